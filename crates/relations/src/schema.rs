use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCategory {
    ParentChild,
    Sibling,
    NoRelation,
}

impl RelationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationCategory::ParentChild => "parent_child",
            RelationCategory::Sibling => "sibling",
            RelationCategory::NoRelation => "no_relation",
        }
    }

    pub fn is_relation(&self) -> bool {
        *self != RelationCategory::NoRelation
    }
}

impl fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown relation category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for RelationCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "parent_child" => Ok(RelationCategory::ParentChild),
            "sibling" => Ok(RelationCategory::Sibling),
            "no_relation" => Ok(RelationCategory::NoRelation),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Ranked (category, count) list, highest count first
pub type RankedScores = Vec<(RelationCategory, usize)>;

/// Raw term counts gathered by the co-occurrence scorer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub parent_child: usize,
    pub sibling: usize,
    /// Per-term hit counts, e.g. "father" -> 3
    #[serde(default)]
    pub terms: BTreeMap<String, usize>,
}

impl Evidence {
    pub fn total(&self) -> usize {
        self.parent_child + self.sibling
    }

    /// Rank the two super-categories by count. Ties keep parent_child first.
    /// No evidence at all ranks as a lone `no_relation`.
    pub fn ranked(&self) -> RankedScores {
        if self.total() == 0 {
            return vec![(RelationCategory::NoRelation, 0)];
        }

        let mut scores = vec![
            (RelationCategory::ParentChild, self.parent_child),
            (RelationCategory::Sibling, self.sibling),
        ];
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        scores
    }

    fn from_scores(scores: &[(RelationCategory, usize)]) -> Self {
        let count_of = |category| {
            scores
                .iter()
                .find(|(c, _)| *c == category)
                .map(|&(_, n)| n)
                .unwrap_or(0)
        };

        Self {
            parent_child: count_of(RelationCategory::ParentChild),
            sibling: count_of(RelationCategory::Sibling),
            terms: BTreeMap::new(),
        }
    }
}

/// An unordered pair of family members with its ranked categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub names: (String, String),
    /// Sorted by count when scored. After resolution only the first entry is
    /// the decision; `evidence.ranked()` keeps the sorted view.
    pub scores: RankedScores,
    pub evidence: Evidence,
}

impl RelationCandidate {
    pub fn new(first: impl Into<String>, second: impl Into<String>, evidence: Evidence) -> Self {
        Self {
            names: (first.into(), second.into()),
            scores: evidence.ranked(),
            evidence,
        }
    }

    /// Build a candidate from an already ranked list; evidence is derived
    /// from the listed counts.
    pub fn from_scores(
        first: impl Into<String>,
        second: impl Into<String>,
        scores: RankedScores,
    ) -> Self {
        let evidence = Evidence::from_scores(&scores);
        Self {
            names: (first.into(), second.into()),
            scores,
            evidence,
        }
    }

    pub fn top(&self) -> (RelationCategory, usize) {
        self.scores
            .first()
            .copied()
            .unwrap_or((RelationCategory::NoRelation, 0))
    }

    pub fn top_category(&self) -> RelationCategory {
        self.top().0
    }

    pub fn involves(&self, name: &str) -> bool {
        self.names.0 == name || self.names.1 == name
    }

    /// The member of the pair that is not `name`
    pub fn other(&self, name: &str) -> Option<&str> {
        if self.names.0 == name {
            Some(&self.names.1)
        } else if self.names.1 == name {
            Some(&self.names.0)
        } else {
            None
        }
    }

    /// Order-insensitive comparison of the two names
    pub fn same_pair(&self, first: &str, second: &str) -> bool {
        (self.names.0 == first && self.names.1 == second)
            || (self.names.0 == second && self.names.1 == first)
    }
}

/// Resolver output: surname -> resolved candidates
pub type RelationMap = BTreeMap<String, Vec<RelationCandidate>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_is_stable_on_ties() {
        let evidence = Evidence {
            parent_child: 2,
            sibling: 2,
            terms: BTreeMap::new(),
        };
        assert_eq!(
            evidence.ranked(),
            vec![(RelationCategory::ParentChild, 2), (RelationCategory::Sibling, 2)]
        );
    }

    #[test]
    fn test_no_evidence_is_no_relation() {
        assert_eq!(
            Evidence::default().ranked(),
            vec![(RelationCategory::NoRelation, 0)]
        );
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            RelationCategory::ParentChild,
            RelationCategory::Sibling,
            RelationCategory::NoRelation,
        ] {
            assert_eq!(category.as_str().parse::<RelationCategory>().unwrap(), category);
        }
        assert!("cousin".parse::<RelationCategory>().is_err());
        assert_eq!(
            serde_json::to_string(&RelationCategory::ParentChild).unwrap(),
            "\"parent_child\""
        );
    }

    #[test]
    fn test_candidate_helpers() {
        let candidate = RelationCandidate::from_scores(
            "Ned",
            "Robb",
            vec![(RelationCategory::Sibling, 3), (RelationCategory::ParentChild, 1)],
        );

        assert_eq!(candidate.top_category(), RelationCategory::Sibling);
        assert_eq!(candidate.evidence.sibling, 3);
        assert_eq!(candidate.other("Robb"), Some("Ned"));
        assert!(candidate.same_pair("Robb", "Ned"));
        assert!(!candidate.involves("Sansa"));
    }
}
