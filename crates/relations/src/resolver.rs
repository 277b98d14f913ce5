use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{RankedScores, RelationCandidate, RelationCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Sibling pairs need a top count strictly above this to seed the group
    pub sibling_floor: usize,
    pub max_parents: usize,
    /// Skip a second parent ranked a sibling of the first
    pub require_unrelated_parents: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            sibling_floor: 2,
            max_parents: 2,
            require_unrelated_parents: false,
        }
    }
}

/// Outcome of one resolution pass over a family's candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub candidates: Vec<RelationCandidate>,
    pub sibling_group: BTreeSet<String>,
    /// Selected parents with their aggregate parent_child weight
    pub parents: Vec<(String, usize)>,
    pub demoted: usize,
    pub forced: usize,
}

type NamePair = (String, String);

/// Turns noisy pairwise scores into one consistent family structure.
pub struct ConstraintResolver {
    config: ResolverConfig,
}

impl ConstraintResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, candidates: &[RelationCandidate]) -> Resolution {
        let sibling_group = self.sibling_group(candidates);

        if sibling_group.is_empty() {
            return Resolution {
                candidates: candidates.to_vec(),
                ..Resolution::default()
            };
        }

        let mut demoted = 0;
        let mut forced = 0;

        // Siblings of a group member must themselves be in the group
        let candidates: Vec<RelationCandidate> = candidates
            .iter()
            .map(|c| {
                if crossing_member(c, &sibling_group).is_some()
                    && c.top_category() == RelationCategory::Sibling
                {
                    demoted += 1;
                    with_scores(c, demote_sibling(&c.scores))
                } else {
                    c.clone()
                }
            })
            .collect();

        let parents = self.select_parents(&candidates, &sibling_group);
        let weights: BTreeMap<&str, usize> =
            parents.iter().map(|(name, w)| (name.as_str(), *w)).collect();

        let candidates: Vec<RelationCandidate> = candidates
            .iter()
            .map(|c| match crossing_member(c, &sibling_group) {
                Some(outsider) => match weights.get(outsider) {
                    Some(&weight) => {
                        let scores = force_parent_child(&c.scores, weight);
                        if scores != c.scores {
                            forced += 1;
                        }
                        with_scores(c, scores)
                    }
                    None if c.top_category() == RelationCategory::ParentChild => {
                        demoted += 1;
                        with_scores(c, demote_to_no_relation(&c.scores))
                    }
                    None => c.clone(),
                },
                None => c.clone(),
            })
            .collect();

        tracing::debug!(
            siblings = sibling_group.len(),
            parents = parents.len(),
            demoted,
            forced,
            "Resolved family structure"
        );

        Resolution {
            candidates,
            sibling_group,
            parents,
            demoted,
            forced,
        }
    }

    /// The maximal consistent sibling set. Seeds come from the scorer's own
    /// ranking, so a second pass over resolved candidates finds the same group.
    pub fn sibling_group(&self, candidates: &[RelationCandidate]) -> BTreeSet<String> {
        let mut pairs: BTreeSet<NamePair> = candidates
            .iter()
            .filter(|c| {
                matches!(
                    c.evidence.ranked().first(),
                    Some(&(RelationCategory::Sibling, count)) if count > self.config.sibling_floor
                )
            })
            .map(|c| normalize(&c.names.0, &c.names.1))
            .collect();

        while !pairs.is_empty() && !is_equivalence_class(&pairs) {
            let Some(victim) = least_frequent_name(&pairs) else {
                break;
            };
            tracing::trace!(name = %victim, "Dropping name from sibling seed set");
            pairs.retain(|(a, b)| *a != victim && *b != victim);
        }

        names_of(&pairs)
    }

    fn select_parents(
        &self,
        candidates: &[RelationCandidate],
        sibling_group: &BTreeSet<String>,
    ) -> Vec<(String, usize)> {
        let mut weights: BTreeMap<&str, usize> = BTreeMap::new();
        let mut eligible: BTreeSet<&str> = BTreeSet::new();

        for c in candidates {
            if let Some(outsider) = crossing_member(c, sibling_group) {
                *weights.entry(outsider).or_insert(0) += c.evidence.parent_child;
                if c.top_category() == RelationCategory::ParentChild {
                    eligible.insert(outsider);
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = eligible
            .into_iter()
            .map(|name| (name, weights.get(name).copied().unwrap_or(0)))
            .filter(|&(_, weight)| weight > 0)
            .collect();
        // Heaviest first, then by name
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut parents: Vec<(String, usize)> = Vec::new();
        for (name, weight) in ranked {
            if parents.len() >= self.config.max_parents {
                break;
            }
            if self.config.require_unrelated_parents
                && parents
                    .iter()
                    .any(|(chosen, _)| ranked_siblings(candidates, chosen, name))
            {
                continue;
            }
            parents.push((name.to_string(), weight));
        }

        parents
    }
}

impl Default for ConstraintResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

/// True iff `pairs` is exactly every unordered pair over its own names.
pub fn is_equivalence_class(pairs: &BTreeSet<NamePair>) -> bool {
    let names: Vec<String> = names_of(pairs).into_iter().collect();

    let mut complete: BTreeSet<NamePair> = BTreeSet::new();
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            complete.insert((a.clone(), b.clone()));
        }
    }

    let normalized: BTreeSet<NamePair> = pairs.iter().map(|(a, b)| normalize(a, b)).collect();
    normalized == complete
}

fn normalize(a: &str, b: &str) -> NamePair {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn names_of(pairs: &BTreeSet<NamePair>) -> BTreeSet<String> {
    pairs
        .iter()
        .flat_map(|(a, b)| [a.clone(), b.clone()])
        .collect()
}

/// Fewest occurrences first; ties go to the lexicographically smallest name.
fn least_frequent_name(pairs: &BTreeSet<NamePair>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (a, b) in pairs {
        *counts.entry(a).or_insert(0) += 1;
        *counts.entry(b).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .min_by(|x, y| x.1.cmp(&y.1).then_with(|| x.0.cmp(y.0)))
        .map(|(name, _)| name.to_string())
}

/// The non-member of a pair that straddles the group, if it does
fn crossing_member<'a>(
    candidate: &'a RelationCandidate,
    group: &BTreeSet<String>,
) -> Option<&'a str> {
    let (a, b) = &candidate.names;
    match (group.contains(a), group.contains(b)) {
        (true, false) => Some(b.as_str()),
        (false, true) => Some(a.as_str()),
        _ => None,
    }
}

fn ranked_siblings(candidates: &[RelationCandidate], a: &str, b: &str) -> bool {
    candidates
        .iter()
        .any(|c| c.same_pair(a, b) && c.top_category() == RelationCategory::Sibling)
}

fn with_scores(candidate: &RelationCandidate, scores: RankedScores) -> RelationCandidate {
    RelationCandidate {
        scores,
        ..candidate.clone()
    }
}

/// Swap to the runner-up unless it is tied or empty, else `no_relation`.
fn demote_sibling(scores: &[(RelationCategory, usize)]) -> RankedScores {
    let top_count = scores.first().map(|&(_, n)| n).unwrap_or(0);

    match scores.get(1) {
        Some(&(_, next)) if next > 0 && next != top_count => {
            let mut swapped = scores.to_vec();
            swapped.swap(0, 1);
            swapped
        }
        _ => demote_to_no_relation(scores),
    }
}

/// `no_relation` first; the previous ranking stays behind it for audit.
fn demote_to_no_relation(scores: &[(RelationCategory, usize)]) -> RankedScores {
    std::iter::once((RelationCategory::NoRelation, 0))
        .chain(
            scores
                .iter()
                .copied()
                .filter(|(c, _)| *c != RelationCategory::NoRelation),
        )
        .collect()
}

fn force_parent_child(scores: &[(RelationCategory, usize)], weight: usize) -> RankedScores {
    std::iter::once((RelationCategory::ParentChild, weight))
        .chain(scores.iter().copied().filter(|(c, _)| {
            *c != RelationCategory::ParentChild && *c != RelationCategory::NoRelation
        }))
        .collect()
}
