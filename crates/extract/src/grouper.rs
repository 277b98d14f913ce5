use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::schema::{Families, Family};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrouperConfig {
    /// A leading token seen more often than this is treated as a title
    pub title_threshold: usize,
    /// Members dropped outright (corpus noise such as "House Stark")
    pub noise_tokens: Vec<String>,
    pub min_family_size: usize,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            title_threshold: 4,
            noise_tokens: vec!["House".to_string()],
            min_family_size: 2,
        }
    }
}

/// Clusters multi-word names into families by surname.
pub struct FamilyGrouper {
    config: GrouperConfig,
}

impl FamilyGrouper {
    pub fn new(config: GrouperConfig) -> Self {
        Self { config }
    }

    pub fn group(&self, names: &BTreeSet<String>) -> Families {
        let split: Vec<Vec<&str>> = names
            .iter()
            .map(|n| n.split_whitespace().collect::<Vec<_>>())
            .filter(|tokens| tokens.len() > 1)
            .collect();

        let titles = self.detect_titles(&split);

        let mut clusters: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for tokens in &split {
            let Some(given) = given_name(tokens, &titles) else {
                tracing::debug!(name = %tokens.join(" "), "Skipping title-only name");
                continue;
            };
            let surname = tokens[tokens.len() - 1];
            clusters.entry(surname.to_string()).or_default().insert(given);
        }

        let mut families = Families::new();
        for (surname, members) in clusters {
            if members.len() < 2 {
                continue;
            }

            let members = self.deduplicate(members);
            if members.len() < self.config.min_family_size {
                tracing::debug!(surname = %surname, "Family too small after deduplication");
                continue;
            }

            families.insert(surname.clone(), Family { surname, members });
        }

        tracing::info!(
            names = names.len(),
            titles = titles.len(),
            families = families.len(),
            "Grouped names into families"
        );

        families
    }

    /// Leading tokens frequent enough to be honorifics rather than given names
    pub fn detect_titles(&self, names: &[Vec<&str>]) -> BTreeSet<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for tokens in names {
            if let Some(first) = tokens.first() {
                *counts.entry(*first).or_insert(0) += 1;
            }
        }

        counts
            .into_iter()
            .filter(|&(_, count)| count > self.config.title_threshold)
            .map(|(token, _)| token.to_string())
            .collect()
    }

    fn deduplicate(&self, members: BTreeSet<String>) -> BTreeSet<String> {
        let members: BTreeSet<String> = members
            .into_iter()
            .filter(|m| !self.config.noise_tokens.contains(m))
            .collect();
        collapse_nicknames(&members)
    }
}

/// Given name for a split name, skipping a leading title. A title followed
/// directly by the surname leaves nothing to group by.
fn given_name(tokens: &[&str], titles: &BTreeSet<String>) -> Option<String> {
    let n = tokens.len();
    if titles.contains(tokens[0]) {
        (n > 2).then(|| tokens[n - 2].to_string())
    } else {
        Some(tokens[..n - 1].join(" "))
    }
}

/// Drop every member that is a strict substring of another member, keeping
/// the fuller name ("Brandon" survives, "Bran" goes).
pub fn collapse_nicknames(members: &BTreeSet<String>) -> BTreeSet<String> {
    members
        .iter()
        .filter(|m| !members.iter().any(|other| other != *m && other.contains(m.as_str())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_surname_clustering() {
        let grouper = FamilyGrouper::new(GrouperConfig::default());
        let families = grouper.group(&names(&[
            "Ned Stark",
            "Robb Stark",
            "Sansa Stark",
            "Jaime Lannister",
            "Cersei Lannister",
            "Jorah Mormont",
        ]));

        assert_eq!(families.len(), 2);
        assert_eq!(families["Stark"].members, names(&["Ned", "Robb", "Sansa"]));
        assert!(!families.contains_key("Mormont"));
    }

    #[test]
    fn test_frequent_leading_token_is_title() {
        let grouper = FamilyGrouper::new(GrouperConfig::default());
        let families = grouper.group(&names(&[
            "Ser Jorah Mormont",
            "Ser Barristan Selmy",
            "Ser Rodrik Cassel",
            "Ser Jaime Lannister",
            "Ser Gregor Clegane",
            "Ser Mormont",
            "Jeor Mormont",
        ]));

        assert_eq!(families["Mormont"].members, names(&["Jeor", "Jorah"]));
    }

    #[test]
    fn test_threshold_is_strict() {
        let grouper = FamilyGrouper::new(GrouperConfig::default());
        let split: Vec<Vec<&str>> = vec![
            vec!["Old", "Nan"],
            vec!["Old", "Bear"],
            vec!["Old", "Man"],
            vec!["Old", "Tom"],
        ];
        assert!(grouper.detect_titles(&split).is_empty());
    }

    #[test]
    fn test_nicknames_and_noise_removed() {
        let grouper = FamilyGrouper::new(GrouperConfig::default());
        let families = grouper.group(&names(&[
            "Bran Stark",
            "Brandon Stark",
            "House Stark",
            "Arya Stark",
        ]));

        assert_eq!(families["Stark"].members, names(&["Arya", "Brandon"]));
    }

    #[test]
    fn test_family_dropped_when_collapse_leaves_one() {
        let grouper = FamilyGrouper::new(GrouperConfig::default());
        let families = grouper.group(&names(&["Bran Stark", "Brandon Stark"]));
        assert!(families.is_empty());
    }

    #[test]
    fn test_no_member_contains_another() {
        let collapsed = collapse_nicknames(&names(&["Jon", "Jonos", "Jo", "Arya", "Ary", "Rickon"]));

        assert_eq!(collapsed, names(&["Arya", "Jonos", "Rickon"]));
        for a in &collapsed {
            for b in &collapsed {
                assert!(a == b || !a.contains(b.as_str()));
            }
        }
    }
}
