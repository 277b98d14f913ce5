use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A family keyed by surname; members are given names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub surname: String,
    pub members: BTreeSet<String>,
}

impl Family {
    pub fn with_members<I, S>(surname: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            surname: surname.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub type Families = BTreeMap<String, Family>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub people: BTreeSet<String>,
    pub families: Families,
}
