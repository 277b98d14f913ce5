use relations::{RelationCategory, RelationMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::gold::GoldStandard;

/// Preconditions the evaluator refuses to paper over
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error(
        "Family keys differ: missing in prediction {missing_in_prediction:?}, missing in gold {missing_in_gold:?}"
    )]
    FamilyMismatch {
        missing_in_prediction: Vec<String>,
        missing_in_gold: Vec<String>,
    },

    #[error("Family {family}: {predicted} predicted pairs but {gold} gold pairs")]
    LengthMismatch {
        family: String,
        predicted: usize,
        gold: usize,
    },

    #[error("Family {family}, position {index}: predicted pair {predicted:?} does not match gold pair {gold:?}")]
    Alignment {
        family: String,
        index: usize,
        predicted: (String, String),
        gold: (String, String),
    },

    #[error("{metric} is undefined: {reason}")]
    UndefinedMetric { metric: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl Confusion {
    pub fn record(&mut self, predicted: RelationCategory, gold: RelationCategory) {
        match (predicted.is_relation(), gold.is_relation()) {
            (true, _) if predicted == gold => self.true_positives += 1,
            (true, _) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    pub fn add(&mut self, other: &Confusion) {
        self.true_positives += other.true_positives;
        self.true_negatives += other.true_negatives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    pub fn precision(&self) -> Result<f64, EvaluationError> {
        let predicted_positive = self.true_positives + self.false_positives;
        if predicted_positive == 0 {
            return Err(EvaluationError::UndefinedMetric {
                metric: "precision",
                reason: "no positive predictions (tp + fp = 0)".to_string(),
            });
        }
        Ok(self.true_positives as f64 / predicted_positive as f64)
    }

    pub fn recall(&self) -> Result<f64, EvaluationError> {
        let actual_positive = self.true_positives + self.false_negatives;
        if actual_positive == 0 {
            return Err(EvaluationError::UndefinedMetric {
                metric: "recall",
                reason: "no positive gold labels (tp + fn = 0)".to_string(),
            });
        }
        Ok(self.true_positives as f64 / actual_positive as f64)
    }

    pub fn scores(&self) -> Result<Scores, EvaluationError> {
        let precision = self.precision()?;
        let recall = self.recall()?;
        if precision + recall == 0.0 {
            return Err(EvaluationError::UndefinedMetric {
                metric: "f1",
                reason: "precision and recall are both zero".to_string(),
            });
        }

        Ok(Scores {
            precision,
            recall,
            f1: 2.0 * precision * recall / (precision + recall),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Confusion counts per family, in surname order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tally {
    pub overall: Confusion,
    pub by_family: Vec<(String, Confusion)>,
}

/// Line predictions up with the gold standard and count outcomes. Only the
/// top-ranked category of each prediction is compared.
pub fn tally(predicted: &RelationMap, gold: &GoldStandard) -> Result<Tally, EvaluationError> {
    check_families(predicted, gold)?;

    let mut overall = Confusion::default();
    let mut by_family = Vec::with_capacity(gold.len());

    for (family, gold_pairs) in gold {
        let predicted_pairs = &predicted[family];
        if predicted_pairs.len() != gold_pairs.len() {
            return Err(EvaluationError::LengthMismatch {
                family: family.clone(),
                predicted: predicted_pairs.len(),
                gold: gold_pairs.len(),
            });
        }

        let mut confusion = Confusion::default();
        for (index, (candidate, expected)) in predicted_pairs.iter().zip(gold_pairs).enumerate() {
            if !candidate.same_pair(&expected.first, &expected.second) {
                return Err(EvaluationError::Alignment {
                    family: family.clone(),
                    index,
                    predicted: candidate.names.clone(),
                    gold: (expected.first.clone(), expected.second.clone()),
                });
            }
            confusion.record(candidate.top_category(), expected.label);
        }

        overall.add(&confusion);
        by_family.push((family.clone(), confusion));
    }

    Ok(Tally { overall, by_family })
}

/// Precision, recall and F1 over every aligned pair
pub fn evaluate(predicted: &RelationMap, gold: &GoldStandard) -> Result<Scores, EvaluationError> {
    tally(predicted, gold)?.overall.scores()
}

fn check_families(predicted: &RelationMap, gold: &GoldStandard) -> Result<(), EvaluationError> {
    let predicted_keys: BTreeSet<&String> = predicted.keys().collect();
    let gold_keys: BTreeSet<&String> = gold.keys().collect();

    if predicted_keys == gold_keys {
        return Ok(());
    }

    Err(EvaluationError::FamilyMismatch {
        missing_in_prediction: gold_keys
            .difference(&predicted_keys)
            .map(|s| s.to_string())
            .collect(),
        missing_in_gold: predicted_keys
            .difference(&gold_keys)
            .map(|s| s.to_string())
            .collect(),
    })
}
