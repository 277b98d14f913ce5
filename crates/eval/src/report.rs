use relations::RelationMap;
use serde::{Deserialize, Serialize};

use crate::gold::GoldStandard;
use crate::metrics::{Confusion, EvaluationError, Scores, tally};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyScore {
    pub family: String,
    pub confusion: Confusion,
    /// None where the family alone has no positives to score
    pub scores: Option<Scores>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub pairs: usize,
    pub overall: Confusion,
    pub scores: Scores,
    pub by_family: Vec<FamilyScore>,
    /// Mean F1 over families whose F1 is defined
    pub macro_f1: Option<f64>,
}

impl EvaluationReport {
    pub fn build(predicted: &RelationMap, gold: &GoldStandard) -> Result<Self, EvaluationError> {
        let tally = tally(predicted, gold)?;
        let scores = tally.overall.scores()?;

        let by_family: Vec<FamilyScore> = tally
            .by_family
            .into_iter()
            .map(|(family, confusion)| FamilyScore {
                family,
                confusion,
                scores: confusion.scores().ok(),
            })
            .collect();

        let f1s: Vec<f64> = by_family
            .iter()
            .filter_map(|f| f.scores.map(|s| s.f1))
            .collect();
        let macro_f1 = (!f1s.is_empty()).then(|| statistical::mean(&f1s));

        Ok(Self {
            pairs: tally.overall.total(),
            overall: tally.overall,
            scores,
            by_family,
            macro_f1,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        for family in &self.by_family {
            let c = &family.confusion;
            let f1 = family
                .scores
                .map(|s| format!("{:.3}", s.f1))
                .unwrap_or_else(|| "n/a".to_string());
            rows.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                family.family,
                c.true_positives,
                c.true_negatives,
                c.false_positives,
                c.false_negatives,
                f1
            ));
        }

        let macro_f1 = self
            .macro_f1
            .map(|f| format!("{:.3}", f))
            .unwrap_or_else(|| "n/a".to_string());

        format!(
            r#"# Relation Evaluation

## Overall

| Pairs | Precision | Recall | F1 | Macro F1 |
|-------|-----------|--------|----|----------|
| {} | {:.3} | {:.3} | {:.3} | {} |

## By Family

| Family | TP | TN | FP | FN | F1 |
|--------|----|----|----|----|----|
{}
![Confusion by family](plots/confusion_by_family.png)
"#,
            self.pairs,
            self.scores.precision,
            self.scores.recall,
            self.scores.f1,
            macro_f1,
            rows,
        )
    }
}
