pub mod config;
pub mod gold;
pub mod metrics;
pub mod plots;
pub mod report;

pub use config::{DataConfig, EvaluationConfig};
pub use gold::{GoldPair, GoldStandard, load_gold, parse_gold};
pub use metrics::{Confusion, EvaluationError, Scores, Tally, evaluate, tally};
pub use plots::generate_plots;
pub use report::{EvaluationReport, FamilyScore};
