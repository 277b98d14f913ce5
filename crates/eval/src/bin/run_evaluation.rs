use anyhow::{Context, Result};
use eval::{EvaluationConfig, EvaluationReport, generate_plots, load_gold};
use relations::FamilyRelationPipeline;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EvaluationConfig::load()?;
    let data = &config.data;
    let output_dir = &data.output_dir;

    println!("=== Family Relation Evaluation ===\n");

    let pipeline = FamilyRelationPipeline::new(config.pipeline.clone())?;
    let output = pipeline.run_from_dirs(&data.ner_dir, &data.chapters_dir).await?;
    println!(
        "Inferred {} candidate pairs across {} families\n",
        output.candidate_count(),
        output.families.len()
    );

    let gold = load_gold(&data.gold_path).await?;
    let report = EvaluationReport::build(&output.relations, &gold)
        .context("Predictions do not line up with the gold standard")?;

    print_report(&report);

    std::fs::create_dir_all(output_dir)?;
    std::fs::write(
        output_dir.join("relations.json"),
        serde_json::to_string_pretty(&output.relations)?,
    )?;
    std::fs::write(
        output_dir.join("evaluation.json"),
        serde_json::to_string_pretty(&report)?,
    )?;
    println!("\n✅ Results saved to {}", output_dir.display());

    let plots_dir = output_dir.join("plots");
    generate_plots(&report, &plots_dir.to_string_lossy())?;
    println!("✅ Plots saved to {}", plots_dir.display());

    std::fs::write(output_dir.join("EVALUATION.md"), report.to_markdown())?;
    println!("✅ Summary saved to EVALUATION.md");

    Ok(())
}

fn print_report(report: &EvaluationReport) {
    println!("=== RESULTS ===\n");
    println!("  Pairs:     {}", report.pairs);
    println!("  Precision: {:.3}", report.scores.precision);
    println!("  Recall:    {:.3}", report.scores.recall);
    println!("  F1:        {:.3}", report.scores.f1);
    if let Some(macro_f1) = report.macro_f1 {
        println!("  Macro F1:  {:.3}", macro_f1);
    }

    println!("\n📊 BY FAMILY:");
    for family in &report.by_family {
        let c = &family.confusion;
        println!(
            "  {:<12} tp={} tn={} fp={} fn={}",
            family.family, c.true_positives, c.true_negatives, c.false_positives, c.false_negatives
        );
    }
}
