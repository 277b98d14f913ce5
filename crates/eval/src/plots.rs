use anyhow::Result;
use plotters::prelude::*;

use crate::report::EvaluationReport;

pub fn generate_plots(report: &EvaluationReport, output_dir: &str) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    plot_confusion_by_family(report, &format!("{}/confusion_by_family.png", output_dir))?;

    Ok(())
}

fn plot_confusion_by_family(report: &EvaluationReport, path: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let families = report.by_family.len().max(1);
    let max_count = report
        .by_family
        .iter()
        .map(|f| {
            let c = &f.confusion;
            c.true_positives.max(c.false_positives).max(c.false_negatives)
        })
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Outcomes by Family", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..families as f64, 0f64..(max_count * 1.2))?;

    let labels: Vec<String> = report.by_family.iter().map(|f| f.family.clone()).collect();
    chart
        .configure_mesh()
        .y_desc("Pairs")
        .x_labels(families)
        .x_label_formatter(&|x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .draw()?;

    let series = [
        ("True positives", GREEN),
        ("False positives", RED),
        ("False negatives", BLUE),
    ];

    for (offset, (label, color)) in series.iter().enumerate() {
        let bars: Vec<Rectangle<(f64, f64)>> = report
            .by_family
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let c = &f.confusion;
                let value = match offset {
                    0 => c.true_positives,
                    1 => c.false_positives,
                    _ => c.false_negatives,
                } as f64;
                let x = i as f64 + 0.1 + offset as f64 * 0.27;
                Rectangle::new([(x, 0.0), (x + 0.25, value)], color.filled())
            })
            .collect();

        let color = *color;
        chart
            .draw_series(bars)?
            .label(*label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    println!("Saved confusion plot to {}", path);
    Ok(())
}
