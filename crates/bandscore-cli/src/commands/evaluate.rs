//! The `bandscore evaluate` command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use bandscore_core::model::{ScoredWork, WorkSample};
use bandscore_core::traits::ScoringProvider;
use bandscore_providers::config::load_config_from;
use bandscore_providers::{build_chain, build_service};
use bandscore_report::html::generate_evaluation_html;

use crate::EvaluateArgs;

pub async fn execute(args: EvaluateArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let content = match (&args.file, &args.text) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text.clone(),
        (None, None) => anyhow::bail!("either --file or --text is required"),
    };

    let work_type = build_service(&config)?.resolve_work_type(&args.work_type)?;
    let sample = WorkSample {
        content,
        work_type,
        task_type: args.task_type.clone(),
        declared_word_count: args.word_count,
    };

    let chain = build_chain(&config, args.offline)?;
    let scored = chain.evaluate(&sample).await?;

    let rendered = match args.format.as_str() {
        "json" => serde_json::to_string_pretty(&scored.result)?,
        "html" => generate_evaluation_html(&scored),
        "text" => render_text(&scored),
        other => anyhow::bail!("unknown format: {other} (expected text, json or html)"),
    };

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Evaluation saved to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn render_text(scored: &ScoredWork) -> String {
    let result = &scored.result;
    let mut out = String::new();

    let mut table = Table::new();
    table.set_header(vec!["Criterion", "Band"]);
    for (criterion, band) in result.scores.iter() {
        table.add_row(vec![Cell::new(criterion.label()), Cell::new(format!("{band:.1}"))]);
    }
    table.add_row(vec![
        Cell::new("Overall"),
        Cell::new(format!("{:.1}", result.scores.overall_band())),
    ]);
    out.push_str(&format!("{table}\n"));

    for (title, items) in [
        ("Strengths", &result.evaluation.strengths),
        ("Weaknesses", &result.evaluation.weaknesses),
        ("Suggestions", &result.evaluation.suggestions),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{title}:\n"));
        for item in items {
            out.push_str(&format!("  - {item}\n"));
        }
    }

    let course = &result.improvement_course;
    out.push_str(&format!(
        "\n{} ({} weeks)\n",
        course.title, course.duration_weeks
    ));
    for week in &course.weekly_plan {
        out.push_str(&format!("  Week {}: {}\n", week.week_number, week.focus_theme));
    }
    for milestone in &course.milestones {
        out.push_str(&format!(
            "  Milestone week {}: band {:.2}\n",
            milestone.week, milestone.target_band
        ));
    }

    out.push_str(&format!(
        "\nScored by {} ({})",
        scored.provider, scored.model
    ));
    out
}
