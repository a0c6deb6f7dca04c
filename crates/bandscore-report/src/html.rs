//! HTML report generator.
//!
//! Produces self-contained HTML files with all CSS/JS inlined, either for a
//! single evaluation or for a batch run.

use anyhow::{Context, Result};
use std::path::Path;

use bandscore_core::model::{ScoredWork, ScoreSet};
use bandscore_core::report::BatchReport;
use bandscore_core::statistics::BandBucket;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn band_class(band: f64) -> &'static str {
    if band >= 7.0 {
        "pass"
    } else if band < 6.0 {
        "fail"
    } else {
        ""
    }
}

fn push_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn push_list(html: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    html.push_str(&format!("<h3>{}</h3>\n<ul>\n", html_escape(heading)));
    for item in items {
        html.push_str(&format!("<li>{}</li>\n", html_escape(item)));
    }
    html.push_str("</ul>\n");
}

fn push_score_table(html: &mut String, scores: &ScoreSet) {
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Criterion</th><th>Band</th></tr></thead>\n<tbody>\n");
    for (criterion, band) in scores.iter() {
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"{}\">{:.1}</td></tr>\n",
            criterion.label(),
            band_class(band),
            band
        ));
    }
    html.push_str(&format!(
        "<tr class=\"overall\"><td>Overall</td><td class=\"{}\">{:.1}</td></tr>\n",
        band_class(scores.overall_band()),
        scores.overall_band()
    ));
    html.push_str("</tbody></table>\n");
}

fn push_raw_json(html: &mut String, json: &str) {
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&json.replace('<', "&lt;").replace('>', "&gt;"));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");
}

/// Generate an HTML page for one evaluation: scores, assessment and course.
pub fn generate_evaluation_html(scored: &ScoredWork) -> String {
    let result = &scored.result;
    let evaluation = &result.evaluation;
    let course = &result.improvement_course;

    let mut html = String::new();
    push_head(
        &mut html,
        &format!("bandscore - band {:.1}", result.scores.overall_band()),
    );

    html.push_str("<header>\n");
    html.push_str("<h1>bandscore evaluation</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Overall band <strong>{:.1}</strong> | {} ({}) | {} tokens | ${:.4}</p>\n",
        result.scores.overall_band(),
        html_escape(&scored.provider),
        html_escape(&scored.model),
        scored.tokens_used,
        scored.cost_usd,
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n<h2>Scores</h2>\n");
    push_score_table(&mut html, &result.scores);
    html.push_str("</section>\n");

    html.push_str("<section class=\"assessment\">\n<h2>Assessment</h2>\n");
    push_list(&mut html, "Strengths", &evaluation.strengths);
    push_list(&mut html, "Weaknesses", &evaluation.weaknesses);
    if !evaluation.feedback.is_empty() {
        html.push_str("<h3>Feedback</h3>\n<dl>\n");
        for (criterion, line) in &evaluation.feedback {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>\n",
                criterion.label(),
                html_escape(line)
            ));
        }
        html.push_str("</dl>\n");
    }
    push_list(&mut html, "Suggestions", &evaluation.suggestions);
    html.push_str("</section>\n");

    html.push_str("<section class=\"course\">\n");
    html.push_str(&format!("<h2>{}</h2>\n", html_escape(&course.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{:.1} to {:.1} over {} weeks</p>\n",
        course.current_level, course.target_level, course.duration_weeks
    ));

    html.push_str("<table>\n<thead><tr><th>Week</th><th>Theme</th><th>Goals</th><th>Activities</th></tr></thead>\n<tbody>\n");
    for week in &course.weekly_plan {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            week.week_number,
            html_escape(&week.focus_theme),
            html_escape(&week.goals.join("; ")),
            html_escape(&week.activities.join("; ")),
        ));
    }
    html.push_str("</tbody></table>\n");

    if !course.milestones.is_empty() {
        html.push_str("<h3>Milestones</h3>\n<ul>\n");
        for milestone in &course.milestones {
            html.push_str(&format!(
                "<li>Week {}: band {:.2}</li>\n",
                milestone.week, milestone.target_band
            ));
        }
        html.push_str("</ul>\n");
    }

    if !course.daily_activities.is_empty() {
        html.push_str("<h3>Daily practice</h3>\n<ul>\n");
        for daily in &course.daily_activities {
            html.push_str(&format!(
                "<li>{} ({} min)</li>\n",
                html_escape(&daily.activity),
                daily.duration_minutes
            ));
        }
        html.push_str("</ul>\n");
    }
    push_list(&mut html, "Resources", &course.resources);
    html.push_str("</section>\n");

    push_raw_json(
        &mut html,
        &serde_json::to_string_pretty(result).unwrap_or_default(),
    );

    html.push_str("</body>\n</html>");
    html
}

/// Generate an HTML report for a batch run.
pub fn generate_batch_html(report: &BatchReport) -> String {
    let stats = &report.aggregate;
    let mut html = String::new();
    push_head(
        &mut html,
        &format!("bandscore report - {}", report.sample_set.name),
    );

    html.push_str("<header>\n");
    html.push_str("<h1>bandscore report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Sample set: <strong>{}</strong> | {} samples | {} | {}</p>\n",
        html_escape(&report.sample_set.name),
        report.sample_set.sample_count,
        html_escape(&report.provider),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n<tbody>\n");
    html.push_str(&format!(
        "<tr><th>Evaluated</th><td>{}</td></tr>\n<tr><th>Failed</th><td>{}</td></tr>\n",
        stats.evaluated, stats.failed
    ));
    html.push_str(&format!(
        "<tr><th>Mean overall band</th><td>{:.2}</td></tr>\n<tr><th>Median overall band</th><td>{:.2}</td></tr>\n",
        stats.mean_overall_band, stats.median_overall_band
    ));
    if let Some(mae) = stats.mean_absolute_error {
        html.push_str(&format!(
            "<tr><th>Mean absolute error</th><td>{mae:.2}</td></tr>\n"
        ));
    }
    html.push_str(&format!(
        "<tr><th>Cost</th><td>${:.4} ({} tokens)</td></tr>\n",
        stats.total_cost_usd, stats.total_tokens
    ));
    html.push_str("</tbody></table>\n");

    if !stats.per_criterion.is_empty() {
        html.push_str("<table class=\"summary\">\n");
        html.push_str("<thead><tr><th>Criterion</th><th>Mean</th><th>Min</th><th>Max</th><th>Focus area</th></tr></thead>\n<tbody>\n");
        for (criterion, c) in &stats.per_criterion {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{:.2}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td></tr>\n",
                criterion.label(),
                c.mean,
                c.min,
                c.max,
                stats.focus_area_frequency.get(criterion).copied().unwrap_or(0),
            ));
        }
        html.push_str("</tbody></table>\n");
    }

    if !stats.band_histogram.is_empty() {
        html.push_str(&generate_band_chart(&stats.band_histogram));
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n<h2>Results</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Sample</th><th onclick=\"sortTable(1)\">Type</th><th onclick=\"sortTable(2)\">Overall</th><th onclick=\"sortTable(3)\">Expected</th><th onclick=\"sortTable(4)\">Weakest</th><th onclick=\"sortTable(5)\">Provider</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for r in &report.results {
        let overall = r.overall_band();
        let expected = r
            .expected_band
            .map(|b| format!("{b:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let weakest = r
            .scored
            .result
            .scores
            .weakest()
            .map(|(c, _)| c.label())
            .unwrap_or("-");
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{:.1}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&r.sample_id),
            r.work_type,
            band_class(overall),
            overall,
            expected,
            weakest,
            html_escape(&r.scored.provider),
        ));
    }
    html.push_str("</tbody></table>\n");

    if !report.failures.is_empty() {
        html.push_str("<h3>Failures</h3>\n<ul>\n");
        for f in &report.failures {
            html.push_str(&format!(
                "<li class=\"fail\"><strong>{}</strong>: {}</li>\n",
                html_escape(&f.sample_id),
                html_escape(&f.error)
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    push_raw_json(
        &mut html,
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    );

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write generated HTML to a file, creating parent directories.
pub fn write_html(html: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Vertical bars of sample counts per half-band bucket.
fn generate_band_chart(buckets: &[BandBucket]) -> String {
    let bar_width = 40;
    let max_height = 200;
    let padding = 10;
    let label_height = 20;

    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let total_width = buckets.len() * (bar_width + padding) + padding;
    let total_height = max_height + 2 * label_height;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        total_width, total_height
    );

    for (i, bucket) in buckets.iter().enumerate() {
        let x = i * (bar_width + padding) + padding;
        let height = bucket.count * max_height / max_count;
        let y = label_height + max_height - height;

        let color = if bucket.band >= 7.0 {
            "#22c55e"
        } else if bucket.band >= 6.0 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            x + bar_width / 2,
            y.saturating_sub(4),
            bucket.count
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            x, y, bar_width, height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">{:.1}</text>\n",
            x + bar_width / 2,
            total_height - 4,
            bucket.band
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.overall td { font-weight: bold; }
dt { font-weight: bold; margin-top: 0.5rem; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use bandscore_core::model::{WorkSample, WorkType};
    use bandscore_core::report::{SampleFailure, SampleResult, SampleSetSummary};
    use bandscore_core::statistics::compute_aggregate_stats;
    use bandscore_core::ScoringService;

    fn scored(content: &str) -> ScoredWork {
        let result = ScoringService::default()
            .evaluate(&WorkSample::essay(content, "task2"))
            .unwrap();
        ScoredWork {
            result,
            provider: "rule_based".into(),
            model: "rules-v1".into(),
            tokens_used: 0,
            cost_usd: 0.0,
        }
    }

    fn make_test_report() -> BatchReport {
        let results = vec![SampleResult {
            sample_id: "essay-<1>".into(),
            name: "First essay".into(),
            work_type: WorkType::Essay,
            scored: scored("Transport matters, because cities grow."),
            expected_band: Some(6.0),
            latency_ms: 3,
        }];
        let aggregate = compute_aggregate_stats(&results, 1);
        BatchReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            sample_set: SampleSetSummary {
                id: "test-set".into(),
                name: "Test Set".into(),
                sample_count: 2,
            },
            provider: "rule_based".into(),
            results,
            failures: vec![SampleFailure {
                sample_id: "blank".into(),
                error: "content cannot be empty".into(),
            }],
            aggregate,
            duration_ms: 10,
        }
    }

    #[test]
    fn batch_report_contains_required_elements() {
        let html = generate_batch_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Test Set"));
        assert!(html.contains("essay-&lt;1&gt;"));
        assert!(!html.contains("essay-<1>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("content cannot be empty"));
        assert!(html.contains("Task Achievement"));
    }

    #[test]
    fn evaluation_page_lists_assessment_and_course() {
        let scored = scored("Short text.");
        let html = generate_evaluation_html(&scored);

        assert!(html.contains("bandscore evaluation"));
        assert!(html.contains(&html_escape(&scored.result.improvement_course.title)));
        assert!(html.contains("Weaknesses"));
        assert!(html.contains("Week 2"));
        assert!(html.contains("Overall"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn html_report_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");

        write_html(&generate_batch_html(&make_test_report()), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
