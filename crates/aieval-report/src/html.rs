//! HTML dashboard generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use std::path::Path;

use anyhow::{Context, Result};

use aieval_core::model::{format_score, question_label, Verdict};
use aieval_core::statistics::{summarize, QuestionStats, TableSummary};
use aieval_core::table::ResultTable;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn verdict_class(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::LikelyAi => "ai",
        Verdict::LikelyHuman => "human",
        Verdict::Uncertain => "uncertain",
        Verdict::Unknown => "unknown",
    }
}

/// Generate the dashboard for a session table.
pub fn generate_html(table: &ResultTable) -> String {
    let summary = summarize(table);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>aieval dashboard</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str("<h1>Assignment evaluation dashboard</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Session <code>{}</code> | started {} | {} submission(s)</p>\n",
        table.session_id,
        table.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        table.len()
    ));
    html.push_str("</header>\n");

    html.push_str(&summary_section(&summary));

    if table.is_empty() {
        html.push_str("<p class=\"empty\">No submissions evaluated yet.</p>\n");
    } else {
        html.push_str(&results_section(table));
        html.push_str(&details_section(table));
    }

    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(table).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the dashboard to a file.
pub fn write_html_report(table: &ResultTable, path: &Path) -> Result<()> {
    let html = generate_html(table);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write dashboard to {}", path.display()))?;
    Ok(())
}

fn summary_section(summary: &TableSummary) -> String {
    let mut html = String::from("<section class=\"dashboard\">\n<h2>Summary</h2>\n");
    html.push_str("<div class=\"cards\">\n");
    let cards = [
        ("Students", summary.students.to_string()),
        ("Mean total", format_score(summary.mean_total)),
        (
            "Range",
            if summary.students == 0 {
                "-".to_string()
            } else {
                format!(
                    "{} - {}",
                    format_score(summary.min_total),
                    format_score(summary.max_total)
                )
            },
        ),
        ("Flagged as AI", summary.flagged_answers.to_string()),
        ("Penalties", summary.penalties_applied.to_string()),
        ("Degraded", summary.degraded_records.to_string()),
    ];
    for (label, value) in cards {
        html.push_str(&format!(
            "<div class=\"card\"><span class=\"value\">{}</span><span class=\"label\">{}</span></div>\n",
            html_escape(&value),
            label
        ));
    }
    html.push_str("</div>\n");

    if !summary.per_question.is_empty() {
        html.push_str("<h3>Average score per question</h3>\n");
        html.push_str(&generate_bar_chart(&summary.per_question));
    }
    html.push_str("</section>\n");
    html
}

fn results_section(table: &ResultTable) -> String {
    let mut html = String::from("<section class=\"results\">\n<h2>Results</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n<thead><tr>");
    for (col, title) in table.header().iter().enumerate() {
        html.push_str(&format!(
            "<th onclick=\"sortTable({col})\">{}</th>",
            html_escape(title)
        ));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    let ids = table.question_ids();
    for eval in table.evaluations() {
        html.push_str(&format!("<tr><td>{}</td>", html_escape(&eval.student_name)));
        for id in &ids {
            match eval.record(id) {
                Some(r) => html.push_str(&format!(
                    "<td class=\"{}\" title=\"{}\">{}</td>",
                    verdict_class(r.verdict),
                    html_escape(r.verdict.phrase()),
                    format_score(r.adjusted_score)
                )),
                None => html.push_str("<td class=\"na\">N/A</td>"),
            }
        }
        html.push_str(&format!(
            "<td class=\"total\">{}</td><td>{}</td></tr>\n",
            format_score(eval.total),
            html_escape(&eval.remarks_summary)
        ));
    }

    html.push_str("</tbody></table>\n</section>\n");
    html
}

fn details_section(table: &ResultTable) -> String {
    let mut html = String::from("<section class=\"details\">\n<h2>Feedback</h2>\n");
    for eval in table.evaluations() {
        html.push_str(&format!(
            "<details>\n<summary>{} <span class=\"meta\">{} | {}</span></summary>\n",
            html_escape(&eval.student_name),
            html_escape(&eval.submission),
            eval.evaluated_at.format("%Y-%m-%d %H:%M")
        ));
        html.push_str("<table>\n<thead><tr><th>Question</th><th>Raw</th><th>Adjusted</th><th>Verdict</th><th>Feedback</th><th>Reason</th></tr></thead>\n<tbody>\n");
        for r in &eval.records {
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                if r.is_degraded() { "degraded" } else { "" },
                question_label(&r.question_id),
                format_score(r.raw_score),
                format_score(r.adjusted_score),
                html_escape(r.verdict.phrase()),
                html_escape(&r.feedback).replace('\n', "<br>"),
                html_escape(&r.ai_reason).replace('\n', "<br>"),
            ));
        }
        html.push_str("</tbody></table>\n</details>\n");
    }
    html.push_str("</section>\n");
    html
}

fn generate_bar_chart(per_question: &[QuestionStats]) -> String {
    let bar_height = 24;
    let max_width = 400;
    let padding = 8;
    let label_width = 80;

    let total_height = per_question.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 120,
        total_height
    );

    for (i, q) in per_question.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let ratio = (q.avg_adjusted_score / 10.0).clamp(0.0, 1.0);
        let width = (ratio * max_width as f64) as usize;

        let color = if ratio >= 0.7 {
            "#22c55e"
        } else if ratio >= 0.4 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&question_label(&q.question_id))
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{} ({} answered, {} flagged)</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            format_score(q.avg_adjusted_score),
            q.answered,
            q.flagged
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --human: #dcfce7; --ai: #fde2e2; --uncertain: #fef9c3; --muted: #6b7280; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --human: #064e3b; --ai: #7f1d1d; --uncertain: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .na, .empty { color: var(--muted); }
.cards { display: flex; flex-wrap: wrap; gap: 1rem; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; min-width: 8rem; display: flex; flex-direction: column; }
.card .value { font-size: 1.6rem; font-weight: bold; }
.card .label { color: var(--muted); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.human { background: var(--human); }
.ai { background: var(--ai); }
.uncertain { background: var(--uncertain); }
.degraded td:first-child::after { content: " !"; color: #ef4444; }
.total { font-weight: bold; }
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
  const key = cell => {
    const n = parseFloat(cell.textContent);
    return isNaN(n) ? cell.textContent : n;
  };
  rows.sort((a, b) => {
    const va = key(a.cells[col]);
    const vb = key(b.cells[col]);
    const cmp = typeof va === 'number' && typeof vb === 'number'
      ? va - vb
      : String(va).localeCompare(String(vb));
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
