// ============================================================
// HTML RENDERER
// ============================================================
// Render a ProfileReport as one self-contained HTML document

use std::fmt::Write as FmtWrite;
use std::path::Path;

use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::profile::{
    CorrelationMatrix, HistogramBin, NumericStats, ProfileReport, VariableProfile,
};

const STYLE: &str = "\
body{font-family:Arial,Helvetica,sans-serif;margin:0;color:#222;background:#f7f7f9;}\
header{background:#337ab7;color:#fff;padding:16px 24px;}\
header h1{margin:0;font-size:24px;}\
header .meta{font-size:13px;opacity:.85;margin-top:4px;}\
nav{background:#fff;border-bottom:1px solid #ddd;padding:8px 24px;}\
nav a{margin-right:16px;color:#337ab7;text-decoration:none;font-size:14px;}\
main{padding:8px 24px 32px 24px;max-width:1200px;}\
section{background:#fff;border:1px solid #e5e5e5;border-radius:4px;margin:16px 0;padding:12px 16px;}\
h2{margin:4px 0 12px 0;font-size:20px;}\
h3{margin:0 0 8px 0;font-size:16px;}\
.grid{display:flex;flex-wrap:wrap;gap:24px;}\
.stats{border-collapse:collapse;font-size:13px;min-width:260px;}\
.stats th,.stats td{border-bottom:1px solid #eee;padding:4px 8px;text-align:left;}\
.stats td{text-align:right;}\
.table{border-collapse:collapse;font-size:12px;width:100%;}\
.table th,.table td{border:1px solid #ddd;padding:4px 6px;text-align:right;}\
.table th:first-child,.table td:first-child{text-align:left;}\
.badge{display:inline-block;background:#777;color:#fff;border-radius:3px;padding:1px 6px;font-size:12px;margin-left:8px;}\
.alert{display:inline-block;background:#f0ad4e;color:#fff;border-radius:3px;padding:1px 6px;font-size:12px;min-width:110px;}\
.variable{border-top:1px solid #eee;padding-top:12px;margin-top:12px;}\
.bar{fill:#337ab7;}\
.freq{background:#337ab7;height:10px;display:inline-block;}\
.empty{color:#999;font-style:italic;}";

pub struct HtmlRenderer;

impl HtmlRenderer {
    /// Render the report and write it to `path`, replacing any existing file
    pub fn write_to(report: &ProfileReport, path: &Path) -> Result<()> {
        let html = Self::render(report)?;
        std::fs::write(path, html).map_err(|e| {
            AppError::ProfilingError(format!(
                "Failed to write report to {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(path = %path.display(), "Report generated");
        Ok(())
    }

    pub fn render(report: &ProfileReport) -> Result<String> {
        render_document(report)
            .map_err(|e| AppError::ProfilingError(format!("Failed to render report: {}", e)))
    }
}

fn render_document(report: &ProfileReport) -> std::result::Result<String, std::fmt::Error> {
    let mut html = String::with_capacity(64 * 1024);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\"/>")?;
    writeln!(
        html,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>"
    )?;
    writeln!(html, "<title>Profiling Report: {}</title>", escape(&report.title))?;
    writeln!(html, "<style>{}</style>", STYLE)?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    writeln!(html, "<header>")?;
    writeln!(html, "<h1>Profiling Report</h1>")?;
    writeln!(
        html,
        "<div class=\"meta\">{} &middot; generated {}</div>",
        escape(&report.title),
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(html, "</header>")?;

    writeln!(
        html,
        "<nav><a href=\"#overview\">Overview</a><a href=\"#alerts\">Alerts</a>\
         <a href=\"#variables\">Variables</a><a href=\"#correlations\">Correlations</a>\
         <a href=\"#missing\">Missing values</a><a href=\"#sample\">Sample</a></nav>"
    )?;
    writeln!(html, "<main>")?;

    render_overview(&mut html, report)?;
    render_alerts(&mut html, report)?;
    render_variables(&mut html, report)?;
    render_correlations(&mut html, report)?;
    render_missing(&mut html, report)?;
    render_sample(&mut html, report)?;

    writeln!(html, "</main>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    Ok(html)
}

fn render_overview(html: &mut String, report: &ProfileReport) -> std::fmt::Result {
    let o = &report.overview;
    writeln!(html, "<section id=\"overview\">")?;
    writeln!(html, "<h2>Overview</h2>")?;
    writeln!(html, "<div class=\"grid\">")?;

    writeln!(html, "<div><h3>Dataset statistics</h3><table class=\"stats\">")?;
    stat_row(html, "Number of variables", &o.n_variables.to_string())?;
    stat_row(html, "Number of observations", &o.n_observations.to_string())?;
    stat_row(html, "Missing cells", &o.n_cells_missing.to_string())?;
    stat_row(html, "Missing cells (%)", &percent(o.p_cells_missing))?;
    stat_row(html, "Duplicate rows", &o.n_duplicates.to_string())?;
    stat_row(html, "Duplicate rows (%)", &percent(o.p_duplicates))?;
    stat_row(html, "Total size in memory", &human_bytes(o.memory_size))?;
    writeln!(html, "</table></div>")?;

    writeln!(html, "<div><h3>Variable types</h3><table class=\"stats\">")?;
    for (var_type, count) in &o.type_counts {
        stat_row(html, var_type.label(), &count.to_string())?;
    }
    writeln!(html, "</table></div>")?;

    writeln!(html, "<div><h3>Reproduction</h3><table class=\"stats\">")?;
    stat_row(
        html,
        "Analysis started",
        &report.started_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    )?;
    stat_row(
        html,
        "Analysis finished",
        &report.finished_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    )?;
    let duration = report.finished_at - report.started_at;
    stat_row(
        html,
        "Duration",
        &format!("{} ms", duration.num_milliseconds()),
    )?;
    writeln!(html, "</table></div>")?;

    writeln!(html, "</div>")?;
    writeln!(html, "</section>")
}

fn render_alerts(html: &mut String, report: &ProfileReport) -> std::fmt::Result {
    writeln!(html, "<section id=\"alerts\">")?;
    writeln!(html, "<h2>Alerts</h2>")?;
    if report.alerts.is_empty() {
        writeln!(html, "<p class=\"empty\">No alerts</p>")?;
    } else {
        writeln!(html, "<table class=\"stats\">")?;
        for alert in &report.alerts {
            writeln!(
                html,
                "<tr><th>{}</th><td><span class=\"alert\">{}</span></td></tr>",
                escape(&alert.message()),
                alert.kind()
            )?;
        }
        writeln!(html, "</table>")?;
    }
    writeln!(html, "</section>")
}

fn render_variables(html: &mut String, report: &ProfileReport) -> std::fmt::Result {
    writeln!(html, "<section id=\"variables\">")?;
    writeln!(html, "<h2>Variables</h2>")?;
    for variable in &report.variables {
        render_variable(html, variable)?;
    }
    writeln!(html, "</section>")
}

fn render_variable(html: &mut String, v: &VariableProfile) -> std::fmt::Result {
    writeln!(html, "<div class=\"variable\">")?;
    writeln!(
        html,
        "<h3>{}<span class=\"badge\">{}</span></h3>",
        escape(&v.name),
        v.var_type.label()
    )?;
    writeln!(html, "<div class=\"grid\">")?;

    writeln!(html, "<table class=\"stats\">")?;
    stat_row(html, "Distinct", &v.n_distinct.to_string())?;
    stat_row(html, "Distinct (%)", &percent(v.p_distinct))?;
    stat_row(html, "Missing", &v.n_missing.to_string())?;
    stat_row(html, "Missing (%)", &percent(v.p_missing))?;
    stat_row(html, "Memory size", &human_bytes(v.memory_size))?;
    if let Some(text) = &v.text {
        stat_row(html, "Min length", &text.min_length.to_string())?;
        stat_row(html, "Mean length", &format!("{:.2}", text.mean_length))?;
        stat_row(html, "Max length", &text.max_length.to_string())?;
    }
    writeln!(html, "</table>")?;

    if let Some(num) = &v.numeric {
        render_numeric(html, num)?;
    } else {
        render_value_counts(html, &v.value_counts, v.n - v.n_missing)?;
    }

    writeln!(html, "</div>")?;
    writeln!(html, "</div>")
}

fn render_numeric(html: &mut String, num: &NumericStats) -> std::fmt::Result {
    writeln!(html, "<table class=\"stats\">")?;
    stat_row(html, "Mean", &number(num.mean))?;
    stat_row(html, "Minimum", &number(num.min))?;
    stat_row(html, "Maximum", &number(num.max))?;
    stat_row(html, "Zeros", &num.n_zeros.to_string())?;
    stat_row(html, "Zeros (%)", &percent(num.p_zeros))?;
    stat_row(html, "Negative", &num.n_negative.to_string())?;
    stat_row(html, "Negative (%)", &percent(num.p_negative))?;
    stat_row(html, "Infinite", &num.n_infinite.to_string())?;
    writeln!(html, "</table>")?;

    writeln!(html, "<table class=\"stats\">")?;
    writeln!(html, "<tr><th colspan=\"2\">Quantile statistics</th></tr>")?;
    stat_row(html, "5-th percentile", &number(num.p5))?;
    stat_row(html, "Q1", &number(num.q1))?;
    stat_row(html, "Median", &number(num.median))?;
    stat_row(html, "Q3", &number(num.q3))?;
    stat_row(html, "95-th percentile", &number(num.p95))?;
    stat_row(html, "Range", &number(num.range))?;
    stat_row(html, "Interquartile range (IQR)", &number(num.iqr))?;
    writeln!(html, "</table>")?;

    writeln!(html, "<table class=\"stats\">")?;
    writeln!(html, "<tr><th colspan=\"2\">Descriptive statistics</th></tr>")?;
    stat_row(html, "Standard deviation", &number(num.std))?;
    stat_row(html, "Coefficient of variation (CV)", &number(num.cv))?;
    stat_row(html, "Kurtosis", &number(num.kurtosis))?;
    stat_row(html, "Median Absolute Deviation (MAD)", &number(num.mad))?;
    stat_row(html, "Skewness", &number(num.skewness))?;
    stat_row(html, "Sum", &number(num.sum))?;
    stat_row(html, "Variance", &number(num.variance))?;
    stat_row(html, "Monotonicity", num.monotonicity.label())?;
    writeln!(html, "</table>")?;

    render_histogram(html, &num.histogram)
}

/// Inline SVG bar chart of the histogram bins
fn render_histogram(html: &mut String, bins: &[HistogramBin]) -> std::fmt::Result {
    if bins.is_empty() {
        return Ok(());
    }
    let width = 360.0;
    let height = 140.0;
    let plot_height = 110.0;
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1) as f64;
    let bar_width = width / bins.len() as f64;

    writeln!(
        html,
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\" aria-label=\"Histogram\">",
        w = width,
        h = height
    )?;
    for (i, bin) in bins.iter().enumerate() {
        let bar_height = bin.count as f64 / max_count * plot_height;
        writeln!(
            html,
            "<rect class=\"bar\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\"><title>[{}, {}]: {}</title></rect>",
            i as f64 * bar_width + 1.0,
            plot_height - bar_height,
            (bar_width - 2.0).max(1.0),
            bar_height,
            number(bin.lower),
            number(bin.upper),
            bin.count
        )?;
    }
    if let (Some(first), Some(last)) = (bins.first(), bins.last()) {
        writeln!(
            html,
            "<text x=\"2\" y=\"{y}\" font-size=\"11\">{}</text><text x=\"{x}\" y=\"{y}\" font-size=\"11\" text-anchor=\"end\">{}</text>",
            number(first.lower),
            number(last.upper),
            x = width - 2.0,
            y = height - 8.0
        )?;
    }
    writeln!(html, "</svg>")
}

fn render_value_counts(
    html: &mut String,
    value_counts: &[(String, usize)],
    n_present: usize,
) -> std::fmt::Result {
    if value_counts.is_empty() {
        return Ok(());
    }
    writeln!(html, "<table class=\"stats\">")?;
    writeln!(html, "<tr><th>Value</th><th>Count</th><th>Frequency (%)</th></tr>")?;
    for (value, count) in value_counts {
        let share = if n_present == 0 {
            0.0
        } else {
            *count as f64 / n_present as f64
        };
        writeln!(
            html,
            "<tr><th>{}</th><td>{}</td><td><span class=\"freq\" style=\"width:{:.0}px\"></span> {}</td></tr>",
            escape(value),
            count,
            share * 120.0,
            percent(share)
        )?;
    }
    writeln!(html, "</table>")
}

fn render_correlations(html: &mut String, report: &ProfileReport) -> std::fmt::Result {
    writeln!(html, "<section id=\"correlations\">")?;
    writeln!(html, "<h2>Correlations</h2>")?;
    if report.correlations.is_empty() {
        writeln!(
            html,
            "<p class=\"empty\">Fewer than two numeric variables; no correlations computed</p>"
        )?;
    }
    for matrix in &report.correlations {
        render_matrix(html, matrix)?;
    }
    writeln!(html, "</section>")
}

fn render_matrix(html: &mut String, matrix: &CorrelationMatrix) -> std::fmt::Result {
    writeln!(html, "<h3>{}</h3>", capitalize(&matrix.method))?;
    writeln!(html, "<table class=\"table\">")?;
    write!(html, "<tr><th></th>")?;
    for name in &matrix.variables {
        write!(html, "<th>{}</th>", escape(name))?;
    }
    writeln!(html, "</tr>")?;
    for (i, name) in matrix.variables.iter().enumerate() {
        write!(html, "<tr><th>{}</th>", escape(name))?;
        for j in 0..matrix.variables.len() {
            match matrix.get(i, j) {
                Some(value) => write!(
                    html,
                    "<td style=\"background:{}\">{:.3}</td>",
                    heat_color(value),
                    value
                )?,
                None => write!(html, "<td></td>")?,
            }
        }
        writeln!(html, "</tr>")?;
    }
    writeln!(html, "</table>")
}

fn render_missing(html: &mut String, report: &ProfileReport) -> std::fmt::Result {
    writeln!(html, "<section id=\"missing\">")?;
    writeln!(html, "<h2>Missing values</h2>")?;
    writeln!(html, "<table class=\"stats\">")?;
    writeln!(html, "<tr><th>Variable</th><th>Count</th><th>Present</th></tr>")?;
    for v in &report.variables {
        let present = v.n - v.n_missing;
        let share = if v.n == 0 {
            0.0
        } else {
            present as f64 / v.n as f64
        };
        writeln!(
            html,
            "<tr><th>{}</th><td>{}</td><td><span class=\"freq\" style=\"width:{:.0}px\"></span> {}</td></tr>",
            escape(&v.name),
            present,
            share * 120.0,
            percent(share)
        )?;
    }
    writeln!(html, "</table>")?;
    writeln!(html, "</section>")
}

fn render_sample(html: &mut String, report: &ProfileReport) -> std::fmt::Result {
    writeln!(html, "<section id=\"sample\">")?;
    writeln!(html, "<h2>Sample</h2>")?;
    for (label, rows) in [("First rows", &report.head), ("Last rows", &report.tail)] {
        writeln!(html, "<h3>{}</h3>", label)?;
        writeln!(html, "<table class=\"table\">")?;
        write!(html, "<tr>")?;
        for column in &report.columns {
            write!(html, "<th>{}</th>", escape(column))?;
        }
        writeln!(html, "</tr>")?;
        for row in rows.iter() {
            write!(html, "<tr>")?;
            for cell in row {
                write!(html, "<td>{}</td>", escape(cell))?;
            }
            writeln!(html, "</tr>")?;
        }
        writeln!(html, "</table>")?;
    }
    writeln!(html, "</section>")
}

fn stat_row(html: &mut String, label: &str, value: &str) -> std::fmt::Result {
    writeln!(html, "<tr><th>{}</th><td>{}</td></tr>", label, escape(value))
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else if value.abs() >= 1e6 || value.abs() < 1e-4 {
        format!("{:.6e}", value)
    } else {
        let s = format!("{:.6}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn human_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Blue for positive, red for negative, intensity by magnitude
fn heat_color(value: f64) -> String {
    let alpha = value.abs().min(1.0) * 0.8;
    if value >= 0.0 {
        format!("rgba(51,122,183,{:.2})", alpha)
    } else {
        format!("rgba(217,83,79,{:.2})", alpha)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::profiling::Profiler;
    use crate::infrastructure::tabular::CsvParser;

    fn sample_report() -> ProfileReport {
        let table = CsvParser::new()
            .parse_content("name,score\n<b>Ann</b>,1.5\nBob,2\nCid,4\n")
            .unwrap();
        Profiler::default().profile(&table, "scores.csv").unwrap()
    }

    #[test]
    fn test_render_has_sections() {
        let html = HtmlRenderer::render(&sample_report()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        for section in ["Profiling Report", "Overview", "Alerts", "Variables", "Sample"] {
            assert!(html.contains(section), "missing section {section}");
        }
        assert!(html.contains("scores.csv"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn test_user_values_are_escaped() {
        let html = HtmlRenderer::render(&sample_report()).unwrap();
        assert!(html.contains("&lt;b&gt;Ann&lt;/b&gt;"));
        assert!(!html.contains("<b>Ann</b>"));
    }

    #[test]
    fn test_write_to_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        std::fs::write(&path, "stale").unwrap();
        HtmlRenderer::write_to(&sample_report(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Profiling Report"));
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_write_to_missing_dir_is_profiling_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("report.html");
        let err = HtmlRenderer::write_to(&sample_report(), &path).unwrap_err();
        assert!(matches!(err, AppError::ProfilingError(_)));
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(number(2.0), "2");
        assert_eq!(number(2.5), "2.5");
        assert_eq!(number(f64::NAN), "NaN");
        assert_eq!(number(1.0 / 3.0), "0.333333");
        assert_eq!(percent(0.25), "25.0%");
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KiB");
        assert_eq!(escape("a&b"), "a&amp;b");
        assert_eq!(capitalize("pearson"), "Pearson");
    }
}
