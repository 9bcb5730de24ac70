use chrono::{Local, NaiveDate};
use egwchat_types::ResultEnvelope;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::markup::escape_html;

pub const NO_INSIGHTS: &str = "No insights available.";

/// Fallback prompt when the insight box has no usable first line
pub const DEFAULT_INSIGHT_PROMPT: &str = "Help me with the above";

fn list_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"^\d+\.|^\*|^-\s").expect("list marker pattern is valid"))
}

fn line_breaks() -> &'static Regex {
    static BREAKS: OnceLock<Regex> = OnceLock::new();
    BREAKS.get_or_init(|| Regex::new(r"\n+").expect("line break pattern is valid"))
}

/// Inclusive date range sent to the events endpoint, formatted `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn single_day(date: NaiveDate) -> Self {
        let day = date.format("%Y-%m-%d").to_string();
        Self {
            start: day.clone(),
            end: day,
        }
    }

    pub fn today() -> Self {
        Self::single_day(Local::now().date_naive())
    }
}

/// What the dashboard widgets currently show; `None` leaves a widget untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub events_today: Option<usize>,
    pub open_tasks: Option<usize>,
    pub insight: Option<String>,
}

/// Number of items in a `{ result: [...] }` response; anything else counts as zero
pub fn result_count(envelope: &ResultEnvelope) -> usize {
    match &envelope.result {
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

/// Insight text from `{ result: { summary } }`
pub fn insight_summary(envelope: &ResultEnvelope) -> String {
    envelope
        .result
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_INSIGHTS)
        .to_string()
}

/// Layout chosen for an insight text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightBody {
    /// Single line, shown as is
    Paragraph(String),
    /// Several lines of which some look like list items; only those are kept
    List(Vec<String>),
    Paragraphs(Vec<String>),
}

pub fn parse_insight(text: &str) -> InsightBody {
    let text = if text.is_empty() { NO_INSIGHTS } else { text };

    let lines: Vec<&str> = line_breaks()
        .split(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() <= 1 {
        return InsightBody::Paragraph(text.to_string());
    }

    let items: Vec<String> = lines
        .iter()
        .filter(|line| list_marker().is_match(line))
        .map(|line| list_marker().replace(line, "").trim().to_string())
        .collect();

    if items.is_empty() {
        InsightBody::Paragraphs(lines.into_iter().map(str::to_string).collect())
    } else {
        InsightBody::List(items)
    }
}

/// Escaped HTML for the insight box
pub fn render_insight_html(text: &str) -> String {
    match parse_insight(text) {
        InsightBody::Paragraph(line) => format!("<p>{}</p>", escape_html(&line)),
        InsightBody::List(items) => {
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", escape_html(item)))
                .collect();
            format!("<div><ul>{}</ul></div>", items)
        }
        InsightBody::Paragraphs(lines) => {
            let paragraphs: String = lines
                .iter()
                .map(|line| format!("<p>{}</p>", escape_html(line)))
                .collect();
            format!("<div>{}</div>", paragraphs)
        }
    }
}

/// Chat input prefill for the "use insight" action
pub fn insight_prompt(box_text: &str) -> String {
    box_text
        .trim()
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or(DEFAULT_INSIGHT_PROMPT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn envelope(result: Value) -> ResultEnvelope {
        ResultEnvelope {
            result,
            detail: None,
        }
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::single_day(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
        assert_eq!(range.start, "2026-03-07");
        assert_eq!(range.end, "2026-03-07");
    }

    #[test]
    fn test_result_count() {
        assert_eq!(result_count(&envelope(json!([1, 2, 3]))), 3);
        assert_eq!(result_count(&envelope(json!({"message": "none"}))), 0);
        assert_eq!(result_count(&envelope(Value::Null)), 0);
    }

    #[test]
    fn test_insight_summary() {
        assert_eq!(
            insight_summary(&envelope(json!({"summary": "Busy day"}))),
            "Busy day"
        );
        assert_eq!(insight_summary(&envelope(json!({}))), NO_INSIGHTS);
        assert_eq!(insight_summary(&envelope(json!("text"))), NO_INSIGHTS);
    }

    #[test]
    fn test_single_line_insight() {
        assert_eq!(
            render_insight_html("Nothing <urgent>"),
            "<p>Nothing &lt;urgent&gt;</p>"
        );
        assert_eq!(render_insight_html(""), format!("<p>{}</p>", NO_INSIGHTS));
    }

    #[test]
    fn test_list_insight_keeps_only_items() {
        let text = "Today:\n\n1. Call Anna\n- Review budget\n* Book room";
        assert_eq!(
            parse_insight(text),
            InsightBody::List(vec![
                "Call Anna".to_string(),
                "Review budget".to_string(),
                "Book room".to_string(),
            ])
        );
        assert_eq!(
            render_insight_html("1. a & b\n2. c"),
            "<div><ul><li>a &amp; b</li><li>c</li></ul></div>"
        );
    }

    #[test]
    fn test_paragraph_insight() {
        assert_eq!(
            render_insight_html("First line\nSecond line"),
            "<div><p>First line</p><p>Second line</p></div>"
        );
    }

    #[test]
    fn test_insight_prompt() {
        assert_eq!(insight_prompt("  Call Anna\nReview budget"), "Call Anna");
        assert_eq!(insight_prompt("   "), DEFAULT_INSIGHT_PROMPT);
    }
}
