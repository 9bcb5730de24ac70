use anyhow::Result;
use colored::Colorize;
use egwchat_core::dashboard::{parse_insight, NO_INSIGHTS};
use egwchat_core::{require_token, DashboardSnapshot, DateRange, InsightBody};

use crate::app::setup::AppConfig;

/// Terminal lines for an insight text
pub fn insight_lines(text: &str) -> Vec<String> {
    match parse_insight(text) {
        InsightBody::Paragraph(text) => vec![text],
        InsightBody::List(items) => items.into_iter().map(|item| format!("• {}", item)).collect(),
        InsightBody::Paragraphs(lines) => lines,
    }
}

/// Visible text of the insight box, one line per item
pub fn insight_text(text: &str) -> String {
    match parse_insight(text) {
        InsightBody::Paragraph(text) => text,
        InsightBody::List(lines) | InsightBody::Paragraphs(lines) => lines.join("\n"),
    }
}

pub fn print_dashboard(snapshot: &DashboardSnapshot) {
    let count = |value: Option<usize>| {
        value
            .map(|n| n.to_string())
            .unwrap_or_else(|| "–".to_string())
    };

    println!("{}", "📅 Today".bright_cyan().bold());
    println!("  {} {}", "Events:".bright_yellow(), count(snapshot.events_today));
    println!("  {} {}", "Open tasks:".bright_yellow(), count(snapshot.open_tasks));

    println!("{}", "💡 AI insights".bright_cyan().bold());
    let insight = snapshot.insight.as_deref().unwrap_or(NO_INSIGHTS);
    for line in insight_lines(insight) {
        println!("  {}", line);
    }
    println!();
}

/// Fetch and print today's dashboard
pub async fn show_dashboard(config: &AppConfig) -> Result<DashboardSnapshot> {
    let token = require_token(&config.store)?;
    let snapshot = config
        .client
        .load_dashboard(&token, &DateRange::today())
        .await;
    print_dashboard(&snapshot);
    Ok(snapshot)
}
