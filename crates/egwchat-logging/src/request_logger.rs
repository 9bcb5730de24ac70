use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use std::fs;
use std::path::PathBuf;

use crate::{get_logs_dir, safe_truncate};

const MAX_BODY_CHARS: usize = 5000;

/// Hide all but the first characters of a `token` query parameter.
/// URLs that do not parse are returned unchanged.
pub fn mask_token(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if !parsed.query_pairs().any(|(key, _)| key == "token") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            if key == "token" {
                let prefix: String = value.chars().take(10).collect();
                (key.into_owned(), format!("{}***", prefix))
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();

    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| body.to_string())
}

fn print_truncated(text: &str) {
    if text.chars().count() > MAX_BODY_CHARS {
        println!("{}", safe_truncate(text, MAX_BODY_CHARS));
        println!("\n{}", format!("... (truncated, total {} bytes)", text.len()).bright_black());
    } else {
        println!("{}", text);
    }
}

/// Log HTTP request details for debugging (console output)
pub fn log_request(method: &str, url: &str, body: Option<&serde_json::Value>, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());

    let masked = mask_token(url);
    println!("{}: {}", "Method".bright_yellow(), method);
    println!("{}: {}", "URL".bright_yellow(), masked);
    if let Ok(parsed_url) = Url::parse(url) {
        println!("{}: {}", "Host".bright_yellow(), parsed_url.host_str().unwrap_or("unknown"));
        println!(
            "{}: {}",
            "Port".bright_yellow(),
            parsed_url
                .port_or_known_default()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }

    if let Some(body) = body {
        println!("\n{}", "Request Body:".bright_yellow());
        match serde_json::to_string_pretty(body) {
            Ok(json) => print_truncated(&json),
            Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
        }
    }

    println!("{}", "═".repeat(80).bright_cyan());
    println!();
}

/// Log HTTP response details for debugging (console output)
pub fn log_response(status: &StatusCode, headers: &HeaderMap, body: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_green());
    println!("{}", "📥 HTTP RESPONSE DEBUG".bright_green().bold());
    println!("{}", "═".repeat(80).bright_green());

    println!(
        "{}: {} {}",
        "Status".bright_yellow(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    println!("\n{}", "Headers:".bright_yellow());
    for (name, value) in headers.iter() {
        if let Ok(val_str) = value.to_str() {
            println!("  {}: {}", name.as_str().bright_white(), val_str);
        }
    }

    println!("\n{}", "Response Body:".bright_yellow());
    print_truncated(&pretty_body(body));

    println!("{}", "═".repeat(80).bright_green());
    println!();
}

/// Write a failed exchange to ~/.egwchat/logs for later inspection
pub fn log_response_to_file(
    method: &str,
    url: &str,
    status: &StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> Result<PathBuf> {
    let logs_dir = get_logs_dir()?;

    let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
    let filename = format!("resp-{}-{}.txt", timestamp, status.as_u16());
    let file_path = logs_dir.join(&filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP RESPONSE LOG\n");
    log_content.push_str("=================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", timestamp));
    log_content.push_str(&format!("Request: {} {}\n\n", method, mask_token(url)));
    log_content.push_str(&format!(
        "Status: {} {}\n\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    ));

    log_content.push_str("Headers:\n");
    for (name, value) in headers.iter() {
        if let Ok(val_str) = value.to_str() {
            log_content.push_str(&format!("  {}: {}\n", name.as_str(), val_str));
        }
    }

    log_content.push_str("\nResponse Body:\n");
    log_content.push_str(&pretty_body(body));
    log_content.push('\n');

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write response log to {}", file_path.display()))?;

    Ok(file_path)
}

/// Log one decoded server-sent event (console output)
pub fn log_stream_event(event_num: usize, event: Option<&str>, data: &str, verbose: bool) {
    if !verbose {
        return;
    }

    let data = if data.chars().count() > 200 {
        format!("{}... ({} bytes)", safe_truncate(data, 200), data.len())
    } else {
        data.to_string()
    };

    println!(
        "{}",
        format!("📦 Event #{} [{}]: {}", event_num, event.unwrap_or("message"), data).bright_black()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    fn test_mask_token_keeps_other_parameters() {
        assert_eq!(
            mask_token("http://localhost:8000/chat?message=hi&token=eyJhbGciOiJIUzI1NiJ9.payload"),
            "http://localhost:8000/chat?message=hi&token=eyJhbGciOi***"
        );
    }

    #[test]
    fn test_mask_token_leaves_plain_urls_alone() {
        assert_eq!(mask_token("http://localhost:8000/token"), "http://localhost:8000/token");
        assert_eq!(mask_token("/chat?token=abc"), "/chat?token=abc");
    }

    #[test]
    #[serial]
    fn test_response_log_file() {
        let home = tempfile::tempdir().unwrap();
        let previous = std::env::var("HOME").ok();
        std::env::set_var("HOME", home.path());

        let path = log_response_to_file(
            "GET",
            "http://localhost:8000/api/tasks?token=secret-token-value&limit=10",
            &StatusCode::BAD_GATEWAY,
            &HeaderMap::new(),
            r#"{"detail":"upstream down"}"#,
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Status: 502 Bad Gateway"));
        assert!(content.contains("token=secret-tok***"));
        assert!(!content.contains("secret-token-value"));
        assert!(content.contains("\"detail\": \"upstream down\""));

        match previous {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
    }
}
