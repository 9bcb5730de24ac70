use regex::Regex;
use std::sync::OnceLock;

/// One substitution step of the stream text renderer
struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

/// Ordered rule list; each rule only ever sees the output of the ones before it
fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"\*\*(.*?)\*\*", "<strong>${1}</strong>"),
            (r"\*(.*?)\*", "<em>${1}</em>"),
            (r"`(.*?)`", "<code>${1}</code>"),
            (r"(?m)^(\d+)\.[ \t]+(.*)$", "<br>${1}. ${2}"),
            (r"(?m)^[-*][ \t]+(.*)$", "<br>• ${1}"),
            (r"\n", "<br>"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).expect("markup rule patterns are valid"),
            replacement,
        })
        .collect()
    })
}

/// Escape HTML to prevent XSS
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render assistant text as HTML.
///
/// The text is escaped before any rule runs, so markup coming from the stream is always
/// shown literally.
pub fn render_markup(text: &str) -> String {
    let mut html = escape_html(text);
    for rule in rules() {
        html = rule.pattern.replace_all(&html, rule.replacement).into_owned();
    }
    html
}

/// Escaped text with line breaks kept, for user messages and inline errors
pub fn render_plain(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}
