//! Backend reply formatting for Telegram display.

use std::sync::LazyLock;

use regex::Regex;

/// Rewrite a markdown-ish backend reply into plain text with emoji markers.
///
/// Rule order is a contract: bold spans are replaced first so the
/// field-label patterns still match plain text, then field labels, then
/// numbered-list rewriting, then blank-line collapsing, then a final trim.
pub fn format_for_telegram(text: &str) -> String {
    static BOLD: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("invalid regex"));
    static FIELD_LABELS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
        [
            (r"(Why you[^:]*:)", "💡"),
            (r"(When:)", "📅"),
            (r"(Where:)", "📍"),
            (r"(Location:)", "📍"),
            (r"(Price:)", "💰"),
            (r"(More Info:)", "🔗"),
        ]
        .into_iter()
        .map(|(pattern, marker)| (Regex::new(pattern).expect("invalid regex"), marker))
        .collect()
    });
    static LIST_ITEM: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^(\d+)\.\s+").expect("invalid regex"));
    static BLANK_RUNS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("invalid regex"));

    let text = BOLD.replace_all(text, "🎨 ${1}");

    let mut text = text.into_owned();
    for (re, marker) in FIELD_LABELS.iter() {
        text = re
            .replace_all(&text, format!("{marker} ${{1}}").as_str())
            .into_owned();
    }

    // Keycap sequence (U+FE0F U+20E3) attaches to the last digit of the
    // captured ordinal.
    let text = LIST_ITEM.replace_all(&text, "\n${1}\u{fe0f}\u{20e3} ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");

    text.trim().to_string()
}
