//! Help-text normalization.

use regex::Regex;
use std::sync::LazyLock;

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("static regex must compile")
});
static OVERSTRIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".\x08").expect("static regex must compile"));

/// Strips terminal styling and normalizes line endings.
///
/// Removes ANSI escape sequences and man-style overstrike (`X\bX` bold,
/// `_\bX` underline), converts `\r\n`/`\r` to `\n` and trims trailing
/// whitespace from every line. Indentation is preserved because section
/// and listing detection depend on it.
pub fn normalize_help_output(raw: &str) -> String {
    let stripped = ANSI_RE.replace_all(raw, "");
    let mut cleaned = stripped.into_owned();
    while OVERSTRIKE_RE.is_match(&cleaned) {
        cleaned = OVERSTRIKE_RE.replace_all(&cleaned, "").into_owned();
    }
    cleaned
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
