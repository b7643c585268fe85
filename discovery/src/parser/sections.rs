//! Man-style section splitting.
//!
//! A section header is a non-indented line made of uppercase words
//! (`NAME`, `SYNOPSIS`, `REQUIRED FLAGS`, `GCLOUD WIDE FLAGS`, ...). A
//! section runs until the next non-indented, non-empty line. Text before
//! the first header lands in a preamble section with an empty header.

use regex::Regex;
use std::sync::LazyLock;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9_/-]*(?: [A-Z0-9_/-]+)*):?$").expect("static regex must compile")
});

/// One section of a help page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Uppercase header without a trailing colon; empty for the preamble.
    pub header: String,
    /// Body lines, indentation preserved.
    pub lines: Vec<String>,
}

impl Section {
    pub fn is_flags(&self) -> bool {
        (self.header == "FLAGS" || self.header.ends_with(" FLAGS")) && !self.is_wide_flags()
    }

    pub fn is_wide_flags(&self) -> bool {
        self.header.ends_with("WIDE FLAGS")
    }

    pub fn is_listing(&self) -> bool {
        self.header == "GROUPS" || self.header == "COMMANDS"
    }

    /// Body lines joined with newlines.
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

/// Returns the header name if `line` is a section header.
pub fn section_header(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    HEADER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Splits normalized help text into sections.
///
/// # Examples
///
/// ```
/// use cmdgen_discovery::parser::split_sections;
///
/// let sections = split_sections("NAME\n    gcloud run - manage\n\nFLAGS\n     --async\n");
/// let headers: Vec<&str> = sections.iter().map(|s| s.header.as_str()).collect();
/// assert_eq!(headers, vec!["NAME", "FLAGS"]);
/// ```
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        header: String::new(),
        lines: Vec::new(),
    };

    for line in text.lines() {
        if let Some(header) = section_header(line) {
            sections.push(current);
            current = Section {
                header: header.to_string(),
                lines: Vec::new(),
            };
            continue;
        }

        let ends_section = !line.is_empty()
            && !line.starts_with(char::is_whitespace)
            && !current.header.is_empty();
        if ends_section {
            sections.push(current);
            current = Section {
                header: String::new(),
                lines: Vec::new(),
            };
        }
        current.lines.push(line.to_string());
    }
    sections.push(current);

    sections
        .into_iter()
        .filter(|s| !s.header.is_empty() || s.lines.iter().any(|l| !l.trim().is_empty()))
        .collect()
}
