use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub const ELLIPSIS: char = '…';

/// Collapse every whitespace run to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Repair common mojibake (UTF-8 read as Latin-1/Windows-1252), then NFKC
/// normalize and collapse whitespace.
///
/// A repair pass is only taken when every char maps back to a single
/// Windows-1252 byte and those bytes form valid UTF-8; otherwise the text is
/// already correct and is left alone.
pub fn fix_mojibake(s: &str) -> String {
    fn looks_broken(s: &str) -> bool {
        s.contains('Ã') || s.contains('â') || s.contains('Â')
    }

    fn normalize(s: &str) -> String {
        let out = s.nfkc().collect::<String>().replace('\u{00A0}', " ");
        collapse_whitespace(&out)
    }

    fn repair_once(s: &str) -> Option<String> {
        let (bytes, _, unmappable) = encoding_rs::WINDOWS_1252.encode(s);
        if unmappable {
            return None;
        }
        String::from_utf8(bytes.into_owned()).ok().filter(|r| r != s)
    }

    let mut cur = s.to_string();
    for _ in 0..3 {
        if !looks_broken(&cur) {
            break;
        }
        match repair_once(&cur) {
            Some(repaired) => cur = repaired,
            None => break,
        }
    }

    normalize(&cur)
}

/// Longest prefix of at most `limit` chars, cut back to the last whitespace
/// when one exists, with trailing whitespace removed.
pub fn cut_at_whitespace(s: &str, limit: usize) -> &str {
    let end = s.char_indices().nth(limit).map(|(i, _)| i).unwrap_or(s.len());
    let head = &s[..end];
    if end == s.len() {
        return head;
    }
    // A cut that lands exactly on a word boundary keeps the whole word.
    let next_is_space = s[end..].chars().next().is_some_and(char::is_whitespace);
    if next_is_space {
        return head.trim_end();
    }
    match head.rfind(char::is_whitespace) {
        Some(i) if i > 0 => head[..i].trim_end(),
        _ => head,
    }
}

/// Truncate to at most `max` chars, ellipsis included.
pub fn truncate_at_whitespace(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = cut_at_whitespace(s, max - 1).to_string();
    out.push(ELLIPSIS);
    out
}

/// Drop C0 control characters that XML 1.0 forbids (tab, LF and CR stay).
pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| {
            let code = c as u32;
            code == 0x09 || code == 0x0A || code == 0x0D || code >= 0x20
        })
        .collect()
}

/// RFC-2822 (RFC-822 compatible) rendering of an RFC-3339 or RFC-2822
/// date; anything else comes back unchanged.
pub fn format_pub_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.to_rfc2822();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt.to_rfc2822();
    }
    raw.to_string()
}
