use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::fix_mojibake;

static RE_SHORTCODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static RE_PIPE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&#(?:124|x0*7c);").unwrap());
static RE_TRAILING_IN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)in$").unwrap());

/// Clean an item title.
///
/// Shortcodes (`[...]`) are removed, `&#124;` becomes `|`, mojibake is
/// repaired and whitespace collapsed. A title left ending in the bare word
/// "in" (typically `... in [current_year]`) gets `year` appended directly,
/// without a space.
pub fn clean_title(raw: &str, year: i32) -> String {
    let without_codes = RE_SHORTCODE.replace_all(raw, " ");
    let piped = RE_PIPE_ENTITY.replace_all(&without_codes, "|");
    let mut title = fix_mojibake(&piped);
    if RE_TRAILING_IN.is_match(&title) {
        title.push_str(&format!("{year:04}"));
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shortcode_residue_gets_the_year() {
        assert_eq!(clean_title("Best Shows Coming in [current_date]", 2025), "Best Shows Coming in2025");
    }

    #[test]
    fn pipe_entity_and_whitespace() {
        assert_eq!(clean_title("  Review &#124;  The   Show [tag] ", 2025), "Review | The Show");
    }

    #[test]
    fn words_ending_in_in_are_left_alone() {
        assert_eq!(clean_title("Welcome to Berlin", 2025), "Welcome to Berlin");
        assert_eq!(clean_title("Log In", 2025), "Log In");
    }

    #[test]
    fn accented_titles_survive() {
        let once = clean_title("Le château – guide", 2025);
        assert_eq!(once, "Le château – guide");
        assert_eq!(clean_title(&once, 2025), once);
        assert_eq!(clean_title("Ã€ la une in", 2025), "À la une in2025");
    }

    #[test]
    fn cleaning_twice_changes_nothing() {
        let once = clean_title("Top Picks in [year] &#124; Guide", 2025);
        assert_eq!(clean_title(&once, 2025), once);
        let residue = clean_title("Coming in [month]", 2025);
        assert_eq!(clean_title(&residue, 2025), residue);
    }
}
