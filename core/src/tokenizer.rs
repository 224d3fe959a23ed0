use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // `\w` is Unicode-aware: letters, marks, digits and connector punctuation.
    static ref WORD: Regex = Regex::new(r"\w+").expect("valid regex");
}

/// Lower-case `text` and split it into maximal runs of word characters, in
/// order of appearance. Everything else is a separator. Shared by the build
/// and query paths, so both see identical tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        assert_eq!(tokenize("Go Concurrency, Rob!"), vec!["go", "concurrency", "rob"]);
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(tokenize("snake_case v2.0"), vec!["snake_case", "v2", "0"]);
    }

    #[test]
    fn empty_and_separator_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  --- !!! ").is_empty());
    }
}
