//! Value normalizers applied to raw region text.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::patterns::{DIGITS_4, DIGITS_5, FILLER_WORDS, UNDERSCORE_RUN, WHITESPACE_RUN};

const QUOTES: &[char] = &['"', '\'', '“', '”', '‘', '’', '«', '»'];

fn is_leading_noise(c: char) -> bool {
    c.is_whitespace() || QUOTES.contains(&c)
}

fn is_trailing_noise(c: char) -> bool {
    c.is_whitespace() || QUOTES.contains(&c) || matches!(c, '-' | ':' | ';')
}

/// Generic cleanup of a captured value.
///
/// Replaces NBSP, turns manual-fill underscore runs into a space, drops form
/// boilerplate words, collapses whitespace runs and strips wrapping quotes and
/// trailing punctuation noise. Idempotent.
pub fn clean(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let s = value.replace('\u{00a0}', " ");
    let s = UNDERSCORE_RUN.replace_all(&s, " ");
    let s = FILLER_WORDS.replace_all(&s, " ");
    let s = WHITESPACE_RUN.replace_all(&s, " ");

    s.trim_end_matches(is_trailing_noise)
        .trim_start_matches(is_leading_noise)
        .to_string()
}

/// Clean a multi-line block line by line, dropping lines left empty.
pub fn clean_block(value: &str) -> String {
    value
        .lines()
        .map(clean)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First run of 4+ digits, else the cleaned value. Used for ticket numbers.
pub fn first_digit_run(value: &str) -> String {
    match DIGITS_4.find(value) {
        Some(m) => m.as_str().to_string(),
        None => clean(value),
    }
}

/// First run of 5+ digits, else the cleaned value. Used for phone numbers.
pub fn digits_or_clean(value: &str) -> String {
    match DIGITS_5.find(value) {
        Some(m) => m.as_str().to_string(),
        None => clean(value),
    }
}

/// Strip diacritics ("Técnico" -> "Tecnico").
pub fn fold_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clean_quotes_and_noise() {
        assert_eq!(clean("\"Fulano de Tal\""), "Fulano de Tal");
        assert_eq!(clean("  Fulano -  "), "Fulano");
        assert_eq!(clean("Fulano:;"), "Fulano");
        assert_eq!(clean("'abc' -"), "abc");
    }

    #[test]
    fn test_clean_underscores_and_whitespace() {
        assert_eq!(clean("Maria____ da   Silva"), "Maria da Silva");
        assert_eq!(clean("a\u{00a0}\u{00a0}b"), "a b");
        assert_eq!(clean("_____"), "");
        assert_eq!(clean("single_underscore"), "single_underscore");
    }

    #[test]
    fn test_clean_filler_words() {
        assert_eq!(clean("Bilhete 1234"), "1234");
        assert_eq!(clean("21 99999-0000 Contato"), "21 99999-0000");
        assert_eq!(clean("Bilhetes"), "Bilhetes");
    }

    #[test]
    fn test_first_digit_run() {
        assert_eq!(first_digit_run("13456789 Bilhete____"), "13456789");
        assert_eq!(first_digit_run("Nº 123 / 98765"), "98765");
        assert_eq!(first_digit_run("sem numero__"), "sem numero");
        assert_eq!(first_digit_run(""), "");
    }

    #[test]
    fn test_digits_or_clean() {
        assert_eq!(digits_or_clean("(21) 987654321"), "987654321");
        assert_eq!(digits_or_clean("ramal 1234"), "ramal 1234");
    }

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("Técnico Ação"), "Tecnico Acao");
        assert_eq!(fold_accents("SUBSTITUÍDO"), "SUBSTITUIDO");
    }

    proptest! {
        #[test]
        fn proptest_clean_is_idempotent(s in "[a-zA-Z0-9 _\"':;\\-\u{00a0}\t\n]{0,64}") {
            let once = clean(&s);
            prop_assert_eq!(clean(&once), once.clone());
        }

        #[test]
        fn proptest_clean_idempotent_with_fillers(
            a in "[a-z_ ]{0,12}",
            b in "[a-z_ ]{0,12}",
        ) {
            let s = format!("\"{a}Bilhete__{b} Contato\"");
            let once = clean(&s);
            prop_assert_eq!(clean(&once), once.clone());
            prop_assert!(!once.contains("__"));
            prop_assert!(!once.contains("  "));
        }
    }
}
