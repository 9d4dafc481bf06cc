use unicode_segmentation::UnicodeSegmentation;

/// Lowercased title and short-form abbreviations that end in a period
/// without ending the sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "jr", "sr", "prof", "mme", "mlle", "vs", "etc", "e.g", "i.e",
    "дж", "проф", "св", "г", "гг", "им", "т.е", "т.к", "т.д", "т.п", "др", "пр", "см", "ул",
];

/// Split text on Unicode (UAX #29) sentence boundaries.
///
/// Every piece is trimmed and whitespace-only pieces are dropped, so joining
/// the result with single spaces gives back all non-whitespace content in order.
/// A piece ending in an abbreviation or an initial (`Mr.`, `Дж.`, `К.`) is
/// glued to the piece after it.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut pending = String::new();
    for piece in text.split_sentence_bounds().map(str::trim).filter(|s| !s.is_empty()) {
        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(piece);
        if !ends_with_abbreviation(piece) {
            sentences.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        sentences.push(pending);
    }
    sentences
}

fn ends_with_abbreviation(piece: &str) -> bool {
    let Some(body) = piece.strip_suffix('.') else { return false };
    let word = body
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or(body)
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(initial), None) => initial.is_uppercase(),
        _ => ABBREVIATIONS.contains(&word.to_lowercase().as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminal_punctuation() {
        let s = split_sentences("The owl arrived. Was it late? No!");
        assert_eq!(s, vec!["The owl arrived.", "Was it late?", "No!"]);
    }

    #[test]
    fn newlines_end_sentences() {
        let s = split_sentences("First line without stop\nSecond line.");
        assert_eq!(s, vec!["First line without stop", "Second line."]);
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(split_sentences("  \n\t ").is_empty());
    }

    #[test]
    fn cyrillic_sentences() {
        let s = split_sentences("Гарри открыл дверь. Там никого не было.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[1], "Там никого не было.");
    }

    #[test]
    fn titles_do_not_end_sentences() {
        let s = split_sentences("Mr. Dursley was proud. Mrs. Dursley was thin.");
        assert_eq!(s, vec!["Mr. Dursley was proud.", "Mrs. Dursley was thin."]);
    }

    #[test]
    fn initials_do_not_end_sentences() {
        let s = split_sentences("Профессор Дж. К. Роулинг написала книгу. Её читают все.");
        assert_eq!(s, vec!["Профессор Дж. К. Роулинг написала книгу.", "Её читают все."]);
    }

    #[test]
    fn trailing_abbreviation_is_kept() {
        assert_eq!(split_sentences("Signed, Dr."), vec!["Signed, Dr."]);
    }

    #[test]
    fn ordinary_short_words_still_end_sentences() {
        let s = split_sentences("He saw Ron. Then he left.");
        assert_eq!(s, vec!["He saw Ron.", "Then he left."]);
    }
}
