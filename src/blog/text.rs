use once_cell::sync::Lazy;
use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Reading time at 200 words per minute, rounded up. Monotonic in word
/// count; 400 words come out as 2 minutes.
pub fn reading_time_minutes(text: &str) -> u32 {
    word_count(text).div_ceil(WORDS_PER_MINUTE) as u32
}

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Plain-text excerpt cut at a word boundary.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= max_chars {
        return trimmed.to_string();
    }

    let mut cut = String::with_capacity(max_chars);
    for word in trimmed.split_whitespace() {
        if cut.len() + word.len() + 1 > max_chars.saturating_sub(1) {
            break;
        }
        if !cut.is_empty() {
            cut.push(' ');
        }
        cut.push_str(word);
    }
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test_case(0, 0)]
    #[test_case(1, 1)]
    #[test_case(199, 1)]
    #[test_case(200, 1)]
    #[test_case(201, 2)]
    #[test_case(400, 2)]
    #[test_case(401, 3)]
    fn reading_time_rounds_up(word_total: usize, expected_minutes: u32) {
        assert_eq!(reading_time_minutes(&words(word_total)), expected_minutes);
    }

    #[test]
    fn reading_time_is_monotonic() {
        let mut previous = 0;
        for n in (0..=1000).step_by(50) {
            let minutes = reading_time_minutes(&words(n));
            assert!(minutes >= previous, "regressed at {n} words");
            previous = minutes;
        }
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(
            slugify("Why BNB Chain? A Founder's Guide!"),
            "why-bnb-chain-a-founder-s-guide"
        );
        assert_eq!(slugify("  --already-clean--  "), "already-clean");
    }

    #[test]
    fn excerpt_cuts_at_word_boundary() {
        let text = "The quick brown fox jumps over the lazy dog";
        let cut = excerpt(text, 20);
        assert!(cut.chars().count() <= 21);
        assert!(cut.ends_with('…'));
        assert!(!cut.contains("jumps"));
    }

    #[test]
    fn short_text_passes_through() {
        assert_eq!(excerpt("short", 20), "short");
    }
}
