use crate::db::Profile;

/// Longest short bio produced from single-paragraph text.
pub const SHORT_BIO_LIMIT: usize = 240;

impl Profile {
    pub fn short_bio(&self) -> String {
        short_bio(&self.bio)
    }
}

fn paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Byte offset just past the last sentence end among the first `limit`
/// chars. A mark only ends a sentence when whitespace or the end of the
/// text follows it, so `3.5` and `github.com` do not count.
fn last_sentence_end(text: &str, limit: usize) -> Option<usize> {
    text.char_indices()
        .take(limit)
        .filter(|&(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(at, c)| at + c.len_utf8())
        .filter(|&end| text[end..].chars().next().is_none_or(char::is_whitespace))
        .last()
}

/// Teaser shown in search results and request lists.
pub fn short_bio(bio: &str) -> String {
    let paragraphs = paragraphs(bio.trim());
    let Some(first) = paragraphs.first() else {
        return String::new();
    };
    if paragraphs.len() > 1 {
        return first.clone();
    }

    if let Some(end) = last_sentence_end(first, SHORT_BIO_LIMIT) {
        return first[..end].to_owned();
    }

    if first.chars().count() <= SHORT_BIO_LIMIT {
        first.clone()
    } else {
        let head: String = first.chars().take(SHORT_BIO_LIMIT).collect();
        format!("{}…", head.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_paragraph_of_multi_paragraph_bio() {
        let bio = "I teach Rust on weekends.\n\nAsk me about lifetimes. Or async.";
        assert_eq!(short_bio(bio), "I teach Rust on weekends.");
    }

    #[test]
    fn blank_lines_with_whitespace_separate_paragraphs() {
        let bio = "First part\r\n   \r\nSecond part";
        assert_eq!(short_bio(bio), "First part");
    }

    #[test]
    fn long_text_is_cut_at_last_sentence_within_limit() {
        let sentence = "I like building small tools. ";
        let bio = sentence.repeat(20);
        let short = short_bio(&bio);
        assert!(short.chars().count() <= SHORT_BIO_LIMIT);
        assert!(short.ends_with("tools."));
        // 8 whole sentences of 29 chars fit, the 9th would cross 240
        assert_eq!(short, sentence.repeat(8).trim_end());
    }

    #[test]
    fn short_text_without_punctuation_is_returned_whole() {
        assert_eq!(short_bio("rust and python mentor"), "rust and python mentor");
    }

    #[test]
    fn short_text_is_cut_after_its_last_sentence() {
        assert_eq!(short_bio("Hello there! I code in Rust"), "Hello there!");
    }

    #[test]
    fn decimal_points_do_not_end_sentences() {
        let bio = "I have 3.5 years of Rust experience";
        assert_eq!(short_bio(bio), bio);
        assert_eq!(short_bio("Rust 1.85 is out. I upgraded"), "Rust 1.85 is out.");
    }

    #[test]
    fn domain_names_do_not_end_sentences() {
        let bio = "Find my projects on github.com/ada and say hi";
        assert_eq!(short_bio(bio), bio);
    }

    #[test]
    fn long_text_without_punctuation_is_hard_cut() {
        let bio = "word ".repeat(100);
        let short = short_bio(&bio);
        assert!(short.ends_with('…'));
        assert!(short.chars().count() <= SHORT_BIO_LIMIT + 1);
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let bio = "é".repeat(300);
        assert_eq!(short_bio(&bio).chars().count(), SHORT_BIO_LIMIT + 1);
    }

    #[test]
    fn empty_bio_gives_empty_teaser() {
        assert_eq!(short_bio("  \n\n "), "");
    }
}
