use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;

const TRAIL: &str = "…";

pub trait PrettyTruncator {
    /// Shortens `self` to at most `max` grapheme clusters, marking the cut with a
    /// trailing ellipsis that counts towards `max`.
    fn pretty_truncate(&self, max: usize) -> Cow<'_, str>;
}

impl PrettyTruncator for str {
    fn pretty_truncate(&self, max: usize) -> Cow<'_, str> {
        let mut graphemes = self.grapheme_indices(true);
        let Some((cut, _)) = graphemes.nth(max.saturating_sub(1)) else {
            return Cow::Borrowed(self);
        };
        if graphemes.next().is_none() {
            return Cow::Borrowed(self);
        }

        let mut owned = String::with_capacity(cut + TRAIL.len());
        owned.push_str(&self[..cut]);
        owned.push_str(TRAIL);
        Cow::Owned(owned)
    }
}

#[cfg(test)]
mod test {
    use std::borrow::Cow;

    use rstest::rstest;

    use super::PrettyTruncator;

    #[rstest]
    #[case("", "")]
    #[case("a", "a")]
    #[case("abc", "abc")]
    #[case("abcd", "ab…")]
    #[case("🇯🇵🇬🇧🇺🇸🇹🇭", "🇯🇵🇬🇧…")]
    #[case("e\u{301}e\u{301}e\u{301}e\u{301}", "e\u{301}e\u{301}…")]
    fn truncates_to_three_graphemes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(input.pretty_truncate(3), expected);
    }

    #[rstest]
    #[case("https://youtu.be/dQw4w9WgXcQ", 64)]
    #[case("short", 5)]
    fn borrows_when_within_limit(#[case] input: &str, #[case] max: usize) {
        assert!(matches!(input.pretty_truncate(max), Cow::Borrowed(_)));
    }

    #[test]
    fn zero_limit_keeps_only_the_trail() {
        assert_eq!("abc".pretty_truncate(0), "…");
    }
}
