use std::fmt::Write;

pub trait PrettyNumbered {
    /// Renders the items as a one-per-line list, numbered from `1`.
    ///
    /// At most `limit` items are listed; the rest are summarised as
    /// `… and N more`.
    fn pretty_numbered(&self, limit: usize) -> String;
}

impl<S: AsRef<str>> PrettyNumbered for [S] {
    fn pretty_numbered(&self, limit: usize) -> String {
        let mut out = String::new();
        for (i, item) in self.iter().take(limit).enumerate() {
            if i != 0 {
                out.push('\n');
            }
            let _ = write!(out, "`#{}` {}", i + 1, item.as_ref());
        }

        let rest = self.len().saturating_sub(limit);
        if rest != 0 {
            if !out.is_empty() {
                out.push('\n');
            }
            let _ = write!(out, "… and {rest} more");
        }
        out
    }
}
