//! Collapsible text for raw detection values. Display only: the detection
//! itself is never touched.

const ELLIPSIS: char = '…';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailText {
    full: String,
    limit: usize,
}

impl DetailText {
    pub fn new(full: impl Into<String>, limit: usize) -> Self {
        Self {
            full: full.into(),
            limit,
        }
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    /// Longer than the limit, counted in characters.
    pub fn is_truncatable(&self) -> bool {
        self.full.chars().count() > self.limit
    }

    pub fn display(&self, expanded: bool) -> String {
        if expanded || !self.is_truncatable() {
            return self.full.clone();
        }
        let mut shown: String = self.full.chars().take(self.limit).collect();
        shown.push(ELLIPSIS);
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_never_truncated() {
        let text = DetailText::new("a".repeat(200), 200);
        assert!(!text.is_truncatable());
        assert_eq!(text.display(false).len(), 200);
    }

    #[test]
    fn long_text_collapses_until_expanded() {
        let raw = "é".repeat(201);
        let text = DetailText::new(raw.clone(), 200);
        assert!(text.is_truncatable());
        let collapsed = text.display(false);
        assert_eq!(collapsed.chars().count(), 201);
        assert!(collapsed.ends_with('…'));
        assert_eq!(text.display(true), raw);
        assert_eq!(text.full(), raw);
    }
}
