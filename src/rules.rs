// File: ./src/rules.rs
//! Ordered keyword tables used by the heuristic classifiers.
//!
//! Each classifier owns a static [`RuleTable`]: an ordered list of keyword
//! groups mapped to a label. Changing a classification means editing a
//! table, never the control flow that consults it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Keyword may appear anywhere in the text.
    Substring,
    /// Keyword must equal a word of the text, or (for keywords of four or
    /// more characters) be a prefix of one. Keeps "pe" from matching "paper".
    Word,
}

#[derive(Debug)]
pub struct KeywordRule<T: 'static> {
    pub keywords: &'static [&'static str],
    pub value: T,
}

#[derive(Debug)]
pub struct RuleTable<T: 'static> {
    mode: MatchMode,
    rules: &'static [KeywordRule<T>],
}

impl<T> RuleTable<T> {
    pub const fn new(mode: MatchMode, rules: &'static [KeywordRule<T>]) -> Self {
        Self { mode, rules }
    }

    pub fn rules(&self) -> &'static [KeywordRule<T>] {
        self.rules
    }

    /// Value of the first rule with a matching keyword.
    pub fn first_match(&self, text: &str) -> Option<&'static T> {
        let text = Prepared::new(text);
        self.rules
            .iter()
            .find(|r| text.matches_any(self.mode, r.keywords))
            .map(|r| &r.value)
    }

    /// Values of every matching rule, in table order, each at most once.
    pub fn all_matches(&self, text: &str) -> Vec<&'static T> {
        let text = Prepared::new(text);
        self.rules
            .iter()
            .filter(|r| text.matches_any(self.mode, r.keywords))
            .map(|r| &r.value)
            .collect()
    }
}

struct Prepared {
    lowered: String,
    words: Vec<String>,
}

impl Prepared {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self { lowered, words }
    }

    fn matches_any(&self, mode: MatchMode, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.matches(mode, kw))
    }

    fn matches(&self, mode: MatchMode, keyword: &str) -> bool {
        match mode {
            MatchMode::Substring => self.lowered.contains(keyword),
            // Phrases fall back to substring search.
            MatchMode::Word if keyword.contains(' ') => self.lowered.contains(keyword),
            MatchMode::Word => self.words.iter().any(|w| {
                w == keyword || (keyword.chars().count() >= 4 && w.starts_with(keyword))
            }),
        }
    }
}
