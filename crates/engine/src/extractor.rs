//! Rule-based extraction of entities and sentiment from a raw message.
//!
//! Every rule is a pure function over the lowercased message and never
//! fails: no trigger phrase, no entity. Rules are independent, so several
//! may fire on one message.

use std::collections::{BTreeMap, HashSet};

use parley_core::context::{Sentiment, entity};

const DEFAULT_POSITIVE: &[&str] = &["happy", "good", "great", "excellent", "love", "like"];
const DEFAULT_NEGATIVE: &[&str] = &["sad", "bad", "terrible", "hate", "dislike"];

/// One entity extraction rule: a trigger predicate plus a value extractor.
pub trait EntityRule: Send + Sync {
    /// Entity kind written when the rule fires (e.g. "person_name").
    fn kind(&self) -> &str;

    /// Extract a value from an already lowercased message.
    fn extract(&self, lowered: &str) -> Option<String>;
}

/// `"my name is <token>"` → `person_name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonNameRule;

impl PersonNameRule {
    const TRIGGER: &'static str = "my name is";
}

impl EntityRule for PersonNameRule {
    fn kind(&self) -> &str {
        entity::PERSON_NAME
    }

    fn extract(&self, lowered: &str) -> Option<String> {
        let rest = text_after(lowered, Self::TRIGGER)?;
        rest.split_whitespace().next().map(capitalize)
    }
}

/// `"i am in <place>."` or `"i'm in <place>."` → `location`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationRule;

impl LocationRule {
    // Checked in order; the first phrase present wins.
    const TRIGGERS: [&'static str; 2] = ["i am in", "i'm in"];
}

impl EntityRule for LocationRule {
    fn kind(&self) -> &str {
        entity::LOCATION
    }

    fn extract(&self, lowered: &str) -> Option<String> {
        let rest = Self::TRIGGERS
            .iter()
            .find_map(|trigger| text_after(lowered, trigger))?;
        let place = rest.trim().split('.').next().unwrap_or_default();
        if place.is_empty() {
            return None;
        }
        Some(capitalize(place))
    }
}

/// Text following the first occurrence of `trigger`.
fn text_after<'a>(haystack: &'a str, trigger: &str) -> Option<&'a str> {
    haystack
        .find(trigger)
        .map(|idx| &haystack[idx + trigger.len()..])
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Word lists for whole-token sentiment matching.
#[derive(Debug, Clone)]
pub struct SentimentLexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl SentimentLexicon {
    pub fn new<P, N>(positive: P, negative: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            positive: positive.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            negative: negative.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    /// Classify a lowercased message. Positive words win over negative ones.
    pub fn classify(&self, lowered: &str) -> Sentiment {
        let has = |set: &HashSet<String>| lowered.split_whitespace().any(|t| set.contains(t));
        if has(&self.positive) {
            Sentiment::Positive
        } else if has(&self.negative) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE, DEFAULT_NEGATIVE)
    }
}

/// Everything extracted from one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Entity kind → value; kinds whose rule did not fire are absent
    pub entities: BTreeMap<String, String>,
    pub sentiment: Sentiment,
}

/// Ordered entity rules plus a sentiment lexicon.
pub struct Extractor {
    rules: Vec<Box<dyn EntityRule>>,
    lexicon: SentimentLexicon,
}

impl Extractor {
    /// The built-in rule set: person name, then location.
    pub fn new() -> Self {
        Self {
            rules: vec![Box::new(PersonNameRule), Box::new(LocationRule)],
            lexicon: SentimentLexicon::default(),
        }
    }

    pub fn with_lexicon(mut self, lexicon: SentimentLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Append a rule. A later rule for the same kind overrides an earlier one.
    pub fn with_rule(mut self, rule: impl EntityRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_kinds(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.kind()).collect()
    }

    pub fn extract(&self, message: &str) -> Extraction {
        let lowered = message.to_lowercase();
        let mut entities = BTreeMap::new();
        for rule in &self.rules {
            if let Some(value) = rule.extract(&lowered) {
                entities.insert(rule.kind().to_string(), value);
            }
        }
        Extraction {
            entities,
            sentiment: self.lexicon.classify(&lowered),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(msg: &str) -> Option<String> {
        Extractor::new().extract(msg).entities.get("person_name").cloned()
    }

    fn location(msg: &str) -> Option<String> {
        Extractor::new().extract(msg).entities.get("location").cloned()
    }

    #[test]
    fn person_name_any_case() {
        for msg in ["My Name is Alice", "my name is alice", "MY NAME IS ALICE", "Hi! my NAME is   Alice and more"] {
            assert_eq!(person(msg).as_deref(), Some("Alice"), "{msg}");
        }
    }

    #[test]
    fn person_name_takes_first_token_of_first_occurrence() {
        assert_eq!(person("my name is bob smith").as_deref(), Some("Bob"));
        assert_eq!(person("my name is carol, my name is dave").as_deref(), Some("Carol,"));
    }

    #[test]
    fn person_name_trigger_without_token() {
        assert_eq!(person("my name is"), None);
        assert_eq!(person("my name is    "), None);
        assert_eq!(person("hello there"), None);
    }

    #[test]
    fn location_truncates_at_period() {
        assert_eq!(location("I am in Paris. It is sunny").as_deref(), Some("Paris"));
        assert_eq!(location("I'm in new york.").as_deref(), Some("New york"));
        assert_eq!(location("i am in   Tokyo").as_deref(), Some("Tokyo"));
    }

    #[test]
    fn location_prefers_i_am_in() {
        assert_eq!(location("i'm in rome but i am in milan tomorrow").as_deref(), Some("Milan tomorrow"));
    }

    #[test]
    fn location_empty_capture_is_absent() {
        assert_eq!(location("I am in."), None);
        assert_eq!(location("I'm in"), None);
    }

    #[test]
    fn both_rules_fire_independently() {
        let extraction = Extractor::new().extract("My name is Ann and I am in Oslo.");
        assert_eq!(extraction.entities.get("person_name").map(String::as_str), Some("Ann"));
        assert_eq!(extraction.entities.get("location").map(String::as_str), Some("Oslo"));
    }

    #[test]
    fn sentiment_rules() {
        let ex = Extractor::new();
        assert_eq!(ex.extract("I love this").sentiment, Sentiment::Positive);
        assert_eq!(ex.extract("what a TERRIBLE day").sentiment, Sentiment::Negative);
        assert_eq!(ex.extract("the weather").sentiment, Sentiment::Neutral);
        assert_eq!(ex.extract("i hate that i like it").sentiment, Sentiment::Positive);
        // whole tokens only
        assert_eq!(ex.extract("goodness, badly").sentiment, Sentiment::Neutral);
        assert_eq!(ex.extract("good!").sentiment, Sentiment::Neutral);
    }

    #[test]
    fn empty_message_is_neutral_and_empty() {
        let extraction = Extractor::new().extract("");
        assert!(extraction.entities.is_empty());
        assert_eq!(extraction.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn custom_lexicon() {
        let ex = Extractor::new().with_lexicon(SentimentLexicon::new(["Stoked"], ["meh"]));
        assert_eq!(ex.extract("so stoked").sentiment, Sentiment::Positive);
        assert_eq!(ex.extract("meh").sentiment, Sentiment::Negative);
        assert_eq!(ex.extract("I love this").sentiment, Sentiment::Neutral);
    }

    #[test]
    fn custom_rule_is_appended() {
        struct Pet;
        impl EntityRule for Pet {
            fn kind(&self) -> &str {
                "pet"
            }
            fn extract(&self, lowered: &str) -> Option<String> {
                text_after(lowered, "my dog is")?.split_whitespace().next().map(capitalize)
            }
        }

        let ex = Extractor::new().with_rule(Pet);
        assert_eq!(ex.rule_kinds(), vec!["person_name", "location", "pet"]);
        let extraction = ex.extract("my dog is rex");
        assert_eq!(extraction.entities.get("pet").map(String::as_str), Some("Rex"));
    }
}
