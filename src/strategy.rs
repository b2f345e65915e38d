use std::fmt;

use serde::{Deserialize, Serialize};

/// An escaping strategy a string can be marked safe under.
///
/// `All` subsumes every other strategy: a value marked safe under `All` is
/// safe under `Html` as well, but not the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Safe for insertion into HTML body text
    #[default]
    Html,
    /// Safe under any escaping context
    All,
}

impl Strategy {
    /// Every strategy, in serialization order.
    pub const ALL: [Strategy; 2] = [Strategy::Html, Strategy::All];

    /// The lowercase name used in the transfer format.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Html => "html",
            Strategy::All => "all",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Strategy::Html => 0b01,
            Strategy::All => 0b10,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of strategies one registry entry is marked under.
///
/// Marks only accumulate; there is no `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategySet {
    bits: u8,
}

impl StrategySet {
    /// An empty set.
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Adds a strategy. Returns `true` if it was not already present.
    pub fn insert(&mut self, strategy: Strategy) -> bool {
        let added = !self.contains(strategy);
        self.bits |= strategy.bit();
        added
    }

    /// Returns `true` if the strategy was marked explicitly.
    pub fn contains(&self, strategy: Strategy) -> bool {
        self.bits & strategy.bit() != 0
    }

    /// Returns `true` if a value with this set is safe under `strategy`,
    /// either directly or through `All`.
    pub fn covers(&self, strategy: Strategy) -> bool {
        self.contains(strategy) || self.contains(Strategy::All)
    }

    /// Merges another set into this one.
    pub fn union_with(&mut self, other: StrategySet) {
        self.bits |= other.bits;
    }

    /// Returns `true` if no strategy is marked.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterates over the marked strategies in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = Strategy> + '_ {
        Strategy::ALL.into_iter().filter(|s| self.contains(*s))
    }
}

impl FromIterator<Strategy> for StrategySet {
    fn from_iter<I: IntoIterator<Item = Strategy>>(iter: I) -> Self {
        let mut set = StrategySet::empty();
        for strategy in iter {
            set.insert(strategy);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_html() {
        assert_eq!(Strategy::default(), Strategy::Html);
    }

    #[test]
    fn all_covers_html() {
        let set: StrategySet = [Strategy::All].into_iter().collect();

        assert!(set.covers(Strategy::Html));
        assert!(set.covers(Strategy::All));
        assert!(!set.contains(Strategy::Html));
    }

    #[test]
    fn html_does_not_cover_all() {
        let set: StrategySet = [Strategy::Html].into_iter().collect();

        assert!(set.covers(Strategy::Html));
        assert!(!set.covers(Strategy::All));
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set = StrategySet::empty();

        assert!(set.is_empty());
        assert!(set.insert(Strategy::Html));
        assert!(!set.insert(Strategy::Html));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Strategy::Html]);
    }

    #[test]
    fn strategy_serializes_lowercase() {
        let json = serde_json::to_string(&Strategy::All).expect("serializes");
        assert_eq!(json, "\"all\"");

        let parsed: Strategy = serde_json::from_str("\"html\"").expect("parses");
        assert_eq!(parsed, Strategy::Html);

        assert!(serde_json::from_str::<Strategy>("\"css\"").is_err());
    }
}
