//! The safe-string registry.
//!
//! A [`SafeStrings`] instance records which exact string values are known to
//! be safe markup for one unit of work (a request, or one step of a batch).
//! Its lifecycle is `create -> use -> export (optional) -> discard`; trust
//! state moves between units only through [`SafeStrings::export_all`] and
//! [`SafeStrings::import_all`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Misuse};
use crate::logging::RegistryLog;
use crate::{Arg, Strategy, StrategySet};

const ANONYMOUS_UNIT: &str = "anonymous";

/// One record of the registry transfer format.
///
/// Each strategy maps to `true`. Any other value is rejected on import:
/// the registry has no way to record "not safe".
///
/// ```
/// use safe_markup::SafeEntry;
///
/// let entry: SafeEntry = serde_json::from_str(
///     r#"{"value":"&lt;b&gt;","strategies":{"html":true}}"#,
/// ).unwrap();
/// assert_eq!(entry.value, "&lt;b&gt;");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeEntry {
    /// The exact string content
    pub value: String,
    /// Strategies the value is safe under
    pub strategies: BTreeMap<Strategy, bool>,
}

impl SafeEntry {
    fn new(value: String, set: StrategySet) -> Self {
        Self {
            value,
            strategies: set.iter().map(|s| (s, true)).collect(),
        }
    }

    fn marks(&self) -> Result<StrategySet, Misuse> {
        let mut set = StrategySet::empty();
        for (&strategy, &mark) in &self.strategies {
            if !mark {
                return Err(Misuse::falsy_mark(strategy));
            }
            set.insert(strategy);
        }
        Ok(set)
    }
}

#[derive(Default)]
struct Entries {
    // Insertion order, so exports are deterministic.
    order: Vec<(String, StrategySet)>,
    index: HashMap<String, usize>,
}

impl Entries {
    fn get(&self, value: &str) -> StrategySet {
        self.index
            .get(value)
            .map(|&i| self.order[i].1)
            .unwrap_or_default()
    }

    fn merge(&mut self, value: &str, set: StrategySet) -> bool {
        if let Some(&i) = self.index.get(value) {
            let before = self.order[i].1;
            self.order[i].1.union_with(set);
            return before != self.order[i].1;
        }
        self.index.insert(value.to_string(), self.order.len());
        self.order.push((value.to_string(), set));
        true
    }
}

/// Registry of string values known to be safe markup.
///
/// The registry only grows: there is no operation that unmarks a string.
/// It uses interior mutability so escaping and formatting can register
/// their output through a shared reference. It is not `Sync`; concurrent
/// units of work each own their own instance.
///
/// # Examples
///
/// ```
/// use safe_markup::{Arg, SafeStrings, Strategy};
///
/// let registry = SafeStrings::for_unit("req-42");
/// let escaped = registry.escape_html("<b>Tom & Jerry</b>");
///
/// assert_eq!(escaped, "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
/// assert!(registry.is_safe_str(&escaped, Strategy::Html));
/// assert!(!registry.is_safe_str(&escaped, Strategy::All));
/// assert!(!registry.is_safe(&Arg::from("<b>"), Strategy::Html));
/// ```
pub struct SafeStrings {
    unit_id: String,
    entries: RefCell<Entries>,
}

impl SafeStrings {
    /// Creates an empty registry for an unnamed unit of work.
    pub fn new() -> Self {
        Self::for_unit(ANONYMOUS_UNIT)
    }

    /// Creates an empty registry whose log events carry `unit_id`.
    pub fn for_unit(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            entries: RefCell::new(Entries::default()),
        }
    }

    /// Returns the unit-of-work id.
    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// Returns a logger bound to this registry's unit of work.
    pub fn log(&self) -> RegistryLog<'_> {
        RegistryLog::new(&self.unit_id)
    }

    /// Returns `true` if `value` is safe under `strategy`.
    ///
    /// `Markup` values are safe by construction and are answered without a
    /// lookup. Plain text is safe if its content is registered under
    /// `strategy` or under [`Strategy::All`].
    pub fn is_safe(&self, value: &Arg, strategy: Strategy) -> bool {
        match value {
            Arg::Markup(_) => true,
            Arg::Text(text) => self.is_safe_str(text, strategy),
        }
    }

    /// Registry-only variant of [`is_safe`](Self::is_safe) for plain strings.
    pub fn is_safe_str(&self, value: &str, strategy: Strategy) -> bool {
        self.entries.borrow().get(value).covers(strategy)
    }

    /// Returns `true` if `value` is registered under any strategy.
    pub fn contains(&self, value: &str) -> bool {
        !self.entries.borrow().get(value).is_empty()
    }

    /// Returns the strategies `value` is registered under.
    pub fn strategies(&self, value: &str) -> StrategySet {
        self.entries.borrow().get(value)
    }

    /// Number of registered strings.
    pub fn len(&self) -> usize {
        self.entries.borrow().order.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().order.is_empty()
    }

    /// Records `value` as safe under `strategy` for the rest of the unit of
    /// work.
    ///
    /// Crate-internal: only escaping primitives and proven-safe format
    /// results may call this.
    pub(crate) fn mark_safe(&self, value: &str, strategy: Strategy) {
        let added = self
            .entries
            .borrow_mut()
            .merge(value, StrategySet::from_iter([strategy]));
        if added {
            self.log().debug(format_args!(
                "marked {} bytes safe under '{}'",
                value.len(),
                strategy
            ));
        }
    }

    /// Returns every registered string with its strategies, in insertion
    /// order.
    pub fn export_all(&self) -> Vec<SafeEntry> {
        let entries = self.entries.borrow();
        let snapshot: Vec<SafeEntry> = entries
            .order
            .iter()
            .map(|(value, set)| SafeEntry::new(value.clone(), *set))
            .collect();
        self.log()
            .debug(format_args!("exported {} safe strings", snapshot.len()));
        snapshot
    }

    /// Merges a snapshot produced by [`export_all`](Self::export_all).
    ///
    /// The snapshot is validated before anything is merged: a single mark
    /// that is not `true` rejects the whole import and leaves the registry
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Misuse`] with
    /// [`MisuseKind::FalsyMark`](crate::MisuseKind::FalsyMark) if any record
    /// carries a `false` mark.
    pub fn import_all<I>(&self, snapshot: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = SafeEntry>,
    {
        let validated = snapshot
            .into_iter()
            .map(|entry| entry.marks().map(|set| (entry.value, set)))
            .collect::<Result<Vec<_>, Misuse>>()
            .inspect_err(|misuse| {
                self.log()
                    .warn(format_args!("rejected safe-string import: {}", misuse));
            })?;

        let mut entries = self.entries.borrow_mut();
        let mut added = 0usize;
        for (value, set) in &validated {
            if !set.is_empty() && entries.merge(value, *set) {
                added += 1;
            }
        }
        drop(entries);

        self.log().debug(format_args!(
            "imported {} safe strings ({} changed)",
            validated.len(),
            added
        ));
        Ok(())
    }
}

impl Default for SafeStrings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SafeStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeStrings")
            .field("unit_id", &self.unit_id)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Markup, MisuseKind};
    use std::io;
    use std::sync::{Arc, Mutex};

    fn entry(value: &str, marks: &[(Strategy, bool)]) -> SafeEntry {
        SafeEntry {
            value: value.to_string(),
            strategies: marks.iter().copied().collect(),
        }
    }

    #[test]
    fn registry_starts_empty() {
        let registry = SafeStrings::new();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.unit_id(), "anonymous");
        assert!(registry.export_all().is_empty());
    }

    #[test]
    fn markup_is_safe_without_registration() {
        let registry = SafeStrings::new();
        let arg = Arg::from(Markup::from_static("<p>"));

        assert!(registry.is_safe(&arg, Strategy::Html));
        assert!(registry.is_safe(&arg, Strategy::All));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_text_is_unsafe() {
        let registry = SafeStrings::new();

        assert!(!registry.is_safe(&Arg::from("<p>"), Strategy::Html));
        assert!(!registry.contains("<p>"));
    }

    #[test]
    fn mark_safe_is_additive() {
        let registry = SafeStrings::new();

        registry.mark_safe("x", Strategy::Html);
        registry.mark_safe("x", Strategy::All);
        registry.mark_safe("x", Strategy::Html);

        assert_eq!(registry.len(), 1);
        let set = registry.strategies("x");
        assert!(set.contains(Strategy::Html));
        assert!(set.contains(Strategy::All));
    }

    #[test]
    fn all_subsumes_html() {
        let registry = SafeStrings::new();
        registry.mark_safe("both", Strategy::All);
        registry.mark_safe("html-only", Strategy::Html);

        assert!(registry.is_safe_str("both", Strategy::Html));
        assert!(registry.is_safe_str("both", Strategy::All));
        assert!(registry.is_safe_str("html-only", Strategy::Html));
        assert!(!registry.is_safe_str("html-only", Strategy::All));
    }

    #[test]
    fn is_safe_is_a_pure_read() {
        let registry = SafeStrings::new();
        registry.mark_safe("a", Strategy::Html);

        let first = registry.is_safe_str("a", Strategy::Html);
        let second = registry.is_safe_str("a", Strategy::Html);
        let miss = registry.is_safe_str("b", Strategy::Html);

        assert_eq!(first, second);
        assert!(!miss);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn export_preserves_insertion_order() {
        let registry = SafeStrings::new();
        registry.mark_safe("z", Strategy::Html);
        registry.mark_safe("a", Strategy::All);

        let exported = registry.export_all();

        assert_eq!(
            exported,
            vec![
                entry("z", &[(Strategy::Html, true)]),
                entry("a", &[(Strategy::All, true)]),
            ]
        );
    }

    #[test]
    fn import_merges_into_existing_entries() {
        let registry = SafeStrings::new();
        registry.mark_safe("x", Strategy::Html);

        registry
            .import_all(vec![
                entry("x", &[(Strategy::All, true)]),
                entry("y", &[(Strategy::Html, true)]),
            ])
            .expect("valid snapshot");

        assert_eq!(registry.len(), 2);
        assert!(registry.is_safe_str("x", Strategy::All));
        assert!(registry.is_safe_str("y", Strategy::Html));
    }

    #[test]
    fn import_rejects_falsy_mark_atomically() {
        let registry = SafeStrings::new();

        let result = registry.import_all(vec![
            entry("good", &[(Strategy::Html, true)]),
            entry("bad", &[(Strategy::Html, false)]),
        ]);

        let err = result.unwrap_err();
        let Error::Misuse(misuse) = err;
        assert_eq!(
            misuse.kind,
            MisuseKind::FalsyMark {
                strategy: Strategy::Html
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn import_skips_entries_without_marks() {
        let registry = SafeStrings::new();

        registry
            .import_all(vec![entry("nothing", &[])])
            .expect("empty marks are not falsy");

        assert!(registry.is_empty());
    }

    #[test]
    fn debug_does_not_print_content() {
        let registry = SafeStrings::for_unit("req-9");
        registry.mark_safe("private page text", Strategy::Html);

        let output = format!("{:?}", registry);

        assert!(output.contains("req-9"));
        assert!(!output.contains("private page text"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn mark_safe_emits_debug_event_without_content() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let registry = SafeStrings::for_unit("req-log");
            registry.mark_safe("private page text", Strategy::Html);
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("DEBUG"));
        assert!(output.contains("marked 17 bytes safe under 'html'"));
        assert!(output.contains("req-log"));
        assert!(!output.contains("private page text"));
    }

    mod proptests {
        use super::*;
        use crate::test_utils::{arb_strategy, arb_text};
        use proptest::prelude::*;
        use crate::Strategy;

        proptest! {
            /// Property: exporting then importing reproduces every is_safe answer
            #[test]
            fn proptest_export_import_round_trip(
                marks in prop::collection::vec((arb_text(32), arb_strategy()), 0..16)
            ) {
                let source = SafeStrings::new();
                for (value, strategy) in &marks {
                    source.mark_safe(value, *strategy);
                }

                let target = SafeStrings::new();
                target.import_all(source.export_all()).expect("exported snapshot is valid");

                prop_assert_eq!(target.len(), source.len());
                for (value, _) in &marks {
                    for strategy in Strategy::ALL {
                        prop_assert_eq!(
                            target.is_safe_str(value, strategy),
                            source.is_safe_str(value, strategy)
                        );
                    }
                }
            }

            /// Property: marking never removes an existing mark
            #[test]
            fn proptest_marks_only_accumulate(
                value in arb_text(32),
                strategies in prop::collection::vec(arb_strategy(), 1..6)
            ) {
                let registry = SafeStrings::new();
                let mut seen = StrategySet::empty();
                for strategy in strategies {
                    registry.mark_safe(&value, strategy);
                    seen.insert(strategy);
                    prop_assert_eq!(registry.strategies(&value), seen);
                }
            }
        }
    }
}
