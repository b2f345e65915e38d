use std::fmt;

/// Structured logger bound to one registry's unit of work.
///
/// `RegistryLog` is obtained from [`SafeStrings::log`](crate::SafeStrings::log)
/// and borrows the registry, so it cannot outlive it. Every event it emits
/// carries the `unit` field, which lets log readers tell apart concurrent
/// requests or batch steps that each own a registry.
///
/// Registry content is never logged, only lengths and counts: the strings
/// being tracked are page output and may include user data.
#[derive(Debug, Clone, Copy)]
pub struct RegistryLog<'a> {
    unit_id: &'a str,
}

impl<'a> RegistryLog<'a> {
    pub(crate) fn new(unit_id: &'a str) -> Self {
        Self { unit_id }
    }

    /// Returns the unit-of-work id attached to every event.
    pub fn unit_id(&self) -> &str {
        self.unit_id
    }

    /// Logs a warning-level message with the unit id.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "safe_markup", unit = %self.unit_id, "{}", args);
    }

    /// Logs a debug-level message with the unit id.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "safe_markup", unit = %self.unit_id, "{}", args);
    }
}
