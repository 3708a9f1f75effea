//! The configuration capability handed to connectors.

/// Key-value configuration access.
///
/// Connectors receive an implementation at construction time instead of
/// reaching for process-wide state, so tests can hand them an isolated store.
pub trait ConfigProvider: Send + Sync {
    /// Returns the resolved value for `key`, if any layer defines it.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Registers the value `key` resolves to when nothing overrides it.
    fn set_default(&self, key: &str, value: &str);

    /// Returns the resolved value for `key`, or `fallback` when unset.
    fn get_string_or(&self, key: &str, fallback: &str) -> String {
        self.get_string(key).unwrap_or_else(|| fallback.to_string())
    }
}
