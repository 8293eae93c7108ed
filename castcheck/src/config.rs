/// Settings that shape how broadcast assertions are reported.
///
/// Use the builder methods to customize, or use [`Default`] for sensible
/// defaults.
///
/// # Examples
///
/// ```rust
/// use castcheck::Config;
///
/// let config = Config::default()
///     .with_max_reported_messages(3)   // List fewer payloads in failures
///     .with_pretty_payloads(true);     // Multi-line JSON in failures
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many non-matching payloads a failure message lists before
    /// summarizing the rest as "... and N more".
    /// Default: 10
    max_reported_messages: usize,

    /// Render listed payloads as pretty-printed JSON instead of a single line.
    /// Default: false
    pretty_payloads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_reported_messages: 10,
            pretty_payloads: false,
        }
    }
}

impl Config {
    /// Set how many non-matching payloads a failure message lists.
    pub fn with_max_reported_messages(mut self, limit: usize) -> Self {
        self.max_reported_messages = limit;
        self
    }

    /// Returns how many non-matching payloads a failure message lists.
    pub fn max_reported_messages(&self) -> usize {
        self.max_reported_messages
    }

    /// Set whether listed payloads are pretty-printed.
    pub fn with_pretty_payloads(mut self, pretty: bool) -> Self {
        self.pretty_payloads = pretty;
        self
    }

    /// Returns whether listed payloads are pretty-printed.
    pub fn pretty_payloads(&self) -> bool {
        self.pretty_payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::default()
            .with_max_reported_messages(2)
            .with_pretty_payloads(true);
        assert_eq!(config.max_reported_messages(), 2);
        assert!(config.pretty_payloads());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"pretty_payloads": true}"#).unwrap();
        assert_eq!(config.max_reported_messages(), 10);
        assert!(config.pretty_payloads());
    }
}
