use std::time::Duration;

/// Runtime knobs for the ledger service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on each storage call. `None` waits as long as storage needs.
    pub operation_timeout: Option<Duration>,
}

impl LedgerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Build from a millisecond count where zero means "no timeout".
    pub fn from_timeout_ms(ms: u64) -> Self {
        match ms {
            0 => Self::default(),
            ms => Self::default().with_timeout(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ms_disables_timeout() {
        assert_eq!(LedgerConfig::from_timeout_ms(0).operation_timeout, None);
        assert_eq!(
            LedgerConfig::from_timeout_ms(250).operation_timeout,
            Some(Duration::from_millis(250))
        );
    }
}
