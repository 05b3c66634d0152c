use serde::{Deserialize, Serialize};

/// engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// how many times a transiently conflicting transaction is retried
    /// before the conflict surfaces to the caller
    pub conflict_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            conflict_retries: 3,
        }
    }
}
