//! Configuration for the memory driver.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Configuration for [`MemoryDriver`](super::MemoryDriver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDriverConfig {
    /// Amount the main key counter advances when a transaction begins.
    ///
    /// Keys allocated inside a transaction come from the range skipped here,
    /// so they cannot collide with keys the main store or a sibling
    /// transaction allocates before the commit. A transaction that creates
    /// more rows than this can still collide. Zero is rejected.
    #[serde(default = "default_id_stride")]
    pub id_stride: NonZeroU32,

    /// Whether `begin` is supported.
    #[serde(default = "default_true")]
    pub transactions: bool,
}

fn default_id_stride() -> NonZeroU32 {
    NonZeroU32::MIN.saturating_add(999)
}

fn default_true() -> bool {
    true
}

impl Default for MemoryDriverConfig {
    fn default() -> Self {
        Self {
            id_stride: default_id_stride(),
            transactions: true,
        }
    }
}

impl MemoryDriverConfig {
    /// Sets the key stride. A zero stride is raised to 1.
    pub fn with_id_stride(mut self, stride: u32) -> Self {
        self.id_stride = NonZeroU32::new(stride).unwrap_or(NonZeroU32::MIN);
        self
    }

    /// Returns the stride as a key offset.
    pub(crate) fn key_stride(&self) -> i64 {
        i64::from(self.id_stride.get())
    }

    /// Disables transaction support.
    pub fn without_transactions(mut self) -> Self {
        self.transactions = false;
        self
    }
}
