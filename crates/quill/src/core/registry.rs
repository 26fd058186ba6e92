//! Holder of the active driver.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{DriverError, StorageResult};

use super::driver::Driver;

/// Holds the active driver and hands out shared references to it.
///
/// The lock only covers the pointer: [`DriverRegistry::current`] clones the
/// `Arc` and releases the read lock before any driver call, so
/// [`DriverRegistry::configure`] waits for pointer reads but never for
/// in-flight driver work.
#[derive(Debug, Default)]
pub struct DriverRegistry {
    active: RwLock<Option<Arc<dyn Driver>>>,
}

impl DriverRegistry {
    /// Creates a registry with `driver` installed.
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            active: RwLock::new(Some(driver)),
        }
    }

    /// Creates a registry with no driver.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Installs or replaces the active driver.
    pub fn configure(&self, driver: Arc<dyn Driver>) {
        let mut active = self.active.write();
        match active.as_ref() {
            Some(previous) => debug!(
                previous = previous.name(),
                driver = driver.name(),
                "Replacing active driver"
            ),
            None => debug!(driver = driver.name(), "Configuring driver"),
        }
        *active = Some(driver);
    }

    /// Returns the active driver.
    pub fn current(&self) -> StorageResult<Arc<dyn Driver>> {
        self.active
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| DriverError::NotConfigured.into())
    }

    /// Returns true if a driver is installed.
    pub fn is_configured(&self) -> bool {
        self.active.read().is_some()
    }
}
