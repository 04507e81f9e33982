//! Wall-clock abstraction for digest expiry checks
//!
//! The form digest expiry is an absolute unix timestamp, so the cache reads
//! wall-clock seconds through this trait. Tests drive it with [`MockClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync + 'static {
    /// Seconds since the UNIX epoch
    fn unix_seconds(&self) -> i64;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient cloning
impl<T: Clock> Clock for Arc<T> {
    fn unix_seconds(&self) -> i64 {
        (**self).unix_seconds()
    }
}

/// Mock clock for deterministic expiry tests
///
/// Clones share the same underlying time, so a test can keep one handle
/// and hand another to the session.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<AtomicI64>,
}

impl MockClock {
    /// Create a mock clock frozen at `unix_seconds`
    pub fn new(unix_seconds: i64) -> Self {
        Self { now: Arc::new(AtomicI64::new(unix_seconds)) }
    }

    /// Advance the mock clock by `seconds`
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Set the mock clock to an absolute timestamp
    pub fn set(&self, unix_seconds: i64) {
        self.now.store(unix_seconds, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl Clock for MockClock {
    fn unix_seconds(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
