// ID Provider Port (for deterministic testing)

use crate::domain::random_share_id;

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique entity ID
    fn generate_id(&self) -> String;

    /// Generate a short public share id
    fn generate_share_id(&self) -> String {
        random_share_id()
    }
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Deterministic ids: `{prefix}-1`, `{prefix}-2`, ...
    ///
    /// Share ids are taken from a scripted queue first (to force collisions),
    /// then derived from the counter.
    pub struct SequentialIdProvider {
        prefix: String,
        counter: AtomicU64,
        share_ids: Mutex<VecDeque<String>>,
    }

    impl SequentialIdProvider {
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
                counter: AtomicU64::new(1),
                share_ids: Mutex::new(VecDeque::new()),
            }
        }

        pub fn with_share_ids(self, ids: &[&str]) -> Self {
            *self.share_ids.lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
            self
        }
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            format!("{}-{}", self.prefix, n)
        }

        fn generate_share_id(&self) -> String {
            if let Some(id) = self.share_ids.lock().unwrap().pop_front() {
                return id;
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            format!("Shr{:05}", n % 100_000)
        }
    }
}
