//! In-memory quota stores for embedders and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::ratelimit::{AtomicStore, LocalStore, TxnOutcome, TxnUpdate};

/// A process-local store implementing both quota seams.
///
/// The atomic side is trivially serializable because all access goes
/// through one mutex; it exists to give embedders a working default and
/// the tests a stand-in for the hosted store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    local: Mutex<HashMap<String, String>>,
    atomic: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a value behind the atomic seam.
    pub fn seed_atomic(&self, key: &str, value: Value) {
        if let Ok(mut map) = self.atomic.lock() {
            map.insert(key.to_string(), value);
        }
    }

    /// Read back a value behind the atomic seam.
    pub fn atomic_value(&self, key: &str) -> Option<Value> {
        self.atomic.lock().ok()?.get(key).cloned()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.local.lock().ok()?.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        if let Ok(mut map) = self.local.lock() {
            map.insert(key.to_string(), value);
        }
    }
}

impl AtomicStore for MemoryStore {
    fn transact<'a>(
        &'a self,
        key: &'a str,
        mut update: Box<dyn FnMut(Option<Value>) -> TxnUpdate + Send + 'a>,
    ) -> BoxFuture<'a, Result<TxnOutcome>> {
        // Single-process store: holding the lock for the whole transaction
        // IS the atomicity guarantee, so the outcome is computed before the
        // future is handed back.
        let outcome = match self.atomic.lock() {
            Ok(mut map) => {
                let current = map.get(key).cloned();
                match update(current.clone()) {
                    TxnUpdate::Commit(next) => {
                        map.insert(key.to_string(), next.clone());
                        Ok(TxnOutcome {
                            committed: true,
                            value: Some(next),
                        })
                    }
                    TxnUpdate::Abort => Ok(TxnOutcome {
                        committed: false,
                        value: current,
                    }),
                }
            }
            Err(_) => Err(Error::StoreError("store mutex poisoned".into())),
        };
        Box::pin(async move { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_values_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v".into());
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn aborted_transactions_leave_state_untouched() {
        let store = MemoryStore::new();
        store.seed_atomic("k", Value::from(1));
        let outcome = store
            .transact("k", Box::new(|_| TxnUpdate::Abort))
            .await
            .unwrap();
        assert!(!outcome.committed);
        assert_eq!(store.atomic_value("k"), Some(Value::from(1)));
    }

    #[tokio::test]
    async fn committed_transactions_replace_state() {
        let store = MemoryStore::new();
        let outcome = store
            .transact("k", Box::new(|_| TxnUpdate::Commit(Value::from(2))))
            .await
            .unwrap();
        assert!(outcome.committed);
        assert_eq!(store.atomic_value("k"), Some(Value::from(2)));
    }
}
