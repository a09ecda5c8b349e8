//! Sliding-window download quotas.
//!
//! Two windows guard poster generation: a per-caller window kept in a plain
//! local store, and a cluster-wide window kept behind an atomic
//! read-modify-write store so concurrent callers cannot both slip under the
//! limit. Both windows are lists of millisecond timestamps pruned on every
//! check. Quota enforcement is a courtesy, not a security boundary: when a
//! store is unreadable or a transaction cannot be carried out, the action
//! is allowed.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::{Error, Result};

/// Plain key-value state local to one caller (the original keeps this in
/// browser local storage). Values are opaque strings owned by the limiter.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// Outcome of one invocation of a transaction update function.
pub enum TxnUpdate {
    /// Replace the stored value and commit.
    Commit(Value),
    /// Leave the stored value untouched and report not-committed.
    Abort,
}

/// Result of a finished transaction. Callers must check `committed`;
/// a transaction that ran without error may still have aborted.
#[derive(Debug, Clone)]
pub struct TxnOutcome {
    pub committed: bool,
    pub value: Option<Value>,
}

/// Atomic read-modify-write store for cluster-shared state.
///
/// The update function receives the current value (or `None`) and decides
/// to commit a replacement or abort. Backends may invoke it more than once
/// when a contended transaction retries, so it must be side-effect free.
pub trait AtomicStore: Send + Sync {
    fn transact<'a>(
        &'a self,
        key: &'a str,
        update: Box<dyn FnMut(Option<Value>) -> TxnUpdate + Send + 'a>,
    ) -> BoxFuture<'a, Result<TxnOutcome>>;
}

/// Extract and prune window timestamps from a stored value.
///
/// Both shapes that have ever been written to the shared counter are
/// accepted: a plain array of numbers, and an object whose values are
/// numbers.
fn window_timestamps(value: Option<&Value>, now_ms: u64, window_ms: u64) -> Vec<u64> {
    let mut stamps: Vec<u64> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_u64()).collect(),
        Some(Value::Object(map)) => map.values().filter_map(|v| v.as_u64()).collect(),
        _ => Vec::new(),
    };
    stamps.retain(|&ts| now_ms.saturating_sub(ts) < window_ms);
    stamps
}

/// Check and consume one slot of the per-caller window.
///
/// Returns `true` when the action is allowed (including the fail-open case
/// of an unreadable store, which allows without consuming).
pub fn check_local(
    store: &mut dyn LocalStore,
    key: &str,
    limit: u32,
    window_ms: u64,
    now_ms: u64,
) -> bool {
    let mut stamps: Vec<u64> = match store.get(key) {
        None => Vec::new(),
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(stamps) => stamps,
            Err(e) => {
                log::warn!("local quota state unreadable, allowing: {}", e);
                return true;
            }
        },
    };

    stamps.retain(|&ts| now_ms.saturating_sub(ts) < window_ms);
    if stamps.len() >= limit as usize {
        return false;
    }

    stamps.push(now_ms);
    if let Ok(raw) = serde_json::to_string(&stamps) {
        store.set(key, raw);
    }
    true
}

/// Check and consume one slot of the cluster-wide window.
///
/// Runs as a single atomic transaction: prune, reject by aborting, or
/// append and commit. Authorization is the transaction's committed flag; a
/// transport error fails open.
pub async fn check_global(
    store: &dyn AtomicStore,
    key: &str,
    limit: u32,
    window_ms: u64,
    now_ms: u64,
) -> bool {
    let update = Box::new(move |current: Option<Value>| {
        let mut stamps = window_timestamps(current.as_ref(), now_ms, window_ms);
        if stamps.len() >= limit as usize {
            return TxnUpdate::Abort;
        }
        stamps.push(now_ms);
        TxnUpdate::Commit(Value::Array(stamps.into_iter().map(Value::from).collect()))
    });

    match store.transact(key, update).await {
        Ok(outcome) => outcome.committed,
        Err(e) => {
            log::warn!("global quota transaction failed, allowing: {}", e);
            true
        }
    }
}

/// A store whose transactions always fail, for exercising fail-open paths.
#[doc(hidden)]
pub struct BrokenAtomicStore;

impl AtomicStore for BrokenAtomicStore {
    fn transact<'a>(
        &'a self,
        _key: &'a str,
        _update: Box<dyn FnMut(Option<Value>) -> TxnUpdate + Send + 'a>,
    ) -> BoxFuture<'a, Result<TxnOutcome>> {
        Box::pin(async { Err(Error::StoreError("transport unavailable".into())) })
    }
}
