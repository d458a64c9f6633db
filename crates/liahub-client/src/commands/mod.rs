//! Async command functions (thunks): each marks the target slice loading,
//! calls the gateway, applies the reducer, and flattens any failure into a
//! readable string for both the slice and the caller.

pub mod connections;
pub mod dashboard;
pub mod jobs;
pub mod lias;
pub mod messaging;
pub mod notifications;
pub mod profile;
pub mod users;

use serde_json::Value;

/// Pull the document list out of a payload that may be a bare array or an
/// envelope keyed by any of `keys`.
pub(crate) fn doc_list(payload: &Value, keys: &[&str]) -> Vec<Value> {
    if let Some(array) = payload.as_array() {
        return array.clone();
    }
    for key in keys {
        if let Some(array) = payload.get(key).and_then(Value::as_array) {
            return array.clone();
        }
    }
    Vec::new()
}
