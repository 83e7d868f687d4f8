use uuid::Uuid;

use crate::storage::KeyValueStore;

/// Store key for the visitor identifier
pub const VISITOR_KEY: &str = "visitor_id";

/// Persisted anonymous visitor identifier, created on first use.
///
/// A failed write still returns the fresh identifier; it just will not
/// survive to the next run.
pub fn visitor_id(store: &mut dyn KeyValueStore) -> String {
    if let Some(id) = store.get(VISITOR_KEY).filter(|id| is_valid(id)) {
        return id;
    }

    let id = format!("v_{}", Uuid::new_v4().simple());
    match store.set(VISITOR_KEY, &id) {
        Ok(()) => log::info!(target: "storage", "Created visitor id {}", id),
        Err(e) => log::warn!(target: "storage", "Failed to persist visitor id: {}", e),
    }
    id
}

fn is_valid(id: &str) -> bool {
    !id.trim().is_empty() && id.len() <= 128 && !id.chars().any(|c| c.is_control() || c.is_whitespace())
}
