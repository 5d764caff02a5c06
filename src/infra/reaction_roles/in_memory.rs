// IN-MEMORY implementation of BindingStore.
//
// Bindings only need to live as long as the process: a restart forgets them,
// the same way the setup messages stop being meaningful without the command
// that created them.

use crate::core::reaction_roles::{BindingStore, RoleBinding};
use dashmap::DashMap;

/// Bindings keyed by message id, then by reaction symbol.
///
/// **DashMap:**
/// Reaction events for different messages are dispatched concurrently, so
/// the outer map needs to be safe to share without a global Mutex.
pub struct InMemoryBindingStore {
    bindings: DashMap<u64, DashMap<String, u64>>,
}

impl InMemoryBindingStore {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }
}

impl BindingStore for InMemoryBindingStore {
    fn insert(&self, binding: RoleBinding) -> Option<u64> {
        self.bindings
            .entry(binding.message_id)
            .or_default()
            .insert(binding.symbol, binding.role_id)
    }

    fn get(&self, message_id: u64, symbol: &str) -> Option<u64> {
        self.bindings
            .get(&message_id)
            .and_then(|symbols| symbols.get(symbol).map(|role| *role))
    }

    fn bindings_for(&self, message_id: u64) -> Vec<RoleBinding> {
        self.bindings
            .get(&message_id)
            .map(|symbols| {
                symbols
                    .iter()
                    .map(|entry| RoleBinding {
                        message_id,
                        symbol: entry.key().clone(),
                        role_id: *entry.value(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for InMemoryBindingStore {
    fn default() -> Self {
        Self::new()
    }
}
