// Implementations for the reaction-role registry.

pub mod in_memory;

pub use in_memory::InMemoryBindingStore;
