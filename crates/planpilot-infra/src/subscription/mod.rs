//! Subscription store implementations.

mod memory;

pub use memory::InMemorySubscriptionStore;
