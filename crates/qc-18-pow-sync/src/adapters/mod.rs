//! Adapters implementing the outbound ports

pub mod in_memory;

pub use in_memory::{InMemoryChain, InMemoryMiner, InMemoryNetwork, ManualClock, SystemTimeSource};
