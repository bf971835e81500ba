//! Profile store implementations for SeriesAI.

pub mod in_memory;

pub use in_memory::InMemoryProfileStore;
