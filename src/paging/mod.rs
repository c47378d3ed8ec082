//! Paging engine: translation, residency tracking, and LRU replacement

mod engine;
mod event;
mod frame;
mod lru;
mod page;
mod snapshot;
mod translate;

pub use engine::PagingEngine;
pub use event::{EngineEvent, EventSink};
pub use frame::FrameTable;
pub use lru::{Candidate, EvictionPolicy, Lru};
pub use page::Page;
pub use snapshot::{FrameSnapshot, PageSnapshot};
pub use translate::translate;

/// Identifier of a virtual page.
pub type PageNumber = u64;

/// Index of a physical frame slot.
pub type FrameId = usize;
