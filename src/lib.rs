//! vmsim - Demand-paged virtual memory simulator
//!
//! A didactic model of an operating system's paging subsystem: virtual
//! addresses are translated to (page, offset) pairs, pages are created
//! lazily on first touch, and a fixed-capacity frame table is managed
//! with least-recently-used replacement.

#![warn(missing_docs, rust_2024_compatibility)]

pub mod error;
pub mod paging;

pub use error::{Error, Result};
pub use paging::{
    EngineEvent, EventSink, EvictionPolicy, FrameSnapshot, Lru, PageSnapshot, PagingEngine,
};
