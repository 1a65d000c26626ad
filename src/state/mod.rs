//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the per-page state machine driven by the coordinator

mod phase;

pub use phase::CrawlPhase;
