//! Tolerant recovery of object literals embedded in free-form text.

pub mod block;
pub mod normalize;

pub use block::{extract_block, extract_delimited};
pub use normalize::normalize;
