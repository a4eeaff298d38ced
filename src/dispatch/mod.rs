//! Daily unit-commitment search for gas-fired plants.
//!
//! Each day is an independent 24-hour window. The plant either runs one contiguous block
//! of at least `min_run_hours` or stays off; it runs only when the best block's summed
//! spark spread is positive. See [`block`] for the search and [`schedule`] for the
//! per-path aggregation.

pub mod block;
pub mod schedule;

pub use block::{DispatchBlock, best_block, candidate_blocks};
pub use schedule::{DailyDispatch, DispatchResult, dispatch, dispatch_days, hourly_margins};
