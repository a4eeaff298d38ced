//! Core domain types, configuration, calendar grid, and the crate error type.

pub mod calendar;
pub mod config;
pub mod error;
pub mod grid;
pub mod serialization;
pub mod types;

pub use calendar::HolidayCalendar;
pub use config::{AnomalyPolicy, DEFAULT_BATCH_SIZE, EngineConfig};
pub(crate) use error::{dimension_mismatch, invalid_model};
pub use error::{Result, SimulationError, SimulationStage};
pub use grid::{CalendarColumns, HourlyGrid};
pub use serialization::{ModelBundle, from_json, load_assets_json, to_json_pretty};
pub use types::*;
