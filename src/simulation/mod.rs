//! What-if overlays resolved against the base forecast items.

pub mod engine;
pub mod types;

pub use engine::resolve;
pub use types::{ForecastItemPatch, Scenario, ScenarioDelta};
