pub mod position;
pub mod services;
pub mod snapshot;
pub mod time;

pub use position::{
    compute_projection, today_index, Phase, PeriodPosition, Projection, ProjectionInput,
    ProjectionOptions, ProjectionWarning,
};
pub use snapshot::ProjectionSnapshot;
pub use time::{Clock, FixedClock, SystemClock};
