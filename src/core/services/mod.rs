pub mod forecast_service;
pub mod projection_service;
pub mod simulation_service;

pub use forecast_service::{DisplayRequest, ForecastService};
pub use projection_service::{ClosingDelta, ProjectionRequest, ProjectionService};
pub use simulation_service::SimulationService;

use crate::errors::EngineError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}
