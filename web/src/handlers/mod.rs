//! Handlers shared by every deployment of the service.

pub mod health;

pub use health::{ComponentStatus, HealthResponse, ReadinessResponse, health_check, readiness};
