pub mod health;
pub mod loyalty;

pub use health::{AppStartTime, HealthService, health_routes};
pub use loyalty::routes::loyalty_v1_routes;
