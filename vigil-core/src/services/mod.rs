//! Services coordinating between repositories and callers.

pub mod auth;
pub mod risk;
pub mod sweeper;

pub use auth::{AuthService, LoginContext};
pub use risk::RiskService;
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, Sweeper};
