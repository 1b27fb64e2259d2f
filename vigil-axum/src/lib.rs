//! Axum integration for the vigil credential and risk engine
//!
//! Provides a ready-to-use router exposing the auth, risk, and admin
//! endpoints, plus the correlation-id and bearer-token middleware.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil::{JwtConfig, SqliteRepositoryProvider, Vigil};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = sqlx::SqlitePool::connect("sqlite:vigil.db").await.unwrap();
//!     let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
//!
//!     let vigil = Arc::new(Vigil::new(
//!         repositories,
//!         JwtConfig::new(b"change-me".to_vec(), "vigil", "vigil-api"),
//!     ));
//!     vigil.migrate().await.unwrap();
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let _sweeper = vigil.start_sweeper(shutdown_rx);
//!
//!     let app = vigil_axum::create_router(vigil)
//!         .into_make_service_with_connect_info::<std::net::SocketAddr>();
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod types;

pub use error::ApiError;
pub use extractors::{AdminUser, AuthUser};
pub use middleware::{AppState, CORRELATION_ID_HEADER, CorrelationId};
pub use routes::create_router;
pub use types::ConnectionInfo;
