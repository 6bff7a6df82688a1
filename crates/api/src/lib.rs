//! HTTP surface of the work request service
//!
//! Routes are grouped by the gates they sit behind: public, authenticated,
//! and operator-only. Every error leaves as `{"error": "..."}`.

pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod request_handlers;
pub mod router;
pub mod state;
pub mod user_handlers;
pub mod validation;

pub use error::{ApiError, ErrorResponse};
pub use extract::{ValidJson, ValidQuery};
pub use router::router;
pub use state::AppState;
