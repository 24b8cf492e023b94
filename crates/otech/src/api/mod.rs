//! HTTP API module.
//!
//! Exposes the chat dispatcher over `POST /chat`.

mod error;
pub mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
