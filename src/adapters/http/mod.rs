//! HTTP adapters - REST API implementations.
//!
//! Each feature has its own module with `dto`, `handlers` and `routes`;
//! `router` assembles them under `/api`.

pub mod dto;
pub mod error;
pub mod join;
pub mod ledger;
pub mod middleware;
pub mod payments;
pub mod router;
pub mod state;
pub mod withdrawals;

pub use dto::ErrorResponse;
pub use error::ApiError;
pub use router::{api_router, api_routes};
pub use state::AppState;
