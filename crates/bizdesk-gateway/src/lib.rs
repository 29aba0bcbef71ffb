//! # BizDesk Gateway
//!
//! HTTP API over the BizDesk stores: departments, chat, tasks, and the
//! on-demand scheduler sweep.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, build_router, start};
