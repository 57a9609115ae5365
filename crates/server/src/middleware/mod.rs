//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Caller identity is read per handler by the [`RequireActor`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{RequireActor, USER_ID_HEADER, USER_ROLE_HEADER};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
