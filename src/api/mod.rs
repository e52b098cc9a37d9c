//! Thin HTTP edge over the redirect resolver.
//!
//! Routing and marshaling only; every cache decision lives in
//! [`crate::application`].
//!
//! # Modules
//!
//! - [`dto`] - Response bodies
//! - [`handlers`] - Redirect, health and metrics handlers
//! - [`middleware`] - Request tracing

pub mod dto;
pub mod handlers;
pub mod middleware;
