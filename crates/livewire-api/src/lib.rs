//! Client for the LiveWire chat service.
//!
//! The heart of the crate is [`gateway::ApiGateway`]: every request goes out
//! with the stored access credential attached as a bearer token, and a single
//! expired-credential (HTTP 401) response is recovered transparently by
//! exchanging the refresh credential and replaying the request once. The
//! typed wrappers in [`auth`] and [`chat`] cover the REST surface.

pub mod auth;
pub mod chat;
pub mod error;
pub mod gateway;
pub mod session;
pub mod types;

pub use {
    error::ApiError,
    gateway::{ApiGateway, SessionEvent},
    session::{Credentials, SessionStore},
};
