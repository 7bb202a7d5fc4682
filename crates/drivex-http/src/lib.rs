//! Drive v3 REST backend for drivex.
//!
//! [`HttpRemoteStore`] implements [`drivex_store::RemoteStore`] with
//! `reqwest`, authenticating every call with a bearer token. Obtaining and
//! refreshing that token is left to the caller.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use client::HttpRemoteStore;
pub use config::{HttpConfig, TOKEN_ENV};
pub use error::{HttpError, HttpResult};
