//! Transport layer for the Dry Beans API.
//!
//! The API is served over plain HTTP; see [`HttpTransport`].

pub mod http;

pub use http::HttpTransport;
