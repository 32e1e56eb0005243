//! In-process browsing sessions for testing HTTP request pipelines.
//!
//! The purpose of this crate is to drive a request pipeline the way a
//! browser does, without using the low level I/O. A `BrowsingSession`
//! keeps the Cookie entries received from the pipeline, attaches the
//! credentials for Basic authentication and encodes the request bodies,
//! and hands each request to the pipeline as a `SimulatedRequest`.
//!
//! # Example
//!
//! ```
//! # #![deny(deprecated)]
//! use {
//!     http::{header::SET_COOKIE, Response},
//!     kagami::{pipeline_fn, BrowsingSession, KnownHeader, SimulatedRequest, TransportRequest},
//!     std::io,
//! };
//!
//! # fn main() -> kagami::Result<()> {
//! // the pipeline to be tested.
//! let pipeline = pipeline_fn(|request: SimulatedRequest| -> io::Result<Response<String>> {
//!     let body = match request.path() {
//!         "login" => "welcome".to_string(),
//!         _ => format!("cookie: {:?}", request.known_header(KnownHeader::Cookie)),
//!     };
//!     Ok(Response::builder()
//!         .header(SET_COOKIE, "sid=abc")
//!         .body(body)
//!         .unwrap())
//! });
//!
//! let mut session = BrowsingSession::new(pipeline)?;
//!
//! let result = session.post("/login", vec![("user", "alice"), ("pass", "secret")])?;
//! assert_eq!(result.response_text(), "welcome");
//!
//! // the Cookie received from the previous response is sent back.
//! let result = session.get("/profile")?;
//! assert_eq!(result.response_text(), "cookie: Some(\"sid=abc;\")");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/kagami/0.1.0-preview.1")]
#![deny(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    rust_2018_compatibility,
    unused
)]
#![forbid(clippy::unimplemented)]

mod capture;
mod cookies;
mod descriptor;
mod error;
pub mod pipeline;
pub mod request;
mod result;
mod runtime;
pub mod session;
mod target;

pub use crate::{
    capture::{Capture, Handle},
    cookies::CookieJar,
    descriptor::{build_headers, encode_form, Credentials, FormFields, RequestDescriptor},
    error::{Compat, Error, Result},
    pipeline::{pipeline_fn, Pipeline, ResponseBody},
    request::{KnownHeader, SimulatedRequest, TransportRequest},
    result::RequestResult,
    runtime::{CurrentThread, DefaultRuntime, Runtime},
    session::BrowsingSession,
    target::{IntoTarget, Target},
};
