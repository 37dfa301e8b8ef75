//! Async client for the Grohe ONDUS cloud API.
//!
//! The cloud exposes a three-level hierarchy, locations → rooms →
//! appliances, behind a refresh-token authenticated REST API. This crate
//! models that hierarchy as a lazily populated tree of cheap-to-clone
//! handles:
//!
//! - **[`Session`]** -- owns the token lifecycle and the authenticated
//!   request protocol (one transparent re-authentication on HTTP 401, at
//!   most two attempts per call), plus the top-level location cache.
//! - **[`Location`] / [`Room`]** -- resource nodes whose children are
//!   fetched on first access and merged by id on later updates, so held
//!   handles keep observing fresh data.
//! - **[`Appliance`]** -- tagged variant selected from the server's type
//!   code; variant-specific operations such as
//!   [`BlueHomeTap::open_water`] are reachable after narrowing.
//!
//! Tree operations never fail: transport, authentication and server errors
//! are logged through `tracing` and surface as empty results.

pub mod appliance;
mod client;
pub mod error;
pub mod location;
pub mod room;
pub mod session;
pub mod transport;
mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use appliance::{
    Appliance, ApplianceCore, ApplianceType, BlueHomeTap, SenseGuardValve, SenseSensor, WaterType,
};
pub use error::Error;
pub use location::Location;
pub use room::Room;
pub use session::{DEFAULT_BASE_URL, Session, SessionConfig};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TlsMode, TransportConfig};
pub use tree::Record;

// Re-exported so callers can name request methods without depending on reqwest.
pub use reqwest::Method;
