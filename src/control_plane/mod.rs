//! Control-plane clients.
//!
//! The control plane is the dev-server side service that advertises and
//! executes the remote tools available to the model during a turn. The
//! traits live in [`crate::traits`]; this module carries the crate's
//! reference implementation, a JSON-over-HTTP client.

mod http;

pub use http::{HttpControlPlane, HttpControlPlaneConnection};
