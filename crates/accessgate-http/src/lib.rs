//! HTTP front end for AccessGate.
//!
//! [`GateHttpService`] implements hyper's `Service` trait. For every request it
//! collects the body, runs the [`RequestGate`](accessgate_iam::RequestGate),
//! and either forwards the request unchanged to a [`ProtectedHandler`] or
//! answers with the rejection's status and a short plain-text body. Health
//! probes bypass the gate.

pub mod body;
pub mod handler;
pub mod response;
pub mod service;

pub use body::GateResponseBody;
pub use handler::ProtectedHandler;
pub use service::GateHttpService;
