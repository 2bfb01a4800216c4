//! OpenShift Express broker client.
//!
//! [`ExpressService`] dispatches every broker operation through a
//! [`protocol::Transport`] and records results in the caller-held [`User`]
//! session. [`ExpressConfiguration`] reads `express.conf`.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Request construction, envelope encoding, sanitizing,
//! unmarshalling and error classification come from the `protocol` crate;
//! this crate sequences them per operation and owns no I/O besides reading
//! configuration files.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`service`] | The request dispatcher (`ExpressService`) |
//! | [`user`] | Caller-held session (`User`) |
//! | [`application`] | Application handle (`Application`) |
//! | [`config`] | `express.conf` loading (`ExpressConfiguration`) |

pub mod application;
pub mod config;
pub mod service;
pub mod user;

pub use application::Application;
pub use config::{ConfigError, ExpressConfiguration};
pub use service::ExpressService;
pub use user::User;
