//! Wire protocol of the OpenShift Express broker.
//!
//! This crate contains everything needed to talk to the broker except the
//! HTTP connection itself: identifiers and value types, request payloads,
//! the form-encoded envelope, the response sanitizer and unmarshaller, and
//! the error taxonomy. The HTTP client is supplied through the [`Transport`]
//! port.
//!
//! ## Architectural Layer
//!
//! **Protocol logic + port definitions.** This crate has no I/O
//! dependencies. The `transport` crate implements [`Transport`]; the
//! `client` crate drives requests through it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Login`, `ApplicationName`, `Namespace`, etc.) |
//! | [`types`] | Shared value types (`ApiVersion`, `Timestamp`, `SshPublicKey`, etc.) |
//! | [`errors`] | Error taxonomy (`ExpressError` and its causes) |
//! | [`model`] | Domain results (`UserInfo`, `DomainInfo`, `ApplicationInfo`, etc.) |
//! | [`request`] | Broker requests and their JSON payloads |
//! | [`envelope`] | Form-encoded request envelope |
//! | [`sanitizer`] | Repair of string-encoded `data` fields |
//! | [`response`] | Response unmarshalling |
//! | [`classify`] | Mapping of failures onto `ExpressError` |
//! | [`transport`] | The HTTP port |

pub mod classify;
pub mod envelope;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod request;
pub mod response;
pub mod sanitizer;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use classify::{classify_transport, endpoint_failure};
pub use envelope::{Envelope, FORM_CONTENT_TYPE};
pub use errors::{EndpointCause, ExpressError, TransportError, UnmarshalError, ValidationError};
pub use identifiers::{
    ApplicationName, BrokerUuid, CartridgeName, InstanceId, Login, Namespace,
};
pub use model::{
    ApplicationInfo, ApplicationRecord, CartridgeInfo, DomainInfo, EmbeddedCartridge, UserInfo,
};
pub use request::{ApplicationAction, EmbedAction, Request, RequestKind, SERVICE_PATH};
pub use response::{unmarshal, Diagnostics, Payload, Response, ResponseShape};
pub use sanitizer::sanitize;
pub use transport::Transport;
pub use types::{
    ApiVersion, CartridgeKind, ClientIdentity, SshKeyType, SshPublicKey, Timestamp,
};
