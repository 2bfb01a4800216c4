//! Response unmarshalling.
//!
//! Every broker response has the same outer shape (diagnostics plus a
//! `data` field) and one of several inner shapes depending on the request.
//! [`unmarshal`] handles the outer shape once and dispatches on
//! [`ResponseShape`] for the inner one, producing a [`Payload`].
//!
//! Input must already have been through [`crate::sanitize`].

mod dto;

use serde_json::Value;

use crate::errors::UnmarshalError;
use crate::model::{ApplicationRecord, CartridgeInfo, DomainInfo, EmbeddedCartridge, UserInfo};
use crate::{
    ApiVersion, ApplicationName, BrokerUuid, CartridgeKind, CartridgeName, Login, Namespace,
};

use dto::{CartListDataDto, DomainDataDto, ResponseDto, UserInfoDataDto};

/// The result shape expected from a request, with the context the
/// unmarshaller needs to complete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape<'a> {
    /// Account, domain and applications.
    UserInfo,
    /// A created or changed domain.
    Domain {
        /// The requested namespace.
        namespace: &'a Namespace,
        /// The requesting user.
        login: &'a Login,
    },
    /// An application after a lifecycle action.
    Application {
        /// The requested application.
        name: &'a ApplicationName,
        /// Its framework cartridge.
        cartridge: &'a CartridgeName,
    },
    /// A cartridge after an embed action.
    Embed {
        /// The embedded cartridge.
        cartridge: &'a CartridgeName,
    },
    /// A cartridge listing.
    Cartridges {
        /// The requested kind, used for entries that do not name one.
        kind: CartridgeKind,
    },
    /// An application's status text.
    Status,
}

impl ResponseShape<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::UserInfo => "user info",
            Self::Domain { .. } => "domain",
            Self::Application { .. } => "application",
            Self::Embed { .. } => "embedded cartridge",
            Self::Cartridges { .. } => "cartridge list",
            Self::Status => "status",
        }
    }
}

/// A domain result, one variant per [`ResponseShape`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// See [`ResponseShape::UserInfo`].
    UserInfo(UserInfo),
    /// See [`ResponseShape::Domain`].
    Domain(DomainInfo),
    /// See [`ResponseShape::Application`].
    Application(ApplicationRecord),
    /// See [`ResponseShape::Embed`].
    Embedded(EmbeddedCartridge),
    /// See [`ResponseShape::Cartridges`].
    Cartridges(Vec<CartridgeInfo>),
    /// See [`ResponseShape::Status`].
    Status(String),
}

/// Top-level diagnostic fields of a response.
///
/// `exit_code` is informational only; success is decided by the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Broker messages (possibly empty).
    pub messages: String,
    /// Broker debug output (possibly empty).
    pub debug: String,
    /// Broker API version, if reported and parseable.
    pub api: Option<ApiVersion>,
    /// Free-text outcome of the operation.
    pub result: Option<String>,
    /// Broker exit code; `0` when absent.
    pub exit_code: i64,
}

/// A parsed response: the domain result plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    /// The domain result.
    pub payload: T,
    /// Top-level diagnostic fields.
    pub diagnostics: Diagnostics,
}

/// Parses a sanitized response into the result for `shape`.
///
/// Fails on invalid JSON, on a `data` field of the wrong shape, on missing
/// required fields and on unparseable dates. Never returns a partial result.
pub fn unmarshal(
    sanitized: &str,
    shape: ResponseShape<'_>,
) -> Result<Response<Payload>, UnmarshalError> {
    let response: ResponseDto =
        serde_json::from_str(sanitized).map_err(UnmarshalError::Json)?;
    let diagnostics = Diagnostics {
        messages: text_of(&response.messages),
        debug: text_of(&response.debug),
        api: response.api.as_deref().and_then(|api| match api.parse() {
            Ok(version) => Some(version),
            Err(error) => {
                tracing::debug!(api, %error, "ignoring unparseable api version");
                None
            }
        }),
        result: response.result.filter(|result| !result.is_empty()),
        exit_code: response.exit_code.unwrap_or(0),
    };
    if diagnostics.exit_code != 0 {
        tracing::warn!(
            exit_code = diagnostics.exit_code,
            messages = %diagnostics.messages,
            shape = shape.name(),
            "broker reported non-zero exit code"
        );
    }

    let payload = decode_payload(response.data, shape, &diagnostics)?;
    Ok(Response {
        payload,
        diagnostics,
    })
}

fn decode_payload(
    data: Value,
    shape: ResponseShape<'_>,
    diagnostics: &Diagnostics,
) -> Result<Payload, UnmarshalError> {
    let decode_error = |source: serde_json::Error| UnmarshalError::Shape {
        shape: shape.name(),
        source,
    };
    match shape {
        ResponseShape::UserInfo => {
            let dto: UserInfoDataDto = serde_json::from_value(data).map_err(decode_error)?;
            dto.into_user_info().map(Payload::UserInfo)
        }
        ResponseShape::Domain { namespace, login } => {
            let dto: DomainDataDto = serde_json::from_value(data).map_err(decode_error)?;
            dto.into_domain_info(namespace, login).map(Payload::Domain)
        }
        ResponseShape::Cartridges { kind } => {
            let dto: CartListDataDto = serde_json::from_value(data).map_err(decode_error)?;
            dto.into_cartridges(kind).map(Payload::Cartridges)
        }
        ResponseShape::Application { name, cartridge } => {
            let uuid = match data.get("uuid").and_then(Value::as_str) {
                Some(uuid) if !uuid.is_empty() => BrokerUuid::new(uuid).ok(),
                _ => None,
            };
            Ok(Payload::Application(ApplicationRecord {
                name: name.clone(),
                cartridge: CartridgeInfo {
                    name: cartridge.clone(),
                    kind: CartridgeKind::Standalone,
                },
                uuid,
            }))
        }
        ResponseShape::Embed { cartridge } => Ok(Payload::Embedded(EmbeddedCartridge {
            name: cartridge.clone(),
            info: None,
            creation_log: diagnostics.result.clone(),
        })),
        ResponseShape::Status => match data {
            Value::Null => Err(UnmarshalError::MissingField { field: "data" }),
            Value::String(status) => Ok(Payload::Status(status)),
            other => Ok(Payload::Status(other.to_string())),
        },
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Payload {
    /// Returns the user info, or an error naming the shape actually received.
    pub fn into_user_info(self) -> Result<UserInfo, UnmarshalError> {
        match self {
            Self::UserInfo(info) => Ok(info),
            other => Err(other.mismatch("user info")),
        }
    }

    /// Returns the domain info.
    pub fn into_domain(self) -> Result<DomainInfo, UnmarshalError> {
        match self {
            Self::Domain(domain) => Ok(domain),
            other => Err(other.mismatch("domain")),
        }
    }

    /// Returns the application record.
    pub fn into_application(self) -> Result<ApplicationRecord, UnmarshalError> {
        match self {
            Self::Application(record) => Ok(record),
            other => Err(other.mismatch("application")),
        }
    }

    /// Returns the embedded cartridge.
    pub fn into_embedded(self) -> Result<EmbeddedCartridge, UnmarshalError> {
        match self {
            Self::Embedded(cartridge) => Ok(cartridge),
            other => Err(other.mismatch("embedded cartridge")),
        }
    }

    /// Returns the cartridge listing.
    pub fn into_cartridges(self) -> Result<Vec<CartridgeInfo>, UnmarshalError> {
        match self {
            Self::Cartridges(cartridges) => Ok(cartridges),
            other => Err(other.mismatch("cartridge list")),
        }
    }

    /// Returns the status text.
    pub fn into_status(self) -> Result<String, UnmarshalError> {
        match self {
            Self::Status(status) => Ok(status),
            other => Err(other.mismatch("status")),
        }
    }

    fn mismatch(&self, expected: &str) -> UnmarshalError {
        let received = match self {
            Self::UserInfo(_) => "user info",
            Self::Domain(_) => "domain",
            Self::Application(_) => "application",
            Self::Embedded(_) => "embedded cartridge",
            Self::Cartridges(_) => "cartridge list",
            Self::Status(_) => "status",
        };
        UnmarshalError::InvalidField {
            field: "data",
            reason: format!("expected {expected}, got {received}"),
        }
    }
}
