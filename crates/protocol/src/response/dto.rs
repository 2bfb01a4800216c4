//! DTOs for decoding the `data` field of sanitized responses.
//!
//! Each result shape decodes into these transport DTOs first, then maps into
//! domain results in one pass. Required fields are non-optional here, so a
//! missing field fails decoding instead of producing a half-filled result.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::UnmarshalError;
use crate::model::{ApplicationInfo, CartridgeInfo, DomainInfo, EmbeddedCartridge, UserInfo};
use crate::{
    ApplicationName, BrokerUuid, CartridgeKind, CartridgeName, Login, Namespace, SshKeyType,
    SshPublicKey, Timestamp,
};

/// Top-level response fields, `data` kept as a generic tree.
#[derive(Debug, Deserialize)]
pub(super) struct ResponseDto {
    #[serde(default)]
    pub(super) messages: Value,
    #[serde(default)]
    pub(super) debug: Value,
    #[serde(default)]
    pub(super) api: Option<String>,
    #[serde(default)]
    pub(super) result: Option<String>,
    #[serde(default)]
    pub(super) exit_code: Option<i64>,
    #[serde(default)]
    pub(super) data: Value,
}

// ---------------------------------------------------------------------------
// userinfo
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UserInfoDataDto {
    user_info: UserDto,
    #[serde(default)]
    app_info: Option<BTreeMap<String, AppInfoDto>>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    rhlogin: String,
    uuid: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    rhc_domain: Option<String>,
    #[serde(default)]
    ssh_key: Option<String>,
    #[serde(default)]
    ssh_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppInfoDto {
    uuid: String,
    framework: String,
    creation_time: String,
    #[serde(default)]
    embedded: Option<BTreeMap<String, Option<EmbeddedDto>>>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedDto {
    #[serde(default)]
    info: Option<String>,
}

impl UserInfoDataDto {
    pub(super) fn into_user_info(self) -> Result<UserInfo, UnmarshalError> {
        let user = self.user_info;
        let login = Login::new(user.rhlogin)
            .map_err(|_| UnmarshalError::MissingField { field: "rhlogin" })?;
        let uuid = broker_uuid(user.uuid)?;

        let domain = match user.namespace {
            Some(namespace) if !namespace.is_empty() => Some(DomainInfo {
                namespace: Namespace::new(namespace).map_err(|e| invalid("namespace", e))?,
                rhc_domain: user.rhc_domain.filter(|d| !d.is_empty()),
                owner: login.clone(),
                owner_uuid: uuid.clone(),
            }),
            _ => None,
        };

        let ssh_key = match (user.ssh_type, user.ssh_key) {
            (Some(key_type), Some(key)) if !key.is_empty() => {
                let key_type = key_type
                    .parse::<SshKeyType>()
                    .map_err(|e| invalid("ssh_type", e))?;
                Some(SshPublicKey::new(key_type, key).map_err(|e| invalid("ssh_key", e))?)
            }
            _ => None,
        };

        let applications = self
            .app_info
            .unwrap_or_default()
            .into_iter()
            .map(|(name, app)| app.into_application_info(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserInfo {
            login,
            uuid,
            domain,
            ssh_key,
            applications,
        })
    }
}

impl AppInfoDto {
    fn into_application_info(self, name: String) -> Result<ApplicationInfo, UnmarshalError> {
        let creation_time = Timestamp::parse_broker(&self.creation_time).map_err(|source| {
            UnmarshalError::InvalidDate {
                field: "creation_time",
                value: self.creation_time.clone(),
                source,
            }
        })?;
        let embedded = self
            .embedded
            .unwrap_or_default()
            .into_iter()
            .map(|(name, info)| -> Result<EmbeddedCartridge, UnmarshalError> {
                Ok(EmbeddedCartridge {
                    name: cartridge_name(name)?,
                    info: info.unwrap_or_default().info,
                    creation_log: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApplicationInfo {
            name: ApplicationName::new(name).map_err(|e| invalid("app_info", e))?,
            uuid: broker_uuid(self.uuid)?,
            cartridge: CartridgeName::new(self.framework)
                .map_err(|_| UnmarshalError::MissingField { field: "framework" })?,
            creation_time,
            embedded,
        })
    }
}

// ---------------------------------------------------------------------------
// domain
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct DomainDataDto {
    #[serde(default)]
    rhlogin: Option<String>,
    uuid: String,
    #[serde(default)]
    rhc_domain: Option<String>,
}

impl DomainDataDto {
    /// The broker does not reliably echo the namespace, so the requested one
    /// is used; the login falls back to the requesting user.
    pub(super) fn into_domain_info(
        self,
        namespace: &Namespace,
        login: &Login,
    ) -> Result<DomainInfo, UnmarshalError> {
        let owner = match self.rhlogin {
            Some(rhlogin) if !rhlogin.is_empty() => {
                Login::new(rhlogin).map_err(|e| invalid("rhlogin", e))?
            }
            _ => login.clone(),
        };
        Ok(DomainInfo {
            namespace: namespace.clone(),
            rhc_domain: self.rhc_domain.filter(|d| !d.is_empty()),
            owner,
            owner_uuid: broker_uuid(self.uuid)?,
        })
    }
}

// ---------------------------------------------------------------------------
// cartlist
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CartListDataDto {
    carts: Vec<CartEntryDto>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CartEntryDto {
    Name(String),
    Described {
        name: String,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl CartListDataDto {
    pub(super) fn into_cartridges(
        self,
        requested: CartridgeKind,
    ) -> Result<Vec<CartridgeInfo>, UnmarshalError> {
        self.carts
            .into_iter()
            .map(|entry| -> Result<CartridgeInfo, UnmarshalError> {
                let (name, kind) = match entry {
                    CartEntryDto::Name(name) => (name, None),
                    CartEntryDto::Described { name, kind } => (name, kind),
                };
                let kind = match kind {
                    Some(kind) => kind
                        .parse::<CartridgeKind>()
                        .map_err(|reason| UnmarshalError::InvalidField { field: "type", reason })?,
                    None => requested,
                };
                Ok(CartridgeInfo {
                    name: cartridge_name(name)?,
                    kind,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn broker_uuid(value: String) -> Result<BrokerUuid, UnmarshalError> {
    BrokerUuid::new(value).map_err(|_| UnmarshalError::MissingField { field: "uuid" })
}

fn cartridge_name(value: String) -> Result<CartridgeName, UnmarshalError> {
    CartridgeName::new(value).map_err(|_| UnmarshalError::MissingField { field: "name" })
}

fn invalid(field: &'static str, error: impl std::fmt::Display) -> UnmarshalError {
    UnmarshalError::InvalidField {
        field,
        reason: error.to_string(),
    }
}
