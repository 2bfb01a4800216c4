//! Domain results extracted from broker responses.
//!
//! These are plain owned values, created fresh for every unmarshalled
//! response and handed to the caller. Associations between them (an
//! application's owner, a cartridge's application) are by identifier only.

use crate::{
    ApplicationName, BrokerUuid, CartridgeKind, CartridgeName, Login, Namespace, SshPublicKey,
    Timestamp,
};

/// A user's account as returned by `userinfo`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    /// The account login.
    pub login: Login,
    /// Broker UUID of the account.
    pub uuid: BrokerUuid,
    /// The user's domain, if one has been created.
    pub domain: Option<DomainInfo>,
    /// The SSH key registered with the domain, if any.
    pub ssh_key: Option<SshPublicKey>,
    /// Every application the user owns, ordered by name.
    pub applications: Vec<ApplicationInfo>,
}

impl UserInfo {
    /// Looks up an application by name.
    pub fn application(&self, name: &ApplicationName) -> Option<&ApplicationInfo> {
        self.applications.iter().find(|app| &app.name == name)
    }

    /// Removes an application by name, returning it if it was present.
    pub fn remove_application(&mut self, name: &ApplicationName) -> Option<ApplicationInfo> {
        let index = self.applications.iter().position(|app| &app.name == name)?;
        Some(self.applications.remove(index))
    }
}

/// A user's domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    /// The namespace, first part of every application host name.
    pub namespace: Namespace,
    /// The platform DNS suffix (e.g. `rhcloud.com`), when known.
    pub rhc_domain: Option<String>,
    /// Login of the owning user.
    pub owner: Login,
    /// Broker UUID of the owning user.
    pub owner_uuid: BrokerUuid,
}

/// Everything the broker records about one application.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationInfo {
    /// Application name.
    pub name: ApplicationName,
    /// Broker UUID of the application.
    pub uuid: BrokerUuid,
    /// The framework cartridge the application runs on.
    pub cartridge: CartridgeName,
    /// When the application was created.
    pub creation_time: Timestamp,
    /// Cartridges embedded into the application.
    pub embedded: Vec<EmbeddedCartridge>,
}

impl ApplicationInfo {
    /// Looks up an embedded cartridge by name.
    pub fn embedded_cartridge(&self, name: &CartridgeName) -> Option<&EmbeddedCartridge> {
        self.embedded.iter().find(|cart| &cart.name == name)
    }
}

/// A cartridge embedded into an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedCartridge {
    /// Cartridge name.
    pub name: CartridgeName,
    /// Descriptive text from `userinfo` (typically a connection URL).
    pub info: Option<String>,
    /// Output of the embed operation, which may hold generated credentials.
    pub creation_log: Option<String>,
}

/// One entry of a cartridge listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeInfo {
    /// Cartridge name.
    pub name: CartridgeName,
    /// Standalone or embeddable.
    pub kind: CartridgeKind,
}

/// Result of an application lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    /// Application name (from the request).
    pub name: ApplicationName,
    /// Framework cartridge (from the request).
    pub cartridge: CartridgeInfo,
    /// Broker UUID, when the response reports it.
    pub uuid: Option<BrokerUuid>,
}
