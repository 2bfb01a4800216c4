//! Shared value types for the broker protocol.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! structure (versions, timestamps, key material) and know how to parse the
//! broker's textual renderings of themselves.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use crate::errors::ValidationError;
use crate::InstanceId;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Broker API version as reported in the `api` field of every response
/// (e.g. `"1.1.1"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    /// Major version, bumped on breaking changes.
    pub major: u32,
    /// Minor version, bumped on additive changes.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl ApiVersion {
    /// Creates a new [`ApiVersion`].
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for ApiVersion {
    type Err = std::num::ParseIntError;

    /// Parses `major[.minor[.patch]]`; missing components default to zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '.');
        let major = parts.next().unwrap_or_default().parse::<u32>()?;
        let minor = parts.next().map(str::parse::<u32>).transpose()?.unwrap_or(0);
        let patch = parts.next().map(str::parse::<u32>).transpose()?.unwrap_or(0);
        Ok(Self::new(major, minor, patch))
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parses a broker `creation_time` value.
    ///
    /// Accepts RFC 822 / RFC 2822 text (`"Wed, 09 Nov 2011 04:58:40 -0500"`)
    /// and the ISO-8601 rendering the broker actually emits
    /// (`"2011-11-09T04:58:40-05:00"`).
    pub fn parse_broker(text: &str) -> Result<Self, chrono::ParseError> {
        let text = text.trim();
        DateTime::parse_from_rfc2822(text)
            .or_else(|_| DateTime::parse_from_rfc3339(text))
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc2822())
    }
}

// ---------------------------------------------------------------------------
// Cartridges
// ---------------------------------------------------------------------------

/// Whether a cartridge runs an application or is embedded into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartridgeKind {
    /// Application framework cartridge (`jbossas-7.0`, `php-5.3`, ...).
    Standalone,
    /// Add-on cartridge embedded into an existing application (`mysql-5.1`, ...).
    Embedded,
}

impl CartridgeKind {
    /// Wire value used in `cart_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Embedded => "embedded",
        }
    }
}

impl FromStr for CartridgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standalone" => Ok(Self::Standalone),
            "embedded" => Ok(Self::Embedded),
            other => Err(format!("unknown cartridge type \"{other}\"")),
        }
    }
}

impl std::fmt::Display for CartridgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SSH keys
// ---------------------------------------------------------------------------

/// Algorithm of an SSH public key registered with a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SshKeyType {
    /// `ssh-rsa`
    Rsa,
    /// `ssh-dss`
    Dss,
}

impl SshKeyType {
    /// Wire value used in `key_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rsa => "ssh-rsa",
            Self::Dss => "ssh-dss",
        }
    }
}

impl FromStr for SshKeyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ssh-rsa" => Ok(Self::Rsa),
            "ssh-dss" => Ok(Self::Dss),
            other => Err(ValidationError::UnknownKeyType(other.to_owned())),
        }
    }
}

/// An SSH public key: algorithm plus the base64 key body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshPublicKey {
    key_type: SshKeyType,
    key: String,
}

impl SshPublicKey {
    /// Creates a key from its parts, rejecting an empty key body.
    pub fn new(key_type: SshKeyType, key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::Empty { field: "ssh" });
        }
        Ok(Self { key_type, key })
    }

    /// Parses an OpenSSH public key line (`<type> <base64> [comment]`).
    ///
    /// The comment is dropped; the broker stores only type and body.
    pub fn from_openssh(line: &str) -> Result<Self, ValidationError> {
        let mut fields = line.split_whitespace();
        let key_type = fields
            .next()
            .ok_or(ValidationError::Empty { field: "ssh" })?
            .parse()?;
        let key = fields.next().ok_or(ValidationError::Empty { field: "ssh" })?;
        Self::new(key_type, key)
    }

    /// Returns the key algorithm.
    pub fn key_type(&self) -> SshKeyType {
        self.key_type
    }

    /// Returns the base64 key body.
    pub fn key(&self) -> &str {
        &self.key
    }
}

// ---------------------------------------------------------------------------
// Client identity
// ---------------------------------------------------------------------------

/// Who is calling: rendered into the `User-Agent` of every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    name: String,
    version: String,
    instance_id: InstanceId,
}

impl ClientIdentity {
    /// Creates an identity from a client name, version and instance id.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        instance_id: InstanceId,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            instance_id,
        }
    }

    /// Returns `<client-name>/<version> (<instance-id>)`.
    pub fn user_agent(&self) -> String {
        format!("{}/{} ({})", self.name, self.version, self.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::full("1.1.1", ApiVersion::new(1, 1, 1))]
    #[case::two_parts("1.2", ApiVersion::new(1, 2, 0))]
    #[case::padded(" 2.0.3 ", ApiVersion::new(2, 0, 3))]
    fn parses_api_versions(#[case] text: &str, #[case] expected: ApiVersion) {
        assert_eq!(text.parse::<ApiVersion>().unwrap(), expected);
    }

    #[test]
    fn rejects_non_numeric_api_version() {
        assert!("one.two".parse::<ApiVersion>().is_err());
    }

    #[rstest]
    #[case::rfc822("Wed, 09 Nov 2011 09:58:40 +0000")]
    #[case::iso8601("2011-11-09T04:58:40-05:00")]
    fn parses_broker_creation_times(#[case] text: &str) {
        let expected = Utc.with_ymd_and_hms(2011, 11, 9, 9, 58, 40).unwrap();
        assert_eq!(
            Timestamp::parse_broker(text).unwrap().as_datetime(),
            expected
        );
    }

    #[test]
    fn rejects_unparseable_creation_time() {
        assert!(Timestamp::parse_broker("yesterday").is_err());
    }

    #[test]
    fn parses_openssh_public_key_and_drops_comment() {
        let key = SshPublicKey::from_openssh("ssh-rsa AAAAB3Nza \"andre@localhost\"").unwrap();
        assert_eq!(key.key_type(), SshKeyType::Rsa);
        assert_eq!(key.key(), "AAAAB3Nza");
    }

    #[test]
    fn rejects_unknown_key_type() {
        assert_eq!(
            SshPublicKey::from_openssh("ssh-ed25519 AAAA").unwrap_err(),
            ValidationError::UnknownKeyType("ssh-ed25519".to_owned())
        );
    }

    #[test]
    fn renders_user_agent() {
        let identity = ClientIdentity::new(
            "express-client",
            "0.1.0",
            InstanceId::new("com.example.tests").unwrap(),
        );
        assert_eq!(
            identity.user_agent(),
            "express-client/0.1.0 (com.example.tests)"
        );
    }
}
