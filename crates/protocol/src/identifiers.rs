//! Newtype identifiers for broker entities.
//!
//! Every name the broker understands is a distinct newtype wrapping a
//! `String`. This prevents accidentally passing, for example, a
//! [`CartridgeName`] where an [`ApplicationName`] is expected even though both
//! are strings on the wire.
//!
//! Constructors validate their input and return [`ValidationError`] on
//! malformed values, so a [`crate::Request`] built from these types is always
//! well-formed.

use serde::Serialize;
use uuid::Uuid;

use crate::errors::ValidationError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes that only need to be non-empty.
// Generates: struct, new() returning Result<Self, ValidationError>, as_str(),
// Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident, $field:literal
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, rejecting empty values.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let v = value.into();
                if v.is_empty() {
                    Err(ValidationError::Empty { field: $field })
                } else {
                    Ok(Self(v))
                }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for names the broker embeds in host names: ASCII alphanumeric with a
// maximum length.
// ---------------------------------------------------------------------------
macro_rules! host_label_id {
    (
        $(#[$attr:meta])*
        $name:ident, $field:literal, $max:expr
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(String);

        impl $name {
            /// Maximum number of characters the broker accepts.
            pub const MAX_LEN: usize = $max;

            /// Creates a new name, rejecting empty, overlong or
            /// non-alphanumeric values.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let v = value.into();
                validate_host_label($field, &v, Self::MAX_LEN)?;
                Ok(Self(v))
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

fn validate_host_label(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, max, len });
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::NotAlphanumeric {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Identifiers: account and broker assigned
// ---------------------------------------------------------------------------

string_id! {
    /// The Red Hat login (`rhlogin`) that owns every request.
    Login, "rhlogin"
}

string_id! {
    /// A UUID assigned by the broker to a user or application.
    ///
    /// The broker renders these as 32 lowercase hex digits without hyphens;
    /// the value is kept verbatim rather than normalised.
    BrokerUuid, "uuid"
}

string_id! {
    /// A cartridge name, e.g. `"jbossas-7.0"` or `"mysql-5.1"`.
    ///
    /// Cartridges are not an enum: the broker adds and retires them at will.
    CartridgeName, "cartridge"
}

string_id! {
    /// Identifies this client installation in the user-agent string.
    InstanceId, "instance_id"
}

impl InstanceId {
    /// Generates a fresh random instance identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

// ---------------------------------------------------------------------------
// Identifiers: host-name labels
// ---------------------------------------------------------------------------

host_label_id! {
    /// An application name. Becomes the first label of the application's
    /// host name (`<name>-<namespace>.<rhc_domain>`).
    ApplicationName, "app_name", 32
}

host_label_id! {
    /// A domain namespace. Becomes part of every application host name.
    Namespace, "namespace", 16
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn login_rejects_empty_value() {
        assert_eq!(
            Login::new("").unwrap_err(),
            ValidationError::Empty { field: "rhlogin" }
        );
    }

    #[test]
    fn login_keeps_value_verbatim() {
        let login = Login::new("toolsjboss@gmail.com").unwrap();
        assert_eq!(login.as_str(), "toolsjboss@gmail.com");
        assert_eq!(login.to_string(), "toolsjboss@gmail.com");
    }

    #[rstest]
    #[case::plain("myapp")]
    #[case::digits("app42")]
    #[case::max_length("abcdefghijklmnopqrstuvwxyz012345")]
    fn application_name_accepts_alphanumeric(#[case] value: &str) {
        assert_eq!(ApplicationName::new(value).unwrap().as_str(), value);
    }

    #[rstest]
    #[case::empty("", ValidationError::Empty { field: "app_name" })]
    #[case::dash(
        "my-app",
        ValidationError::NotAlphanumeric { field: "app_name", value: "my-app".to_owned() }
    )]
    #[case::too_long(
        "abcdefghijklmnopqrstuvwxyz0123456",
        ValidationError::TooLong { field: "app_name", max: 32, len: 33 }
    )]
    fn application_name_rejects_malformed(#[case] value: &str, #[case] expected: ValidationError) {
        assert_eq!(ApplicationName::new(value).unwrap_err(), expected);
    }

    #[test]
    fn namespace_is_limited_to_sixteen_characters() {
        assert!(Namespace::new("abcdefghijklmnop").is_ok());
        assert_eq!(
            Namespace::new("abcdefghijklmnopq").unwrap_err(),
            ValidationError::TooLong {
                field: "namespace",
                max: 16,
                len: 17
            }
        );
    }

    #[test]
    fn random_instance_ids_differ() {
        assert_ne!(InstanceId::random(), InstanceId::random());
    }
}
