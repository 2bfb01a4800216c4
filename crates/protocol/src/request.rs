//! Broker requests and their JSON payloads.
//!
//! A [`Request`] is immutable once built. It knows its broker path, its JSON
//! payload, the response shape it expects back, and how to describe itself in
//! an error message.

use serde::Serialize;

use crate::response::ResponseShape;
use crate::{ApplicationName, CartridgeKind, CartridgeName, Login, Namespace, SshPublicKey};

/// Path of the broker below the platform base URL.
pub const SERVICE_PATH: &str = "/broker";

/// Lifecycle action on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationAction {
    /// Create the application.
    Configure,
    /// Destroy the application.
    Deconfigure,
    /// Start the application.
    Start,
    /// Stop the application.
    Stop,
    /// Restart the application.
    Restart,
    /// Query the application's status.
    Status,
}

impl ApplicationAction {
    /// Wire value used in `action`.
    pub fn command(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Deconfigure => "deconfigure",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "status",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Configure => "create",
            Self::Deconfigure => "destroy",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "get status of",
        }
    }
}

/// Action on an embedded cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedAction {
    /// Embed the cartridge into the application.
    Add,
    /// Remove the cartridge from the application.
    Remove,
}

impl EmbedAction {
    /// Wire value used in `action`.
    pub fn command(self) -> &'static str {
        match self {
            Self::Add => "configure",
            Self::Remove => "deconfigure",
        }
    }
}

/// What a request asks the broker to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Fetch the user's account, domain and applications.
    UserInfo,
    /// List the cartridges of one kind.
    ListCartridges {
        /// Standalone or embeddable cartridges.
        kind: CartridgeKind,
    },
    /// Create or rename the user's domain.
    Domain {
        /// Namespace to create, or the new namespace.
        namespace: Namespace,
        /// Key registered for git access.
        ssh_key: SshPublicKey,
        /// `false` to create, `true` to change an existing domain.
        alter: bool,
    },
    /// Lifecycle action on an application.
    Application {
        /// Target application.
        name: ApplicationName,
        /// The application's framework cartridge.
        cartridge: CartridgeName,
        /// What to do.
        action: ApplicationAction,
    },
    /// Add or remove an embedded cartridge.
    Embed {
        /// Target application.
        application: ApplicationName,
        /// The embedded cartridge.
        cartridge: CartridgeName,
        /// What to do.
        action: EmbedAction,
    },
}

/// One broker request on behalf of a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    login: Login,
    debug: bool,
    kind: RequestKind,
}

impl Request {
    /// Creates a request with broker debugging enabled.
    pub fn new(login: Login, kind: RequestKind) -> Self {
        Self {
            login,
            debug: true,
            kind,
        }
    }

    /// Requests the user's account information.
    pub fn user_info(login: Login) -> Self {
        Self::new(login, RequestKind::UserInfo)
    }

    /// Lists the cartridges of `kind`.
    pub fn list_cartridges(login: Login, kind: CartridgeKind) -> Self {
        Self::new(login, RequestKind::ListCartridges { kind })
    }

    /// Creates a domain.
    pub fn create_domain(login: Login, namespace: Namespace, ssh_key: SshPublicKey) -> Self {
        Self::new(
            login,
            RequestKind::Domain {
                namespace,
                ssh_key,
                alter: false,
            },
        )
    }

    /// Changes the namespace and/or SSH key of the existing domain.
    pub fn change_domain(login: Login, namespace: Namespace, ssh_key: SshPublicKey) -> Self {
        Self::new(
            login,
            RequestKind::Domain {
                namespace,
                ssh_key,
                alter: true,
            },
        )
    }

    /// Lifecycle action on an application.
    pub fn application(
        login: Login,
        name: ApplicationName,
        cartridge: CartridgeName,
        action: ApplicationAction,
    ) -> Self {
        Self::new(
            login,
            RequestKind::Application {
                name,
                cartridge,
                action,
            },
        )
    }

    /// Adds or removes an embedded cartridge.
    pub fn embed(
        login: Login,
        application: ApplicationName,
        cartridge: CartridgeName,
        action: EmbedAction,
    ) -> Self {
        Self::new(
            login,
            RequestKind::Embed {
                application,
                cartridge,
                action,
            },
        )
    }

    /// Sets the broker debug flag.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns the login the request is made for.
    pub fn login(&self) -> &Login {
        &self.login
    }

    /// Returns what the request asks for.
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Broker path segment for this request.
    pub fn path(&self) -> &'static str {
        match self.kind {
            RequestKind::UserInfo => "userinfo",
            RequestKind::ListCartridges { .. } => "cartlist",
            RequestKind::Domain { .. } => "domain",
            RequestKind::Application { .. } => "cartridge",
            RequestKind::Embed { .. } => "embed_cartridge",
        }
    }

    /// Full request URL below `service_url` (the base URL plus
    /// [`SERVICE_PATH`]).
    pub fn url(&self, service_url: &str) -> String {
        format!("{}/{}", service_url.trim_end_matches('/'), self.path())
    }

    /// Whether a 401/403 from the broker means the credentials were rejected.
    ///
    /// Listing cartridges is allowed without valid credentials, so a
    /// rejection there is reported as an endpoint failure instead.
    pub fn checks_credentials(&self) -> bool {
        !matches!(self.kind, RequestKind::ListCartridges { .. })
    }

    /// The response shape this request expects.
    pub fn response_shape(&self) -> ResponseShape<'_> {
        match &self.kind {
            RequestKind::UserInfo => ResponseShape::UserInfo,
            RequestKind::ListCartridges { kind } => ResponseShape::Cartridges { kind: *kind },
            RequestKind::Domain { namespace, .. } => ResponseShape::Domain {
                namespace,
                login: &self.login,
            },
            RequestKind::Application {
                action: ApplicationAction::Status,
                ..
            } => ResponseShape::Status,
            RequestKind::Application {
                name, cartridge, ..
            } => ResponseShape::Application { name, cartridge },
            RequestKind::Embed { cartridge, .. } => ResponseShape::Embed { cartridge },
        }
    }

    /// Human-readable description for error messages, e.g.
    /// `start application "myapp"`.
    pub fn describe(&self) -> String {
        match &self.kind {
            RequestKind::UserInfo => format!("get user info for user \"{}\"", self.login),
            RequestKind::ListCartridges {
                kind: CartridgeKind::Standalone,
            } => "list available cartridges".to_owned(),
            RequestKind::ListCartridges {
                kind: CartridgeKind::Embedded,
            } => "list available embeddable cartridges".to_owned(),
            RequestKind::Domain {
                namespace,
                alter: false,
                ..
            } => format!("create domain \"{namespace}\""),
            RequestKind::Domain { namespace, .. } => format!("change domain to \"{namespace}\""),
            RequestKind::Application { name, action, .. } => {
                format!("{} application \"{name}\"", action.verb())
            }
            RequestKind::Embed {
                application,
                cartridge,
                action: EmbedAction::Add,
            } => format!("add embedded cartridge \"{cartridge}\" to application \"{application}\""),
            RequestKind::Embed {
                application,
                cartridge,
                action: EmbedAction::Remove,
            } => format!(
                "remove embedded cartridge \"{cartridge}\" from application \"{application}\""
            ),
        }
    }

    /// Serialises the JSON payload carried in the envelope's `json_data`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let rhlogin = self.login.as_str();
        let debug = flag(self.debug);
        match &self.kind {
            RequestKind::UserInfo => serde_json::to_string(&UserInfoPayload { rhlogin, debug }),
            RequestKind::ListCartridges { kind } => serde_json::to_string(&CartListPayload {
                rhlogin,
                debug,
                cart_type: kind.as_str(),
            }),
            RequestKind::Domain {
                namespace,
                ssh_key,
                alter,
            } => serde_json::to_string(&DomainPayload {
                rhlogin,
                debug,
                namespace: namespace.as_str(),
                alter: flag(*alter),
                ssh: ssh_key.key(),
                key_type: ssh_key.key_type().as_str(),
                delete: flag(false),
            }),
            RequestKind::Application {
                name,
                cartridge,
                action,
            } => serde_json::to_string(&CartridgePayload {
                rhlogin,
                debug,
                cartridge: cartridge.as_str(),
                action: action.command(),
                app_name: name.as_str(),
            }),
            RequestKind::Embed {
                application,
                cartridge,
                action,
            } => serde_json::to_string(&CartridgePayload {
                rhlogin,
                debug,
                cartridge: cartridge.as_str(),
                action: action.command(),
                app_name: application.as_str(),
            }),
        }
    }
}

/// The broker expects booleans as the strings `"true"` / `"false"`.
fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

// Field order below is the order on the wire.

#[derive(Serialize)]
struct UserInfoPayload<'a> {
    rhlogin: &'a str,
    debug: &'static str,
}

#[derive(Serialize)]
struct CartListPayload<'a> {
    rhlogin: &'a str,
    debug: &'static str,
    cart_type: &'static str,
}

#[derive(Serialize)]
struct DomainPayload<'a> {
    rhlogin: &'a str,
    debug: &'static str,
    namespace: &'a str,
    alter: &'static str,
    ssh: &'a str,
    key_type: &'static str,
    delete: &'static str,
}

#[derive(Serialize)]
struct CartridgePayload<'a> {
    rhlogin: &'a str,
    debug: &'static str,
    cartridge: &'a str,
    action: &'static str,
    app_name: &'a str,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Envelope, SshKeyType};

    const RHLOGIN: &str = "toolsjboss@gmail.com";
    const PASSWORD: &str = "1q2w3e";
    const SSH_KEY: &str = "AAAAB3NzaC1yc2EAAAADAQABAAABAQC+/test==";

    fn login() -> Login {
        Login::new(RHLOGIN).unwrap()
    }

    fn ssh_key() -> SshPublicKey {
        SshPublicKey::new(SshKeyType::Rsa, SSH_KEY).unwrap()
    }

    fn expected_domain_body(alter: bool) -> String {
        let payload = format!(
            r#"{{"rhlogin":"{RHLOGIN}","debug":"true","namespace":"myDomain","alter":"{alter}","ssh":"{SSH_KEY}","key_type":"ssh-rsa","delete":"false"}}"#
        );
        let encoded: String = url::form_urlencoded::byte_serialize(payload.as_bytes()).collect();
        format!("password={PASSWORD}&json_data={encoded}")
    }

    #[test]
    fn create_domain_envelope_matches_wire_format() {
        let namespace = Namespace::new("myDomain").unwrap();
        let request = Request::create_domain(login(), namespace, ssh_key());
        let json = request.to_json().unwrap();
        assert_eq!(Envelope::new(PASSWORD, &json).encode(), expected_domain_body(false));
    }

    #[test]
    fn change_domain_differs_only_in_alter_flag() {
        let namespace = Namespace::new("myDomain").unwrap();
        let request = Request::change_domain(login(), namespace, ssh_key());
        let json = request.to_json().unwrap();
        assert_eq!(Envelope::new(PASSWORD, &json).encode(), expected_domain_body(true));
    }

    #[test]
    fn application_payload_names_action_and_app() {
        let request = Request::application(
            login(),
            ApplicationName::new("myapp").unwrap(),
            CartridgeName::new("jbossas-7.0").unwrap(),
            ApplicationAction::Start,
        )
        .with_debug(false);
        assert_eq!(
            request.to_json().unwrap(),
            format!(
                r#"{{"rhlogin":"{RHLOGIN}","debug":"false","cartridge":"jbossas-7.0","action":"start","app_name":"myapp"}}"#
            )
        );
    }

    #[test]
    fn embed_payload_carries_embedded_cartridge() {
        let request = Request::embed(
            login(),
            ApplicationName::new("myapp").unwrap(),
            CartridgeName::new("mysql-5.1").unwrap(),
            EmbedAction::Add,
        );
        assert_eq!(
            request.to_json().unwrap(),
            format!(
                r#"{{"rhlogin":"{RHLOGIN}","debug":"true","cartridge":"mysql-5.1","action":"configure","app_name":"myapp"}}"#
            )
        );
        assert_eq!(request.path(), "embed_cartridge");
    }

    #[rstest]
    #[case::standalone(CartridgeKind::Standalone, "standalone")]
    #[case::embedded(CartridgeKind::Embedded, "embedded")]
    fn cartlist_payload_names_cart_type(#[case] kind: CartridgeKind, #[case] wire: &str) {
        let request = Request::list_cartridges(login(), kind);
        assert_eq!(
            request.to_json().unwrap(),
            format!(r#"{{"rhlogin":"{RHLOGIN}","debug":"true","cart_type":"{wire}"}}"#)
        );
        assert!(!request.checks_credentials());
    }

    #[test]
    fn url_is_joined_below_service_path() {
        let request = Request::user_info(login());
        assert_eq!(
            request.url("https://openshift.redhat.com/broker/"),
            "https://openshift.redhat.com/broker/userinfo"
        );
        assert!(request.checks_credentials());
    }

    #[rstest]
    #[case::start(ApplicationAction::Start, "start application \"myapp\"")]
    #[case::create(ApplicationAction::Configure, "create application \"myapp\"")]
    #[case::destroy(ApplicationAction::Deconfigure, "destroy application \"myapp\"")]
    #[case::status(ApplicationAction::Status, "get status of application \"myapp\"")]
    fn describes_application_actions(#[case] action: ApplicationAction, #[case] expected: &str) {
        let request = Request::application(
            login(),
            ApplicationName::new("myapp").unwrap(),
            CartridgeName::new("php-5.3").unwrap(),
            action,
        );
        assert_eq!(request.describe(), expected);
    }

    #[test]
    fn status_requests_expect_a_status_string() {
        let request = Request::application(
            login(),
            ApplicationName::new("myapp").unwrap(),
            CartridgeName::new("php-5.3").unwrap(),
            ApplicationAction::Status,
        );
        assert_eq!(request.response_shape(), ResponseShape::Status);
    }
}
