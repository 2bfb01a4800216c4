//! Caller-side handle for one application.

use protocol::{
    ApplicationInfo, ApplicationName, CartridgeName, DomainInfo, EmbeddedCartridge, Login,
};

/// An application as known to the caller.
///
/// `info` is filled only by an explicit
/// [`crate::ExpressService::load_application_info`]; nothing is fetched
/// behind the caller's back.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    name: ApplicationName,
    cartridge: CartridgeName,
    owner: Login,
    info: Option<ApplicationInfo>,
    embedded: Vec<EmbeddedCartridge>,
}

impl Application {
    /// Creates a handle with no fetched info.
    pub fn new(name: ApplicationName, cartridge: CartridgeName, owner: Login) -> Self {
        Self {
            name,
            cartridge,
            owner,
            info: None,
            embedded: Vec::new(),
        }
    }

    /// Creates a handle from a broker record already fetched for `owner`.
    pub fn from_info(info: ApplicationInfo, owner: Login) -> Self {
        let mut application = Self::new(info.name.clone(), info.cartridge.clone(), owner);
        application.set_info(info);
        application
    }

    /// Application name.
    pub fn name(&self) -> &ApplicationName {
        &self.name
    }

    /// Framework cartridge.
    pub fn cartridge(&self) -> &CartridgeName {
        &self.cartridge
    }

    /// Login of the owning user.
    pub fn owner(&self) -> &Login {
        &self.owner
    }

    /// Broker record, once loaded.
    pub fn info(&self) -> Option<&ApplicationInfo> {
        self.info.as_ref()
    }

    /// Embedded cartridges known to this handle.
    pub fn embedded(&self) -> &[EmbeddedCartridge] {
        &self.embedded
    }

    /// The embedded cartridge named `name`, if known.
    pub fn embedded_cartridge(&self, name: &CartridgeName) -> Option<&EmbeddedCartridge> {
        self.embedded.iter().find(|cart| &cart.name == name)
    }

    /// `https://<name>-<namespace>.<rhc_domain>/`, when the domain's DNS
    /// suffix is known.
    pub fn application_url(&self, domain: &DomainInfo) -> Option<String> {
        Some(format!("https://{}/", self.host(domain)?))
    }

    /// `ssh://<uuid>@<name>-<namespace>.<rhc_domain>/~/git/<name>.git/`.
    /// Requires loaded info for the uuid.
    pub fn git_url(&self, domain: &DomainInfo) -> Option<String> {
        let uuid = &self.info.as_ref()?.uuid;
        Some(format!(
            "ssh://{uuid}@{}/~/git/{}.git/",
            self.host(domain)?,
            self.name
        ))
    }

    fn host(&self, domain: &DomainInfo) -> Option<String> {
        let rhc_domain = domain.rhc_domain.as_deref()?;
        Some(format!("{}-{}.{rhc_domain}", self.name, domain.namespace))
    }

    /// Replaces the fetched record; its embedded cartridges replace the
    /// handle's, keeping creation logs already recorded.
    pub(crate) fn set_info(&mut self, info: ApplicationInfo) {
        let embedded = info
            .embedded
            .iter()
            .cloned()
            .map(|mut cart| {
                if let Some(known) = self.embedded_cartridge(&cart.name) {
                    cart.creation_log.clone_from(&known.creation_log);
                }
                cart
            })
            .collect();
        self.embedded = embedded;
        self.info = Some(info);
    }

    pub(crate) fn add_embedded(&mut self, cartridge: EmbeddedCartridge) {
        self.embedded.retain(|cart| cart.name != cartridge.name);
        self.embedded.push(cartridge);
    }

    pub(crate) fn remove_embedded(&mut self, name: &CartridgeName) {
        self.embedded.retain(|cart| &cart.name != name);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use protocol::{BrokerUuid, Namespace, Timestamp};

    use super::*;

    fn domain(rhc_domain: Option<&str>) -> DomainInfo {
        DomainInfo {
            namespace: Namespace::new("foobar").unwrap(),
            rhc_domain: rhc_domain.map(str::to_owned),
            owner: Login::new("me@example.com").unwrap(),
            owner_uuid: BrokerUuid::new("0c82860dae904a4d87f8e5d87a5af840").unwrap(),
        }
    }

    fn application() -> Application {
        Application::new(
            ApplicationName::new("myapp").unwrap(),
            CartridgeName::new("jbossas-7.0").unwrap(),
            Login::new("me@example.com").unwrap(),
        )
    }

    fn info(embedded: Vec<EmbeddedCartridge>) -> ApplicationInfo {
        ApplicationInfo {
            name: ApplicationName::new("myapp").unwrap(),
            uuid: BrokerUuid::new("9fc1").unwrap(),
            cartridge: CartridgeName::new("jbossas-7.0").unwrap(),
            creation_time: Timestamp::parse_broker("2011-11-09T04:58:40-05:00").unwrap(),
            embedded,
        }
    }

    #[test]
    fn application_url_uses_namespace_and_dns_suffix() {
        assert_eq!(
            application().application_url(&domain(Some("rhcloud.com"))).as_deref(),
            Some("https://myapp-foobar.rhcloud.com/")
        );
        assert_eq!(application().application_url(&domain(None)), None);
    }

    #[test]
    fn git_url_requires_loaded_info() {
        let mut app = application();
        assert_eq!(app.git_url(&domain(Some("rhcloud.com"))), None);

        app.set_info(info(Vec::new()));
        assert_eq!(
            app.git_url(&domain(Some("rhcloud.com"))).as_deref(),
            Some("ssh://9fc1@myapp-foobar.rhcloud.com/~/git/myapp.git/")
        );
    }

    #[test]
    fn handle_built_from_info_carries_record() {
        let mysql = EmbeddedCartridge {
            name: CartridgeName::new("mysql-5.1").unwrap(),
            info: None,
            creation_log: None,
        };
        let app = Application::from_info(
            info(vec![mysql.clone()]),
            Login::new("me@example.com").unwrap(),
        );

        assert_eq!(app.name().as_str(), "myapp");
        assert_eq!(app.cartridge().as_str(), "jbossas-7.0");
        assert_eq!(app.embedded(), &[mysql][..]);
        assert_eq!(app.info().map(|i| i.uuid.as_str()), Some("9fc1"));
    }

    #[test]
    fn loaded_info_keeps_known_creation_logs() {
        let mysql = CartridgeName::new("mysql-5.1").unwrap();
        let mut app = application();
        app.add_embedded(EmbeddedCartridge {
            name: mysql.clone(),
            info: None,
            creation_log: Some("Root Password: secret".to_owned()),
        });

        app.set_info(info(vec![EmbeddedCartridge {
            name: mysql.clone(),
            info: Some("Connection URL: mysql://127.1.1.1:3306/".to_owned()),
            creation_log: None,
        }]));

        let cart = app.embedded_cartridge(&mysql).unwrap();
        assert_eq!(cart.info.as_deref(), Some("Connection URL: mysql://127.1.1.1:3306/"));
        assert_eq!(cart.creation_log.as_deref(), Some("Root Password: secret"));

        app.remove_embedded(&mysql);
        assert!(app.embedded().is_empty());
    }
}
