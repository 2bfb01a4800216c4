//! Caller-held user session.

use protocol::{ApplicationName, CartridgeName, DomainInfo, EmbeddedCartridge, Login, UserInfo};
use secrecy::SecretString;

use crate::Application;

/// Credentials plus everything fetched on the user's behalf.
///
/// The session is owned by the caller and only changed by the
/// [`crate::ExpressService`] operation it is passed to. The password is
/// never logged; `Debug` redacts it.
#[derive(Debug)]
pub struct User {
    login: Login,
    password: SecretString,
    user_info: Option<UserInfo>,
    domain: Option<DomainInfo>,
    applications: Vec<Application>,
}

impl User {
    /// Creates a session with nothing fetched yet.
    pub fn new(login: Login, password: impl Into<SecretString>) -> Self {
        Self {
            login,
            password: password.into(),
            user_info: None,
            domain: None,
            applications: Vec::new(),
        }
    }

    /// The account login.
    pub fn login(&self) -> &Login {
        &self.login
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    /// Cached user info, if fetched.
    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    /// The user's domain, if created, changed or fetched in this session.
    pub fn domain(&self) -> Option<&DomainInfo> {
        self.domain.as_ref()
    }

    /// Applications created or loaded in this session.
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    /// The session's application named `name`, if any.
    pub fn application(&self, name: &ApplicationName) -> Option<&Application> {
        self.applications.iter().find(|app| app.name() == name)
    }

    fn application_mut(&mut self, name: &ApplicationName) -> Option<&mut Application> {
        self.applications.iter_mut().find(|app| app.name() == name)
    }

    /// Caches fetched user info. Its domain, when present, becomes the
    /// session's domain.
    pub(crate) fn set_user_info(&mut self, info: UserInfo) -> &UserInfo {
        if let Some(domain) = &info.domain {
            self.domain = Some(domain.clone());
        }
        self.user_info.insert(info)
    }

    pub(crate) fn take_user_info(&mut self) -> Option<UserInfo> {
        self.user_info.take()
    }

    pub(crate) fn invalidate_user_info(&mut self) {
        self.user_info = None;
    }

    pub(crate) fn set_domain(&mut self, domain: DomainInfo) -> &DomainInfo {
        if let Some(info) = self.user_info.as_mut() {
            info.domain = Some(domain.clone());
        }
        self.domain.insert(domain)
    }

    /// Records an application, replacing any with the same name.
    pub(crate) fn add_application(&mut self, application: Application) {
        self.applications.retain(|app| app.name() != application.name());
        self.applications.push(application);
    }

    /// Forgets one application in both the application list and the cached
    /// user info.
    pub(crate) fn remove_application(&mut self, name: &ApplicationName) {
        self.applications.retain(|app| app.name() != name);
        if let Some(info) = self.user_info.as_mut() {
            info.remove_application(name);
        }
    }

    pub(crate) fn record_embedded(
        &mut self,
        application: &ApplicationName,
        cartridge: &EmbeddedCartridge,
    ) {
        if let Some(app) = self.application_mut(application) {
            app.add_embedded(cartridge.clone());
        }
        if let Some(app) = self
            .user_info
            .as_mut()
            .and_then(|info| info.applications.iter_mut().find(|app| &app.name == application))
        {
            app.embedded.retain(|cart| cart.name != cartridge.name);
            app.embedded.push(cartridge.clone());
        }
    }

    pub(crate) fn forget_embedded(
        &mut self,
        application: &ApplicationName,
        cartridge: &CartridgeName,
    ) {
        if let Some(app) = self.application_mut(application) {
            app.remove_embedded(cartridge);
        }
        if let Some(app) = self
            .user_info
            .as_mut()
            .and_then(|info| info.applications.iter_mut().find(|app| &app.name == application))
        {
            app.embedded.retain(|cart| &cart.name != cartridge);
        }
    }
}

#[cfg(test)]
mod tests {
    use protocol::{ApplicationInfo, BrokerUuid, Namespace, Timestamp};

    use super::*;

    fn login() -> Login {
        Login::new("me@example.com").unwrap()
    }

    fn user_info(apps: &[&str]) -> UserInfo {
        UserInfo {
            login: login(),
            uuid: BrokerUuid::new("0c82860dae904a4d87f8e5d87a5af840").unwrap(),
            domain: Some(DomainInfo {
                namespace: Namespace::new("foobar").unwrap(),
                rhc_domain: Some("rhcloud.com".to_owned()),
                owner: login(),
                owner_uuid: BrokerUuid::new("0c82860dae904a4d87f8e5d87a5af840").unwrap(),
            }),
            ssh_key: None,
            applications: apps
                .iter()
                .map(|name| ApplicationInfo {
                    name: ApplicationName::new(*name).unwrap(),
                    uuid: BrokerUuid::new("9fc1").unwrap(),
                    cartridge: CartridgeName::new("php-5.3").unwrap(),
                    creation_time: Timestamp::parse_broker("2011-11-09T04:58:40-05:00").unwrap(),
                    embedded: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn debug_output_redacts_password() {
        let user = User::new(login(), "hunter2".to_owned());
        assert!(!format!("{user:?}").contains("hunter2"));
    }

    #[test]
    fn fetched_user_info_sets_domain() {
        let mut user = User::new(login(), "pw".to_owned());
        user.set_user_info(user_info(&[]));
        assert_eq!(user.domain().map(|d| d.namespace.as_str()), Some("foobar"));
    }

    #[test]
    fn removing_an_application_leaves_the_others() {
        let mut user = User::new(login(), "pw".to_owned());
        user.set_user_info(user_info(&["one", "two"]));
        for name in ["one", "two"] {
            user.add_application(Application::new(
                ApplicationName::new(name).unwrap(),
                CartridgeName::new("php-5.3").unwrap(),
                login(),
            ));
        }

        user.remove_application(&ApplicationName::new("one").unwrap());

        let remaining: Vec<&str> =
            user.applications().iter().map(|a| a.name().as_str()).collect();
        assert_eq!(remaining, vec!["two"]);
        let cached: Vec<&str> = user
            .user_info()
            .unwrap()
            .applications
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(cached, vec!["two"]);
        assert!(user.domain().is_some());
    }
}
