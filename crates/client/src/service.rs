//! The request dispatcher.
//!
//! Every operation runs the same pipeline: build a [`Request`], marshal its
//! payload, wrap it in an [`Envelope`], POST it once through the
//! [`Transport`], sanitize and unmarshal the body, and classify any failure.
//! Results that the session tracks are recorded in the caller's [`User`].

use std::sync::Arc;

use protocol::{
    classify_transport, endpoint_failure, sanitize, unmarshal, ApplicationAction, ApplicationName,
    ApplicationRecord, CartridgeInfo, CartridgeKind, CartridgeName, ClientIdentity, DomainInfo,
    EmbedAction, EmbeddedCartridge, EndpointCause, Envelope, ExpressError, Namespace, Payload,
    Request, Response, SshPublicKey, Transport, UnmarshalError, UserInfo, SERVICE_PATH,
};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::{Application, User};

/// Client for one broker.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ExpressService {
    base_url: String,
    identity: ClientIdentity,
    default_rhc_domain: Option<String>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ExpressService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressService")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("default_rhc_domain", &self.default_rhc_domain)
            .finish_non_exhaustive()
    }
}

impl ExpressService {
    /// Creates a service for the platform at `base_url`
    /// (e.g. `https://openshift.redhat.com`).
    ///
    /// The URL is not validated here; a malformed URL fails the first
    /// operation with [`ExpressError::Endpoint`].
    pub fn new(
        base_url: impl Into<String>,
        identity: ClientIdentity,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            identity,
            default_rhc_domain: None,
            transport,
        }
    }

    /// Sets the DNS suffix assumed for domains whose responses omit it.
    #[must_use]
    pub fn with_default_rhc_domain(mut self, rhc_domain: impl Into<String>) -> Self {
        self.default_rhc_domain = Some(rhc_domain.into());
        self
    }

    /// `<base>/broker`.
    pub fn service_url(&self) -> String {
        format!("{}{SERVICE_PATH}", self.base_url.trim_end_matches('/'))
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    /// Returns the user's cached info, fetching it first if the cache is
    /// empty.
    pub async fn get_user_info<'u>(
        &self,
        user: &'u mut User,
    ) -> Result<&'u UserInfo, ExpressError> {
        let info = match user.take_user_info() {
            Some(info) => info,
            None => self.fetch_user_info(user).await?,
        };
        Ok(user.set_user_info(info))
    }

    /// Refetches the user's info and replaces the cache.
    pub async fn refresh_user_info<'u>(
        &self,
        user: &'u mut User,
    ) -> Result<&'u UserInfo, ExpressError> {
        let info = self.fetch_user_info(user).await?;
        Ok(user.set_user_info(info))
    }

    /// Checks the user's credentials against the broker.
    ///
    /// Returns `Ok(false)` only when the broker rejects them; any other
    /// failure is propagated.
    pub async fn validate_credentials(&self, user: &User) -> Result<bool, ExpressError> {
        match self.fetch_user_info(user).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_invalid_credentials() => {
                tracing::debug!(login = %user.login(), "credentials rejected");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    async fn fetch_user_info(&self, user: &User) -> Result<UserInfo, ExpressError> {
        let request = Request::user_info(user.login().clone());
        let response = self.dispatch(&request, user.password(), Payload::into_user_info).await?;
        Ok(response.payload)
    }

    // -----------------------------------------------------------------------
    // Cartridges
    // -----------------------------------------------------------------------

    /// Lists the standalone (framework) cartridges.
    pub async fn list_cartridges(&self, user: &User) -> Result<Vec<CartridgeInfo>, ExpressError> {
        self.list(user, CartridgeKind::Standalone).await
    }

    /// Lists the cartridges that can be embedded into an application.
    pub async fn list_embeddable_cartridges(
        &self,
        user: &User,
    ) -> Result<Vec<CartridgeInfo>, ExpressError> {
        self.list(user, CartridgeKind::Embedded).await
    }

    async fn list(
        &self,
        user: &User,
        kind: CartridgeKind,
    ) -> Result<Vec<CartridgeInfo>, ExpressError> {
        let request = Request::list_cartridges(user.login().clone(), kind);
        let response = self.dispatch(&request, user.password(), Payload::into_cartridges).await?;
        Ok(response.payload)
    }

    // -----------------------------------------------------------------------
    // Domain
    // -----------------------------------------------------------------------

    /// Creates the user's domain and records it in the session.
    pub async fn create_domain<'u>(
        &self,
        user: &'u mut User,
        namespace: Namespace,
        ssh_key: SshPublicKey,
    ) -> Result<&'u DomainInfo, ExpressError> {
        let request = Request::create_domain(user.login().clone(), namespace, ssh_key);
        self.domain(user, request).await
    }

    /// Changes the namespace or SSH key of the user's domain and records the
    /// result in the session.
    pub async fn change_domain<'u>(
        &self,
        user: &'u mut User,
        namespace: Namespace,
        ssh_key: SshPublicKey,
    ) -> Result<&'u DomainInfo, ExpressError> {
        let request = Request::change_domain(user.login().clone(), namespace, ssh_key);
        self.domain(user, request).await
    }

    async fn domain<'u>(
        &self,
        user: &'u mut User,
        request: Request,
    ) -> Result<&'u DomainInfo, ExpressError> {
        let mut domain = self
            .dispatch(&request, user.password(), Payload::into_domain)
            .await?
            .payload;
        if domain.rhc_domain.is_none() {
            domain.rhc_domain = user
                .domain()
                .and_then(|known| known.rhc_domain.clone())
                .or_else(|| self.default_rhc_domain.clone());
        }
        Ok(user.set_domain(domain))
    }

    // -----------------------------------------------------------------------
    // Applications
    // -----------------------------------------------------------------------

    /// Creates an application and records it in the session. Drops the
    /// cached user info, which does not list the new application.
    pub async fn create_application(
        &self,
        user: &mut User,
        name: ApplicationName,
        cartridge: CartridgeName,
    ) -> Result<Application, ExpressError> {
        let record = self
            .record(user, &name, &cartridge, ApplicationAction::Configure)
            .await?;
        let application =
            Application::new(record.name, record.cartridge.name, user.login().clone());
        user.add_application(application.clone());
        user.invalidate_user_info();
        Ok(application)
    }

    /// Destroys an application and forgets it in the session.
    pub async fn destroy_application(
        &self,
        user: &mut User,
        name: &ApplicationName,
        cartridge: &CartridgeName,
    ) -> Result<(), ExpressError> {
        let request = Request::application(
            user.login().clone(),
            name.clone(),
            cartridge.clone(),
            ApplicationAction::Deconfigure,
        );
        self.dispatch(&request, user.password(), Ok).await?;
        user.remove_application(name);
        Ok(())
    }

    /// Starts an application.
    pub async fn start_application(
        &self,
        user: &User,
        name: &ApplicationName,
        cartridge: &CartridgeName,
    ) -> Result<ApplicationRecord, ExpressError> {
        self.record(user, name, cartridge, ApplicationAction::Start).await
    }

    /// Stops an application.
    pub async fn stop_application(
        &self,
        user: &User,
        name: &ApplicationName,
        cartridge: &CartridgeName,
    ) -> Result<ApplicationRecord, ExpressError> {
        self.record(user, name, cartridge, ApplicationAction::Stop).await
    }

    /// Restarts an application.
    pub async fn restart_application(
        &self,
        user: &User,
        name: &ApplicationName,
        cartridge: &CartridgeName,
    ) -> Result<ApplicationRecord, ExpressError> {
        self.record(user, name, cartridge, ApplicationAction::Restart).await
    }

    /// Returns the broker's status text for an application, verbatim.
    pub async fn application_status(
        &self,
        user: &User,
        name: &ApplicationName,
        cartridge: &CartridgeName,
    ) -> Result<String, ExpressError> {
        let request = Request::application(
            user.login().clone(),
            name.clone(),
            cartridge.clone(),
            ApplicationAction::Status,
        );
        let response = self.dispatch(&request, user.password(), Payload::into_status).await?;
        Ok(response.payload)
    }

    async fn record(
        &self,
        user: &User,
        name: &ApplicationName,
        cartridge: &CartridgeName,
        action: ApplicationAction,
    ) -> Result<ApplicationRecord, ExpressError> {
        let login = user.login().clone();
        let request = Request::application(login, name.clone(), cartridge.clone(), action);
        let response = self
            .dispatch(&request, user.password(), Payload::into_application)
            .await?;
        Ok(response.payload)
    }

    /// Fills `application` with the broker's record, using the user's cached
    /// info and fetching it only if the cache is empty.
    ///
    /// Fails with [`ExpressError::NotFound`] when the user has no such
    /// application.
    pub async fn load_application_info(
        &self,
        application: &mut Application,
        user: &mut User,
    ) -> Result<(), ExpressError> {
        let info = self.get_user_info(user).await?;
        let record = info.application(application.name()).cloned();
        match record {
            Some(record) => {
                application.set_info(record);
                Ok(())
            }
            None => Err(ExpressError::NotFound {
                url: Request::user_info(user.login().clone()).url(&self.service_url()),
                action: format!("load application \"{}\"", application.name()),
                source: None,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Embedded cartridges
    // -----------------------------------------------------------------------

    /// Embeds `cartridge` into `application` and records it, including the
    /// broker's creation log, in the session.
    pub async fn add_embedded_cartridge(
        &self,
        user: &mut User,
        application: &ApplicationName,
        cartridge: CartridgeName,
    ) -> Result<EmbeddedCartridge, ExpressError> {
        let request = Request::embed(
            user.login().clone(),
            application.clone(),
            cartridge,
            EmbedAction::Add,
        );
        let embedded = self
            .dispatch(&request, user.password(), Payload::into_embedded)
            .await?
            .payload;
        user.record_embedded(application, &embedded);
        Ok(embedded)
    }

    /// Removes `cartridge` from `application` and forgets it in the session.
    pub async fn remove_embedded_cartridge(
        &self,
        user: &mut User,
        application: &ApplicationName,
        cartridge: CartridgeName,
    ) -> Result<(), ExpressError> {
        let request = Request::embed(
            user.login().clone(),
            application.clone(),
            cartridge.clone(),
            EmbedAction::Remove,
        );
        self.dispatch(&request, user.password(), Ok).await?;
        user.forget_embedded(application, &cartridge);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Sends one request and extracts the expected payload.
    ///
    /// Exactly one POST is made. Every failure carries the request URL and
    /// description.
    #[tracing::instrument(
        skip_all,
        fields(action = %request.describe(), url = tracing::field::Empty)
    )]
    async fn dispatch<T>(
        &self,
        request: &Request,
        password: &SecretString,
        extract: fn(Payload) -> Result<T, UnmarshalError>,
    ) -> Result<Response<T>, ExpressError> {
        let action = request.describe();
        let url_text = request.url(&self.service_url());
        tracing::Span::current().record("url", url_text.as_str());

        let fail = |cause: EndpointCause| endpoint_failure(cause, url_text.as_str(), &action);

        let url = Url::parse(&url_text).map_err(|e| fail(e.into()))?;
        let json = request.to_json().map_err(|e| fail(EndpointCause::Request(e)))?;
        let body = Envelope::new(password.expose_secret(), &json).encode();
        tracing::debug!(json_len = json.len(), body_len = body.len(), "encoded request envelope");

        let raw = self
            .transport
            .post(&url, &self.identity.user_agent(), body)
            .await
            .map_err(|e| {
                let checks_credentials = request.checks_credentials();
                classify_transport(e, url_text.as_str(), action.as_str(), checks_credentials)
            })?;

        let parsed = unmarshal(&sanitize(&raw), request.response_shape())
            .and_then(|response| {
                Ok(Response {
                    payload: extract(response.payload)?,
                    diagnostics: response.diagnostics,
                })
            })
            .map_err(|e| fail(e.into()))?;
        tracing::debug!(
            exit_code = parsed.diagnostics.exit_code,
            api = ?parsed.diagnostics.api,
            "broker request completed"
        );
        Ok(parsed)
    }
}
