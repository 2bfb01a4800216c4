//! Human-readable rendering of broker results.

use client::Application;
use protocol::{CartridgeInfo, DomainInfo, EmbeddedCartridge, UserInfo};

/// Account summary followed by one block per application.
pub fn user_info(info: &UserInfo) -> String {
    let mut out = String::from("User Info\n=========\n");
    out.push_str(&format!("  rhlogin: {}\n", info.login));
    out.push_str(&format!("  uuid: {}\n", info.uuid));
    match &info.domain {
        Some(domain) => {
            out.push_str(&format!("  namespace: {}\n", domain.namespace));
            if let Some(rhc_domain) = &domain.rhc_domain {
                out.push_str(&format!("  rhc_domain: {rhc_domain}\n"));
            }
        }
        None => out.push_str("  namespace: (none)\n"),
    }
    if let Some(key) = &info.ssh_key {
        out.push_str(&format!("  ssh key type: {}\n", key.key_type().as_str()));
    }

    out.push_str("\nApplication Info\n================\n");
    if info.applications.is_empty() {
        out.push_str("  (none)\n");
    }
    for record in &info.applications {
        out.push_str(&format!("{}\n", record.name));
        out.push_str(&format!("  Framework: {}\n", record.cartridge));
        out.push_str(&format!("  Creation: {}\n", record.creation_time));
        out.push_str(&format!("  UUID: {}\n", record.uuid));

        let app = Application::from_info(record.clone(), info.login.clone());
        if let Some(domain) = &info.domain {
            if let Some(url) = app.git_url(domain) {
                out.push_str(&format!("  Git URL: {url}\n"));
            }
            if let Some(url) = app.application_url(domain) {
                out.push_str(&format!("  Public URL: {url}\n"));
            }
        }
        for cart in app.embedded() {
            match &cart.info {
                Some(text) => out.push_str(&format!("  Embedded: {} - {text}\n", cart.name)),
                None => out.push_str(&format!("  Embedded: {}\n", cart.name)),
            }
        }
    }
    out
}

/// One cartridge name per line.
pub fn cartridges(carts: &[CartridgeInfo]) -> String {
    carts.iter().map(|cart| format!("{}\n", cart.name)).collect()
}

/// Domain summary with the DNS suffix applications live under.
pub fn domain(domain: &DomainInfo) -> String {
    let mut out = format!("Domain \"{}\" (owner {})\n", domain.namespace, domain.owner);
    if let Some(rhc_domain) = &domain.rhc_domain {
        out.push_str(&format!(
            "  Applications will be reachable below {}.{rhc_domain}\n",
            domain.namespace
        ));
    }
    out
}

/// Confirmation of a created application, with its public URL when known.
pub fn created_application(app: &Application, domain: Option<&DomainInfo>) -> String {
    let mut out = format!("Created application \"{}\" ({})\n", app.name(), app.cartridge());
    if let Some(url) = domain.and_then(|d| app.application_url(d)) {
        out.push_str(&format!("  Public URL: {url}\n"));
    }
    out
}

/// Confirmation of an embed, followed by the indented creation log.
pub fn embedded(application: &str, cart: &EmbeddedCartridge) -> String {
    let mut out = format!("Embedded \"{}\" into \"{application}\"\n", cart.name);
    if let Some(log) = &cart.creation_log {
        for line in log.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    out
}
