//! `express.conf` loading.
//!
//! The file is a flat properties list:
//!
//! ```text
//! # comment
//! default_rhlogin='me@example.com'
//! libra_server=openshift.redhat.com
//! ```
//!
//! Values are layered: built-in defaults, then the system file, then the
//! user file. Later layers override earlier ones key by key.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Broker host used when no configuration names one.
pub const DEFAULT_LIBRA_SERVER: &str = "openshift.redhat.com";

/// Platform DNS suffix used when no configuration names one.
pub const DEFAULT_LIBRA_DOMAIN: &str = "rhcloud.com";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/openshift/express.conf";

const KEY_DEFAULT_RHLOGIN: &str = "default_rhlogin";
const KEY_LIBRA_SERVER: &str = "libra_server";
const KEY_LIBRA_DOMAIN: &str = "libra_domain";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file exists but could not be read.
    #[error("could not read configuration file \"{path}\": {source}")]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Effective client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressConfiguration {
    default_rhlogin: Option<String>,
    libra_server: String,
    libra_domain: String,
}

impl Default for ExpressConfiguration {
    fn default() -> Self {
        Self {
            default_rhlogin: None,
            libra_server: DEFAULT_LIBRA_SERVER.to_owned(),
            libra_domain: DEFAULT_LIBRA_DOMAIN.to_owned(),
        }
    }
}

impl ExpressConfiguration {
    /// Loads the system file and then the user file
    /// (`~/.openshift/express.conf`) over the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
        if let Some(user_path) = user_config_path() {
            paths.push(user_path);
        }
        Self::load_from(&paths)
    }

    /// Loads `paths` in order over the built-in defaults. Missing files are
    /// skipped.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in paths {
            match read_optional(path)? {
                Some(text) => {
                    tracing::debug!(path = %path.display(), "applying configuration file");
                    config.apply(&parse_properties(&text));
                }
                None => tracing::debug!(path = %path.display(), "configuration file not present"),
            }
        }
        Ok(config)
    }

    /// Overrides keys present in `properties`.
    fn apply(&mut self, properties: &BTreeMap<String, String>) {
        if let Some(login) = properties.get(KEY_DEFAULT_RHLOGIN) {
            self.default_rhlogin = Some(login.clone()).filter(|l| !l.is_empty());
        }
        if let Some(server) = properties.get(KEY_LIBRA_SERVER).filter(|s| !s.is_empty()) {
            self.libra_server = server.clone();
        }
        if let Some(domain) = properties.get(KEY_LIBRA_DOMAIN).filter(|d| !d.is_empty()) {
            self.libra_domain = domain.clone();
        }
    }

    /// Login to use when none is given explicitly.
    pub fn default_rhlogin(&self) -> Option<&str> {
        self.default_rhlogin.as_deref()
    }

    /// Base URL of the platform, `https://` prepended unless a scheme is
    /// already present.
    pub fn libra_server(&self) -> String {
        with_scheme(&self.libra_server)
    }

    /// Platform DNS suffix of application host names.
    pub fn libra_domain(&self) -> &str {
        &self.libra_domain
    }
}

/// `~/.openshift/express.conf`, if a home directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".openshift").join("express.conf"))
}

/// Prepends `https://` to `server` unless it already names a scheme.
pub fn with_scheme(server: &str) -> String {
    if server.contains("://") {
        server.to_owned()
    } else {
        format!("https://{server}")
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Read {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Parses `key=value` lines. Blank lines and `#` comments are ignored;
/// surrounding whitespace and one pair of single quotes are stripped.
fn parse_properties(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), strip_quotes(value.trim()).to_owned()))
        .collect()
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn parses_properties_with_comments_and_quotes() {
        let properties = parse_properties(concat!(
            "# Default user login\n",
            "default_rhlogin='me@example.com'\n",
            "\n",
            "  libra_server = stg.openshift.example \n",
            "not a property\n",
        ));
        assert_eq!(
            properties.get("default_rhlogin").map(String::as_str),
            Some("me@example.com")
        );
        assert_eq!(
            properties.get("libra_server").map(String::as_str),
            Some("stg.openshift.example")
        );
        assert_eq!(properties.len(), 2);
    }

    #[test]
    fn defaults_apply_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            ExpressConfiguration::load_from(&[dir.path().join("express.conf")]).unwrap();
        assert_eq!(config, ExpressConfiguration::default());
        assert_eq!(config.libra_server(), "https://openshift.redhat.com");
        assert_eq!(config.libra_domain(), "rhcloud.com");
        assert_eq!(config.default_rhlogin(), None);
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let system = dir.path().join("system.conf");
        let user = dir.path().join("user.conf");
        std::fs::write(
            &system,
            "libra_server=system.example\ndefault_rhlogin=system@example.com\n",
        )
        .unwrap();
        std::fs::write(&user, "default_rhlogin='user@example.com'\n").unwrap();

        let config = ExpressConfiguration::load_from(&[system, user]).unwrap();

        assert_eq!(config.libra_server(), "https://system.example");
        assert_eq!(config.default_rhlogin(), Some("user@example.com"));
        assert_eq!(config.libra_domain(), DEFAULT_LIBRA_DOMAIN);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let error = ExpressConfiguration::load_from(&[path.clone()]).unwrap_err();
        assert!(matches!(error, ConfigError::Read { path: ref failed, .. } if *failed == path));
    }

    #[rstest]
    #[case::bare_host("openshift.redhat.com", "https://openshift.redhat.com")]
    #[case::https("https://openshift.redhat.com", "https://openshift.redhat.com")]
    #[case::http("http://localhost:8080", "http://localhost:8080")]
    fn prepends_scheme_when_missing(#[case] server: &str, #[case] expected: &str) {
        assert_eq!(with_scheme(server), expected);
    }
}
