// Client configuration: where the web service lives, how long a single
// call may take and which client flavour (resize / compress) is in use.
//
// The file is TOML with a single `[client]` table:
//
//   [client]
//   webservice = "http://my-service.example.com:8081"
//   timeout_secs = 30
//   variant = "resize"

use crate::error::{ClientError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "client_config.toml";
pub const CONFIG_ENV: &str = "PHOTOAPP_CONFIG";
pub const WEBSERVICE_ENV: &str = "PHOTOAPP_WEBSERVICE";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_BASE_URL_LEN: usize = 16;

/// The two client flavours differ only in wording and in the name of the
/// boolean flag the server reports on each asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientVariant {
    #[default]
    Resize,
    Compress,
}

impl ClientVariant {
    /// Prefix used when prompting for upload dimensions.
    pub fn dimension_label(&self) -> &'static str {
        match self {
            ClientVariant::Resize => "resize",
            ClientVariant::Compress => "target",
        }
    }

    /// Adjective shown next to the asset flag when listing assets.
    pub fn flag_label(&self) -> &'static str {
        match self {
            ClientVariant::Resize => "resized",
            ClientVariant::Compress => "compressed",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    client: ClientSection,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    webservice: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    variant: ClientVariant,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash, e.g. `http://host:8081`.
    pub base_url: String,
    /// Per-call transport timeout.
    pub timeout: Duration,
    pub variant: ClientVariant,
}

impl ClientConfig {
    /// Load and validate the config file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ClientError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ClientError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Parse a config from TOML text. `origin` is only used in error messages.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ClientError::ConfigParse {
            path: origin.to_path_buf(),
            detail: e.to_string(),
        })?;
        let section = file.client;
        Ok(ClientConfig {
            base_url: validate_base_url(&section.webservice)?,
            timeout: Duration::from_secs(section.timeout_secs),
            variant: section.variant,
        })
    }

    /// Replace the base URL with `PHOTOAPP_WEBSERVICE` when it is set.
    pub fn with_env_override(self) -> Result<Self> {
        match std::env::var(WEBSERVICE_ENV) {
            Ok(url) if !url.trim().is_empty() => self.override_base_url(&url),
            _ => Ok(self),
        }
    }

    pub fn override_base_url(mut self, url: &str) -> Result<Self> {
        self.base_url = validate_base_url(url)?;
        Ok(self)
    }

    /// Join an endpoint path such as `/assets` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Check a base URL and normalise it by stripping one trailing `/`.
///
/// Rejects URLs shorter than 16 characters (an empty or placeholder value)
/// and anything starting with `https`, which the service does not speak.
pub fn validate_base_url(raw: &str) -> Result<String> {
    let url = raw.trim();
    if url.len() < MIN_BASE_URL_LEN {
        return Err(ClientError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "is empty or not nearly long enough".into(),
        });
    }
    if url.starts_with("https") {
        return Err(ClientError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "starts with https, which is not supported (use http)".into(),
        });
    }
    Ok(url.strip_suffix('/').unwrap_or(url).to_string())
}

/// Default config location: `client_config.toml` in the working directory,
/// else the same file name under the user's config directory.
pub fn default_config_path() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    default_config_path_in(&cwd, dirs::config_dir().as_deref())
}

/// Same lookup as [`default_config_path`] with explicit directories. When
/// neither candidate exists the working-directory path is returned so the
/// caller reports it as missing.
pub fn default_config_path_in(cwd: &Path, config_dir: Option<&Path>) -> PathBuf {
    let local = cwd.join(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return local;
    }
    config_dir
        .map(|dir| dir.join("photoapp").join(DEFAULT_CONFIG_FILE))
        .filter(|p| p.is_file())
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_trailing_slash() {
        let url = validate_base_url("http://localhost:8081/").unwrap();
        assert_eq!(url, "http://localhost:8081");
    }

    #[test]
    fn rejects_short_url() {
        let err = validate_base_url("http://a").unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
        assert!(err.to_string().contains("not nearly long enough"));
    }

    #[test]
    fn rejects_empty_url() {
        assert!(validate_base_url("   ").is_err());
    }

    #[test]
    fn rejects_https() {
        let err = validate_base_url("https://photoapp.example.com").unwrap_err();
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn parses_minimal_file() {
        let cfg = ClientConfig::from_toml_str(
            "[client]\nwebservice = \"http://photoapp.example.com/\"\n",
            Path::new("inline"),
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://photoapp.example.com");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.variant, ClientVariant::Resize);
        assert_eq!(cfg.url("/assets"), "http://photoapp.example.com/assets");
    }

    #[test]
    fn parses_variant_and_timeout() {
        let cfg = ClientConfig::from_toml_str(
            "[client]\nwebservice = \"http://photoapp.example.com\"\ntimeout_secs = 5\nvariant = \"compress\"\n",
            Path::new("inline"),
        )
        .unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.variant, ClientVariant::Compress);
        assert_eq!(cfg.variant.flag_label(), "compressed");
    }

    #[test]
    fn missing_section_is_parse_error() {
        let err = ClientConfig::from_toml_str("webservice = 1", Path::new("inline")).unwrap_err();
        assert!(matches!(err, ClientError::ConfigParse { .. }));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ClientError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client]").unwrap();
        writeln!(file, "webservice = \"http://10.0.0.12:8081\"").unwrap();
        let cfg = ClientConfig::load(file.path()).unwrap();
        assert_eq!(cfg.base_url, "http://10.0.0.12:8081");
    }

    #[test]
    fn default_path_prefers_working_directory() {
        let cwd = tempfile::tempdir().unwrap();
        let conf = tempfile::tempdir().unwrap();
        fs::create_dir_all(conf.path().join("photoapp")).unwrap();
        fs::write(conf.path().join("photoapp").join(DEFAULT_CONFIG_FILE), "").unwrap();
        fs::write(cwd.path().join(DEFAULT_CONFIG_FILE), "").unwrap();

        let path = default_config_path_in(cwd.path(), Some(conf.path()));
        assert_eq!(path, cwd.path().join(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn default_path_falls_back_to_config_dir() {
        let cwd = tempfile::tempdir().unwrap();
        let conf = tempfile::tempdir().unwrap();
        let expected = conf.path().join("photoapp").join(DEFAULT_CONFIG_FILE);
        fs::create_dir_all(expected.parent().unwrap()).unwrap();
        fs::write(&expected, "").unwrap();

        assert_eq!(default_config_path_in(cwd.path(), Some(conf.path())), expected);
    }

    #[test]
    fn default_path_when_nothing_exists() {
        let cwd = tempfile::tempdir().unwrap();
        let conf = tempfile::tempdir().unwrap();
        let local = cwd.path().join(DEFAULT_CONFIG_FILE);
        assert_eq!(default_config_path_in(cwd.path(), Some(conf.path())), local);
        assert_eq!(default_config_path_in(cwd.path(), None), local);
    }

    #[test]
    fn env_override_replaces_base_url() {
        // Only this test touches the variable.
        let cfg = ClientConfig::from_toml_str(
            "[client]\nwebservice = \"http://photoapp.example.com\"\n",
            Path::new("inline"),
        )
        .unwrap();

        std::env::set_var(WEBSERVICE_ENV, "http://override.example.com:8081/");
        let overridden = cfg.clone().with_env_override();
        std::env::set_var(WEBSERVICE_ENV, "https://override.example.com");
        let rejected = cfg.clone().with_env_override();
        std::env::remove_var(WEBSERVICE_ENV);
        let untouched = cfg.with_env_override();

        assert_eq!(overridden.unwrap().base_url, "http://override.example.com:8081");
        assert!(matches!(rejected, Err(ClientError::InvalidBaseUrl { .. })));
        assert_eq!(untouched.unwrap().base_url, "http://photoapp.example.com");
    }

    #[test]
    fn override_base_url_is_validated() {
        let cfg = ClientConfig::from_toml_str(
            "[client]\nwebservice = \"http://photoapp.example.com\"\n",
            Path::new("inline"),
        )
        .unwrap();
        assert!(cfg.clone().override_base_url("https://secure.example.com").is_err());
        let cfg = cfg.override_base_url("http://other.example.com:9000/").unwrap();
        assert_eq!(cfg.base_url, "http://other.example.com:9000");
    }
}
