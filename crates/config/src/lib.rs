//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults (`data/raw`, `data/intermediate`, no source URL)
//! 2. `sluice.toml` in the platform configuration directory
//! 3. `sluice.toml` in the working directory (or its parents)
//! 4. An explicit `--config` file, when given
//! 5. The legacy `GITHUB_DATA_URL` environment variable (as `source_url`)
//! 6. `SLUICE_*` environment variables (`SLUICE_SOURCE_URL`, `SLUICE_RAW_DIR`,
//!    `SLUICE_INTERMEDIATE_DIR`)
//!
//! A `.env` file in the working directory is loaded into the process
//! environment by [`load_dotenv`] before the environment layers are read.
//!
//! The loaded [`Config`] is only ever handed to the other crates as explicit
//! values ([`Config::fetch`], [`Config::pipeline`]); none of them read the
//! environment themselves.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sluice_fetch::FetchConfig;
use sluice_pipeline::{DEFAULT_INTERMEDIATE_DIR, DEFAULT_RAW_DIR, HeaderPolicy, PipelineConfig};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "sluice.toml";
pub const ENV_PREFIX: &str = "SLUICE_";
/// Kept so existing `.env` files from earlier deployments still work.
pub const LEGACY_URL_VAR: &str = "GITHUB_DATA_URL";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: Option<String>,
    pub raw_dir: PathBuf,
    pub intermediate_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: None,
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            intermediate_dir: PathBuf::from(DEFAULT_INTERMEDIATE_DIR),
        }
    }
}

impl Config {
    /// Load `.env`, then extract the full layered configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        load_dotenv();
        Self::figment(explicit)?.extract().or_raise(|| ErrorKind::Invalid)
    }

    /// Build the provider stack without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dirs) = ProjectDirs::from("", "", "sluice") {
            figment = figment.merge(Toml::file(dirs.config_dir().join(CONFIG_FILE)));
        }
        figment = figment.merge(Toml::file(CONFIG_FILE));
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment
            .merge(Env::raw().only(&[LEGACY_URL_VAR]).map(|_| "source_url".into()))
            .merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Command-line override for the source URL; `None` keeps the loaded one.
    #[must_use]
    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.source_url = url;
        }
        self
    }

    pub fn fetch(&self) -> FetchConfig {
        FetchConfig { source_url: self.source_url.clone(), raw_dir: self.raw_dir.clone() }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            raw_dir: self.raw_dir.clone(),
            intermediate_dir: self.intermediate_dir.clone(),
            header_policy: HeaderPolicy::FirstRecord,
        }
    }
}

/// Load `.env` from the working directory (or its parents) into the process
/// environment. A missing file is normal; anything else is logged and ignored.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => tracing::trace!("No .env file found"),
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn extract(explicit: Option<&Path>) -> figment::Result<Config> {
        Config::figment(explicit).expect("figment to build").extract()
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = extract(None)?;
            assert_eq!(config, Config::default());
            assert_eq!(config.source_url, None);
            assert_eq!(config.raw_dir, Path::new("data/raw"));
            Ok(())
        });
    }

    #[test]
    fn test_working_directory_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                source_url = "https://example.com/data.zip"
                intermediate_dir = "out/interim"
                "#,
            )?;
            let config = extract(None)?;
            assert_eq!(config.source_url.as_deref(), Some("https://example.com/data.zip"));
            assert_eq!(config.intermediate_dir, Path::new("out/interim"));
            assert_eq!(config.raw_dir, Path::new("data/raw"));
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_files() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, r#"raw_dir = "from/file""#)?;
            jail.set_env("SLUICE_RAW_DIR", "from/env");
            let config = extract(None)?;
            assert_eq!(config.raw_dir, Path::new("from/env"));
            Ok(())
        });
    }

    #[test]
    fn test_legacy_url_variable() {
        Jail::expect_with(|jail| {
            jail.set_env(LEGACY_URL_VAR, "https://github.com/o/r/raw/main/a.tgz");
            let config = extract(None)?;
            assert_eq!(config.source_url.as_deref(), Some("https://github.com/o/r/raw/main/a.tgz"));
            assert_eq!(config.fetch().source_url, config.source_url);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_url_beats_legacy() {
        Jail::expect_with(|jail| {
            jail.set_env(LEGACY_URL_VAR, "https://legacy.example/a.zip");
            jail.set_env("SLUICE_SOURCE_URL", "https://new.example/b.zip");
            let config = extract(None)?;
            assert_eq!(config.source_url.as_deref(), Some("https://new.example/b.zip"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", r#"raw_dir = "elsewhere/raw""#)?;
            let config = extract(Some(Path::new("custom.toml")))?;
            assert_eq!(config.raw_dir, Path::new("elsewhere/raw"));
            assert_eq!(config.pipeline().raw_dir, Path::new("elsewhere/raw"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        Jail::expect_with(|_jail| {
            let err = Config::figment(Some(Path::new("absent.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::MissingFile(_)));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "raw_dir = [1, 2")?;
            assert!(extract(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_load_keeps_figment_error_as_cause() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "raw_dir = [1, 2]")?;
            let err = Config::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid));
            assert!(format!("{err:?}").contains("raw_dir"));
            Ok(())
        });
    }

    #[test]
    fn test_cli_override() {
        let config = Config { source_url: Some("https://a.example/x.zip".to_string()), ..Config::default() };
        assert_eq!(config.clone().with_source_url(None), config);
        let overridden = config.with_source_url(Some("https://b.example/y.zip".to_string()));
        assert_eq!(overridden.source_url.as_deref(), Some("https://b.example/y.zip"));
    }
}
