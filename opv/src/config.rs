use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use opv_fs::{self as fs, FsError};
use opv_machine::MachineResolver;
use opv_release::{DEFAULT_BASE_URL, DEFAULT_CONVERTER, HttpTimeouts, ReleaseOptions};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const CONFIG_ENV: &str = "OPV_CONFIG";
pub const CONFIG_FILE: &str = "opv.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found at: {0}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Read(#[from] FsError),

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid release.base_url '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base directory holding `deploy-scripts/`.
    pub scripts_dir: PathBuf,
    /// Root of the local mirrors the provisioning step syncs into.
    pub reposync_dir: PathBuf,
    pub release: ReleaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("/usr/share/ovirt-patch-verifier"),
            reposync_dir: PathBuf::from("/var/lib/lago/opv/reposync"),
            release: ReleaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub extract_timeout_secs: u64,
    pub converter: PathBuf,
    pub output_dir: Option<PathBuf>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            extract_timeout_secs: 60,
            converter: PathBuf::from(DEFAULT_CONVERTER),
            output_dir: None,
        }
    }
}

impl Config {
    /// Load from `explicit`, else `$OPV_CONFIG`, else `./opv.toml`. Falls back
    /// to defaults when none of those is given and `./opv.toml` is absent.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match discover_path(explicit, std::env::var_os(CONFIG_ENV), &cwd)? {
            Some(path) => Self::load_file(&path).await,
            None => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub async fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let string = fs::read_file_to_string(path).await?;
        let config = Self::parse(&string, path)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn parse(string: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(string).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn machine_resolver(&self) -> MachineResolver {
        MachineResolver::new(&self.scripts_dir)
    }

    pub fn release_options(&self) -> Result<ReleaseOptions, ConfigError> {
        let ReleaseConfig {
            base_url,
            connect_timeout_secs,
            request_timeout_secs,
            extract_timeout_secs,
            converter,
            output_dir,
        } = &self.release;

        let url = Url::parse(base_url).map_err(|source| ConfigError::BaseUrl {
            url: base_url.clone(),
            source,
        })?;

        let mut options = ReleaseOptions::new(url);
        options.timeouts = HttpTimeouts {
            connect: Duration::from_secs(*connect_timeout_secs),
            request: Duration::from_secs(*request_timeout_secs),
        };
        options.converter = converter.clone();
        options.extract_timeout = Duration::from_secs(*extract_timeout_secs);
        if let Some(dir) = output_dir {
            options.output_dir = dir.clone();
        }
        Ok(options)
    }

    /// Local mirror for one distribution and release, e.g. `<reposync_dir>/el7-master`.
    pub fn reposync_path(&self, dist: &str, release: &str) -> PathBuf {
        self.reposync_dir.join(format!("{dist}-{release}"))
    }
}

fn discover_path(
    explicit: Option<&Path>,
    env: Option<OsString>,
    cwd: &Path,
) -> Result<Option<PathBuf>, ConfigError> {
    let requested = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.filter(|value| !value.is_empty()).map(PathBuf::from));

    if let Some(path) = requested {
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::NotFound(path))
        };
    }

    let path = cwd.join(CONFIG_FILE);
    Ok(path.exists().then_some(path))
}
