use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

/// Configuration for the query client.
///
/// An explicit value threaded through client construction; the library
/// keeps no ambient global configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base directory for index and methylome storage.
    pub config_dir: PathBuf,

    /// Remote query server host; its presence selects the remote backend.
    pub hostname: Option<String>,

    /// Remote query server port.
    pub port: Option<u16>,

    /// Overrides the genome index storage location.
    pub index_dir: Option<PathBuf>,

    /// Overrides the methylome storage location.
    pub methylome_dir: Option<PathBuf>,
}

/// Which backend a configuration selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Local,
    Remote { hostname: String, port: u16 },
}

impl Backend {
    /// Pure function of the configured remote endpoint; never affects the
    /// query or aggregation algorithms.
    pub fn select(config: &ClientConfig) -> Backend {
        match (&config.hostname, config.port) {
            (Some(hostname), Some(port)) => Backend::Remote {
                hostname: hostname.clone(),
                port,
            },
            _ => Backend::Local,
        }
    }
}

impl ClientConfig {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_remote(
        mut self,
        hostname: impl Into<String>,
        port: u16,
    ) -> Self {
        self.hostname = Some(hostname.into());
        self.port = Some(port);
        self
    }

    pub fn with_index_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    pub fn with_methylome_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.methylome_dir = Some(dir.into());
        self
    }

    /// Genome index storage location, defaulting under `config_dir`.
    pub fn index_dir(&self) -> PathBuf {
        self.index_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("indexes"))
    }

    /// Methylome storage location, defaulting under `config_dir`.
    pub fn methylome_dir(&self) -> PathBuf {
        self.methylome_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("methylomes"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}
