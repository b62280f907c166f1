//! Service configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use ageverify_analysis::AnalysisConfig;
use ageverify_types::{LivenessParams, VerificationParams};
use ageverify_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Which implementation backs the consistency stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilerKind {
    /// Ask the analysis service.
    #[default]
    Remote,
    /// Compare the records locally with fixed rules.
    Rules,
}

/// Top-level configuration for the verification service.
///
/// Scalars come before the tables so the struct serializes to valid TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Log output format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter (e.g. "info", "debug,ageverify_liveness=trace").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose Prometheus metrics on `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Origins allowed to call the API from a browser. Empty allows any.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub reconciler: ReconcilerKind,

    /// Largest tolerated age difference for the rule reconciler, in years.
    #[serde(default = "default_max_age_gap")]
    pub max_age_gap: u32,

    #[serde(default)]
    pub liveness: LivenessParams,

    #[serde(default)]
    pub verification: VerificationParams,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_listen_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_age_gap() -> u32 {
    ageverify_verification::reconciler::DEFAULT_MAX_AGE_GAP
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, DaemonError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DaemonError> {
        let config: Self = toml::from_str(s).map_err(|e| DaemonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ServiceConfig is always serializable to TOML")
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        self.liveness
            .validate()
            .map_err(|e| DaemonError::Config(format!("[liveness] {e}")))?;
        self.verification
            .validate()
            .map_err(|e| DaemonError::Config(format!("[verification] {e}")))?;
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            enable_metrics: false,
            allowed_origins: Vec::new(),
            reconciler: ReconcilerKind::default(),
            max_age_gap: default_max_age_gap(),
            liveness: LivenessParams::default(),
            verification: VerificationParams::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}
