use std::fs;
use std::io;
use std::time::Duration;

use chord_core::consts::DEFAULT_MAX_LOOKUP_HOPS;
use chord_core::consts::DEFAULT_STABILIZE_INTERVAL_SECS;
use chord_core::consts::DEFAULT_SUCCESSOR_LIST_SIZE;
use chord_core::dht::RingConfig;
use chord_rpc::ClientConfig;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::logging::LogLevel;
use crate::util::ensure_parent_dir;
use crate::util::expand_home;

pub const DEFAULT_RPC_ADDR: &str = "127.0.0.1:8011";
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_NAMESERVER: &str = "127.0.0.1:8000";
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_CONFIG_PATH: &str = "~/.chord/config.yaml";

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Listen address of the ring JSON-RPC server.
    pub rpc_addr: String,
    /// Listen address of the key/value front end.
    pub http_addr: String,
    /// Address advertised to other nodes, the node id is derived from it.
    /// Defaults to `rpc_addr`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_address: Option<String>,
    /// `host:port` of the membership nameserver. Without one the node starts alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameserver: Option<String>,
    pub stabilize_interval: u64,
    pub rpc_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub successor_list_size: usize,
    pub max_lookup_hops: usize,
    #[serde(default)]
    pub announce_on_join: bool,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_addr: DEFAULT_RPC_ADDR.to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            external_address: None,
            nameserver: Some(DEFAULT_NAMESERVER.to_string()),
            stabilize_interval: DEFAULT_STABILIZE_INTERVAL_SECS,
            rpc_timeout_ms: DEFAULT_RPC_TIMEOUT_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            successor_list_size: DEFAULT_SUCCESSOR_LIST_SIZE,
            max_lookup_hops: DEFAULT_MAX_LOOKUP_HOPS,
            announce_on_join: false,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// The address other nodes dial.
    pub fn advertised_address(&self) -> &str {
        self.external_address.as_deref().unwrap_or(&self.rpc_addr)
    }

    pub fn stabilize_interval(&self) -> Duration {
        Duration::from_secs(self.stabilize_interval)
    }

    pub fn write_fs<P>(&self, path: P) -> Result<String>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        ensure_parent_dir(&path)?;
        let f =
            fs::File::create(path.as_path()).map_err(|e| Error::CreateFileError(e.to_string()))?;
        let f_writer = io::BufWriter::new(f);
        serde_yaml::to_writer(f_writer, self)?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn read_fs<P>(path: P) -> Result<Config>
    where P: AsRef<std::path::Path> {
        let path = expand_home(path)?;
        tracing::debug!("Read config from: {:?}", path);
        let f = fs::File::open(path).map_err(|e| Error::OpenFileError(e.to_string()))?;
        let f_rdr = io::BufReader::new(f);
        Ok(serde_yaml::from_reader(f_rdr)?)
    }
}

impl From<&Config> for RingConfig {
    fn from(config: &Config) -> Self {
        Self {
            successor_list_size: config.successor_list_size,
            max_lookup_hops: config.max_lookup_hops,
            announce_on_join: config.announce_on_join,
        }
    }
}

impl From<&Config> for ClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            call_timeout: Duration::from_millis(config.rpc_timeout_ms),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        }
    }
}
