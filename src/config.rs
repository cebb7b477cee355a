use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medguard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Distinct resolved medications above which a polypharmacy review is advised.
pub const POLYPHARMACY_THRESHOLD: usize = 10;

/// Request size cap, enforced by the HTTP layer only.
pub const MAX_MEDICATIONS_PER_REQUEST: usize = 50;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8085";

const ENV_BIND_ADDR: &str = "MEDGUARD_BIND_ADDR";
const ENV_RESOURCES_DIR: &str = "MEDGUARD_RESOURCES_DIR";
const ENV_LOG: &str = "MEDGUARD_LOG";

/// Fallback tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    std::env::var(ENV_LOG).unwrap_or_else(|_| "info,medguard_lib=debug".to_string())
}

/// Where the knowledge base is (re)loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeSource {
    /// JSON compiled into the binary.
    Embedded,
    /// Directory holding the six JSON source files.
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub knowledge_source: KnowledgeSource,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let raw_addr = lookup(ENV_BIND_ADDR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {ENV_BIND_ADDR} {raw_addr:?}: {e}"))?;

        let knowledge_source = match lookup(ENV_RESOURCES_DIR) {
            Some(dir) if !dir.trim().is_empty() => KnowledgeSource::Directory(PathBuf::from(dir.trim())),
            _ => KnowledgeSource::Embedded,
        };

        Ok(Self {
            bind_addr,
            knowledge_source,
        })
    }
}
