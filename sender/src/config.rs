//! Sender configuration file (A2) and payload loading (A3).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use transfer_core::ProposedParameters;

/// The TOML shape of a sender config file. Every field is optional; missing
/// ones fall back to [`ProposedParameters::default`] and a built-in payload
/// path.
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    payload: Option<PathBuf>,
    window_size: Option<i64>,
    maximum_msg_size: Option<i64>,
    timeout: Option<i64>,
    dynamic_size: Option<bool>,
}

/// Parsed sender configuration: the parameters to propose, plus where to
/// find the payload.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub proposed: ProposedParameters,
    pub payload_path: PathBuf,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            proposed: ProposedParameters::default(),
            payload_path: PathBuf::from("payload.txt"),
        }
    }
}

/// Loads a [`SenderConfig`] from `path`. A missing config file is not an
/// error — the caller gets built-in defaults, matching the Receiver's
/// "optional config" behavior.
pub fn load(path: &Path) -> anyhow::Result<SenderConfig> {
    let defaults = SenderConfig::default();

    if !path.exists() {
        log::info!("no config file at {}, using defaults", path.display());
        return Ok(defaults);
    }

    let text = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("failed to read config file {}: {err}", path.display()))?;
    let raw: RawConfig = toml::from_str(&text)
        .map_err(|err| anyhow::anyhow!("failed to parse config file {}: {err}", path.display()))?;

    Ok(SenderConfig {
        proposed: ProposedParameters {
            window_size: raw.window_size.unwrap_or(defaults.proposed.window_size),
            maximum_msg_size: raw.maximum_msg_size.unwrap_or(defaults.proposed.maximum_msg_size),
            timeout: raw.timeout.unwrap_or(defaults.proposed.timeout),
            dynamic_size: raw.dynamic_size.unwrap_or(defaults.proposed.dynamic_size),
        },
        payload_path: raw.payload.unwrap_or(defaults.payload_path),
    })
}

/// Reads the payload named by `config` into memory. A missing or unreadable
/// payload file is fatal: the transfer cannot start without it.
pub fn read_payload(config: &SenderConfig) -> anyhow::Result<String> {
    std::fs::read_to_string(&config.payload_path).map_err(|err| {
        anyhow::anyhow!(
            transfer_core::Error::PayloadSourceMissing(format!(
                "{}: {err}",
                config.payload_path.display()
            ))
        )
    })
}
