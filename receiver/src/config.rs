//! Receiver configuration file loading (A2).

use std::path::Path;

use serde::Deserialize;
use transfer_core::ProposedParameters;

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    window_size: Option<i64>,
    maximum_msg_size: Option<i64>,
    timeout: Option<i64>,
    dynamic_size: Option<bool>,
}

/// Loads the parameters the Receiver will propose during the handshake. A
/// missing `path` (no `--config` given) yields [`ProposedParameters::default`].
pub fn load(path: Option<&Path>) -> anyhow::Result<ProposedParameters> {
    let defaults = ProposedParameters::default();

    let Some(path) = path else {
        return Ok(defaults);
    };

    let text = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("failed to read config file {}: {err}", path.display()))?;
    let raw: RawConfig = toml::from_str(&text)
        .map_err(|err| anyhow::anyhow!("failed to parse config file {}: {err}", path.display()))?;

    Ok(ProposedParameters {
        window_size: raw.window_size.unwrap_or(defaults.window_size),
        maximum_msg_size: raw.maximum_msg_size.unwrap_or(defaults.maximum_msg_size),
        timeout: raw.timeout.unwrap_or(defaults.timeout),
        dynamic_size: raw.dynamic_size.unwrap_or(defaults.dynamic_size),
    })
}
