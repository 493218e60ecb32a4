//! Configuration for the tikplay client.
//!
//! The configuration lives in a small JSON rc file (`~/.tikplayrc` by
//! default). A missing file is bootstrapped with defaults on first use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "tikradio.tt.hut.fi:5000";
const RC_FILE: &str = ".tikplayrc";

/// Resolved client configuration. Built once at startup and passed by
/// reference; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Service address as `host:port`.
    pub host: String,

    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            verbose: true,
        }
    }
}

impl Config {
    /// Replace the verbosity read from the file. The command line always
    /// wins over the file setting.
    pub fn with_verbose(self, verbose: bool) -> Self {
        Config { verbose, ..self }
    }

    /// Replace the host, e.g. from `--host`.
    pub fn with_host(self, host: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            ..self
        }
    }
}

/// Tracing filter used when `RUST_LOG` is not set. Recoverable request
/// failures are logged at debug level, so without `-v` the printed
/// diagnostic is the only report of them.
pub fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "tikplay=debug"
    } else {
        "warn"
    }
}

/// Default location of the rc file: `~/.tikplayrc`, or the current
/// directory when no home directory can be determined.
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(RC_FILE)
}

/// Load the configuration at `path`, writing the defaults there first if
/// the file does not exist yet. The bootstrap notice goes to `out`.
pub fn load_or_init(path: &Path, out: &mut dyn Write) -> Result<Config> {
    if !path.exists() {
        writeln!(
            out,
            "Error: The configuration file does not exist. Generating a default config to {}",
            path.display()
        )?;
        write_config(path, &Config::default())?;
    }
    load(path)
}

pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

/// Write `config` as 4-space indented JSON.
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config
        .serialize(&mut ser)
        .context("Failed to encode default config")?;
    std::fs::write(path, buf)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}
