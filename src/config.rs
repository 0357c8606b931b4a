//! Configuration loading and validation.
//!
//! Loaded from `aegis.toml` (usually under [`config_dir`]). Every section is
//! optional. Precedence: env vars > config file > defaults.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::fee::FeeConfig;
use crate::registry::DEFAULT_RECENT_CAPACITY;
use crate::types::Address;

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    /// Verdict registry settings.
    pub registry: RegistryConfig,
    /// Default fee triple and its administrators.
    pub fees: FeesConfig,
    /// Log filter settings.
    pub logging: LoggingConfig,
}

impl AegisConfig {
    /// Parse from a TOML string, without env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML does not parse.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function so tests need not touch the process env.
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Registry.
        if let Some(v) = env("AEGIS_REGISTRY_OWNER") {
            override_parsed(&mut self.registry.owner, "AEGIS_REGISTRY_OWNER", &v);
        }
        if let Some(v) = env("AEGIS_RECENT_CAPACITY") {
            override_parsed(&mut self.registry.recent_capacity, "AEGIS_RECENT_CAPACITY", &v);
        }

        // Fees.
        if let Some(v) = env("AEGIS_FEE_TOKEN") {
            override_parsed(&mut self.fees.token, "AEGIS_FEE_TOKEN", &v);
        }
        if let Some(v) = env("AEGIS_FEE_RECIPIENT") {
            override_parsed(&mut self.fees.recipient, "AEGIS_FEE_RECIPIENT", &v);
        }
        if let Some(v) = env("AEGIS_FEE_AMOUNT") {
            override_parsed(&mut self.fees.amount_per_call, "AEGIS_FEE_AMOUNT", &v);
        }

        // Logging.
        if let Some(v) = env("AEGIS_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    /// Check the values that have no safe fallback.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero registry owner or a zero history length.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry.owner.is_zero() {
            anyhow::bail!("registry.owner must be set to a non-zero address");
        }
        if self.registry.recent_capacity == 0 {
            anyhow::bail!("registry.recent_capacity must be at least 1");
        }
        Ok(())
    }

    /// History length as a non-zero value, falling back to the default.
    pub fn recent_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.registry.recent_capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_RECENT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN)
    }
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, var: &'static str, value: &str) {
    match value.parse() {
        Ok(parsed) => *target = parsed,
        Err(_) => tracing::warn!(var, value, "ignoring invalid env override"),
    }
}

// ── Sections ────────────────────────────────────────────────────

/// Verdict registry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry owner; also the first publisher.
    pub owner: Address,
    /// Recent-pair history length.
    pub recent_capacity: usize,
    /// Extra publishers allowed from the start.
    pub publishers: Vec<Address>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            publishers: Vec::new(),
        }
    }
}

/// Default fee triple. All-zero (the default) disables fees.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    /// Fee policy owner; falls back to the registry owner when zero.
    pub owner: Address,
    /// Accounts allowed to change fee triples.
    pub operators: Vec<Address>,
    /// Fee token.
    pub token: Address,
    /// Fee recipient.
    pub recipient: Address,
    /// Amount charged per forwarded call.
    pub amount_per_call: u128,
}

impl FeesConfig {
    /// The configured default triple.
    pub fn default_triple(&self) -> FeeConfig {
        FeeConfig::new(self.token, self.recipient, self.amount_per_call)
    }
}

/// Log filter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

// ── Loading ─────────────────────────────────────────────────────

/// Load config from a TOML file and apply env overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<AegisConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let mut config = AegisConfig::from_toml(&contents)
        .with_context(|| format!("failed to load config at {}", path.display()))?;
    config.apply_overrides(|key| std::env::var(key).ok());
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Resolve the default config directory (`~/.aegis/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".aegis"))
}
