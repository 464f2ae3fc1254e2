//! Render configuration with environment overrides.

use std::fmt;

use crate::trace::{BackendKind, UnknownBackend};

/// Tunables for the path tracer and its fly camera.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub backend: BackendKind,
    /// Seed for the per-frame RNG stream.
    pub seed: u64,
    pub exposure: f32,
    pub gamma: f32,
    /// Camera speed in units per second.
    pub move_speed: f32,
    /// Degrees of rotation per pointer unit per second.
    pub look_sensitivity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Host,
            seed: 0,
            exposure: 1.0,
            gamma: 2.2,
            move_speed: 10.0,
            look_sensitivity: 4.096,
        }
    }
}

pub const ENV_BACKEND: &str = "SPHAERA_BACKEND";
pub const ENV_SEED: &str = "SPHAERA_SEED";
pub const ENV_EXPOSURE: &str = "SPHAERA_EXPOSURE";
pub const ENV_GAMMA: &str = "SPHAERA_GAMMA";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Backend(UnknownBackend),
    /// A variable is set but does not parse as the expected type.
    Malformed { var: &'static str, value: String },
    /// A tonemap parameter must be finite and strictly positive.
    OutOfRange { var: &'static str, value: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(e) => write!(f, "{ENV_BACKEND}: {e}"),
            Self::Malformed { var, value } => write!(f, "{var}: cannot parse {value:?}"),
            Self::OutOfRange { var, value } => write!(f, "{var}: {value} must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl RenderConfig {
    /// Defaults overridden by `SPHAERA_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_BACKEND) {
            config.backend = v.parse().map_err(ConfigError::Backend)?;
        }
        if let Some(v) = lookup(ENV_SEED) {
            config.seed = parse(ENV_SEED, &v)?;
        }
        if let Some(v) = lookup(ENV_EXPOSURE) {
            config.exposure = positive(ENV_EXPOSURE, parse(ENV_EXPOSURE, &v)?)?;
        }
        if let Some(v) = lookup(ENV_GAMMA) {
            config.gamma = positive(ENV_GAMMA, parse(ENV_GAMMA, &v)?)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Malformed {
        var,
        value: value.to_string(),
    })
}

fn positive(var: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { var, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(RenderConfig::from_lookup(lookup(&[])), Ok(RenderConfig::default()));
    }

    #[test]
    fn overrides_apply() {
        let cfg = RenderConfig::from_lookup(lookup(&[
            (ENV_BACKEND, "device"),
            (ENV_SEED, " 42 "),
            (ENV_EXPOSURE, "1.5"),
            (ENV_GAMMA, "2.4"),
        ]))
        .unwrap();

        assert_eq!(cfg.backend, BackendKind::Device);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.exposure, 1.5);
        assert_eq!(cfg.gamma, 2.4);
        assert_eq!(cfg.move_speed, 10.0);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(
            RenderConfig::from_lookup(lookup(&[(ENV_SEED, "abc")])),
            Err(ConfigError::Malformed { var: ENV_SEED, .. })
        ));
        assert!(matches!(
            RenderConfig::from_lookup(lookup(&[(ENV_BACKEND, "vulkan")])),
            Err(ConfigError::Backend(_))
        ));
        assert!(matches!(
            RenderConfig::from_lookup(lookup(&[(ENV_GAMMA, "0")])),
            Err(ConfigError::OutOfRange { var: ENV_GAMMA, .. })
        ));
    }
}
