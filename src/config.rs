//! Service configuration from the environment

use std::str::FromStr;

use orbital_toolkit::EarthModel;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub http_port: u16,
    pub metrics_port: u16,
    pub json_logs: bool,
    pub earth_model: EarthModel,
    /// Upper bound on points returned by one ephemeris request.
    pub max_ephemeris_points: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            metrics_port: 9090,
            json_logs: false,
            earth_model: EarthModel::Wgs72,
            max_ephemeris_points: 10_000,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            http_port: parse(&lookup, "HTTP_PORT", defaults.http_port)?,
            metrics_port: parse(&lookup, "METRICS_PORT", defaults.metrics_port)?,
            json_logs: lookup("JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
            earth_model: parse(&lookup, "EARTH_MODEL", defaults.earth_model)?,
            max_ephemeris_points: parse(&lookup, "MAX_EPHEMERIS_POINTS", defaults.max_ephemeris_points)?,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("HTTP_PORT", "8000"),
            ("JSON_LOGS", "1"),
            ("EARTH_MODEL", "WGS-84"),
            ("MAX_EPHEMERIS_POINTS", "50"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 8000);
        assert!(config.json_logs);
        assert_eq!(config.earth_model, EarthModel::Wgs84);
        assert_eq!(config.max_ephemeris_points, 50);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let err = ServiceConfig::from_lookup(lookup(&[("METRICS_PORT", "ninety")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "METRICS_PORT", .. }));
    }
}
