//! Central-body constants for the supported Earth reference models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sidereal rotation rate of the Earth (rad/min).
pub const ROTATION_RATE_RAD_PER_MIN: f64 = 4.375_269_088_011_3e-3;

/// Named geopotential constant sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EarthModel {
    #[default]
    #[serde(rename = "WGS-72")]
    Wgs72,
    /// WGS-72 with the historical truncated xke.
    #[serde(rename = "WGS-72-OLD")]
    Wgs72Old,
    #[serde(rename = "WGS-84")]
    Wgs84,
}

impl EarthModel {
    pub fn name(&self) -> &'static str {
        match self {
            EarthModel::Wgs72 => "WGS-72",
            EarthModel::Wgs72Old => "WGS-72-OLD",
            EarthModel::Wgs84 => "WGS-84",
        }
    }

    pub fn constants(self) -> EarthConstants {
        EarthConstants::from_model(self)
    }
}

impl fmt::Display for EarthModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EarthModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "WGS-72" | "WGS72" => Ok(EarthModel::Wgs72),
            "WGS-72-OLD" | "WGS72OLD" => Ok(EarthModel::Wgs72Old),
            "WGS-84" | "WGS84" => Ok(EarthModel::Wgs84),
            _ => Err(Error::validation("earth_model", s)),
        }
    }
}

/// Read-only constants consumed by the propagator and the acceleration models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarthConstants {
    pub model: EarthModel,
    /// Gravitational parameter (km³/s²).
    pub mu: f64,
    /// Equatorial radius (km).
    pub radius: f64,
    pub flattening: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j5: f64,
    /// Rotation rate (rad/min).
    pub rotation_rate: f64,
    /// sqrt(mu) in earth radii^1.5 per minute.
    pub xke: f64,
}

impl EarthConstants {
    pub fn from_model(model: EarthModel) -> Self {
        match model {
            EarthModel::Wgs72 => {
                let mu = 398_600.8;
                let radius = 6378.135;
                Self {
                    model,
                    mu,
                    radius,
                    flattening: 1.0 / 298.26,
                    j2: 0.001_082_616,
                    j3: -0.000_002_538_81,
                    j4: -0.000_001_655_97,
                    j5: -0.000_000_218_482_7,
                    rotation_rate: ROTATION_RATE_RAD_PER_MIN,
                    xke: xke(mu, radius),
                }
            }
            EarthModel::Wgs72Old => Self {
                model,
                mu: 398_600.799_64,
                radius: 6378.135,
                flattening: 1.0 / 298.26,
                j2: 0.001_082_616,
                j3: -0.000_002_538_81,
                j4: -0.000_001_655_97,
                j5: -0.000_000_218_482_7,
                rotation_rate: ROTATION_RATE_RAD_PER_MIN,
                xke: 0.074_366_916_1,
            },
            EarthModel::Wgs84 => {
                let mu = 398_600.5;
                let radius = 6378.137;
                Self {
                    model,
                    mu,
                    radius,
                    flattening: 1.0 / 298.257_223_563,
                    j2: 0.001_082_629_989_05,
                    j3: -0.000_002_532_153_06,
                    j4: -0.000_001_610_987_61,
                    j5: -0.000_000_227_76,
                    rotation_rate: ROTATION_RATE_RAD_PER_MIN,
                    xke: xke(mu, radius),
                }
            }
        }
    }

    /// First eccentricity squared of the reference ellipsoid.
    pub fn eccentricity_squared(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }

    /// Minutes per canonical time unit.
    pub fn time_unit(&self) -> f64 {
        1.0 / self.xke
    }
}

impl Default for EarthConstants {
    fn default() -> Self {
        Self::from_model(EarthModel::default())
    }
}

fn xke(mu: f64, radius: f64) -> f64 {
    60.0 / (radius * radius * radius / mu).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs72_constants() {
        let earth = EarthConstants::default();
        assert_eq!(earth.model, EarthModel::Wgs72);
        assert_eq!(earth.j2, 0.001082616);
        assert_eq!(earth.j3, -2.53881e-06);
        assert_eq!(earth.j4, -1.65597e-06);
        assert_eq!(earth.j5, -2.184827e-07);
        assert_eq!(earth.mu, 398600.8);
        assert_eq!(earth.radius, 6378.135);
        assert!((earth.flattening - 0.003352779454167505).abs() < 1e-15);
        assert!((earth.rotation_rate - 0.0043752690880113).abs() < 1e-15);
    }

    #[test]
    fn test_xke_matches_historical_value() {
        let earth = EarthConstants::from_model(EarthModel::Wgs72);
        assert!((earth.xke - 0.0743669161).abs() < 1e-9);
    }

    #[test]
    fn test_model_names_round_trip() {
        for model in [EarthModel::Wgs72, EarthModel::Wgs72Old, EarthModel::Wgs84] {
            assert_eq!(model.name().parse::<EarthModel>().unwrap(), model);
        }
        assert!("EGM-2008".parse::<EarthModel>().is_err());
    }
}
