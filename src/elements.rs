//! Orbital element value types
//!
//! All angles are degrees at this boundary; distances km, velocities km/s,
//! mean motions rev/day.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::Epoch;
use crate::tle::Classification;

/// Maximum iterations of the Kepler equation solver.
const KEPLER_MAX_ITERATIONS: usize = 50;
const KEPLER_TOLERANCE: f64 = 1e-14;

/// Inertial position (km) and velocity (km/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianElements {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl CartesianElements {
    pub fn new(x: f64, y: f64, z: f64, vx: f64, vy: f64, vz: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            velocity: Vector3::new(vx, vy, vz),
        }
    }

    pub fn from_vectors(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.position.cross(&self.velocity)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        ]
    }
}

/// Osculating two-body elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub mean_anomaly: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
}

impl KeplerianElements {
    pub fn new(sma: f64, ecc: f64, inc: f64, ma: f64, raan: f64, aop: f64) -> Self {
        Self {
            semi_major_axis: sma,
            eccentricity: ecc,
            inclination: inc,
            mean_anomaly: ma,
            raan,
            argument_of_perigee: aop,
        }
    }

    /// Eccentric anomaly (deg).
    pub fn eccentric_anomaly(&self) -> Result<f64> {
        solve_kepler(self.mean_anomaly.to_radians(), self.eccentricity).map(f64::to_degrees)
    }

    /// True anomaly (deg, [0, 360)).
    pub fn true_anomaly(&self) -> Result<f64> {
        let e = self.eccentricity;
        let ea = self.eccentric_anomaly()?.to_radians();
        let nu = 2.0 * ((1.0 + e).sqrt() * (ea / 2.0).sin()).atan2((1.0 - e).sqrt() * (ea / 2.0).cos());
        Ok(wrap_degrees(nu.to_degrees()))
    }

    /// Mean motion (rev/day) for the given gravitational parameter.
    pub fn mean_motion(&self, mu: f64) -> f64 {
        crate::convert::mean_motion_from_semi_major_axis(self.semi_major_axis, mu)
    }

    pub fn apogee_radius(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    pub fn perigee_radius(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }
}

/// Mean (short-period averaged) elements, laid out like [`KeplerianElements`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub mean_anomaly: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
}

impl MeanElements {
    pub fn new(sma: f64, ecc: f64, inc: f64, ma: f64, raan: f64, aop: f64) -> Self {
        Self {
            semi_major_axis: sma,
            eccentricity: ecc,
            inclination: inc,
            mean_anomaly: ma,
            raan,
            argument_of_perigee: aop,
        }
    }
}

/// Non-singular equinoctial elements.
///
/// `af`/`ag` carry the eccentricity vector, `chi`/`psi` the node vector,
/// `mean_longitude` is M + ω + Ω in degrees (not wrapped).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquinoctialElements {
    pub af: f64,
    pub ag: f64,
    pub chi: f64,
    pub psi: f64,
    pub mean_longitude: f64,
    pub mean_motion: f64,
}

impl EquinoctialElements {
    pub fn new(af: f64, ag: f64, chi: f64, psi: f64, l: f64, n: f64) -> Self {
        Self {
            af,
            ag,
            chi,
            psi,
            mean_longitude: l,
            mean_motion: n,
        }
    }

    pub fn eccentricity(&self) -> f64 {
        self.af.hypot(self.ag)
    }

    pub fn inclination(&self) -> f64 {
        (2.0 * self.chi.hypot(self.psi).atan()).to_degrees()
    }
}

/// Keplerian elements with mean motion (rev/day) in place of semi-major axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassicalElements {
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub mean_anomaly: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
}

impl ClassicalElements {
    pub fn new(n: f64, ecc: f64, inc: f64, ma: f64, raan: f64, aop: f64) -> Self {
        Self {
            mean_motion: n,
            eccentricity: ecc,
            inclination: inc,
            mean_anomaly: ma,
            raan,
            argument_of_perigee: aop,
        }
    }
}

/// Geodetic latitude/longitude (deg) and altitude above the ellipsoid (km).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticCoords {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// State vector with the metadata needed to build an element set from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpVector {
    pub epoch: Epoch,
    pub elements: CartesianElements,
    satellite_id: u32,
    designator: String,
    pub classification: Classification,
    /// Ballistic coefficient (m²/kg).
    pub b_term: f64,
    /// Solar radiation pressure coefficient (m²/kg).
    pub agom: f64,
}

impl SpVector {
    pub fn new(epoch: Epoch, elements: CartesianElements, satellite_id: u32) -> Result<Self> {
        crate::tle::validate_satellite_id(satellite_id)?;
        Ok(Self {
            epoch,
            elements,
            satellite_id,
            designator: String::new(),
            classification: Classification::Unclassified,
            b_term: 0.0,
            agom: 0.0,
        })
    }

    pub fn satellite_id(&self) -> u32 {
        self.satellite_id
    }

    pub fn set_satellite_id(&mut self, satellite_id: u32) -> Result<()> {
        crate::tle::validate_satellite_id(satellite_id)?;
        self.satellite_id = satellite_id;
        Ok(())
    }

    pub fn designator(&self) -> &str {
        &self.designator
    }

    pub fn set_designator(&mut self, designator: &str) -> Result<()> {
        crate::tle::validate_designator(designator)?;
        self.designator = designator.to_string();
        Ok(())
    }
}

/// Solve M = E - e·sin(E) for E (radians).
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> Result<f64> {
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(Error::BadElement {
            field: "eccentricity",
            value: eccentricity,
        });
    }
    let m = wrap_radians(mean_anomaly);
    let mut ea = if eccentricity > 0.8 { std::f64::consts::PI } else { m };
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ea - eccentricity * ea.sin() - m) / (1.0 - eccentricity * ea.cos());
        ea -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    Ok(ea)
}

pub(crate) fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub(crate) fn wrap_radians(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kepler_solution_satisfies_equation() {
        for &(m, e) in &[(0.3, 0.1), (3.0, 0.7), (5.9, 0.95), (0.0, 0.0)] {
            let ea = solve_kepler(m, e).unwrap();
            assert!((ea - e * ea.sin() - m).abs() < 1e-12, "M={m} e={e}");
        }
    }

    #[test]
    fn test_kepler_rejects_hyperbolic() {
        assert!(solve_kepler(1.0, 1.2).is_err());
    }

    #[test]
    fn test_anomalies_of_circular_orbit_coincide() {
        let kep = KeplerianElements::new(7000.0, 0.0, 45.0, 123.0, 10.0, 20.0);
        assert!((kep.eccentric_anomaly().unwrap() - 123.0).abs() < 1e-10);
        assert!((kep.true_anomaly().unwrap() - 123.0).abs() < 1e-10);
    }

    #[test]
    fn test_true_anomaly_ahead_of_mean_anomaly() {
        let kep = KeplerianElements::new(26000.0, 0.7, 63.4, 30.0, 0.0, 270.0);
        let nu = kep.true_anomaly().unwrap();
        assert!(nu > kep.eccentric_anomaly().unwrap());
        assert!(nu > 30.0 && nu < 180.0);
    }

    #[test]
    fn test_sp_vector_bounds() {
        let cart = CartesianElements::new(7000.0, 0.0, 0.0, 0.0, 7.5, 0.0);
        assert!(SpVector::new(Epoch::from_ds50(27000.0), cart, 340000).is_err());
        let mut sp = SpVector::new(Epoch::from_ds50(27000.0), cart, 25544).unwrap();
        assert!(sp.set_designator("123456789").is_err());
        assert!(sp.set_designator("98067A").is_ok());
        assert_eq!(sp.designator(), "98067A");
    }
}
