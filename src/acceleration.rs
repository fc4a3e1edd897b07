//! Point-mass, third-body and J2 accelerations (km/s²)

use nalgebra::Vector3;

use crate::bodies::{BodyEphemeris, MOON_MU, SUN_MU};
use crate::earth::EarthConstants;
use crate::time::Epoch;

/// Acceleration contributions on a satellite at an inertial position (km).
#[derive(Debug, Clone, Copy)]
pub struct Acceleration;

impl Acceleration {
    pub fn from_central_body(mu: f64, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        position * (-mu / (r * r * r))
    }

    /// Differential pull of a body relative to the Earth's centre.
    pub fn from_third_body(mu: f64, position: &Vector3<f64>, body: &Vector3<f64>) -> Vector3<f64> {
        let to_body = body - position;
        let d = to_body.norm();
        let s = body.norm();
        (to_body / (d * d * d) - body / (s * s * s)) * mu
    }

    /// Zonal J2 term; strengthens gravity over the equator and weakens it over the poles.
    pub fn from_j2(earth: &EarthConstants, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        let r2 = r * r;
        let c = 3.0 * earth.j2 * earth.mu * earth.radius * earth.radius / (2.0 * r2 * r2 * r);
        let d = 5.0 * position.z * position.z / r2;
        Vector3::new(
            c * position.x * (d - 1.0),
            c * position.y * (d - 1.0),
            c * position.z * (d - 3.0),
        )
    }

    pub fn from_earth(earth: &EarthConstants, position: &Vector3<f64>) -> Vector3<f64> {
        Self::from_central_body(earth.mu, position)
    }

    pub fn from_moon<E: BodyEphemeris + ?Sized>(
        ephemeris: &E,
        epoch: Epoch,
        position: &Vector3<f64>,
    ) -> Vector3<f64> {
        Self::from_third_body(MOON_MU, position, &ephemeris.moon_position(epoch))
    }

    pub fn from_sun<E: BodyEphemeris + ?Sized>(
        ephemeris: &E,
        epoch: Epoch,
        position: &Vector3<f64>,
    ) -> Vector3<f64> {
        Self::from_third_body(SUN_MU, position, &ephemeris.sun_position(epoch))
    }

    /// Earth point mass plus J2 plus lunar and solar third-body terms.
    pub fn from_bodies<E: BodyEphemeris + ?Sized>(
        earth: &EarthConstants,
        ephemeris: &E,
        epoch: Epoch,
        position: &Vector3<f64>,
    ) -> Vector3<f64> {
        Self::from_earth(earth, position)
            + Self::from_moon(ephemeris, epoch, position)
            + Self::from_sun(ephemeris, epoch, position)
            + Self::from_j2(earth, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::AnalyticEphemeris;

    #[test]
    fn test_central_body_points_inward() {
        let earth = EarthConstants::default();
        let position = Vector3::new(7000.0, 0.0, 0.0);
        let accel = Acceleration::from_earth(&earth, &position);
        assert!((accel.x + earth.mu / 49e6).abs() < 1e-15);
        assert_eq!(accel.y, 0.0);
        assert_eq!(accel.z, 0.0);
    }

    #[test]
    fn test_j2_on_equator_and_pole() {
        let earth = EarthConstants::default();
        let r: f64 = 7000.0;
        let scale = 1.5 * earth.j2 * earth.mu * earth.radius * earth.radius / r.powi(4);

        let equator = Acceleration::from_j2(&earth, &Vector3::new(r, 0.0, 0.0));
        assert!((equator.x + scale).abs() < 1e-15);

        let pole = Acceleration::from_j2(&earth, &Vector3::new(0.0, 0.0, r));
        assert!((pole.z - 2.0 * scale).abs() < 1e-15);
    }

    #[test]
    fn test_third_body_vanishes_at_earth_centre() {
        let body = Vector3::new(384_400.0, 0.0, 0.0);
        let accel = Acceleration::from_third_body(MOON_MU, &Vector3::zeros(), &body);
        assert!(accel.norm() < 1e-20);
    }

    #[test]
    fn test_bodies_dominated_by_earth() {
        let earth = EarthConstants::default();
        let epoch = Epoch::from_calendar(2024, 12, 5, 0, 0, 0.0).unwrap();
        let position = Vector3::new(42_164.0, 0.0, 0.0);
        let total = Acceleration::from_bodies(&earth, &AnalyticEphemeris, epoch, &position);
        let central = Acceleration::from_earth(&earth, &position);
        let perturbation = (total - central).norm();
        assert!(perturbation > 0.0);
        assert!(perturbation / central.norm() < 1e-3);
        let moon = Acceleration::from_moon(&AnalyticEphemeris, epoch, &position).norm();
        let sun = Acceleration::from_sun(&AnalyticEphemeris, epoch, &position).norm();
        assert!(moon > 1e-9 && moon < 1e-8, "lunar {moon}");
        assert!(sun > 1e-9 && sun < 1e-8, "solar {sun}");
    }
}
