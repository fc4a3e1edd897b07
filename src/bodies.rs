//! Sun and Moon positions for third-body perturbations
//!
//! The analytic series are the low-precision Astronomical Almanac forms,
//! good to about 0.01° for the Sun and 0.3° for the Moon.

use nalgebra::Vector3;

use crate::time::Epoch;

/// Gravitational parameter of the Sun (km³/s²).
pub const SUN_MU: f64 = 132_712_440_018.0;
/// Gravitational parameter of the Moon (km³/s²).
pub const MOON_MU: f64 = 4_902.800_066;

const ASTRONOMICAL_UNIT_KM: f64 = 149_597_870.7;
const MOON_PARALLAX_RADIUS_KM: f64 = 6_378.137;
const J2000_JULIAN_DATE: f64 = 2_451_545.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Geocentric inertial positions of the perturbing bodies (km).
pub trait BodyEphemeris: Send + Sync {
    fn sun_position(&self, epoch: Epoch) -> Vector3<f64>;

    fn moon_position(&self, epoch: Epoch) -> Vector3<f64>;
}

/// Closed-form low-precision ephemeris; needs no external data.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticEphemeris;

fn centuries_since_j2000(epoch: Epoch) -> f64 {
    (epoch.julian_date() - J2000_JULIAN_DATE) / DAYS_PER_CENTURY
}

fn obliquity(t: f64) -> f64 {
    (23.439_291 - 0.013_004_2 * t).to_radians()
}

fn sin_deg(angle: f64) -> f64 {
    angle.to_radians().sin()
}

fn cos_deg(angle: f64) -> f64 {
    angle.to_radians().cos()
}

impl BodyEphemeris for AnalyticEphemeris {
    fn sun_position(&self, epoch: Epoch) -> Vector3<f64> {
        let t = centuries_since_j2000(epoch);
        let mean_longitude = 280.460 + 36_000.771 * t;
        let mean_anomaly = 357.529_109_2 + 35_999.050_34 * t;
        let longitude = (mean_longitude
            + 1.914_666_471 * sin_deg(mean_anomaly)
            + 0.019_994_643 * sin_deg(2.0 * mean_anomaly))
        .to_radians();
        let distance = (1.000_140_612
            - 0.016_708_617 * cos_deg(mean_anomaly)
            - 0.000_139_589 * cos_deg(2.0 * mean_anomaly))
            * ASTRONOMICAL_UNIT_KM;

        let (sin_eps, cos_eps) = obliquity(t).sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        Vector3::new(cos_lon, cos_eps * sin_lon, sin_eps * sin_lon) * distance
    }

    fn moon_position(&self, epoch: Epoch) -> Vector3<f64> {
        let t = centuries_since_j2000(epoch);
        let longitude = (218.32 + 481_267.881_3 * t
            + 6.29 * sin_deg(134.9 + 477_198.85 * t)
            - 1.27 * sin_deg(259.2 - 413_335.38 * t)
            + 0.66 * sin_deg(235.7 + 890_534.23 * t)
            + 0.21 * sin_deg(269.9 + 954_397.70 * t)
            - 0.19 * sin_deg(357.5 + 35_999.05 * t)
            - 0.11 * sin_deg(186.6 + 966_404.05 * t))
        .to_radians();
        let latitude = (5.13 * sin_deg(93.3 + 483_202.03 * t)
            + 0.28 * sin_deg(228.2 + 960_400.87 * t)
            - 0.28 * sin_deg(318.3 + 6_003.18 * t)
            - 0.17 * sin_deg(217.6 - 407_332.20 * t))
        .to_radians();
        let parallax = 0.9508
            + 0.0518 * cos_deg(134.9 + 477_198.85 * t)
            + 0.0095 * cos_deg(259.2 - 413_335.38 * t)
            + 0.0078 * cos_deg(235.7 + 890_534.23 * t)
            + 0.0028 * cos_deg(269.9 + 954_397.70 * t);
        let distance = MOON_PARALLAX_RADIUS_KM / sin_deg(parallax);

        let (sin_eps, cos_eps) = obliquity(t).sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        let (sin_lat, cos_lat) = latitude.sin_cos();
        Vector3::new(
            cos_lat * cos_lon,
            cos_eps * cos_lat * sin_lon - sin_eps * sin_lat,
            sin_eps * cos_lat * sin_lon + cos_eps * sin_lat,
        ) * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_distance_within_orbit_bounds() {
        let ephemeris = AnalyticEphemeris;
        for day in (0..365).step_by(30) {
            let epoch = Epoch::from_calendar(2024, 1, 1, 0, 0, 0.0).unwrap().plus_days(day as f64);
            let au = ephemeris.sun_position(epoch).norm() / ASTRONOMICAL_UNIT_KM;
            assert!(au > 0.982 && au < 1.018, "day {day}: {au} AU");
        }
    }

    #[test]
    fn test_sun_on_equator_at_march_equinox() {
        let epoch = Epoch::from_calendar(2024, 3, 20, 3, 6, 0.0).unwrap();
        let sun = AnalyticEphemeris.sun_position(epoch);
        let declination = (sun.z / sun.norm()).asin().to_degrees();
        assert!(declination.abs() < 0.05, "declination {declination}");
        assert!(sun.x > 0.0);
    }

    #[test]
    fn test_moon_distance_within_orbit_bounds() {
        let ephemeris = AnalyticEphemeris;
        for hour in (0..24 * 30).step_by(12) {
            let epoch = Epoch::from_calendar(2024, 6, 1, 0, 0, 0.0).unwrap().plus_days(hour as f64 / 24.0);
            let km = ephemeris.moon_position(epoch).norm();
            assert!(km > 350_000.0 && km < 410_000.0, "hour {hour}: {km} km");
        }
    }

    #[test]
    fn test_moon_stays_near_ecliptic() {
        let epoch = Epoch::from_calendar(2024, 6, 15, 0, 0, 0.0).unwrap();
        let moon = AnalyticEphemeris.moon_position(epoch);
        let declination = (moon.z / moon.norm()).asin().to_degrees();
        assert!(declination.abs() < 23.5 + 5.3);
    }
}
