//! Relative geometry of two satellites at a common epoch
//!
//! Components are resolved in the primary's radial / in-track / cross-track
//! frame. The Mahalanobis distances use unit sigmas on every axis.

use serde::Serialize;

use crate::elements::CartesianElements;
use crate::error::{Error, Result};
use crate::propagator::PropagatedState;
use crate::time::SECONDS_PER_DAY;

/// Largest epoch mismatch (s) still treated as a common epoch.
const EPOCH_TOLERANCE_SECONDS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelativeState {
    /// Separation (km).
    pub range: f64,
    /// In-track separation expressed as time along the primary's track (s).
    pub time: f64,
    pub radial_position: f64,
    pub in_track_position: f64,
    pub cross_track_position: f64,
    /// Magnitude of the velocity difference (km/s).
    pub velocity: f64,
    pub radial_velocity: f64,
    pub in_track_velocity: f64,
    pub cross_track_velocity: f64,
    /// Angle between the orbit planes (deg).
    pub plane: f64,
    /// Difference of geocentric radii (km).
    pub height: f64,
    /// Difference of specific angular momentum magnitudes (km²/s).
    pub angular_momentum: f64,
    pub mahalanobis_uvw: f64,
    pub mahalanobis_htb: f64,
}

impl RelativeState {
    /// Secondary relative to primary; both states must share an epoch.
    pub fn between(primary: &PropagatedState, secondary: &PropagatedState) -> Result<Self> {
        let offset = (secondary.epoch - primary.epoch) * SECONDS_PER_DAY;
        if offset.abs() > EPOCH_TOLERANCE_SECONDS {
            return Err(Error::Validation {
                field: "epoch",
                value: format!("secondary is {offset} s from the primary epoch"),
            });
        }
        Ok(Self::from_cartesian(&primary.cartesian, &secondary.cartesian))
    }

    fn from_cartesian(primary: &CartesianElements, secondary: &CartesianElements) -> Self {
        let h1 = primary.angular_momentum();
        let h2 = secondary.angular_momentum();

        let u = primary.position.normalize();
        let w = h1.normalize();
        let v = w.cross(&u);

        let dr = secondary.position - primary.position;
        let dv = secondary.velocity - primary.velocity;

        let radial_position = dr.dot(&u);
        let in_track_position = dr.dot(&v);
        let cross_track_position = dr.dot(&w);

        let time = in_track_position / primary.velocity.norm();
        let plane = h2.normalize().dot(&w).clamp(-1.0, 1.0).acos().to_degrees();
        let height = secondary.position.norm() - primary.position.norm();

        Self {
            range: dr.norm(),
            time,
            radial_position,
            in_track_position,
            cross_track_position,
            velocity: dv.norm(),
            radial_velocity: dv.dot(&u),
            in_track_velocity: dv.dot(&v),
            cross_track_velocity: dv.dot(&w),
            plane,
            height,
            angular_momentum: h2.norm() - h1.norm(),
            mahalanobis_uvw: (radial_position.powi(2)
                + in_track_position.powi(2)
                + cross_track_position.powi(2))
            .sqrt(),
            mahalanobis_htb: (height.powi(2) + time.powi(2) + plane.powi(2)).sqrt(),
        }
    }
}
