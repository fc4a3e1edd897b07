//! Catalog-backed SGP4 propagation

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use crate::catalog::{Catalog, SatKey};
use crate::convert::ElementConverter;
use crate::earth::{EarthConstants, EarthModel};
use crate::elements::{
    wrap_degrees, CartesianElements, GeodeticCoords, KeplerianElements, MeanElements,
};
use crate::error::{Error, Result};
use crate::sgp4::{Sgp4, Sgp4State};
use crate::time::{Epoch, SECONDS_PER_DAY};
use crate::tle::ElementRecord;

/// Grid tolerance, in steps, when deciding whether `stop` lies on the grid.
/// Day-fraction epochs resolve to about 0.3 µs, so the tolerance is coarser than that.
const GRID_TOLERANCE: f64 = 1e-6;
/// Most points one grid may hold.
pub const MAX_GRID_POINTS: usize = 1_000_000;
const GEODETIC_ITERATIONS: usize = 10;

/// State of one satellite at one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatedState {
    pub epoch: Epoch,
    pub minutes_since_epoch: f64,
    /// TEME position (km) and velocity (km/s).
    pub cartesian: CartesianElements,
    pub geodetic: GeodeticCoords,
    pub revolution_number: i64,
    /// Minutes between ascending-node crossings.
    pub nodal_period: f64,
    pub mean: MeanElements,
    pub osculating: KeplerianElements,
}

/// Time-ordered sequence of states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ephemeris {
    states: Vec<PropagatedState>,
}

impl Ephemeris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a state; epochs may repeat but never go backwards.
    pub fn push(&mut self, state: PropagatedState) -> Result<()> {
        if let Some(last) = self.states.last() {
            if state.epoch < last.epoch {
                return Err(Error::OutOfOrder {
                    last: last.epoch.ds50(),
                    attempted: state.epoch.ds50(),
                });
            }
        }
        self.states.push(state);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[PropagatedState] {
        &self.states
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropagatedState> {
        self.states.iter()
    }

    pub fn first(&self) -> Option<&PropagatedState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&PropagatedState> {
        self.states.last()
    }

    pub fn into_states(self) -> Vec<PropagatedState> {
        self.states
    }
}

impl IntoIterator for Ephemeris {
    type Item = PropagatedState;
    type IntoIter = std::vec::IntoIter<PropagatedState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.into_iter()
    }
}

impl<'a> IntoIterator for &'a Ephemeris {
    type Item = &'a PropagatedState;
    type IntoIter = std::slice::Iter<'a, PropagatedState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Number of grid points in [start, stop] for a step in seconds, at most
/// [`MAX_GRID_POINTS`].
pub fn grid_len(start: Epoch, stop: Epoch, step_seconds: f64) -> Result<usize> {
    if !(step_seconds.is_finite() && step_seconds > 0.0) {
        return Err(Error::validation("step_seconds", step_seconds));
    }
    if stop < start {
        return Err(Error::validation("stop", stop));
    }
    let steps = ((stop - start) * SECONDS_PER_DAY / step_seconds + GRID_TOLERANCE).floor();
    if !(steps < MAX_GRID_POINTS as f64) {
        return Err(Error::Validation {
            field: "points",
            value: format!("{} exceeds {MAX_GRID_POINTS}", steps + 1.0),
        });
    }
    Ok(steps as usize + 1)
}

/// Propagates the satellites of a shared catalog.
#[derive(Debug, Clone)]
pub struct PropagationEngine {
    catalog: Arc<Catalog>,
    converter: ElementConverter,
}

impl PropagationEngine {
    pub fn new(catalog: Arc<Catalog>, model: EarthModel) -> Self {
        Self {
            catalog,
            converter: ElementConverter::new(model),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn earth(&self) -> &EarthConstants {
        self.converter.earth()
    }

    /// Inserts and initializes; nothing is stored if initialization fails.
    #[instrument(skip(self, record), fields(satellite_id = record.satellite_id()))]
    pub fn load(&self, record: &ElementRecord) -> Result<SatKey> {
        self.catalog
            .insert_with(record, |record| self.initialize(record).map(Some))
    }

    #[instrument(skip(self))]
    pub fn propagate(&self, key: SatKey, epoch: Epoch) -> Result<PropagatedState> {
        let (record, sgp4) = self.coefficients(key)?;
        self.evaluate(&record, &sgp4, epoch)
    }

    /// State of `record` at `epoch`, loading the satellite if it is not loaded yet.
    #[instrument(skip(self, record), fields(satellite_id = record.satellite_id()))]
    pub fn state_at(&self, record: &ElementRecord, epoch: Epoch) -> Result<PropagatedState> {
        record.validate()?;
        let key = self.key_or_load(record)?;
        self.propagate(key, epoch)
    }

    /// States on the grid `start + n * step` up to and including `stop`.
    #[instrument(skip(self))]
    pub fn propagate_range(
        &self,
        key: SatKey,
        start: Epoch,
        stop: Epoch,
        step_seconds: f64,
    ) -> Result<Ephemeris> {
        let points = grid_len(start, stop, step_seconds)?;
        let (record, sgp4) = self.coefficients(key)?;
        debug!(points, "propagating range");
        self.evaluate_grid(&record, &sgp4, start, step_seconds, points)
    }

    /// Range over a record; a satellite loaded only for this call is unloaded afterwards.
    #[instrument(skip(self, record), fields(satellite_id = record.satellite_id()))]
    pub fn ephemeris(
        &self,
        record: &ElementRecord,
        start: Epoch,
        stop: Epoch,
        step_seconds: f64,
    ) -> Result<Ephemeris> {
        record.validate()?;
        grid_len(start, stop, step_seconds)?;
        let existing = self.catalog.key_of(record.satellite_id());
        let key = match existing {
            Some(key) => key,
            None => self.load(record)?,
        };
        let result = self.propagate_range(key, start, stop, step_seconds);
        if existing.is_none() {
            self.catalog.remove(key);
        }
        result
    }

    /// States of every loaded satellite at one epoch, in key order.
    #[instrument(skip(self))]
    pub fn propagate_all(&self, epoch: Epoch) -> Vec<(SatKey, Result<PropagatedState>)> {
        self.catalog
            .snapshot()
            .into_par_iter()
            .map(|(key, record, sgp4)| {
                let result = self
                    .loaded_coefficients(key, &record, sgp4)
                    .and_then(|sgp4| self.evaluate(&record, &sgp4, epoch));
                if let Err(err) = &result {
                    warn!(%key, satellite_id = record.satellite_id(), error = %err, "propagation failed");
                }
                (key, result)
            })
            .collect()
    }

    /// Ephemerides of every loaded satellite over one grid, in key order.
    ///
    /// The grid is checked once up front; per-key failures are reported per key.
    #[instrument(skip(self))]
    pub fn propagate_all_range(
        &self,
        start: Epoch,
        stop: Epoch,
        step_seconds: f64,
    ) -> Result<Vec<(SatKey, Result<Ephemeris>)>> {
        let points = grid_len(start, stop, step_seconds)?;
        let snapshot = self.catalog.snapshot();
        debug!(points, satellites = snapshot.len(), "propagating all over range");

        Ok(snapshot
            .into_par_iter()
            .map(|(key, record, sgp4)| {
                let result = self
                    .loaded_coefficients(key, &record, sgp4)
                    .and_then(|sgp4| self.evaluate_grid(&record, &sgp4, start, step_seconds, points));
                if let Err(err) = &result {
                    warn!(%key, satellite_id = record.satellite_id(), error = %err, "range propagation failed");
                }
                (key, result)
            })
            .collect())
    }

    fn evaluate_grid(
        &self,
        record: &ElementRecord,
        sgp4: &Sgp4,
        start: Epoch,
        step_seconds: f64,
        points: usize,
    ) -> Result<Ephemeris> {
        let states = (0..points)
            .into_par_iter()
            .map(|n| {
                let epoch = start.plus_seconds(n as f64 * step_seconds);
                self.evaluate(record, sgp4, epoch)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Ephemeris { states })
    }

    /// Snapshot coefficients, initializing and storing them when missing.
    fn loaded_coefficients(
        &self,
        key: SatKey,
        record: &ElementRecord,
        sgp4: Option<Arc<Sgp4>>,
    ) -> Result<Arc<Sgp4>> {
        match sgp4 {
            Some(sgp4) => Ok(sgp4),
            None => self
                .initialize(record)
                .map(|sgp4| self.catalog.store_coefficients(key, sgp4)),
        }
    }

    fn initialize(&self, record: &ElementRecord) -> Result<Arc<Sgp4>> {
        Sgp4::from_record(record, self.earth()).map(Arc::new)
    }

    /// Coefficients for a live key, initializing them on first use.
    fn coefficients(&self, key: SatKey) -> Result<(ElementRecord, Arc<Sgp4>)> {
        let (record, sgp4) = self.catalog.coefficients(key)?;
        let sgp4 = match sgp4 {
            Some(sgp4) => sgp4,
            None => {
                debug!(%key, "initializing on first use");
                let sgp4 = self.initialize(&record)?;
                self.catalog.store_coefficients(key, sgp4)
            }
        };
        Ok((record, sgp4))
    }

    fn key_or_load(&self, record: &ElementRecord) -> Result<SatKey> {
        if let Some(key) = self.catalog.key_of(record.satellite_id()) {
            return Ok(key);
        }
        match self.load(record) {
            Err(Error::DuplicateKey { satellite_id }) => self
                .catalog
                .key_of(satellite_id)
                .ok_or(Error::DuplicateKey { satellite_id }),
            other => other,
        }
    }

    fn evaluate(&self, record: &ElementRecord, sgp4: &Sgp4, epoch: Epoch) -> Result<PropagatedState> {
        let minutes = epoch.minutes_since(sgp4.epoch());
        let state = sgp4
            .propagate(minutes)
            .map_err(|status| Error::Propagation { status, minutes })?;
        let cartesian = CartesianElements::from_vectors(state.position, state.velocity);
        let osculating = self.converter.keplerian_from_cartesian(&cartesian)?;

        Ok(PropagatedState {
            epoch,
            minutes_since_epoch: minutes,
            cartesian,
            geodetic: eci_to_geodetic(&cartesian, epoch, self.earth()),
            revolution_number: i64::from(record.revolution_number) + sgp4.revolutions_since_epoch(&state),
            nodal_period: sgp4.nodal_period(),
            mean: self.mean_elements(&state),
            osculating,
        })
    }

    fn mean_elements(&self, state: &Sgp4State) -> MeanElements {
        MeanElements::new(
            state.semi_major_axis * self.earth().radius,
            state.eccentricity,
            state.inclination.to_degrees(),
            wrap_degrees(state.mean_anomaly.to_degrees()),
            wrap_degrees(state.raan.to_degrees()),
            wrap_degrees(state.argument_of_perigee.to_degrees()),
        )
    }
}

/// Geodetic coordinates of a TEME position on the model's ellipsoid.
///
/// Longitude is in (-180, 180].
pub fn eci_to_geodetic(cartesian: &CartesianElements, epoch: Epoch, earth: &EarthConstants) -> GeodeticCoords {
    let position = cartesian.position;
    let a = earth.radius;
    let e2 = earth.eccentricity_squared();

    let (sin_theta, cos_theta) = epoch.greenwich_angle().sin_cos();
    let x_ecef = position.x * cos_theta + position.y * sin_theta;
    let y_ecef = -position.x * sin_theta + position.y * cos_theta;
    let z_ecef = position.z;

    let mut longitude_deg = y_ecef.atan2(x_ecef).to_degrees();
    if longitude_deg <= -180.0 {
        longitude_deg += 360.0;
    }

    let p = x_ecef.hypot(y_ecef);
    let mut latitude_rad = z_ecef.atan2(p * (1.0 - e2));
    for _ in 0..GEODETIC_ITERATIONS {
        let sin_lat = latitude_rad.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude_rad = (z_ecef + e2 * n * sin_lat).atan2(p);
    }

    let (sin_lat, cos_lat) = latitude_rad.sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let altitude_km = if cos_lat.abs() > 1e-10 {
        p / cos_lat - n
    } else {
        z_ecef.abs() / sin_lat.abs() - n * (1.0 - e2)
    };

    GeodeticCoords {
        latitude_deg: latitude_rad.to_degrees(),
        longitude_deg,
        altitude_km,
    }
}
