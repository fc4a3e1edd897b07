//! SGP4 orbit propagation toolkit
//!
//! Parses and writes two-line element sets, keeps them in an in-memory
//! [`Catalog`], propagates them with SGP4/SDP4 and converts between element
//! representations.
//!
//! ```no_run
//! use std::sync::Arc;
//! use orbital_toolkit::{Catalog, EarthModel, ElementRecord, PropagationEngine};
//!
//! # fn main() -> orbital_toolkit::Result<()> {
//! let record = ElementRecord::parse(
//!     "1 25544U 98067A   24340.99323416 +.00018216  00000 0  32316-3 0 0999",
//!     "2 25544  51.6388 184.2057 0007028 306.7642 201.1123 15.5026597648519",
//! )?;
//! let engine = PropagationEngine::new(Arc::new(Catalog::new()), EarthModel::Wgs72);
//! let key = engine.load(&record)?;
//! let state = engine.propagate(key, record.epoch.plus_minutes(90.0))?;
//! println!("{:?}", state.geodetic);
//! # Ok(())
//! # }
//! ```

pub mod acceleration;
pub mod bodies;
pub mod catalog;
pub mod convert;
pub mod earth;
pub mod elements;
pub mod error;
pub mod propagator;
pub mod relative;
pub mod sgp4;
pub mod time;
pub mod tle;

pub use acceleration::Acceleration;
pub use bodies::{AnalyticEphemeris, BodyEphemeris};
pub use catalog::{Catalog, SatKey};
pub use convert::ElementConverter;
pub use earth::{EarthConstants, EarthModel};
pub use elements::{
    CartesianElements, ClassicalElements, EquinoctialElements, GeodeticCoords, KeplerianElements,
    MeanElements, SpVector,
};
pub use error::{Error, Result};
pub use propagator::{Ephemeris, PropagatedState, PropagationEngine};
pub use relative::RelativeState;
pub use sgp4::{Sgp4, Sgp4Status};
pub use time::{Epoch, TimeSpan};
pub use tle::{Classification, ElementRecord, EphemerisType, Perturbations};

#[cfg(test)]
mod tests;
