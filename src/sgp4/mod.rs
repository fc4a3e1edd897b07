//! SGP4 analytic propagator (AFSPC-compatible)
//!
//! [`Sgp4::new`] computes every coefficient once; [`Sgp4::propagate`] is a
//! pure function of the time since epoch, so one instance can be shared
//! across threads.

mod deep_space;

use std::f64::consts::{PI, TAU};
use std::fmt;

use nalgebra::Vector3;
use serde::Serialize;
use tracing::debug;

use crate::earth::EarthConstants;
use crate::error::{Error, Result};
use crate::time::{Epoch, MINUTES_PER_DAY};
use crate::tle::{ElementRecord, EphemerisType};

use deep_space::{DeepSpace, EpochState, Osculator};

/// Orbits with a period at or above this many minutes use the deep-space branch.
pub const DEEP_SPACE_PERIOD_MINUTES: f64 = 225.0;

const KEPLER_MAX_ITERATIONS: usize = 10;
const KEPLER_TOLERANCE: f64 = 1.0e-12;
const TEMP4: f64 = 1.5e-12;

/// Breakdown conditions reported by the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sgp4Status {
    MeanEccentricity,
    MeanMotion,
    PerturbedEccentricity,
    SemiLatusRectum,
    Decayed,
}

impl Sgp4Status {
    pub fn code(self) -> i32 {
        match self {
            Sgp4Status::MeanEccentricity => 1,
            Sgp4Status::MeanMotion => 2,
            Sgp4Status::PerturbedEccentricity => 3,
            Sgp4Status::SemiLatusRectum => 4,
            Sgp4Status::Decayed => 6,
        }
    }
}

impl fmt::Display for Sgp4Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Sgp4Status::MeanEccentricity => "mean eccentricity out of range",
            Sgp4Status::MeanMotion => "mean motion not positive",
            Sgp4Status::PerturbedEccentricity => "perturbed eccentricity out of range",
            Sgp4Status::SemiLatusRectum => "semi-latus rectum negative",
            Sgp4Status::Decayed => "orbit decayed",
        };
        write!(f, "{message} (code {})", self.code())
    }
}

/// Mean elements in the propagator's input units (degrees, rev/day, Kozai n).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgp4Elements {
    pub epoch: Epoch,
    pub b_star: f64,
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
}

impl Sgp4Elements {
    /// Drag-model inputs for a record; SP elements have no analytic model.
    pub fn from_record(record: &ElementRecord) -> Result<Self> {
        match record.ephemeris_type() {
            EphemerisType::Sgp | EphemerisType::Sgp4 | EphemerisType::Sgp4Xp => Ok(Self {
                epoch: record.epoch,
                b_star: record.b_star(),
                mean_motion: record.mean_motion(),
                eccentricity: record.eccentricity(),
                inclination: record.inclination(),
                raan: record.raan(),
                argument_of_perigee: record.argument_of_perigee(),
                mean_anomaly: record.mean_anomaly(),
            }),
            model @ EphemerisType::Sp => Err(Error::UnsupportedModel { model }),
        }
    }
}

/// Output of one propagation step.
///
/// Mean elements are in canonical units: earth radii, radians, radians/minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgp4State {
    /// TEME position (km).
    pub position: Vector3<f64>,
    /// TEME velocity (km/s).
    pub velocity: Vector3<f64>,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    pub mean_motion: f64,
    /// Mean argument of latitude, not wrapped, for counting revolutions.
    pub mean_argument_of_latitude: f64,
}

/// Initialized SGP4 coefficients for one element set.
#[derive(Debug, Clone)]
pub struct Sgp4 {
    epoch: Epoch,
    radius: f64,
    xke: f64,
    j2: f64,
    j3oj2: f64,
    gsto: f64,

    bstar: f64,
    ecco: f64,
    argpo: f64,
    inclo: f64,
    mo: f64,
    no_unkozai: f64,
    nodeo: f64,

    simplified: bool,
    aycof: f64,
    con41: f64,
    cc1: f64,
    cc4: f64,
    cc5: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    delmo: f64,
    eta: f64,
    argpdot: f64,
    omgcof: f64,
    sinmao: f64,
    t2cof: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
    x1mth2: f64,
    x7thm1: f64,
    mdot: f64,
    nodedot: f64,
    xlcof: f64,
    xmcof: f64,
    nodecf: f64,

    deep_space: Option<Box<DeepSpace>>,
    revolution_origin: f64,
}

impl Sgp4 {
    /// Initializes from a stored record, mapping breakdowns to [`Error::Initialization`].
    pub fn from_record(record: &ElementRecord, earth: &EarthConstants) -> Result<Self> {
        let elements = Sgp4Elements::from_record(record)?;
        Self::new(&elements, earth).map_err(|status| Error::Initialization { status })
    }

    pub fn new(elements: &Sgp4Elements, earth: &EarthConstants) -> std::result::Result<Self, Sgp4Status> {
        let ecco = elements.eccentricity;
        if !(0.0..1.0).contains(&ecco) {
            return Err(Sgp4Status::MeanEccentricity);
        }
        if !(elements.mean_motion > 0.0) {
            return Err(Sgp4Status::MeanMotion);
        }

        let radius = earth.radius;
        let xke = earth.xke;
        let j2 = earth.j2;
        let j3oj2 = earth.j3 / earth.j2;
        let j4 = earth.j4;
        let x2o3 = 2.0 / 3.0;

        let no_kozai = elements.mean_motion / (MINUTES_PER_DAY / TAU);
        let inclo = elements.inclination.to_radians();
        let nodeo = elements.raan.to_radians();
        let argpo = elements.argument_of_perigee.to_radians();
        let mo = elements.mean_anomaly.to_radians();
        let bstar = elements.b_star;
        let ds50 = elements.epoch.ds50();

        let ss = 78.0 / radius + 1.0;
        let qzms2t = ((120.0 - 78.0) / radius).powi(4);

        // Recover the Brouwer mean motion from the Kozai value.
        let eccsq = ecco * ecco;
        let omeosq = 1.0 - eccsq;
        let rteosq = omeosq.sqrt();
        let cosio = inclo.cos();
        let cosio2 = cosio * cosio;
        let ak = (xke / no_kozai).powf(x2o3);
        let d1 = 0.75 * j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
        let del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        let del = d1 / (adel * adel);
        let no_unkozai = no_kozai / (1.0 + del);

        let ao = (xke / no_unkozai).powf(x2o3);
        let sinio = inclo.sin();
        let po = ao * omeosq;
        let con42 = 1.0 - 5.0 * cosio2;
        let con41 = -con42 - cosio2 - cosio2;
        let posq = po * po;
        let rp = ao * (1.0 - ecco);
        let gsto = crate::time::greenwich_angle(ds50);

        let mut simplified = rp < 220.0 / radius + 1.0;
        let mut sfour = ss;
        let mut qzms24 = qzms2t;
        let perigee = (rp - 1.0) * radius;
        if perigee < 156.0 {
            sfour = if perigee < 98.0 { 20.0 } else { perigee - 78.0 };
            qzms24 = ((120.0 - sfour) / radius).powi(4);
            sfour = sfour / radius + 1.0;
        }

        let pinvsq = 1.0 / posq;
        let tsi = 1.0 / (ao - sfour);
        let eta = ao * ecco * tsi;
        let etasq = eta * eta;
        let eeta = ecco * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qzms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let cc2 = coef1
            * no_unkozai
            * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.375 * j2 * tsi / psisq * con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 {
            -2.0 * coef * tsi * j3oj2 * no_unkozai * sinio / ecco
        } else {
            0.0
        };
        let x1mth2 = 1.0 - cosio2;
        let cc4 = 2.0
            * no_unkozai
            * coef1
            * ao
            * omeosq
            * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - j2 * tsi / (ao * psisq)
                    * (-3.0 * con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * argpo).cos()));
        let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * j2 * pinvsq * no_unkozai;
        let temp2 = 0.5 * temp1 * j2 * pinvsq;
        let temp3 = -0.46875 * j4 * pinvsq * pinvsq * no_unkozai;
        let mdot = no_unkozai
            + 0.5 * temp1 * rteosq * con41
            + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        let argpdot = -0.5 * temp1 * con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        let nodedot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;
        let omgcof = bstar * cc3 * argpo.cos();
        let xmcof = if ecco > 1.0e-4 {
            -x2o3 * coef * bstar / eeta
        } else {
            0.0
        };
        let nodecf = 3.5 * omeosq * xhdot1 * cc1;
        let t2cof = 1.5 * cc1;
        let xlcof = long_period_coefficient(j3oj2, sinio, cosio);
        let aycof = -0.5 * j3oj2 * sinio;
        let delmotemp = 1.0 + eta * mo.cos();
        let delmo = delmotemp * delmotemp * delmotemp;
        let sinmao = mo.sin();
        let x7thm1 = 7.0 * cosio2 - 1.0;

        let deep_space = if TAU / no_unkozai >= DEEP_SPACE_PERIOD_MINUTES {
            simplified = true;
            Some(Box::new(DeepSpace::new(EpochState {
                ds50,
                eccentricity: ecco,
                inclination: inclo,
                raan: nodeo,
                argument_of_perigee: argpo,
                mean_anomaly: mo,
                mean_motion: no_unkozai,
                mdot,
                argpdot,
                nodedot,
                gsto,
                xke,
            })))
        } else {
            None
        };

        let (mut d2, mut d3, mut d4, mut t3cof, mut t4cof, mut t5cof) =
            (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        if !simplified {
            let cc1sq = cc1 * cc1;
            d2 = 4.0 * ao * tsi * cc1sq;
            let temp = d2 * tsi * cc1 / 3.0;
            d3 = (17.0 * ao + sfour) * temp;
            d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
            t3cof = d2 + 2.0 * cc1sq;
            t4cof = 0.25 * (3.0 * d3 + cc1 * (12.0 * d2 + 10.0 * cc1sq));
            t5cof = 0.2 * (3.0 * d4 + 12.0 * cc1 * d3 + 6.0 * d2 * d2 + 15.0 * cc1sq * (2.0 * d2 + cc1sq));
        }

        let mut sgp4 = Self {
            epoch: elements.epoch,
            radius,
            xke,
            j2,
            j3oj2,
            gsto,
            bstar,
            ecco,
            argpo,
            inclo,
            mo,
            no_unkozai,
            nodeo,
            simplified,
            aycof,
            con41,
            cc1,
            cc4,
            cc5,
            d2,
            d3,
            d4,
            delmo,
            eta,
            argpdot,
            omgcof,
            sinmao,
            t2cof,
            t3cof,
            t4cof,
            t5cof,
            x1mth2,
            x7thm1,
            mdot,
            nodedot,
            xlcof,
            xmcof,
            nodecf,
            deep_space,
            revolution_origin: 0.0,
        };

        let at_epoch = sgp4.propagate(0.0)?;
        sgp4.revolution_origin = (at_epoch.mean_argument_of_latitude / TAU).floor();
        debug!(
            deep_space = sgp4.is_deep_space(),
            simplified = sgp4.simplified,
            period_min = TAU / no_unkozai,
            "initialized sgp4"
        );
        Ok(sgp4)
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_deep_space(&self) -> bool {
        self.deep_space.is_some()
    }

    /// Greenwich sidereal angle at the element epoch (rad).
    pub fn gsto(&self) -> f64 {
        self.gsto
    }

    /// Brouwer mean motion at epoch (rad/min).
    pub fn mean_motion(&self) -> f64 {
        self.no_unkozai
    }

    /// Period between ascending-node crossings from the secular rates (minutes).
    pub fn nodal_period(&self) -> f64 {
        let mut rate = self.mdot + self.argpdot;
        if let Some(deep) = &self.deep_space {
            rate += deep.secular_argument_rate();
        }
        TAU / rate
    }

    /// Ascending-node crossings between the epoch and `state`.
    pub fn revolutions_since_epoch(&self, state: &Sgp4State) -> i64 {
        ((state.mean_argument_of_latitude / TAU).floor() - self.revolution_origin) as i64
    }

    /// State at `tsince` minutes from the element epoch.
    pub fn propagate(&self, tsince: f64) -> std::result::Result<Sgp4State, Sgp4Status> {
        let t = tsince;
        let x2o3 = 2.0 / 3.0;
        let vkmpersec = self.radius * self.xke / 60.0;

        let xmdf = self.mo + self.mdot * t;
        let argpdf = self.argpo + self.argpdot * t;
        let nodedf = self.nodeo + self.nodedot * t;
        let t2 = t * t;
        let mut argpm = argpdf;
        let mut mm = xmdf;
        let mut nodem = nodedf + self.nodecf * t2;
        let mut tempa = 1.0 - self.cc1 * t;
        let mut tempe = self.bstar * self.cc4 * t;
        let mut templ = self.t2cof * t2;

        if !self.simplified {
            let delomg = self.omgcof * t;
            let delmtemp = 1.0 + self.eta * xmdf.cos();
            let delm = self.xmcof * (delmtemp * delmtemp * delmtemp - self.delmo);
            let temp = delomg + delm;
            mm = xmdf + temp;
            argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa -= self.d2 * t2 + self.d3 * t3 + self.d4 * t4;
            tempe += self.bstar * self.cc5 * (mm.sin() - self.sinmao);
            templ += self.t3cof * t3 + t4 * (self.t4cof + t * self.t5cof);
        }

        let mut mean = Osculator {
            eccentricity: self.ecco,
            inclination: self.inclo,
            raan: nodem,
            argument_of_perigee: argpm,
            mean_anomaly: mm,
            mean_motion: self.no_unkozai,
        };
        if let Some(deep) = &self.deep_space {
            mean = deep.secular(t, mean);
        }

        if mean.mean_motion <= 0.0 {
            return Err(Sgp4Status::MeanMotion);
        }
        let am = (self.xke / mean.mean_motion).powf(x2o3) * tempa * tempa;
        let nm = self.xke / am.powf(1.5);
        let mut em = mean.eccentricity - tempe;
        if !(-0.001..1.0).contains(&em) {
            return Err(Sgp4Status::MeanEccentricity);
        }
        if em < 1.0e-6 {
            em = 1.0e-6;
        }
        let mm = mean.mean_anomaly + self.no_unkozai * templ;
        let argpm = mean.argument_of_perigee;
        let inclm = mean.inclination;
        let mean_argument_of_latitude = mm + argpm;

        let xlm = (mm + argpm + mean.raan) % TAU;
        let nodem = mean.raan % TAU;
        let argpm = argpm % TAU;
        let mm = (xlm - argpm - nodem) % TAU;

        let mut perturbed = Osculator {
            eccentricity: em,
            inclination: inclm,
            raan: nodem,
            argument_of_perigee: argpm,
            mean_anomaly: mm,
            mean_motion: nm,
        };
        let (mut con41, mut x1mth2, mut x7thm1) = (self.con41, self.x1mth2, self.x7thm1);
        let (mut aycof, mut xlcof) = (self.aycof, self.xlcof);

        if let Some(deep) = &self.deep_space {
            perturbed = deep.periodics(t, perturbed);
            if perturbed.inclination < 0.0 {
                perturbed.inclination = -perturbed.inclination;
                perturbed.raan += PI;
                perturbed.argument_of_perigee -= PI;
            }
            if !(0.0..=1.0).contains(&perturbed.eccentricity) {
                return Err(Sgp4Status::PerturbedEccentricity);
            }
            let sinip = perturbed.inclination.sin();
            let cosip = perturbed.inclination.cos();
            aycof = -0.5 * self.j3oj2 * sinip;
            xlcof = long_period_coefficient(self.j3oj2, sinip, cosip);
            let cosisq = cosip * cosip;
            con41 = 3.0 * cosisq - 1.0;
            x1mth2 = 1.0 - cosisq;
            x7thm1 = 7.0 * cosisq - 1.0;
        }

        let ep = perturbed.eccentricity;
        let xincp = perturbed.inclination;
        let argpp = perturbed.argument_of_perigee;
        let nodep = perturbed.raan;
        let mp = perturbed.mean_anomaly;
        let sinip = xincp.sin();
        let cosip = xincp.cos();

        // Long-period periodics.
        let axnl = ep * argpp.cos();
        let temp = 1.0 / (am * (1.0 - ep * ep));
        let aynl = ep * argpp.sin() + temp * aycof;
        let xl = mp + argpp + nodep + temp * xlcof * axnl;

        // Kepler's equation in the modified form.
        let u = (xl - nodep) % TAU;
        let mut eo1 = u;
        let mut tem5: f64 = 9999.9;
        let mut iterations = 0;
        while tem5.abs() >= KEPLER_TOLERANCE && iterations < KEPLER_MAX_ITERATIONS {
            let sineo1 = eo1.sin();
            let coseo1 = eo1.cos();
            tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
            tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
            if tem5.abs() >= 0.95 {
                tem5 = 0.95_f64.copysign(tem5);
            }
            eo1 += tem5;
            iterations += 1;
        }

        // Short-period periodics.
        let sineo1 = eo1.sin();
        let coseo1 = eo1.cos();
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(Sgp4Status::SemiLatusRectum);
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * self.j2 * temp;
        let temp2 = temp1 * temp;

        let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
        let su = su - 0.25 * temp2 * x7thm1 * sin2u;
        let xnode = nodep + 1.5 * temp2 * cosip * sin2u;
        let xinc = xincp + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * x1mth2 * sin2u / self.xke;
        let rvdot = rvdotl + nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / self.xke;

        let (sinsu, cossu) = su.sin_cos();
        let (snod, cnod) = xnode.sin_cos();
        let (sini, cosi) = xinc.sin_cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let unit_u = Vector3::new(xmx * sinsu + cnod * cossu, xmy * sinsu + snod * cossu, sini * sinsu);
        let unit_v = Vector3::new(xmx * cossu - cnod * sinsu, xmy * cossu - snod * sinsu, sini * cossu);

        if mrt < 1.0 {
            return Err(Sgp4Status::Decayed);
        }

        Ok(Sgp4State {
            position: unit_u * (mrt * self.radius),
            velocity: (unit_u * mvt + unit_v * rvdot) * vkmpersec,
            semi_major_axis: am,
            eccentricity: em,
            inclination: inclm,
            raan: nodem,
            argument_of_perigee: argpm,
            mean_anomaly: mm,
            mean_motion: nm,
            mean_argument_of_latitude,
        })
    }
}

fn long_period_coefficient(j3oj2: f64, sinio: f64, cosio: f64) -> f64 {
    let denominator = if (cosio + 1.0).abs() > TEMP4 {
        1.0 + cosio
    } else {
        TEMP4
    };
    -0.25 * j3oj2 * sinio * (3.0 + 5.0 * cosio) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const LINE_2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    fn vanguard() -> Sgp4 {
        let record = ElementRecord::parse(LINE_1, LINE_2).unwrap();
        Sgp4::from_record(&record, &EarthConstants::default()).unwrap()
    }

    fn assert_vec(actual: &Vector3<f64>, expected: [f64; 3], tolerance: f64) {
        for axis in 0..3 {
            assert!(
                (actual[axis] - expected[axis]).abs() < tolerance,
                "axis {axis}: {} vs {}",
                actual[axis],
                expected[axis]
            );
        }
    }

    #[test]
    fn test_epoch_state_matches_verification_values() {
        let sgp4 = vanguard();
        assert!(!sgp4.is_deep_space());
        let state = sgp4.propagate(0.0).unwrap();
        assert_vec(&state.position, [7022.46529266, -1400.08296755, 0.03995155], 1e-6);
        assert_vec(&state.velocity, [1.893841015, 6.405893759, 4.534807250], 1e-8);
    }

    #[test]
    fn test_six_hour_state_matches_verification_values() {
        let state = vanguard().propagate(360.0).unwrap();
        assert_vec(
            &state.position,
            [-7154.03120202, -3783.17682504, -3536.19412294],
            1e-6,
        );
        assert_vec(&state.velocity, [4.741887409, -4.151817765, -2.093935425], 1e-8);
    }

    #[test]
    fn test_propagation_is_deterministic() {
        let sgp4 = vanguard();
        let first = sgp4.propagate(1234.5).unwrap();
        let second = sgp4.propagate(1234.5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_deep_space_branch_selected_by_period() {
        let elements = Sgp4Elements {
            epoch: Epoch::from_ds50(27000.0),
            b_star: 0.0,
            mean_motion: 1.0027,
            eccentricity: 0.0002,
            inclination: 0.05,
            raan: 80.0,
            argument_of_perigee: 120.0,
            mean_anomaly: 200.0,
        };
        let sgp4 = Sgp4::new(&elements, &EarthConstants::default()).unwrap();
        assert!(sgp4.is_deep_space());
        let state = sgp4.propagate(2880.0).unwrap();
        let radius = state.position.norm();
        assert!((radius - 42164.0).abs() < 100.0, "geostationary radius {radius}");
        assert_eq!(sgp4.propagate(2880.0).unwrap(), state);
        let backwards = sgp4.propagate(-2880.0).unwrap();
        assert!((backwards.position.norm() - 42164.0).abs() < 100.0);
    }

    #[test]
    fn test_molniya_resonance_stays_bounded() {
        let elements = Sgp4Elements {
            epoch: Epoch::from_ds50(27000.0),
            b_star: 0.0,
            mean_motion: 2.00563,
            eccentricity: 0.72,
            inclination: 63.4,
            raan: 100.0,
            argument_of_perigee: 270.0,
            mean_anomaly: 10.0,
        };
        let sgp4 = Sgp4::new(&elements, &EarthConstants::default()).unwrap();
        assert!(sgp4.is_deep_space());
        let state = sgp4.propagate(10_000.0).unwrap();
        let radius = state.position.norm();
        assert!(radius > 6378.0 && radius < 50_000.0);
    }

    #[test]
    fn test_initialization_rejects_bad_elements() {
        let mut elements = Sgp4Elements {
            epoch: Epoch::from_ds50(27000.0),
            b_star: 0.0,
            mean_motion: 15.5,
            eccentricity: 1.2,
            inclination: 51.6,
            raan: 0.0,
            argument_of_perigee: 0.0,
            mean_anomaly: 0.0,
        };
        let earth = EarthConstants::default();
        assert_eq!(Sgp4::new(&elements, &earth).unwrap_err(), Sgp4Status::MeanEccentricity);
        elements.eccentricity = 0.001;
        elements.mean_motion = 0.0;
        assert_eq!(Sgp4::new(&elements, &earth).unwrap_err(), Sgp4Status::MeanMotion);
    }

    #[test]
    fn test_heavy_drag_decays() {
        let elements = Sgp4Elements {
            epoch: Epoch::from_ds50(27000.0),
            b_star: 0.05,
            mean_motion: 16.2,
            eccentricity: 0.0005,
            inclination: 51.6,
            raan: 0.0,
            argument_of_perigee: 0.0,
            mean_anomaly: 0.0,
        };
        let sgp4 = Sgp4::new(&elements, &EarthConstants::default()).unwrap();
        let failure = (1..200)
            .map(|day| sgp4.propagate(day as f64 * MINUTES_PER_DAY))
            .find_map(|result| result.err());
        assert!(failure.is_some());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Sgp4Status::MeanEccentricity.code(), 1);
        assert_eq!(Sgp4Status::MeanMotion.code(), 2);
        assert_eq!(Sgp4Status::PerturbedEccentricity.code(), 3);
        assert_eq!(Sgp4Status::SemiLatusRectum.code(), 4);
        assert_eq!(Sgp4Status::Decayed.code(), 6);
    }

    #[test]
    fn test_revolution_count_advances_once_per_period() {
        let sgp4 = vanguard();
        let period = sgp4.nodal_period();
        assert!((period - 133.0).abs() < 1.5, "period {period}");
        let start = sgp4.propagate(0.0).unwrap();
        assert_eq!(sgp4.revolutions_since_epoch(&start), 0);
        let later = sgp4.propagate(10.0 * period + 1.0).unwrap();
        assert_eq!(sgp4.revolutions_since_epoch(&later), 10);
    }
}
