//! Conversions between element representations
//!
//! Conversions between element sets go through the equinoctial set; states
//! are turned into Keplerian elements directly. Angles are degrees at this
//! boundary and radians inside.

use std::f64::consts::TAU;

use nalgebra::{Rotation3, Vector3};
use tracing::{debug, instrument};

use crate::earth::{EarthConstants, EarthModel};
use crate::elements::{
    solve_kepler, wrap_degrees, CartesianElements, ClassicalElements, EquinoctialElements,
    KeplerianElements, MeanElements, SpVector,
};
use crate::error::{Error, Result};
use crate::sgp4::{Sgp4, Sgp4Elements};
use crate::time::{Epoch, SECONDS_PER_DAY};
use crate::tle::{ElementRecord, EphemerisType, Perturbations, B_STAR_TO_B_TERM};

const MAX_FIT_ITERATIONS: usize = 50;
const FIT_POSITION_TOLERANCE_KM: f64 = 1e-6;
const FIT_VELOCITY_TOLERANCE_KM_S: f64 = 1e-9;
const KOZAI_MAX_ITERATIONS: usize = 20;
/// Below this, node line or eccentricity vector is treated as undefined.
const SINGULAR_TOLERANCE: f64 = 1e-11;

/// Mean motion (rev/day) of a two-body orbit with semi-major axis `a` (km).
pub fn mean_motion_from_semi_major_axis(a: f64, mu: f64) -> f64 {
    (mu / (a * a * a)).sqrt() * SECONDS_PER_DAY / TAU
}

/// Semi-major axis (km) of a two-body orbit with mean motion `n` (rev/day).
pub fn semi_major_axis_from_mean_motion(n: f64, mu: f64) -> f64 {
    let n_rad_s = n * TAU / SECONDS_PER_DAY;
    (mu / (n_rad_s * n_rad_s)).cbrt()
}

/// Element conversions bound to one set of Earth constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementConverter {
    earth: EarthConstants,
}

impl ElementConverter {
    pub fn new(model: EarthModel) -> Self {
        Self {
            earth: model.constants(),
        }
    }

    pub fn earth(&self) -> &EarthConstants {
        &self.earth
    }

    pub fn mu(&self) -> f64 {
        self.earth.mu
    }

    pub fn mean_motion_from_semi_major_axis(&self, a: f64) -> f64 {
        mean_motion_from_semi_major_axis(a, self.earth.mu)
    }

    pub fn semi_major_axis_from_mean_motion(&self, n: f64) -> f64 {
        semi_major_axis_from_mean_motion(n, self.earth.mu)
    }

    pub fn equinoctial_from_keplerian(&self, kep: &KeplerianElements) -> EquinoctialElements {
        let n = self.mean_motion_from_semi_major_axis(kep.semi_major_axis);
        equinoctial_from_angles(
            n,
            kep.eccentricity,
            kep.inclination,
            kep.mean_anomaly,
            kep.raan,
            kep.argument_of_perigee,
        )
    }

    pub fn equinoctial_from_classical(&self, classical: &ClassicalElements) -> EquinoctialElements {
        equinoctial_from_angles(
            classical.mean_motion,
            classical.eccentricity,
            classical.inclination,
            classical.mean_anomaly,
            classical.raan,
            classical.argument_of_perigee,
        )
    }

    /// Osculating equinoctial elements of an inertial state.
    pub fn equinoctial_from_cartesian(&self, cart: &CartesianElements) -> Result<EquinoctialElements> {
        equinoctial_from_cartesian(cart, self.earth.mu)
    }

    pub fn keplerian_from_equinoctial(&self, eqnx: &EquinoctialElements) -> KeplerianElements {
        let classical = classical_from_equinoctial(eqnx);
        KeplerianElements::new(
            self.semi_major_axis_from_mean_motion(classical.mean_motion),
            classical.eccentricity,
            classical.inclination,
            classical.mean_anomaly,
            classical.raan,
            classical.argument_of_perigee,
        )
    }

    /// Osculating Keplerian elements of an inertial state, defined for every
    /// bound orbit including equatorial and circular ones.
    pub fn keplerian_from_cartesian(&self, cart: &CartesianElements) -> Result<KeplerianElements> {
        keplerian_from_cartesian(cart, self.earth.mu)
    }

    pub fn classical_from_equinoctial(&self, eqnx: &EquinoctialElements) -> ClassicalElements {
        classical_from_equinoctial(eqnx)
    }

    pub fn cartesian_from_keplerian(&self, kep: &KeplerianElements) -> Result<CartesianElements> {
        cartesian_from_keplerian(kep, self.earth.mu)
    }

    pub fn cartesian_from_equinoctial(&self, eqnx: &EquinoctialElements) -> Result<CartesianElements> {
        self.cartesian_from_keplerian(&self.keplerian_from_equinoctial(eqnx))
    }

    /// Brouwer mean motion (rev/day) from the Kozai value used in element sets.
    pub fn brouwer_from_kozai(&self, eccentricity: f64, inclination: f64, kozai: f64) -> f64 {
        let n = kozai * TAU / 1440.0;
        n / (1.0 + self.kozai_delta(eccentricity, inclination, n)) * 1440.0 / TAU
    }

    /// Inverse of [`ElementConverter::brouwer_from_kozai`], solved by fixed-point iteration.
    pub fn kozai_from_brouwer(&self, eccentricity: f64, inclination: f64, brouwer: f64) -> f64 {
        let target = brouwer * TAU / 1440.0;
        let mut kozai = target;
        for _ in 0..KOZAI_MAX_ITERATIONS {
            let next = target * (1.0 + self.kozai_delta(eccentricity, inclination, kozai));
            let converged = (next - kozai).abs() <= 1e-15 * next.abs();
            kozai = next;
            if converged {
                break;
            }
        }
        kozai * 1440.0 / TAU
    }

    /// Correction `del` such that n_brouwer = n_kozai / (1 + del), n in rad/min.
    fn kozai_delta(&self, eccentricity: f64, inclination: f64, kozai: f64) -> f64 {
        let cosio = inclination.to_radians().cos();
        let omeosq = 1.0 - eccentricity * eccentricity;
        let ak = (self.earth.xke / kozai).powf(2.0 / 3.0);
        let d1 = 0.75 * self.earth.j2 * (3.0 * cosio * cosio - 1.0) / (omeosq.sqrt() * omeosq);
        let del = d1 / (ak * ak);
        let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
        d1 / (adel * adel)
    }

    /// SGP4 mean elements whose epoch state reproduces the osculating elements.
    #[instrument(skip(self, kep))]
    pub fn mean_from_keplerian(&self, kep: &KeplerianElements, epoch: Epoch) -> Result<MeanElements> {
        let target = self.cartesian_from_keplerian(kep)?;
        let (elements, sgp4) = self.fit_mean_elements(epoch, &target)?;
        let a = (self.earth.xke / sgp4.mean_motion()).powf(2.0 / 3.0) * self.earth.radius;
        Ok(MeanElements::new(
            a,
            elements.eccentricity,
            elements.inclination,
            wrap_degrees(elements.mean_anomaly),
            wrap_degrees(elements.raan),
            wrap_degrees(elements.argument_of_perigee),
        ))
    }

    /// Element set whose SGP4 state at the vector's epoch matches the vector.
    ///
    /// The drag slot is filled from the vector's ballistic coefficient
    /// according to `model`.
    #[instrument(skip(self, sp), fields(satellite_id = sp.satellite_id()))]
    pub fn tle_from_state_vector(&self, sp: &SpVector, model: EphemerisType) -> Result<ElementRecord> {
        let (elements, _) = self.fit_mean_elements(sp.epoch, &sp.elements)?;
        let classical = ClassicalElements::new(
            elements.mean_motion,
            elements.eccentricity,
            elements.inclination,
            wrap_degrees(elements.mean_anomaly),
            wrap_degrees(elements.raan),
            wrap_degrees(elements.argument_of_perigee),
        );
        let mut record = ElementRecord::from_classical(sp.satellite_id(), sp.epoch, &classical)?;
        record.set_designator(sp.designator())?;
        record.classification = sp.classification;
        let b_star = sp.b_term / B_STAR_TO_B_TERM;
        record.perturbations = match model {
            EphemerisType::Sgp => Perturbations::Sgp {
                n_dot: 0.0,
                n_dot_dot: 0.0,
                b_star,
            },
            EphemerisType::Sgp4 => Perturbations::Sgp4 {
                n_dot: 0.0,
                n_dot_dot: 0.0,
                b_star,
            },
            EphemerisType::Sgp4Xp => Perturbations::Sgp4Xp {
                n_dot: 0.0,
                agom: sp.agom,
                b_term: sp.b_term,
            },
            EphemerisType::Sp => Perturbations::Sp {
                outgassing: 0.0,
                agom: sp.agom,
                b_term: sp.b_term,
            },
        };
        Ok(record)
    }

    /// Differential correction in equinoctial space against the SGP4 state at t = 0.
    ///
    /// Drag terms vanish at the epoch, so the fit runs with B* = 0.
    fn fit_mean_elements(&self, epoch: Epoch, target: &CartesianElements) -> Result<(Sgp4Elements, Sgp4)> {
        let wanted = self.equinoctial_from_cartesian(target)?;
        let mut guess = wanted;

        for iteration in 0..MAX_FIT_ITERATIONS {
            let classical = classical_from_equinoctial(&guess);
            if classical.eccentricity >= 1.0 || !(classical.mean_motion > 0.0) {
                return Err(Error::DegenerateOrbit {
                    reason: "mean element fit left the elliptic domain",
                });
            }
            let elements = Sgp4Elements {
                epoch,
                b_star: 0.0,
                mean_motion: classical.mean_motion,
                eccentricity: classical.eccentricity,
                inclination: classical.inclination,
                raan: classical.raan,
                argument_of_perigee: classical.argument_of_perigee,
                mean_anomaly: classical.mean_anomaly,
            };
            let sgp4 = Sgp4::new(&elements, &self.earth)
                .map_err(|status| Error::Initialization { status })?;
            let state = sgp4
                .propagate(0.0)
                .map_err(|status| Error::Propagation { status, minutes: 0.0 })?;

            let position_error = (state.position - target.position).norm();
            let velocity_error = (state.velocity - target.velocity).norm();
            if position_error < FIT_POSITION_TOLERANCE_KM && velocity_error < FIT_VELOCITY_TOLERANCE_KM_S {
                debug!(iterations = iteration, position_error, "mean element fit converged");
                return Ok((elements, sgp4));
            }

            let achieved = self.equinoctial_from_cartesian(&CartesianElements::from_vectors(
                state.position,
                state.velocity,
            ))?;
            guess.af += wanted.af - achieved.af;
            guess.ag += wanted.ag - achieved.ag;
            guess.chi += wanted.chi - achieved.chi;
            guess.psi += wanted.psi - achieved.psi;
            guess.mean_motion += wanted.mean_motion - achieved.mean_motion;
            let dl = (wanted.mean_longitude - achieved.mean_longitude + 180.0).rem_euclid(360.0) - 180.0;
            guess.mean_longitude += dl;
        }

        Err(Error::DegenerateOrbit {
            reason: "mean element fit did not converge",
        })
    }
}

fn equinoctial_from_angles(n: f64, e: f64, i: f64, m: f64, raan: f64, aop: f64) -> EquinoctialElements {
    let lon_periapsis = (aop + raan).to_radians();
    let tan_half_i = (i.to_radians() / 2.0).tan();
    let node = raan.to_radians();
    EquinoctialElements::new(
        e * lon_periapsis.cos(),
        e * lon_periapsis.sin(),
        tan_half_i * node.sin(),
        tan_half_i * node.cos(),
        m + aop + raan,
        n,
    )
}

/// Classical elements, all angles wrapped to [0, 360).
pub fn classical_from_equinoctial(eqnx: &EquinoctialElements) -> ClassicalElements {
    let eccentricity = eqnx.eccentricity();
    let inclination = eqnx.inclination();
    let raan = eqnx.chi.atan2(eqnx.psi).to_degrees();
    let lon_periapsis = eqnx.ag.atan2(eqnx.af).to_degrees();
    ClassicalElements::new(
        eqnx.mean_motion,
        eccentricity,
        inclination,
        wrap_degrees(eqnx.mean_longitude - lon_periapsis),
        wrap_degrees(raan),
        wrap_degrees(lon_periapsis - raan),
    )
}

/// Angular momentum and semi-major axis of a bound two-body state.
fn bound_orbit(cart: &CartesianElements, mu: f64) -> Result<(Vector3<f64>, f64)> {
    let r = cart.position;
    let v = cart.velocity;
    let finite = r.iter().chain(v.iter()).all(|x| x.is_finite());
    let r_mag = r.norm();
    if !finite || r_mag == 0.0 || v.norm() == 0.0 {
        return Err(Error::DegenerateOrbit {
            reason: "position and velocity must be finite and non-zero",
        });
    }
    let h = r.cross(&v);
    if h.norm() == 0.0 {
        return Err(Error::DegenerateOrbit {
            reason: "zero angular momentum",
        });
    }
    let energy = v.norm_squared() / 2.0 - mu / r_mag;
    if energy >= 0.0 {
        return Err(Error::DegenerateOrbit {
            reason: "orbit is not elliptic",
        });
    }
    Ok((h, -mu / (2.0 * energy)))
}

/// Classical r/v conversion. The node line falls back to +x for equatorial
/// orbits and the perigee to the node line for circular ones, so angles stay
/// finite at i = 0, i = 180 and e = 0.
pub fn keplerian_from_cartesian(cart: &CartesianElements, mu: f64) -> Result<KeplerianElements> {
    let (h, a) = bound_orbit(cart, mu)?;
    let r = cart.position;
    let v = cart.velocity;
    let w = h.normalize();
    let inclination = w.x.hypot(w.y).atan2(w.z);

    let node_line = Vector3::z().cross(&w);
    let node = if node_line.norm() > SINGULAR_TOLERANCE {
        node_line.normalize()
    } else {
        Vector3::x()
    };
    let raan = node.y.atan2(node.x);

    let e_vec = (r * (v.norm_squared() - mu / r.norm()) - v * r.dot(&v)) / mu;
    let e = e_vec.norm();
    let perigee = if e > SINGULAR_TOLERANCE { e_vec / e } else { node };
    let argument_of_perigee = w.dot(&node.cross(&perigee)).atan2(node.dot(&perigee));

    let true_anomaly = w.dot(&perigee.cross(&r)).atan2(perigee.dot(&r));
    let (sin_nu, cos_nu) = true_anomaly.sin_cos();
    let eccentric_anomaly = ((1.0 - e * e).sqrt() * sin_nu).atan2(e + cos_nu);
    let mean_anomaly = eccentric_anomaly - e * eccentric_anomaly.sin();

    Ok(KeplerianElements::new(
        a,
        e,
        inclination.to_degrees(),
        wrap_degrees(mean_anomaly.to_degrees()),
        wrap_degrees(raan.to_degrees()),
        wrap_degrees(argument_of_perigee.to_degrees()),
    ))
}

/// Direct equinoctial set; singular at i = 180.
pub fn equinoctial_from_cartesian(cart: &CartesianElements, mu: f64) -> Result<EquinoctialElements> {
    let (h, a) = bound_orbit(cart, mu)?;
    let r = cart.position;
    let v = cart.velocity;
    let r_mag = r.norm();

    let w = h.normalize();
    if 1.0 + w.z < 1e-12 {
        return Err(Error::DegenerateOrbit {
            reason: "retrograde equatorial orbit",
        });
    }
    let chi = w.x / (1.0 + w.z);
    let psi = -w.y / (1.0 + w.z);

    let scale = 1.0 + chi * chi + psi * psi;
    let f_hat = Vector3::new(1.0 - chi * chi + psi * psi, 2.0 * chi * psi, -2.0 * chi) / scale;
    let g_hat = Vector3::new(2.0 * chi * psi, 1.0 + chi * chi - psi * psi, 2.0 * psi) / scale;

    let e_vec = (r * (v.norm_squared() - mu / r_mag) - v * r.dot(&v)) / mu;
    let af = e_vec.dot(&f_hat);
    let ag = e_vec.dot(&g_hat);

    let x = r.dot(&f_hat);
    let y = r.dot(&g_hat);
    let root = (1.0 - af * af - ag * ag).sqrt();
    let b = 1.0 / (1.0 + root);
    let cos_f = af + ((1.0 - af * af * b) * x - af * ag * b * y) / (a * root);
    let sin_f = ag + ((1.0 - ag * ag * b) * y - af * ag * b * x) / (a * root);
    let f = sin_f.atan2(cos_f);
    let mean_longitude = f + ag * f.cos() - af * f.sin();

    Ok(EquinoctialElements::new(
        af,
        ag,
        chi,
        psi,
        wrap_degrees(mean_longitude.to_degrees()),
        mean_motion_from_semi_major_axis(a, mu),
    ))
}

pub fn cartesian_from_keplerian(kep: &KeplerianElements, mu: f64) -> Result<CartesianElements> {
    let a = kep.semi_major_axis;
    let e = kep.eccentricity;
    if !(a > 0.0) {
        return Err(Error::BadElement {
            field: "semi_major_axis",
            value: a,
        });
    }
    let ea = solve_kepler(kep.mean_anomaly.to_radians(), e)?;
    let (sin_e, cos_e) = ea.sin_cos();
    let root = (1.0 - e * e).sqrt();
    let n = (mu / (a * a * a)).sqrt();

    let position = Vector3::new(a * (cos_e - e), a * root * sin_e, 0.0);
    let speed = n * a / (1.0 - e * cos_e);
    let velocity = Vector3::new(-speed * sin_e, speed * root * cos_e, 0.0);

    let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), kep.raan.to_radians())
        * Rotation3::from_axis_angle(&Vector3::x_axis(), kep.inclination.to_radians())
        * Rotation3::from_axis_angle(&Vector3::z_axis(), kep.argument_of_perigee.to_radians());

    Ok(CartesianElements::from_vectors(rotation * position, rotation * velocity))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_keplerian() -> KeplerianElements {
        KeplerianElements::new(42164.0, 0.0001, 0.42, 42.0, 200.0, 300.0)
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{what}: {actual} vs {expected}"
        );
    }

    #[test]
    fn test_keplerian_to_equinoctial() {
        let eqnx = ElementConverter::default().equinoctial_from_keplerian(&geo_keplerian());
        assert_close(eqnx.af, -7.660444431189783e-05, 1e-15, "af");
        assert_close(eqnx.ag, 6.42787609686539e-05, 1e-15, "ag");
        assert_close(eqnx.chi, -0.001253574911285049, 1e-15, "chi");
        assert_close(eqnx.psi, -0.0034441687623505044, 1e-15, "psi");
        assert_close(eqnx.mean_longitude, 542.0000000000001, 1e-9, "L");
        assert_close(eqnx.mean_motion, 1.0027444112324284, 1e-12, "n");
    }

    #[test]
    fn test_classical_to_equinoctial_uses_mean_motion() {
        let classical = ClassicalElements::new(1.0027444112324284, 0.0001, 0.42, 42.0, 200.0, 300.0);
        let eqnx = ElementConverter::default().equinoctial_from_classical(&classical);
        assert_eq!(eqnx.mean_motion, 1.0027444112324284);
        assert_close(eqnx.mean_longitude, 542.0, 1e-9, "L");
    }

    #[test]
    fn test_equinoctial_back_to_keplerian_wraps_angles() {
        let converter = ElementConverter::default();
        let kep = converter.keplerian_from_equinoctial(&converter.equinoctial_from_keplerian(&geo_keplerian()));
        assert_close(kep.semi_major_axis, 42164.0, 1e-6, "a");
        assert_close(kep.eccentricity, 0.0001, 1e-15, "e");
        assert_close(kep.inclination, 0.42, 1e-12, "i");
        assert_close(kep.mean_anomaly, 42.0, 1e-9, "M");
        assert_close(kep.raan, 200.0, 1e-9, "raan");
        assert_close(kep.argument_of_perigee, 300.0, 1e-9, "aop");
    }

    #[test]
    fn test_keplerian_to_cartesian() {
        let cart = ElementConverter::default()
            .cartesian_from_keplerian(&geo_keplerian())
            .unwrap();
        let expected = [
            -42134.866555365596,
            -1477.3611216130757,
            -95.4631435846219,
            0.10749110300482166,
            -3.072941987275631,
            0.021437245884576635,
        ];
        let actual = cart.to_array();
        for axis in 0..3 {
            assert_close(actual[axis], expected[axis], 1e-6, "position");
            assert_close(actual[axis + 3], expected[axis + 3], 1e-10, "velocity");
        }
    }

    #[test]
    fn test_cartesian_round_trip_recovers_shape() {
        let converter = ElementConverter::default();
        for kep in [
            KeplerianElements::new(7000.0, 0.001, 51.6, 10.0, 30.0, 80.0),
            KeplerianElements::new(26560.0, 0.72, 63.4, 200.0, 100.0, 270.0),
            KeplerianElements::new(42164.0, 0.0001, 0.42, 42.0, 200.0, 300.0),
            KeplerianElements::new(12000.0, 0.3, 120.0, 300.0, 10.0, 5.0),
        ] {
            let cart = converter.cartesian_from_keplerian(&kep).unwrap();
            let back = converter.keplerian_from_cartesian(&cart).unwrap();
            assert_close(back.semi_major_axis / kep.semi_major_axis, 1.0, 1e-6, "a");
            assert_close(back.eccentricity, kep.eccentricity, 1e-6 * kep.eccentricity.max(1e-3), "e");
            assert_close(back.inclination / kep.inclination, 1.0, 1e-6, "i");
        }
    }

    #[test]
    fn test_degenerate_states_rejected() {
        let converter = ElementConverter::default();
        let zero = CartesianElements::new(0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(matches!(
            converter.keplerian_from_cartesian(&zero),
            Err(Error::DegenerateOrbit { .. })
        ));
        let radial = CartesianElements::new(7000.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(matches!(
            converter.equinoctial_from_cartesian(&radial),
            Err(Error::DegenerateOrbit { reason: "zero angular momentum" })
        ));
        let escaping = CartesianElements::new(7000.0, 0.0, 0.0, 0.0, 12.0, 0.0);
        assert!(matches!(
            converter.keplerian_from_cartesian(&escaping),
            Err(Error::DegenerateOrbit { reason: "orbit is not elliptic" })
        ));
        let nan = CartesianElements::new(f64::NAN, 0.0, 0.0, 0.0, 7.5, 0.0);
        assert!(converter.keplerian_from_cartesian(&nan).is_err());
    }

    #[test]
    fn test_equatorial_and_circular_states_convert() {
        let converter = ElementConverter::default();
        for kep in [
            KeplerianElements::new(6800.0, 0.001, 180.0, 40.0, 0.0, 75.0),
            KeplerianElements::new(7000.0, 0.0, 0.0, 120.0, 0.0, 0.0),
            KeplerianElements::new(7000.0, 0.0, 180.0, 120.0, 0.0, 0.0),
            KeplerianElements::new(7000.0, 0.0, 97.8, 210.0, 33.0, 0.0),
        ] {
            let cart = converter.cartesian_from_keplerian(&kep).unwrap();
            let back = converter.keplerian_from_cartesian(&cart).unwrap();
            assert_close(back.inclination, kep.inclination, 1e-6, "i");
            assert_close(back.semi_major_axis / kep.semi_major_axis, 1.0, 1e-9, "a");
            let again = converter.cartesian_from_keplerian(&back).unwrap();
            assert_close((again.position - cart.position).norm(), 0.0, 1e-6, "position");
            assert_close((again.velocity - cart.velocity).norm(), 0.0, 1e-9, "velocity");
        }

        let retrograde = converter
            .cartesian_from_keplerian(&KeplerianElements::new(7000.0, 0.01, 180.0, 0.0, 0.0, 0.0))
            .unwrap();
        assert!(matches!(
            converter.equinoctial_from_cartesian(&retrograde),
            Err(Error::DegenerateOrbit { .. })
        ));
    }

    #[test]
    fn test_mean_motion_semi_major_axis_inverse() {
        let mu = EarthConstants::default().mu;
        let n = mean_motion_from_semi_major_axis(42164.0, mu);
        assert_close(n, 1.0027444112324284, 1e-12, "n");
        assert_close(semi_major_axis_from_mean_motion(n, mu), 42164.0, 1e-8, "a");
    }

    #[test]
    fn test_kozai_brouwer_inverse() {
        let converter = ElementConverter::default();
        let brouwer = converter.brouwer_from_kozai(0.0007028, 51.6388, 15.50265976);
        assert!(brouwer < 15.50265976 && brouwer > 15.49);
        let kozai = converter.kozai_from_brouwer(0.0007028, 51.6388, brouwer);
        assert_close(kozai, 15.50265976, 1e-10, "kozai");
    }

    #[test]
    fn test_mean_elements_reproduce_osculating_state() {
        let converter = ElementConverter::default();
        let epoch = Epoch::from_ds50(27368.5);
        let kep = KeplerianElements::new(6790.0, 0.0008, 51.64, 120.0, 184.2, 306.8);
        let mean = converter.mean_from_keplerian(&kep, epoch).unwrap();
        assert_close(mean.semi_major_axis, 6790.0, 20.0, "a");
        assert_close(mean.inclination, 51.64, 0.1, "i");
        let lon = |m: f64, w: f64| (m + w).rem_euclid(360.0);
        let dl = lon(mean.mean_anomaly, mean.argument_of_perigee) - lon(kep.mean_anomaly, kep.argument_of_perigee);
        assert!(dl.abs() < 0.5 || (dl.abs() - 360.0).abs() < 0.5);
    }

    #[test]
    fn test_geostationary_mean_elements_fit() {
        let converter = ElementConverter::default();
        let mean = converter
            .mean_from_keplerian(&geo_keplerian(), Epoch::from_ds50(27368.5))
            .unwrap();
        assert_close(mean.semi_major_axis, 42164.0, 5.0, "a");
        assert!(mean.eccentricity < 1e-3);
        assert_close(mean.inclination, 0.42, 0.1, "i");
    }

    #[test]
    fn test_state_vector_to_tle_round_trip() {
        let converter = ElementConverter::default();
        let epoch = Epoch::from_ds50(27368.99323416);
        let kep = KeplerianElements::new(6795.0, 0.0007, 51.6388, 201.1123, 184.2057, 306.7642);
        let cart = converter.cartesian_from_keplerian(&kep).unwrap();
        let mut sp = SpVector::new(epoch, cart, 25544).unwrap();
        sp.set_designator("98067A").unwrap();
        sp.b_term = 0.004;

        let record = converter.tle_from_state_vector(&sp, EphemerisType::Sgp4).unwrap();
        assert_eq!(record.satellite_id(), 25544);
        assert_eq!(record.designator(), "98067A");
        assert_close(record.b_star(), 0.004 / B_STAR_TO_B_TERM, 1e-15, "b*");

        let sgp4 = Sgp4::from_record(&record, converter.earth()).unwrap();
        let state = sgp4.propagate(0.0).unwrap();
        assert!((state.position - cart.position).norm() < 1e-5);
        assert!((state.velocity - cart.velocity).norm() < 1e-8);
    }
}
