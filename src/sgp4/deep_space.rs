//! Deep-space (period ≥ 225 min) lunar-solar terms and 12h/24h resonance

use std::f64::consts::{PI, TAU};

use crate::earth::ROTATION_RATE_RAD_PER_MIN;

const ZES: f64 = 0.01675;
const ZEL: f64 = 0.05490;
const ZNS: f64 = 1.19459e-5;
const ZNL: f64 = 1.5835218e-4;

const STEP: f64 = 720.0;
const STEP2: f64 = 259_200.0;

/// Orbit state at the element epoch, radians and radians/minute.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EpochState {
    pub ds50: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    /// Brouwer mean motion.
    pub mean_motion: f64,
    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
    pub gsto: f64,
    pub xke: f64,
}

/// Mean elements carried through the secular and periodic corrections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Osculator {
    pub eccentricity: f64,
    pub inclination: f64,
    pub raan: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    pub mean_motion: f64,
}

/// Coefficients of the long-period lunar and solar perturbations.
#[derive(Debug, Clone, Copy, Default)]
struct Periodics {
    e3: f64,
    ee2: f64,
    se2: f64,
    se3: f64,
    sgh2: f64,
    sgh3: f64,
    sgh4: f64,
    sh2: f64,
    sh3: f64,
    si2: f64,
    si3: f64,
    sl2: f64,
    sl3: f64,
    sl4: f64,
    xgh2: f64,
    xgh3: f64,
    xgh4: f64,
    xh2: f64,
    xh3: f64,
    xi2: f64,
    xi3: f64,
    xl2: f64,
    xl3: f64,
    xl4: f64,
    zmol: f64,
    zmos: f64,
}

#[derive(Debug, Clone, Copy)]
enum Resonance {
    None,
    /// 24h geosynchronous resonance.
    Synchronous { del1: f64, del2: f64, del3: f64 },
    /// 12h resonance for eccentric orbits (Molniya class).
    HalfDay { d: [f64; 10] },
}

#[derive(Debug, Clone, Copy)]
struct Integrator {
    resonance: Resonance,
    xfact: f64,
    xlamo: f64,
}

/// Secular rates and resonance state fixed at initialization.
#[derive(Debug, Clone)]
pub(crate) struct DeepSpace {
    periodics: Periodics,
    dedt: f64,
    didt: f64,
    dmdt: f64,
    dnodt: f64,
    domdt: f64,
    integrator: Integrator,
    epoch: EpochState,
}

/// Geometry shared by the solar and lunar passes of the common terms.
struct SolarLunarSums {
    s: [f64; 7],
    ss: [f64; 7],
    z: ZTerms,
    sz: ZTerms,
}

#[derive(Default, Clone, Copy)]
struct ZTerms {
    z1: f64,
    z2: f64,
    z3: f64,
    z11: f64,
    z12: f64,
    z13: f64,
    z21: f64,
    z22: f64,
    z23: f64,
    z31: f64,
    z32: f64,
    z33: f64,
}

impl DeepSpace {
    pub fn new(epoch: EpochState) -> Self {
        let em = epoch.eccentricity;
        let emsq = em * em;
        let sinim = epoch.inclination.sin();
        let cosim = epoch.inclination.cos();
        let (sums, periodics) = common_terms(&epoch);

        let [s1, s2, s3, s4, s5, _, _] = sums.s;
        let [ss1, ss2, ss3, ss4, ss5, _, _] = sums.ss;
        let z = sums.z;
        let sz = sums.sz;

        let near_equatorial = epoch.inclination < 5.235_987_7e-2
            || epoch.inclination > PI - 5.235_987_7e-2;

        let ses = ss1 * ZNS * ss5;
        let sis = ss2 * ZNS * (sz.z11 + sz.z13);
        let sls = -ZNS * ss3 * (sz.z1 + sz.z3 - 14.0 - 6.0 * emsq);
        let sghs = ss4 * ZNS * (sz.z31 + sz.z33 - 6.0);
        let mut shs = -ZNS * ss2 * (sz.z21 + sz.z23);
        if near_equatorial {
            shs = 0.0;
        }
        if sinim != 0.0 {
            shs /= sinim;
        }
        let sgs = sghs - cosim * shs;

        let dedt = ses + s1 * ZNL * s5;
        let didt = sis + s2 * ZNL * (z.z11 + z.z13);
        let dmdt = sls - ZNL * s3 * (z.z1 + z.z3 - 14.0 - 6.0 * emsq);
        let sghl = s4 * ZNL * (z.z31 + z.z33 - 6.0);
        let mut shll = -ZNL * s2 * (z.z21 + z.z23);
        if near_equatorial {
            shll = 0.0;
        }
        let mut domdt = sgs + sghl;
        let mut dnodt = shs;
        if sinim != 0.0 {
            domdt -= cosim / sinim * shll;
            dnodt += shll / sinim;
        }

        let integrator = resonance_terms(&epoch, dmdt, domdt, dnodt);

        Self {
            periodics,
            dedt,
            didt,
            dmdt,
            dnodt,
            domdt,
            integrator,
            epoch,
        }
    }

    /// Lunar-solar secular drift of the mean anomaly plus argument of perigee (rad/min).
    pub fn secular_argument_rate(&self) -> f64 {
        self.dmdt + self.domdt
    }

    /// Applies secular rates and integrates the resonance from the epoch to `t`.
    ///
    /// Integration always restarts at the epoch, so results depend on `t` only.
    pub fn secular(&self, t: f64, mut state: Osculator) -> Osculator {
        let epoch = &self.epoch;
        let theta = (epoch.gsto + t * ROTATION_RATE_RAD_PER_MIN) % TAU;
        state.eccentricity += self.dedt * t;
        state.inclination += self.didt * t;
        state.argument_of_perigee += self.domdt * t;
        state.raan += self.dnodt * t;
        state.mean_anomaly += self.dmdt * t;

        let Integrator {
            resonance,
            xfact,
            xlamo,
        } = self.integrator;
        if matches!(resonance, Resonance::None) {
            return state;
        }

        let mut atime = 0.0;
        let mut xni = epoch.mean_motion;
        let mut xli = xlamo;
        let delt = if t > 0.0 { STEP } else { -STEP };

        let (xndt, xldot, xnddt, ft) = loop {
            let (xndt, xnddt) = resonance_rates(&resonance, epoch, atime, xli);
            let xldot = xni + xfact;
            let xnddt = xnddt * xldot;
            if (t - atime).abs() < STEP {
                break (xndt, xldot, xnddt, t - atime);
            }
            xli += xldot * delt + xndt * STEP2;
            xni += xndt * delt + xnddt * STEP2;
            atime += delt;
        };

        let nm = xni + xndt * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndt * ft * ft * 0.5;
        state.mean_anomaly = match resonance {
            Resonance::Synchronous { .. } => {
                xl - state.raan - state.argument_of_perigee + theta
            }
            _ => xl - 2.0 * state.raan + 2.0 * theta,
        };
        state.mean_motion = nm;
        state
    }

    /// Adds the long-period lunar-solar periodics at time `t`.
    pub fn periodics(&self, t: f64, mut state: Osculator) -> Osculator {
        let p = &self.periodics;

        let zm = p.zmos + ZNS * t;
        let zf = zm + 2.0 * ZES * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        let ses = p.se2 * f2 + p.se3 * f3;
        let sis = p.si2 * f2 + p.si3 * f3;
        let sls = p.sl2 * f2 + p.sl3 * f3 + p.sl4 * sinzf;
        let sghs = p.sgh2 * f2 + p.sgh3 * f3 + p.sgh4 * sinzf;
        let shs = p.sh2 * f2 + p.sh3 * f3;

        let zm = p.zmol + ZNL * t;
        let zf = zm + 2.0 * ZEL * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        let sel = p.ee2 * f2 + p.e3 * f3;
        let sil = p.xi2 * f2 + p.xi3 * f3;
        let sll = p.xl2 * f2 + p.xl3 * f3 + p.xl4 * sinzf;
        let sghl = p.xgh2 * f2 + p.xgh3 * f3 + p.xgh4 * sinzf;
        let shll = p.xh2 * f2 + p.xh3 * f3;

        let pe = ses + sel;
        let pinc = sis + sil;
        let pl = sls + sll;
        let pgh = sghs + sghl;
        let ph = shs + shll;

        state.inclination += pinc;
        state.eccentricity += pe;
        let sinip = state.inclination.sin();
        let cosip = state.inclination.cos();

        if state.inclination >= 0.2 {
            let ph = ph / sinip;
            state.argument_of_perigee += pgh - cosip * ph;
            state.raan += ph;
            state.mean_anomaly += pl;
        } else {
            // Lyddane modification for low inclinations.
            let sinop = state.raan.sin();
            let cosop = state.raan.cos();
            let alfdp = sinip * sinop + (ph * cosop + pinc * cosip * sinop);
            let betdp = sinip * cosop + (-ph * sinop + pinc * cosip * cosop);
            let mut nodep = state.raan % TAU;
            if nodep < 0.0 {
                nodep += TAU;
            }
            let xls = state.mean_anomaly
                + state.argument_of_perigee
                + pl
                + pgh
                + (cosip - pinc * sinip) * nodep;
            let xnoh = nodep;
            nodep = alfdp.atan2(betdp);
            if nodep < 0.0 {
                nodep += TAU;
            }
            if (xnoh - nodep).abs() > PI {
                if nodep < xnoh {
                    nodep += TAU;
                } else {
                    nodep -= TAU;
                }
            }
            state.mean_anomaly += pl;
            state.argument_of_perigee = xls - state.mean_anomaly - cosip * nodep;
            state.raan = nodep;
        }
        state
    }
}

/// Solar and lunar geometry at the epoch and the periodic coefficients derived from it.
fn common_terms(epoch: &EpochState) -> (SolarLunarSums, Periodics) {
    const C1SS: f64 = 2.986_479_7e-6;
    const C1L: f64 = 4.796_806_5e-7;
    const ZSINIS: f64 = 0.397_854_16;
    const ZCOSIS: f64 = 0.917_448_67;
    const ZCOSGS: f64 = 0.194_590_5;
    const ZSINGS: f64 = -0.980_884_58;

    let em = epoch.eccentricity;
    let snodm = epoch.raan.sin();
    let cnodm = epoch.raan.cos();
    let sinomm = epoch.argument_of_perigee.sin();
    let cosomm = epoch.argument_of_perigee.cos();
    let sinim = epoch.inclination.sin();
    let cosim = epoch.inclination.cos();
    let emsq = em * em;
    let betasq = 1.0 - emsq;
    let rtemsq = betasq.sqrt();

    let day = epoch.ds50 + 18_261.5;
    let xnodce = (4.523_602_0 - 9.242_202_9e-4 * day) % TAU;
    let stem = xnodce.sin();
    let ctem = xnodce.cos();
    let zcosil = 0.913_751_64 - 0.035_680_96 * ctem;
    let zsinil = (1.0 - zcosil * zcosil).sqrt();
    let zsinhl = 0.089_683_511 * stem / zsinil;
    let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
    let gam = 5.835_151_4 + 0.001_944_368_0 * day;
    let zx = 0.397_854_16 * stem / zsinil;
    let zy = zcoshl * ctem + 0.917_448_67 * zsinhl * stem;
    let zx = gam + zx.atan2(zy) - xnodce;
    let zcosgl = zx.cos();
    let zsingl = zx.sin();

    let xnoi = 1.0 / epoch.mean_motion;

    // Solar pass first, then the lunar pass with the Moon's orientation.
    let passes = [
        (ZCOSGS, ZSINGS, ZCOSIS, ZSINIS, cnodm, snodm, C1SS),
        (
            zcosgl,
            zsingl,
            zcosil,
            zsinil,
            zcoshl * cnodm + zsinhl * snodm,
            snodm * zcoshl - cnodm * zsinhl,
            C1L,
        ),
    ];
    let mut results = [([0.0; 7], ZTerms::default()); 2];
    for (slot, &(zcosg, zsing, zcosi, zsini, zcosh, zsinh, cc)) in passes.iter().enumerate() {
        let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
        let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
        let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
        let a8 = zsing * zsini;
        let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
        let a10 = zcosg * zsini;
        let a2 = cosim * a7 + sinim * a8;
        let a4 = cosim * a9 + sinim * a10;
        let a5 = -sinim * a7 + cosim * a8;
        let a6 = -sinim * a9 + cosim * a10;

        let x1 = a1 * cosomm + a2 * sinomm;
        let x2 = a3 * cosomm + a4 * sinomm;
        let x3 = -a1 * sinomm + a2 * cosomm;
        let x4 = -a3 * sinomm + a4 * cosomm;
        let x5 = a5 * sinomm;
        let x6 = a6 * sinomm;
        let x7 = a5 * cosomm;
        let x8 = a6 * cosomm;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);

        let s3 = cc * xnoi;
        let s2 = -0.5 * s3 / rtemsq;
        let s4 = s3 * rtemsq;
        let s1 = -15.0 * em * s4;
        let s5 = x1 * x3 + x2 * x4;
        let s6 = x2 * x3 + x1 * x4;
        let s7 = x2 * x4 - x1 * x3;

        results[slot] = (
            [s1, s2, s3, s4, s5, s6, s7],
            ZTerms {
                z1: z1 + z1 + betasq * z31,
                z2: z2 + z2 + betasq * z32,
                z3: z3 + z3 + betasq * z33,
                z11,
                z12,
                z13,
                z21,
                z22,
                z23,
                z31,
                z32,
                z33,
            },
        );
    }
    let [(ss, sz), (s, z)] = results;

    let periodics = Periodics {
        se2: 2.0 * ss[0] * ss[5],
        se3: 2.0 * ss[0] * ss[6],
        si2: 2.0 * ss[1] * sz.z12,
        si3: 2.0 * ss[1] * (sz.z13 - sz.z11),
        sl2: -2.0 * ss[2] * sz.z2,
        sl3: -2.0 * ss[2] * (sz.z3 - sz.z1),
        sl4: -2.0 * ss[2] * (-21.0 - 9.0 * emsq) * ZES,
        sgh2: 2.0 * ss[3] * sz.z32,
        sgh3: 2.0 * ss[3] * (sz.z33 - sz.z31),
        sgh4: -18.0 * ss[3] * ZES,
        sh2: -2.0 * ss[1] * sz.z22,
        sh3: -2.0 * ss[1] * (sz.z23 - sz.z21),
        ee2: 2.0 * s[0] * s[5],
        e3: 2.0 * s[0] * s[6],
        xi2: 2.0 * s[1] * z.z12,
        xi3: 2.0 * s[1] * (z.z13 - z.z11),
        xl2: -2.0 * s[2] * z.z2,
        xl3: -2.0 * s[2] * (z.z3 - z.z1),
        xl4: -2.0 * s[2] * (-21.0 - 9.0 * emsq) * ZEL,
        xgh2: 2.0 * s[3] * z.z32,
        xgh3: 2.0 * s[3] * (z.z33 - z.z31),
        xgh4: -18.0 * s[3] * ZEL,
        xh2: -2.0 * s[1] * z.z22,
        xh3: -2.0 * s[1] * (z.z23 - z.z21),
        zmol: (4.719_967_2 + 0.229_971_50 * day - gam) % TAU,
        zmos: (6.256_583_7 + 0.017_201_977 * day) % TAU,
    };

    (SolarLunarSums { s, ss, z, sz }, periodics)
}

/// Selects the resonance class and its coefficients.
fn resonance_terms(epoch: &EpochState, dmdt: f64, domdt: f64, dnodt: f64) -> Integrator {
    const Q22: f64 = 1.789_167_9e-6;
    const Q31: f64 = 2.146_074_8e-6;
    const Q33: f64 = 2.212_301_5e-7;
    const ROOT22: f64 = 1.789_167_9e-6;
    const ROOT44: f64 = 7.363_695_3e-9;
    const ROOT54: f64 = 2.176_580_3e-9;
    const ROOT32: f64 = 3.739_379_2e-7;
    const ROOT52: f64 = 1.142_863_9e-7;

    let nm = epoch.mean_motion;
    let em = epoch.eccentricity;
    let emsq = em * em;
    let sinim = epoch.inclination.sin();
    let cosim = epoch.inclination.cos();
    let theta = epoch.gsto % TAU;
    let aonv = (nm / epoch.xke).powf(2.0 / 3.0);
    let rptim = ROTATION_RATE_RAD_PER_MIN;

    let none = Integrator {
        resonance: Resonance::None,
        xfact: 0.0,
        xlamo: 0.0,
    };

    if nm > 0.003_490_658_5 && nm < 0.005_235_987_7 {
        let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
        let g310 = 1.0 + 2.0 * emsq;
        let g300 = 1.0 + emsq * (-6.0 + 6.609_37 * emsq);
        let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
        let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
        let f330 = 1.0 + cosim;
        let f330 = 1.875 * f330 * f330 * f330;
        let del1 = 3.0 * nm * nm * aonv * aonv;
        let del2 = 2.0 * del1 * f220 * g200 * Q22;
        let del3 = 3.0 * del1 * f330 * g300 * Q33 * aonv;
        let del1 = del1 * f311 * g310 * Q31 * aonv;
        let xpidot = epoch.argpdot + epoch.nodedot;
        return Integrator {
            resonance: Resonance::Synchronous { del1, del2, del3 },
            xfact: epoch.mdot + xpidot - rptim + dmdt + domdt + dnodt - nm,
            xlamo: (epoch.mean_anomaly + epoch.raan + epoch.argument_of_perigee - theta) % TAU,
        };
    }

    if !((8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5) {
        return none;
    }

    let cosisq = cosim * cosim;
    let eoc = em * emsq;
    let g201 = -0.306 - (em - 0.64) * 0.440;
    let (g211, g310, g322, g410, g422, g520);
    if em <= 0.65 {
        g211 = 3.616 - 13.2470 * em + 16.2900 * emsq;
        g310 = -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc;
        g322 = -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc;
        g410 = -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc;
        g422 = -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc;
        g520 = -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc;
    } else {
        g211 = -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc;
        g310 = -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc;
        g322 = -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc;
        g410 = -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc;
        g422 = -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc;
        g520 = if em > 0.715 {
            -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
        } else {
            1464.74 - 4664.75 * em + 3763.64 * emsq
        };
    }
    let (g533, g521, g532) = if em < 0.7 {
        (
            -919.22770 + 4988.61 * em - 9064.77 * emsq + 5542.21 * eoc,
            -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc,
            -853.66600 + 4690.25 * em - 8624.77 * emsq + 5341.4 * eoc,
        )
    } else {
        (
            -37995.78 + 161616.52 * em - 229838.2 * emsq + 109377.94 * eoc,
            -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc,
            -40023.88 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc,
        )
    };

    let sini2 = sinim * sinim;
    let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
    let f221 = 1.5 * sini2;
    let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
    let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
    let f441 = 35.0 * sini2 * f220;
    let f442 = 39.375 * sini2 * sini2;
    let f522 = 9.84375
        * sinim
        * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
            + 1.0 / 3.0 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
    let f523 = sinim
        * (4.921_875_12 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
            + 6.562_500_12 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
    let f542 = 29.53125
        * sinim
        * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
    let f543 = 29.53125
        * sinim
        * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

    let xno2 = nm * nm;
    let ainv2 = aonv * aonv;
    let mut temp1 = 3.0 * xno2 * ainv2;
    let mut temp = temp1 * ROOT22;
    let d2201 = temp * f220 * g201;
    let d2211 = temp * f221 * g211;
    temp1 *= aonv;
    temp = temp1 * ROOT32;
    let d3210 = temp * f321 * g310;
    let d3222 = temp * f322 * g322;
    temp1 *= aonv;
    temp = 2.0 * temp1 * ROOT44;
    let d4410 = temp * f441 * g410;
    let d4422 = temp * f442 * g422;
    temp1 *= aonv;
    temp = temp1 * ROOT52;
    let d5220 = temp * f522 * g520;
    let d5232 = temp * f523 * g532;
    temp = 2.0 * temp1 * ROOT54;
    let d5421 = temp * f542 * g521;
    let d5433 = temp * f543 * g533;

    Integrator {
        resonance: Resonance::HalfDay {
            d: [
                d2201, d2211, d3210, d3222, d4410, d4422, d5220, d5232, d5421, d5433,
            ],
        },
        xfact: epoch.mdot + dmdt + 2.0 * (epoch.nodedot + dnodt - rptim) - nm,
        xlamo: (epoch.mean_anomaly + epoch.raan + epoch.raan - theta - theta) % TAU,
    }
}

/// Rate of change of the resonance mean motion and its derivative factor.
fn resonance_rates(resonance: &Resonance, epoch: &EpochState, atime: f64, xli: f64) -> (f64, f64) {
    const FASX2: f64 = 0.131_309_08;
    const FASX4: f64 = 2.884_319_8;
    const FASX6: f64 = 0.374_480_87;
    const G22: f64 = 5.768_639_6;
    const G32: f64 = 0.952_408_98;
    const G44: f64 = 1.801_499_8;
    const G52: f64 = 1.050_833_0;
    const G54: f64 = 4.410_889_8;

    match *resonance {
        Resonance::None => (0.0, 0.0),
        Resonance::Synchronous { del1, del2, del3 } => {
            let xndt = del1 * (xli - FASX2).sin()
                + del2 * (2.0 * (xli - FASX4)).sin()
                + del3 * (3.0 * (xli - FASX6)).sin();
            let xnddt = del1 * (xli - FASX2).cos()
                + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                + 3.0 * del3 * (3.0 * (xli - FASX6)).cos();
            (xndt, xnddt)
        }
        Resonance::HalfDay { d } => {
            let [d2201, d2211, d3210, d3222, d4410, d4422, d5220, d5232, d5421, d5433] = d;
            let xomi = epoch.argument_of_perigee + epoch.argpdot * atime;
            let x2omi = xomi + xomi;
            let x2li = xli + xli;
            let xndt = d2201 * (x2omi + xli - G22).sin()
                + d2211 * (xli - G22).sin()
                + d3210 * (xomi + xli - G32).sin()
                + d3222 * (-xomi + xli - G32).sin()
                + d4410 * (x2omi + x2li - G44).sin()
                + d4422 * (x2li - G44).sin()
                + d5220 * (xomi + xli - G52).sin()
                + d5232 * (-xomi + xli - G52).sin()
                + d5421 * (xomi + x2li - G54).sin()
                + d5433 * (-xomi + x2li - G54).sin();
            let xnddt = d2201 * (x2omi + xli - G22).cos()
                + d2211 * (xli - G22).cos()
                + d3210 * (xomi + xli - G32).cos()
                + d3222 * (-xomi + xli - G32).cos()
                + d5220 * (xomi + xli - G52).cos()
                + d5232 * (-xomi + xli - G52).cos()
                + 2.0
                    * (d4410 * (x2omi + x2li - G44).cos()
                        + d4422 * (x2li - G44).cos()
                        + d5421 * (xomi + x2li - G54).cos()
                        + d5433 * (-xomi + x2li - G54).cos());
            (xndt, xnddt)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::earth::EarthConstants;
    use crate::sgp4::Sgp4;
    use crate::tle::ElementRecord;

    const TIMES: [f64; 7] = [-1440.0, 0.0, 360.0, 1440.0, 2880.0, 4320.0, 10_000.0];

    /// Compares against the `sgp4` crate in AFSPC mode over [`TIMES`].
    fn assert_matches_reference(line1: &str, line2: &str) {
        let record = ElementRecord::parse(line1, line2).unwrap();
        let engine = Sgp4::from_record(&record, &EarthConstants::default()).unwrap();
        assert!(engine.is_deep_space());

        let elements = ::sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes()).unwrap();
        let reference = ::sgp4::Constants::from_elements_afspc_compatibility_mode(&elements).unwrap();

        for minutes in TIMES {
            let expected = reference.propagate_afspc_compatibility_mode(minutes).unwrap();
            let state = engine.propagate(minutes).unwrap();
            for axis in 0..3 {
                assert!(
                    (state.position[axis] - expected.position[axis]).abs() < 1e-6,
                    "t={minutes} position axis {axis}: {} vs {}",
                    state.position[axis],
                    expected.position[axis]
                );
                assert!(
                    (state.velocity[axis] - expected.velocity[axis]).abs() < 1e-8,
                    "t={minutes} velocity axis {axis}: {} vs {}",
                    state.velocity[axis],
                    expected.velocity[axis]
                );
            }
        }
    }

    #[test]
    fn test_twelve_hour_resonance_molniya() {
        assert_matches_reference(
            "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
            "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
        );
    }

    #[test]
    fn test_twelve_hour_resonance_high_eccentricity() {
        assert_matches_reference(
            "1 09880U 77021A   06176.56157475  .00000421  00000-0  10000-3 0  9814",
            "2 09880  64.5968 349.3786 7069051 270.0229  16.3320  2.00813614112380",
        );
    }

    #[test]
    fn test_low_inclination_lyddane_branch() {
        assert_matches_reference(
            "1 23599U 95029B   06171.76535463  .00085586  12891-6  12956-2 0  2905",
            "2 23599   6.9327   0.2849 5782022 274.4436  25.2425  4.47796565123555",
        );
    }

    #[test]
    fn test_long_period_orbit() {
        assert_matches_reference(
            "1 20413U 83020D   05363.79166667  .00000000  00000-0  00000+0 0  7041",
            "2 20413  12.3514 187.4253 7864447 196.3027 356.5478  0.24690082  7978",
        );
    }
}
