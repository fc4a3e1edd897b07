//! Two-line element records
//!
//! [`ElementRecord`] is the validated, structured form of a TLE. The text
//! lines are produced on demand by [`ElementRecord::lines`] and parsed by
//! [`ElementRecord::parse`]; the record never caches an encoding.

pub mod fields;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::elements::ClassicalElements;
use crate::error::{Error, Result};
use crate::time::Epoch;

pub use fields::TleField;
use fields::{
    checksum, format_exponential, format_fixed, format_satellite_number, format_signed_fraction,
    parse_decimal, parse_exponential, parse_implied_decimal, parse_integer,
    parse_satellite_number, LineWriter, LINE_WIDTH,
};

/// Highest identifier representable in the Alpha-5 scheme (`Z9999`).
pub const MAX_SATELLITE_ID: u32 = 339_999;
pub const MAX_DESIGNATOR_LENGTH: usize = 8;
/// Conversion factor between B* (1/earth radii) and the ballistic coefficient (m²/kg).
pub const B_STAR_TO_B_TERM: f64 = 12.741_621;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    /// Blank column.
    None,
    #[default]
    Unclassified,
    Confidential,
    Secret,
}

impl Classification {
    pub fn as_char(self) -> char {
        match self {
            Classification::None => ' ',
            Classification::Unclassified => 'U',
            Classification::Confidential => 'C',
            Classification::Secret => 'S',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Classification::None),
            'U' => Some(Classification::Unclassified),
            'C' => Some(Classification::Confidential),
            'S' => Some(Classification::Secret),
            _ => None,
        }
    }
}

/// Ephemeris-model tag from the ephemeris-type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EphemerisType {
    Sgp = 0,
    Sgp4 = 2,
    Sgp4Xp = 4,
    Sp = 6,
}

impl EphemerisType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(EphemerisType::Sgp),
            2 => Some(EphemerisType::Sgp4),
            4 => Some(EphemerisType::Sgp4Xp),
            6 => Some(EphemerisType::Sp),
            _ => None,
        }
    }
}

impl fmt::Display for EphemerisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EphemerisType::Sgp => "SGP",
            EphemerisType::Sgp4 => "SGP4",
            EphemerisType::Sgp4Xp => "SGP4-XP",
            EphemerisType::Sp => "SP",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Model-dependent contents of the three perturbation slots on line 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Perturbations {
    Sgp {
        n_dot: f64,
        n_dot_dot: f64,
        b_star: f64,
    },
    Sgp4 {
        n_dot: f64,
        n_dot_dot: f64,
        b_star: f64,
    },
    Sgp4Xp {
        n_dot: f64,
        agom: f64,
        b_term: f64,
    },
    Sp {
        outgassing: f64,
        agom: f64,
        b_term: f64,
    },
}

impl Perturbations {
    pub fn ephemeris_type(&self) -> EphemerisType {
        match self {
            Perturbations::Sgp { .. } => EphemerisType::Sgp,
            Perturbations::Sgp4 { .. } => EphemerisType::Sgp4,
            Perturbations::Sgp4Xp { .. } => EphemerisType::Sgp4Xp,
            Perturbations::Sp { .. } => EphemerisType::Sp,
        }
    }

    fn values(&self) -> [f64; 3] {
        match *self {
            Perturbations::Sgp { n_dot, n_dot_dot, b_star }
            | Perturbations::Sgp4 { n_dot, n_dot_dot, b_star } => [n_dot, n_dot_dot, b_star],
            Perturbations::Sgp4Xp { n_dot, agom, b_term } => [n_dot, agom, b_term],
            Perturbations::Sp { outgassing, agom, b_term } => [outgassing, agom, b_term],
        }
    }
}

/// Validated element set for one satellite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    satellite_id: u32,
    pub classification: Classification,
    designator: String,
    pub epoch: Epoch,
    /// Kozai mean motion (rev/day).
    mean_motion: f64,
    eccentricity: f64,
    inclination: f64,
    raan: f64,
    argument_of_perigee: f64,
    mean_anomaly: f64,
    pub perturbations: Perturbations,
    pub element_set_number: u32,
    pub revolution_number: u32,
}

pub fn validate_satellite_id(satellite_id: u32) -> Result<()> {
    if satellite_id > MAX_SATELLITE_ID {
        return Err(Error::validation("satellite_id", satellite_id));
    }
    Ok(())
}

pub fn validate_designator(designator: &str) -> Result<()> {
    if designator.len() > MAX_DESIGNATOR_LENGTH || !designator.is_ascii() {
        return Err(Error::validation("designator", designator));
    }
    Ok(())
}

fn check(field: &'static str, value: f64, valid: bool) -> Result<()> {
    if valid && value.is_finite() {
        Ok(())
    } else {
        Err(Error::BadElement { field, value })
    }
}

impl ElementRecord {
    /// SGP4 record from classical mean elements with zero drag.
    pub fn from_classical(satellite_id: u32, epoch: Epoch, elements: &ClassicalElements) -> Result<Self> {
        let record = Self {
            satellite_id,
            classification: Classification::Unclassified,
            designator: String::new(),
            epoch,
            mean_motion: elements.mean_motion,
            eccentricity: elements.eccentricity,
            inclination: elements.inclination,
            raan: elements.raan,
            argument_of_perigee: elements.argument_of_perigee,
            mean_anomaly: elements.mean_anomaly,
            perturbations: Perturbations::Sgp4 {
                n_dot: 0.0,
                n_dot_dot: 0.0,
                b_star: 0.0,
            },
            element_set_number: 0,
            revolution_number: 0,
        };
        record.validate()?;
        Ok(record)
    }

    /// Parses a line pair; a checksum in column 69 is verified when present.
    pub fn parse(line1: &str, line2: &str) -> Result<Self> {
        let line1 = normalize_line(line1, 1)?;
        let line2 = normalize_line(line2, 2)?;

        let satellite_id =
            parse_satellite_number(TleField::SatelliteNumber1.slice(&line1)?, 1)?;
        let second_id = parse_satellite_number(TleField::SatelliteNumber2.slice(&line2)?, 2)?;
        if second_id != satellite_id {
            return Err(Error::tle(
                2,
                "satellite_id",
                format!("{second_id} does not match line 1 ({satellite_id})"),
            ));
        }

        let class_char = TleField::Classification
            .slice(&line1)?
            .chars()
            .next()
            .unwrap_or(' ');
        let classification = Classification::from_char(class_char)
            .ok_or_else(|| Error::tle(1, "classification", format!("{class_char:?}")))?;
        let designator = TleField::Designator.slice(&line1)?.trim().to_string();

        let epoch_text = TleField::Epoch.slice(&line1)?;
        let year = parse_integer(&epoch_text[..2], 1, "epoch")?;
        let day_of_year = parse_decimal(&epoch_text[2..], 1, "epoch")?;
        let epoch = Epoch::from_tle_epoch(year, day_of_year)
            .map_err(|_| Error::tle(1, "epoch", epoch_text.trim()))?;

        let type_text = TleField::EphemerisType.slice(&line1)?.trim();
        let type_code = if type_text.is_empty() {
            0
        } else {
            type_text
                .parse::<u8>()
                .map_err(|_| Error::tle(1, "ephemeris_type", type_text))?
        };
        let model = EphemerisType::from_code(type_code)
            .ok_or_else(|| Error::tle(1, "ephemeris_type", type_text))?;

        let slot1 = TleField::NDotSlot.slice(&line1)?;
        let slot2 = parse_exponential(TleField::NDotDotSlot.slice(&line1)?, 1, "n_dot_dot")?;
        let slot3 = parse_exponential(TleField::DragSlot.slice(&line1)?, 1, "drag")?;
        let perturbations = match model {
            EphemerisType::Sgp => Perturbations::Sgp {
                n_dot: parse_decimal(slot1, 1, "n_dot")?,
                n_dot_dot: slot2,
                b_star: slot3,
            },
            EphemerisType::Sgp4 => Perturbations::Sgp4 {
                n_dot: parse_decimal(slot1, 1, "n_dot")?,
                n_dot_dot: slot2,
                b_star: slot3,
            },
            EphemerisType::Sgp4Xp => Perturbations::Sgp4Xp {
                n_dot: parse_decimal(slot1, 1, "n_dot")?,
                agom: slot2,
                b_term: slot3,
            },
            EphemerisType::Sp => Perturbations::Sp {
                outgassing: parse_exponential(slot1, 1, "outgassing")?,
                agom: slot2,
                b_term: slot3,
            },
        };

        let record = Self {
            satellite_id,
            classification,
            designator,
            epoch,
            mean_motion: parse_decimal(TleField::MeanMotion.slice(&line2)?, 2, "mean_motion")?,
            eccentricity: parse_implied_decimal(
                TleField::Eccentricity.slice(&line2)?,
                2,
                "eccentricity",
            )?,
            inclination: parse_decimal(TleField::Inclination.slice(&line2)?, 2, "inclination")?,
            raan: parse_decimal(TleField::Raan.slice(&line2)?, 2, "raan")?,
            argument_of_perigee: parse_decimal(
                TleField::ArgumentOfPerigee.slice(&line2)?,
                2,
                "argument_of_perigee",
            )?,
            mean_anomaly: parse_decimal(TleField::MeanAnomaly.slice(&line2)?, 2, "mean_anomaly")?,
            perturbations,
            element_set_number: parse_integer(
                TleField::ElementSetNumber.slice(&line1)?,
                1,
                "element_set_number",
            )?,
            revolution_number: parse_integer(
                TleField::RevolutionNumber.slice(&line2)?,
                2,
                "revolution_number",
            )?,
        };
        record.validate()?;
        Ok(record)
    }

    /// Encodes the record as a 68-column line pair.
    pub fn lines(&self) -> Result<(String, String)> {
        let satellite = format_satellite_number(self.satellite_id)?;
        let [slot1, slot2, slot3] = self.perturbations.values();

        let mut line1 = LineWriter::new(1);
        line1.put(TleField::SatelliteNumber1, &satellite)?;
        line1.put(
            TleField::Classification,
            &self.classification.as_char().to_string(),
        )?;
        line1.put_left(TleField::Designator, &self.designator)?;
        let (year, day_of_year) = self.epoch.to_tle_epoch();
        line1.put(TleField::Epoch, &format!("{year:02}{day_of_year:012.8}"))?;
        let first_slot = match self.perturbations {
            Perturbations::Sp { .. } => format_exponential(slot1, 2, "outgassing")?,
            _ => format_signed_fraction(slot1, "n_dot")?,
        };
        line1.put(TleField::NDotSlot, &first_slot)?;
        line1.put(TleField::NDotDotSlot, &format_exponential(slot2, 1, "n_dot_dot")?)?;
        line1.put(TleField::DragSlot, &format_exponential(slot3, 1, "drag")?)?;
        line1.put(
            TleField::EphemerisType,
            &self.ephemeris_type().code().to_string(),
        )?;
        line1.put(
            TleField::ElementSetNumber,
            &format!("{:04}", self.element_set_number),
        )?;

        let mut line2 = LineWriter::new(2);
        line2.put(TleField::SatelliteNumber2, &satellite)?;
        line2.put(
            TleField::Inclination,
            &format_fixed(self.inclination, 8, 4, "inclination")?,
        )?;
        line2.put(TleField::Raan, &format_fixed(self.raan, 8, 4, "raan")?)?;
        let ecc_digits = (self.eccentricity * 1e7).round() as u32;
        line2.put(TleField::Eccentricity, &format!("{ecc_digits:07}"))?;
        line2.put(
            TleField::ArgumentOfPerigee,
            &format_fixed(self.argument_of_perigee, 8, 4, "argument_of_perigee")?,
        )?;
        line2.put(
            TleField::MeanAnomaly,
            &format_fixed(self.mean_anomaly, 8, 4, "mean_anomaly")?,
        )?;
        line2.put(
            TleField::MeanMotion,
            &format_fixed(self.mean_motion, 11, 8, "mean_motion")?,
        )?;
        line2.put(
            TleField::RevolutionNumber,
            &format!("{:05}", self.revolution_number),
        )?;

        Ok((line1.finish(), line2.finish()))
    }

    /// Identifier and designator bounds.
    pub fn validate_identity(&self) -> Result<()> {
        validate_satellite_id(self.satellite_id)?;
        validate_designator(&self.designator)
    }

    /// Element ranges accepted by the propagator.
    pub fn validate_elements(&self) -> Result<()> {
        check(
            "eccentricity",
            self.eccentricity,
            (0.0..1.0).contains(&self.eccentricity),
        )?;
        check("mean_motion", self.mean_motion, self.mean_motion > 0.0)?;
        check(
            "inclination",
            self.inclination,
            (0.0..=180.0).contains(&self.inclination),
        )?;
        check("raan", self.raan, true)?;
        check("argument_of_perigee", self.argument_of_perigee, true)?;
        check("mean_anomaly", self.mean_anomaly, true)?;
        for value in self.perturbations.values() {
            check("perturbations", value, true)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_identity()?;
        self.validate_elements()
    }

    pub fn satellite_id(&self) -> u32 {
        self.satellite_id
    }

    pub fn set_satellite_id(&mut self, satellite_id: u32) -> Result<()> {
        validate_satellite_id(satellite_id)?;
        self.satellite_id = satellite_id;
        Ok(())
    }

    pub fn designator(&self) -> &str {
        &self.designator
    }

    pub fn set_designator(&mut self, designator: &str) -> Result<()> {
        validate_designator(designator)?;
        self.designator = designator.to_string();
        Ok(())
    }

    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    pub fn set_mean_motion(&mut self, mean_motion: f64) -> Result<()> {
        check("mean_motion", mean_motion, mean_motion > 0.0)?;
        self.mean_motion = mean_motion;
        Ok(())
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn set_eccentricity(&mut self, eccentricity: f64) -> Result<()> {
        check("eccentricity", eccentricity, (0.0..1.0).contains(&eccentricity))?;
        self.eccentricity = eccentricity;
        Ok(())
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    pub fn set_inclination(&mut self, inclination: f64) -> Result<()> {
        check("inclination", inclination, (0.0..=180.0).contains(&inclination))?;
        self.inclination = inclination;
        Ok(())
    }

    pub fn raan(&self) -> f64 {
        self.raan
    }

    pub fn set_raan(&mut self, raan: f64) -> Result<()> {
        check("raan", raan, true)?;
        self.raan = raan;
        Ok(())
    }

    pub fn argument_of_perigee(&self) -> f64 {
        self.argument_of_perigee
    }

    pub fn set_argument_of_perigee(&mut self, argument_of_perigee: f64) -> Result<()> {
        check("argument_of_perigee", argument_of_perigee, true)?;
        self.argument_of_perigee = argument_of_perigee;
        Ok(())
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.mean_anomaly
    }

    pub fn set_mean_anomaly(&mut self, mean_anomaly: f64) -> Result<()> {
        check("mean_anomaly", mean_anomaly, true)?;
        self.mean_anomaly = mean_anomaly;
        Ok(())
    }

    pub fn classical_elements(&self) -> ClassicalElements {
        ClassicalElements::new(
            self.mean_motion,
            self.eccentricity,
            self.inclination,
            self.mean_anomaly,
            self.raan,
            self.argument_of_perigee,
        )
    }

    pub fn ephemeris_type(&self) -> EphemerisType {
        self.perturbations.ephemeris_type()
    }

    /// Re-tags the record, carrying drag and SRP terms across the slot layouts.
    pub fn set_ephemeris_type(&mut self, model: EphemerisType) {
        let n_dot = self.n_dot();
        let n_dot_dot = self.n_dot_dot();
        let b_star = self.b_star();
        let b_term = self.ballistic_coefficient();
        let agom = self.agom();
        let outgassing = self.outgassing();
        self.perturbations = match model {
            EphemerisType::Sgp => Perturbations::Sgp {
                n_dot,
                n_dot_dot,
                b_star,
            },
            EphemerisType::Sgp4 => Perturbations::Sgp4 {
                n_dot,
                n_dot_dot,
                b_star,
            },
            EphemerisType::Sgp4Xp => Perturbations::Sgp4Xp { n_dot, agom, b_term },
            EphemerisType::Sp => Perturbations::Sp {
                outgassing,
                agom,
                b_term,
            },
        };
    }

    /// First derivative of mean motion over two (rev/day²); zero for SP.
    pub fn n_dot(&self) -> f64 {
        match self.perturbations {
            Perturbations::Sgp { n_dot, .. }
            | Perturbations::Sgp4 { n_dot, .. }
            | Perturbations::Sgp4Xp { n_dot, .. } => n_dot,
            Perturbations::Sp { .. } => 0.0,
        }
    }

    /// Second derivative of mean motion over six (rev/day³); SGP/SGP4 only.
    pub fn n_dot_dot(&self) -> f64 {
        match self.perturbations {
            Perturbations::Sgp { n_dot_dot, .. } | Perturbations::Sgp4 { n_dot_dot, .. } => {
                n_dot_dot
            }
            _ => 0.0,
        }
    }

    /// Drag term in 1/earth radii, derived from the ballistic coefficient for XP/SP.
    pub fn b_star(&self) -> f64 {
        match self.perturbations {
            Perturbations::Sgp { b_star, .. } | Perturbations::Sgp4 { b_star, .. } => b_star,
            Perturbations::Sgp4Xp { b_term, .. } | Perturbations::Sp { b_term, .. } => {
                b_term / B_STAR_TO_B_TERM
            }
        }
    }

    /// Ballistic coefficient (m²/kg), derived from B* for SGP/SGP4.
    pub fn ballistic_coefficient(&self) -> f64 {
        match self.perturbations {
            Perturbations::Sgp { b_star, .. } | Perturbations::Sgp4 { b_star, .. } => {
                b_star * B_STAR_TO_B_TERM
            }
            Perturbations::Sgp4Xp { b_term, .. } | Perturbations::Sp { b_term, .. } => b_term,
        }
    }

    pub fn agom(&self) -> f64 {
        match self.perturbations {
            Perturbations::Sgp4Xp { agom, .. } | Perturbations::Sp { agom, .. } => agom,
            _ => 0.0,
        }
    }

    pub fn outgassing(&self) -> f64 {
        match self.perturbations {
            Perturbations::Sp { outgassing, .. } => outgassing,
            _ => 0.0,
        }
    }
}

/// Trims line endings, pads short lines and verifies the optional checksum.
fn normalize_line(raw: &str, line: u8) -> Result<String> {
    let text = raw.trim_end();
    if !text.is_ascii() {
        return Err(Error::tle(line, "line", "non-ASCII characters"));
    }
    if !text.starts_with(char::from(b'0' + line)) {
        return Err(Error::tle(line, "line", format!("must start with '{line}'")));
    }
    if text.len() > LINE_WIDTH + 1 {
        return Err(Error::tle(
            line,
            "line",
            format!("{} columns, expected at most {}", text.len(), LINE_WIDTH + 1),
        ));
    }
    if text.len() == LINE_WIDTH + 1 {
        let expected = checksum(text);
        let found = text.as_bytes()[LINE_WIDTH];
        if found != b'0' + expected {
            return Err(Error::tle(
                line,
                "checksum",
                format!("expected {expected}, found {:?}", found as char),
            ));
        }
    }
    Ok(format!("{text:<width$}", width = LINE_WIDTH + 1))
}
