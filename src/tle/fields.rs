//! Column layout of the two-line format and the fixed-width codecs for each slot

use crate::error::{Error, Result};

/// Width of a line without its trailing checksum column.
pub const LINE_WIDTH: usize = 68;

/// Every field of the two-line format, with its line and 1-based column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TleField {
    SatelliteNumber1,
    Classification,
    Designator,
    Epoch,
    /// ṅ/2 for SGP/SGP4/XP, outgassing for SP.
    NDotSlot,
    /// n̈/6 for SGP/SGP4, agom for XP/SP.
    NDotDotSlot,
    /// B* for SGP/SGP4, ballistic coefficient for XP/SP.
    DragSlot,
    EphemerisType,
    ElementSetNumber,
    Checksum1,
    SatelliteNumber2,
    Inclination,
    Raan,
    Eccentricity,
    ArgumentOfPerigee,
    MeanAnomaly,
    MeanMotion,
    RevolutionNumber,
    Checksum2,
}

impl TleField {
    pub const ALL: [TleField; 19] = [
        TleField::SatelliteNumber1,
        TleField::Classification,
        TleField::Designator,
        TleField::Epoch,
        TleField::NDotSlot,
        TleField::NDotDotSlot,
        TleField::DragSlot,
        TleField::EphemerisType,
        TleField::ElementSetNumber,
        TleField::Checksum1,
        TleField::SatelliteNumber2,
        TleField::Inclination,
        TleField::Raan,
        TleField::Eccentricity,
        TleField::ArgumentOfPerigee,
        TleField::MeanAnomaly,
        TleField::MeanMotion,
        TleField::RevolutionNumber,
        TleField::Checksum2,
    ];

    /// (line, first column, last column), columns 1-based and inclusive.
    pub const fn layout(self) -> (u8, usize, usize) {
        match self {
            TleField::SatelliteNumber1 => (1, 3, 7),
            TleField::Classification => (1, 8, 8),
            TleField::Designator => (1, 10, 17),
            TleField::Epoch => (1, 19, 32),
            TleField::NDotSlot => (1, 34, 43),
            TleField::NDotDotSlot => (1, 45, 52),
            TleField::DragSlot => (1, 54, 61),
            TleField::EphemerisType => (1, 63, 63),
            TleField::ElementSetNumber => (1, 65, 68),
            TleField::Checksum1 => (1, 69, 69),
            TleField::SatelliteNumber2 => (2, 3, 7),
            TleField::Inclination => (2, 9, 16),
            TleField::Raan => (2, 18, 25),
            TleField::Eccentricity => (2, 27, 33),
            TleField::ArgumentOfPerigee => (2, 35, 42),
            TleField::MeanAnomaly => (2, 44, 51),
            TleField::MeanMotion => (2, 53, 63),
            TleField::RevolutionNumber => (2, 64, 68),
            TleField::Checksum2 => (2, 69, 69),
        }
    }

    pub const fn line(self) -> u8 {
        self.layout().0
    }

    pub const fn width(self) -> usize {
        let (_, first, last) = self.layout();
        last - first + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            TleField::SatelliteNumber1 | TleField::SatelliteNumber2 => "satellite_id",
            TleField::Classification => "classification",
            TleField::Designator => "designator",
            TleField::Epoch => "epoch",
            TleField::NDotSlot => "n_dot",
            TleField::NDotDotSlot => "n_dot_dot",
            TleField::DragSlot => "drag",
            TleField::EphemerisType => "ephemeris_type",
            TleField::ElementSetNumber => "element_set_number",
            TleField::Checksum1 | TleField::Checksum2 => "checksum",
            TleField::Inclination => "inclination",
            TleField::Raan => "raan",
            TleField::Eccentricity => "eccentricity",
            TleField::ArgumentOfPerigee => "argument_of_perigee",
            TleField::MeanAnomaly => "mean_anomaly",
            TleField::MeanMotion => "mean_motion",
            TleField::RevolutionNumber => "revolution_number",
        }
    }

    /// Field for a semantic name; satellite id and checksum resolve to line 1.
    pub fn from_name(name: &str) -> Option<TleField> {
        TleField::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Raw text of this field in `line`.
    pub fn slice(self, line: &str) -> Result<&str> {
        let (_, first, last) = self.layout();
        line.get(first - 1..last)
            .ok_or_else(|| Error::tle(self.line(), self.name(), "line too short"))
    }
}

/// Builder for one fixed-width line.
pub struct LineWriter {
    line: u8,
    buf: Vec<u8>,
}

impl LineWriter {
    pub fn new(line: u8) -> Self {
        let mut buf = vec![b' '; LINE_WIDTH];
        buf[0] = b'0' + line;
        Self { line, buf }
    }

    /// Right-aligns `text` in the field's columns.
    pub fn put(&mut self, field: TleField, text: &str) -> Result<()> {
        let (line, first, last) = field.layout();
        debug_assert_eq!(line, self.line);
        let width = field.width();
        if text.len() > width || !text.is_ascii() {
            return Err(Error::validation(field.name(), text));
        }
        let start = first - 1 + (width - text.len());
        self.buf[start..last].copy_from_slice(text.as_bytes());
        Ok(())
    }

    /// Left-aligns `text`, blank filling the rest of the field.
    pub fn put_left(&mut self, field: TleField, text: &str) -> Result<()> {
        let padded = format!("{:<width$}", text, width = field.width());
        self.put(field, &padded)
    }

    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}

/// Digit sum of the first 68 columns, `-` counting as 1, modulo 10.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(LINE_WIDTH)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// Satellite number, Alpha-5 letters above 99999 (I and O are skipped).
pub fn parse_satellite_number(text: &str, line: u8) -> Result<u32> {
    let text = text.trim();
    let mut chars = text.chars();
    let first = chars
        .next()
        .ok_or_else(|| Error::tle(line, "satellite_id", "empty"))?;
    if first.is_ascii_alphabetic() {
        let prefix = alpha5_value(first.to_ascii_uppercase())
            .ok_or_else(|| Error::tle(line, "satellite_id", text))?;
        let rest: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| Error::tle(line, "satellite_id", text))?;
        Ok(prefix * 10_000 + rest)
    } else {
        text.parse()
            .map_err(|_| Error::tle(line, "satellite_id", text))
    }
}

pub fn format_satellite_number(id: u32) -> Result<String> {
    if id <= 99_999 {
        return Ok(format!("{id:05}"));
    }
    let letter = alpha5_letter(id / 10_000).ok_or_else(|| Error::validation("satellite_id", id))?;
    Ok(format!("{letter}{:04}", id % 10_000))
}

const ALPHA5: &[u8; 24] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

fn alpha5_value(letter: char) -> Option<u32> {
    ALPHA5
        .iter()
        .position(|&c| c as char == letter)
        .map(|index| index as u32 + 10)
}

fn alpha5_letter(value: u32) -> Option<char> {
    value
        .checked_sub(10)
        .and_then(|index| ALPHA5.get(index as usize))
        .map(|&c| c as char)
}

/// Parses a free-format decimal field; blank means zero.
pub fn parse_decimal(text: &str, line: u8, field: &'static str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse()
        .map_err(|_| Error::tle(line, field, format!("not a number: {text:?}")))
}

pub fn parse_integer(text: &str, line: u8, field: &'static str) -> Result<u32> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| Error::tle(line, field, format!("not an integer: {text:?}")))
}

/// Eccentricity with an implied leading decimal point.
pub fn parse_implied_decimal(text: &str, line: u8, field: &'static str) -> Result<f64> {
    let digits = text.trim();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::tle(line, field, format!("not digits: {digits:?}")));
    }
    if digits.is_empty() {
        return Ok(0.0);
    }
    format!("0.{digits}")
        .parse()
        .map_err(|_| Error::tle(line, field, digits.to_string()))
}

/// Parses `SMMMMMEX` style fields (sign, mantissa with implied leading
/// decimal, exponent sign, exponent digits). A blank exponent sign is positive.
pub fn parse_exponential(text: &str, line: u8, field: &'static str) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let malformed = || Error::tle(line, field, format!("bad exponent field: {text:?}"));
    let (sign, body) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if body.len() < 7 || !body.is_ascii() {
        return Err(malformed());
    }
    let mantissa: u32 = body[..5].parse().map_err(|_| malformed())?;
    let exp_sign = match body.as_bytes()[5] {
        b'-' => -1,
        b' ' | b'+' => 1,
        _ => return Err(malformed()),
    };
    let exponent: i32 = body[6..].parse().map_err(|_| malformed())?;
    Ok(sign * mantissa as f64 * 10f64.powi(exp_sign * exponent - 5))
}

/// Inverse of [`parse_exponential`]; `exp_digits` is 1 for the standard
/// 8-column slots and 2 for the SP outgassing slot.
pub fn format_exponential(value: f64, exp_digits: usize, field: &'static str) -> Result<String> {
    let sign = if value < 0.0 { '-' } else { ' ' };
    let magnitude = value.abs();
    let (mut mantissa, mut exponent) = if magnitude == 0.0 {
        (0u32, 0i32)
    } else {
        let exponent = magnitude.log10().floor() as i32 + 1;
        let mantissa = (magnitude * 10f64.powi(5 - exponent)).round() as u32;
        (mantissa, exponent)
    };
    if mantissa >= 100_000 {
        mantissa /= 10;
        exponent += 1;
    }
    let limit = 10i32.pow(exp_digits as u32) - 1;
    if exponent.abs() > limit || !value.is_finite() {
        return Err(Error::validation(field, value));
    }
    let exp_sign = match exponent.signum() {
        -1 => '-',
        0 => ' ',
        _ => '+',
    };
    Ok(format!(
        "{sign}{mantissa:05}{exp_sign}{:0width$}",
        exponent.abs(),
        width = exp_digits
    ))
}

/// `±.NNNNNNNN` first-derivative slot.
pub fn format_signed_fraction(value: f64, field: &'static str) -> Result<String> {
    let text = format!("{:.8}", value.abs());
    let fraction = text
        .strip_prefix('0')
        .filter(|rest| rest.starts_with('.'))
        .ok_or_else(|| Error::validation(field, value))?;
    let sign = if value < 0.0 { '-' } else { '+' };
    Ok(format!("{sign}{fraction}"))
}

/// Fixed-point angle or mean-motion column.
pub fn format_fixed(value: f64, width: usize, precision: usize, field: &'static str) -> Result<String> {
    let text = format!("{value:width$.precision$}");
    if text.len() > width {
        return Err(Error::validation(field, value));
    }
    Ok(text)
}
