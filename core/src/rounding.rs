//! Rounding of values for display.
//!
//! A [`Rounder`] rounds a value and renders it without trailing zeros. Use
//! [`RounderFactory::create`] to pick an implementation from a precision setting,
//! where a precision of zero means "do not round".

use crate::maths::{round_to_decimal_places, round_to_significant};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

pub trait Rounder: Send + Sync {
    fn round(&self, value: f64) -> f64;

    /// Round and convert to a string with no trailing zeros.
    fn to_string(&self, value: f64) -> String {
        format_plain(self.round(value))
    }
}

/// The kind of rounding a [`Rounder`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
pub enum Rounding {
    None,
    SignificantDigits,
    DecimalPlaces,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NonRoundingRounder;

impl Rounder for NonRoundingRounder {
    fn round(&self, value: f64) -> f64 {
        value
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SignificantDigitsRounder {
    precision: u32,
}

impl SignificantDigitsRounder {
    /// Precision below one is raised to one.
    pub fn new(precision: u32) -> Self {
        Self {
            precision: precision.max(1),
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

impl Rounder for SignificantDigitsRounder {
    fn round(&self, value: f64) -> f64 {
        round_to_significant(value, self.precision)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecimalPlacesRounder {
    places: i32,
}

impl DecimalPlacesRounder {
    pub fn new(places: i32) -> Self {
        Self { places }
    }

    pub fn places(&self) -> i32 {
        self.places
    }
}

impl Rounder for DecimalPlacesRounder {
    fn round(&self, value: f64) -> f64 {
        round_to_decimal_places(value, self.places)
    }
}

pub struct RounderFactory;

impl RounderFactory {
    /// Create a rounder for the given number of significant digits.
    ///
    /// A precision of zero returns a rounder that leaves values unchanged.
    pub fn create(precision: u32) -> Box<dyn Rounder> {
        if precision == 0 {
            Box::new(NonRoundingRounder)
        } else {
            Box::new(SignificantDigitsRounder::new(precision))
        }
    }

    pub fn create_with(rounding: Rounding, precision: i32) -> Box<dyn Rounder> {
        match rounding {
            Rounding::None => Box::new(NonRoundingRounder),
            Rounding::SignificantDigits => {
                Box::new(SignificantDigitsRounder::new(precision.max(0) as u32))
            }
            Rounding::DecimalPlaces => Box::new(DecimalPlacesRounder::new(precision)),
        }
    }
}

/// Render a value without trailing zeros.
///
/// Values in `[1e-3, 1e7)` (and zero) are rendered in positional notation; others
/// use scientific notation.
pub fn format_plain(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // Display for f64 prints the shortest round-trip representation.
        let s = value.to_string();
        if s == "-0" { "0".to_string() } else { s }
    } else {
        format!("{:e}", value)
    }
}
