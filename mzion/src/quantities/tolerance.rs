use std::{
    fmt::Display,
    ops::{Add, Mul, Sub},
    str::FromStr,
};

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::{
    IonError,
    system::{Mass, MassOverCharge, OrderedRatio, Ratio, dalton, fraction, ppm, thomson},
};

/// A tolerance around a given value for searching purposes
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Tolerance<T> {
    /// An absolute tolerance defined by a constant offset from the unit (bounds are unit - tolerance, unit + tolerance)
    Absolute(T),
    /// A relative tolerance defined by a ratio of the unit (bounds are unit * (1 - tolerance), unit * (1 + tolerance))
    Relative(OrderedRatio),
    /// The widest window of an absolute and a relative tolerance, the absolute part dominates
    /// at low values
    Maximum {
        /// The absolute part
        absolute: T,
        /// The relative part
        relative: OrderedRatio,
    },
}

impl<T> Tolerance<T> {
    /// Create a new ppm value
    pub fn new_ppm(value: f64) -> Self {
        Self::Relative(Ratio::new::<ppm>(value).into())
    }

    /// Create a new absolute value
    pub const fn new_absolute(value: T) -> Self {
        Self::Absolute(value)
    }

    /// Create a tolerance that takes the widest window of the given absolute and ppm tolerances
    pub fn new_maximum(absolute: T, ppm_value: f64) -> Self {
        Self::Maximum {
            absolute,
            relative: Ratio::new::<ppm>(ppm_value).into(),
        }
    }

    /// Find the bounds around a given value for this tolerance
    pub fn bounds(&self, value: impl Into<T>) -> (T, T)
    where
        T: Copy + PartialOrd + Add<T, Output = T> + Sub<T, Output = T> + Mul<Ratio, Output = T>,
    {
        let value = value.into();
        let relative = |ratio: &OrderedRatio| {
            let one = Ratio::new::<fraction>(1.0);
            let a = value * (one - ratio.into_inner());
            let b = value * (one + ratio.into_inner());
            if a <= b { (a, b) } else { (b, a) }
        };
        match self {
            Self::Absolute(tolerance) => (value - *tolerance, value + *tolerance),
            Self::Relative(ratio) => relative(ratio),
            Self::Maximum { absolute, relative: ratio } => {
                let (low, high) = relative(ratio);
                let (abs_low, abs_high) = (value - *absolute, value + *absolute);
                (
                    if abs_low < low { abs_low } else { low },
                    if abs_high > high { abs_high } else { high },
                )
            }
        }
    }

    /// See if these two values are within this tolerance of each other, the tolerance window is
    /// determined based on the first value
    pub fn within(&self, a: impl Into<T>, b: impl Into<T>) -> bool
    where
        T: Copy + PartialOrd + Add<T, Output = T> + Sub<T, Output = T> + Mul<Ratio, Output = T>,
    {
        let b = b.into();
        let (low, high) = self.bounds(a);
        low <= b && b <= high
    }
}

/// Parse a tolerance from text, returns the absolute part (in the base unit) and the relative
/// part (in ppm). One of the two is always set.
fn parse_tolerance(
    s: &str,
    absolute_units: &[&str],
) -> Result<(Option<f64>, Option<f64>), BoxedError<'static, IonError>> {
    let error = |long: String| {
        BoxedError::new(
            IonError::InvalidTolerance,
            "Invalid tolerance",
            long,
            Context::show(s.to_string()),
        )
    };
    let parse_single = |text: &str| -> Result<(f64, bool), BoxedError<'static, IonError>> {
        let text = text.trim();
        let split = text
            .char_indices()
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map_or(text.len(), |(i, _)| i);
        let (number, unit) = text.split_at(split);
        let value = number
            .trim()
            .parse::<f64>()
            .map_err(|err| error(format!("The number could not be parsed: {err}")))?;
        if !value.is_finite() || value < 0.0 {
            return Err(error(
                "A tolerance has to be a finite positive number".to_string(),
            ));
        }
        let unit = unit.trim().to_ascii_lowercase();
        if unit == "ppm" {
            Ok((value, true))
        } else if absolute_units.contains(&unit.as_str()) {
            Ok((value, false))
        } else {
            Err(error(format!(
                "The unit has to be 'ppm' or one of: {}",
                absolute_units.join(", ")
            )))
        }
    };
    let lower = s.to_ascii_lowercase();
    if let Some(index) = lower.find(" or ") {
        match (parse_single(&s[..index])?, parse_single(&s[index + 4..])?) {
            ((absolute, false), (relative, true)) | ((relative, true), (absolute, false)) => {
                Ok((Some(absolute), Some(relative)))
            }
            _ => Err(error(
                "A combined tolerance needs one absolute and one relative (ppm) part".to_string(),
            )),
        }
    } else {
        let (value, relative) = parse_single(s)?;
        Ok(if relative {
            (None, Some(value))
        } else {
            (Some(value), None)
        })
    }
}

macro_rules! tolerance_text {
    ($quantity:ident, $unit:ident, $symbol:literal, $units:expr) => {
        impl Display for Tolerance<$quantity> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    Self::Absolute(value) => write!(f, "{} {}", value.get::<$unit>(), $symbol),
                    Self::Relative(ratio) => write!(f, "{} ppm", ratio.get::<ppm>()),
                    Self::Maximum { absolute, relative } => write!(
                        f,
                        "{} {} or {} ppm",
                        absolute.get::<$unit>(),
                        $symbol,
                        relative.get::<ppm>()
                    ),
                }
            }
        }

        impl FromStr for Tolerance<$quantity> {
            type Err = BoxedError<'static, IonError>;
            /// Parse a tolerance from text, the accepted forms are `<n> ppm`, `<n> <unit>`, and
            /// `<n> <unit> or <n> ppm` (the unit is case insensitive, the space is optional).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match parse_tolerance(s, $units)? {
                    (Some(absolute), Some(relative)) => {
                        Self::new_maximum($quantity::new::<$unit>(absolute), relative)
                    }
                    (Some(absolute), None) => Self::Absolute($quantity::new::<$unit>(absolute)),
                    (None, relative) => Self::new_ppm(relative.unwrap_or_default()),
                })
            }
        }
    };
}

tolerance_text!(Mass, dalton, "Da", &["da", "dalton"]);
tolerance_text!(MassOverCharge, thomson, "Th", &["th", "thomson", "mz"]);
