//! The measurement system used in this crate. The SI quantities are redefined so that they are
//! stored in the base units that make sense for mass spectrometry: masses in dalton, charges in
//! elementary charges, and m/z in thomson.
#![allow(
    clippy::non_canonical_clone_impl,
    clippy::ignored_unit_patterns,
    clippy::wildcard_imports,
    missing_docs
)]

use std::{
    cmp::Ordering,
    hash::Hash,
    ops::{Deref, DerefMut},
};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// The mass quantity in dalton
#[macro_use]
pub mod mass {
    quantity! {
        /// Mass (base unit dalton, Da)
        quantity: Mass; "mass";
        /// Mass
        dimension: Q<P1, Z0>;
        units {
            @millidalton: 0.001; "mDa", "millidalton", "millidaltons";
            @dalton: 1.0; "Da", "dalton", "daltons";
            @kilodalton: 1_000.0; "kDa", "kilodalton", "kilodaltons";
        }
    }
}

/// The charge quantity in elementary charges
#[macro_use]
pub mod charge {
    quantity! {
        /// Charge (base unit the elementary charge, e)
        quantity: Charge; "charge";
        /// Charge
        dimension: Q<Z0, P1>;
        units {
            @e: 1.0; "e", "atomic_unit_of_charge", "atomic_units_of_charge";
        }
    }
}

/// The mass over charge quantity
#[macro_use]
pub mod mass_over_charge {
    quantity! {
        /// Mass over charge (base unit thomson, Th)
        quantity: MassOverCharge; "mass_over_charge";
        /// Mass over charge
        dimension: Q<P1, N1>;
        units {
            @thomson: 1.0; "Th", "thomson", "thomsons";
            @mz: 1.0; "m/z", "mass_over_charge", "mass_over_charge";
        }
    }
}

/// The unitless quantity
#[macro_use]
pub mod ratio {
    quantity! {
        /// Unitless quantity
        quantity: Ratio; "ratio";
        /// Unitless
        dimension: Q<Z0, Z0>;
        units {
            @fraction: 1.0; "⅟", "fraction", "fraction";
            @percent: 0.01; "%", "percent", "percent";
            @promille: 0.001; "‰", "promille", "promille";
            @ppm: 0.000_001; "ppm", "ppm", "ppm";
        }
    }
}

system! {
    /// Quantities
    #[doc(hidden)]
    quantities: Q {
        /// Mass in dalton
        mass: dalton, M;
        /// Charge in electrons
        charge: e, C;
    }

    /// Units
    units: U {
        mod mass::Mass,
        mod charge::Charge,
        mod mass_over_charge::MassOverCharge,
        mod ratio::Ratio,
    }
}

/// The whole measurement system with `f64` values
#[allow(unused_imports)]
pub mod f64 {
    mod mks {
        pub use super::super::*;
    }

    Q!(self::mks, f64);

    pub use super::charge::e;
    pub use super::mass::dalton;
    pub use super::mass_over_charge::{mz, thomson};
    pub use super::ratio::{fraction, ppm};

    /// Annotate the given number as being in Da
    pub fn da(v: f64) -> Mass {
        Mass::new::<super::mass::dalton>(v)
    }
}

/// The whole measurement system with `isize` values
#[allow(unused_imports)]
pub mod isize {
    mod mks {
        pub use super::super::*;
    }

    Q!(self::mks, isize);

    pub use super::charge::e;
}

pub use self::f64::*;

macro_rules! ordered_quantity {
    ($(#[$meta:meta])* $name:ident, $quantity:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name($quantity);

        impl $name {
            /// Get the wrapped quantity
            pub const fn into_inner(self) -> $quantity {
                self.0
            }

            /// Zero in the base unit
            pub fn zero() -> Self {
                Self($quantity {
                    dimension: std::marker::PhantomData,
                    units: std::marker::PhantomData,
                    value: 0.0,
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl From<$quantity> for $name {
            fn from(value: $quantity) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $quantity {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Deref for $name {
            type Target = $quantity;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                OrderedFloat(self.0.value).cmp(&OrderedFloat(other.0.value))
            }
        }

        impl Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                OrderedFloat(self.0.value).hash(state);
            }
        }
    };
}

ordered_quantity!(
    /// A [`Mass`] that implements [`Eq`], [`Ord`], and [`Hash`], so it can be used in types
    /// that derive those
    OrderedMass,
    Mass
);
ordered_quantity!(
    /// A [`MassOverCharge`] that implements [`Eq`], [`Ord`], and [`Hash`]
    OrderedMassOverCharge,
    MassOverCharge
);
ordered_quantity!(
    /// A [`Ratio`] that implements [`Eq`], [`Ord`], and [`Hash`]
    OrderedRatio,
    Ratio
);
