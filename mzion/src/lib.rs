#![doc = include_str!("../README.md")]
#![expect(macro_use_extern_crate)] // uom quantities need the macros

#[cfg(test)]
use env_logger as _;

#[macro_use]
mod helper_functions;

/// Contains all things related to the underlying chemistry.
pub mod chemistry;
mod error;
/// Ion identities: ion parts, ion types, their notation, the global library and the search.
pub mod identities;
/// Contains logic to parse the persisted ion library with backwards compatibility
pub mod parse_json;
/// Contains all things related to tolerances.
pub mod quantities;
pub mod system;

pub use error::IonError;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::chemistry::{Element, MolecularFormula};
    pub use crate::identities::{
        FeatureRow, GlobalIonLibrary, IonLibrary, IonPart, IonPartDefinition, IonSearchRow,
        IonType, Polarity, SearchableIonLibrary,
    };
    pub use crate::molecular_formula;
    pub use crate::quantities::Tolerance;
    pub use crate::system::{Mass, MassOverCharge, Ratio, da};
}

#[macro_use]
extern crate uom;
