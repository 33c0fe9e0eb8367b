use std::sync::LazyLock;

use crate::{
    chemistry::ELECTRON_MASS,
    identities::{IonPart, IonPartDefinition, IonType},
};

/// The built-in parts as name, formula, and charge. For names with multiple charge states the
/// first one listed is the default.
const PARTS: &[(&str, &str, isize)] = &[
    ("H", "H", 1),
    ("Na", "Na", 1),
    ("K", "K", 1),
    ("NH4", "NH4", 1),
    ("Li", "Li", 1),
    ("Fe", "Fe", 3),
    ("Fe", "Fe", 2),
    ("Ca", "Ca", 2),
    ("Mg", "Mg", 2),
    ("Cl", "Cl", -1),
    ("Br", "Br", -1),
    ("FA", "HCO2", -1),
    ("Acetate", "C2H3O2", -1),
    ("H2O", "H2O", 0),
    ("NH3", "NH3", 0),
    ("CO", "CO", 0),
    ("CO2", "CO2", 0),
    ("H2", "H2", 0),
    ("C2H4", "C2H4", 0),
    ("O", "O", 0),
    ("MeOH", "CH3OH", 0),
    ("HFA", "CH2O2", 0),
    ("HAc", "CH3COOH", 0),
    ("ACN", "CH3CN", 0),
    ("IsoProp", "C3H8O", 0),
];

const POSITIVE: &[&str] = &[
    "[M+H]+",
    "[M+Na]+",
    "[M+K]+",
    "[M+NH4]+",
    "[M+Li]+",
    "[M-H2O+H]+",
    "[M-2H2O+H]+",
    "[M-NH3+H]+",
    "[M+2H]2+",
    "[M+H+Na]2+",
    "[M+H+NH4]2+",
    "[M+2Na]2+",
    "[M-H+2Na]+",
    "[M-H+2K]+",
    "[M-H+Ca]+",
    "[M-H+Mg]+",
    "[M-2H+(Fe+3)]+",
    "[M-H+(Fe+2)]+",
    "[M]+",
    "[M-e]+",
    "[2M+H]+",
    "[2M+Na]+",
    "[2M+NH4]+",
    "[3M+H]+",
    "[M+ACN+H]+",
    "[M+MeOH+H]+",
    "[M+IsoProp+H]+",
];

const NEGATIVE: &[&str] = &[
    "[M-H]-",
    "[M+Cl]-",
    "[M+Br]-",
    "[M+FA]-",
    "[M+Acetate]-",
    "[M+HFA-H]-",
    "[M+HAc-H]-",
    "[M-H2O-H]-",
    "[M-CO2-H]-",
    "[M+Na-2H]-",
    "[M+K-2H]-",
    "[M-2H]2-",
    "[M-3H]3-",
    "[2M-H]-",
    "[2M+FA]-",
    "[3M-H]-",
    "[M+e]-",
    "[M]-",
];

/// The charge that a built-in part name resolves to when it is written without a charge (the
/// first listed charge state), None for names that are not built-in
pub(crate) fn default_charge(name: &str) -> Option<isize> {
    if name == ELECTRON_NAME {
        return Some(-1);
    }
    PARTS
        .iter()
        .find(|(part, _, _)| *part == name)
        .map(|(_, _, charge)| *charge)
}

const ELECTRON_NAME: &str = "e";

/// The built-in parts and ion types
#[derive(Debug)]
pub(crate) struct Defaults {
    pub(crate) parts: Vec<IonPart>,
    pub(crate) positive: Vec<IonType>,
    pub(crate) negative: Vec<IonType>,
}

pub(crate) static DEFAULTS: LazyLock<Defaults> = LazyLock::new(Defaults::build);

impl Defaults {
    fn build() -> Self {
        let mut parts: Vec<IonPart> = PARTS
            .iter()
            .filter_map(|(name, formula, charge)| {
                IonPartDefinition::from_formula(*name, *formula, *charge).ok()
            })
            .map(|definition| IonPart::new(definition, 1))
            .collect();
        if let Ok(electron) = IonPartDefinition::with_mass(ELECTRON_NAME, None, ELECTRON_MASS, -1) {
            parts.insert(1, IonPart::new(electron, 1));
        }
        let positive = POSITIVE
            .iter()
            .filter_map(|text| IonType::parse_with(text, &parts[..]))
            .collect();
        let negative = NEGATIVE
            .iter()
            .filter_map(|text| IonType::parse_with(text, &parts[..]))
            .collect();
        Self {
            parts,
            positive,
            negative,
        }
    }
}
