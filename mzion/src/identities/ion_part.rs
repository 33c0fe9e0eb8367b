use std::{
    cmp::Ordering,
    fmt::{Display, Write},
    hash::Hash,
    marker::PhantomData,
    sync::Arc,
};

use context_error::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    IonError,
    chemistry::{Element, MolecularFormula},
    identities::defaults::default_charge,
    parse_json::{ParseJson, use_serde},
    system::{Mass, da},
};

/// The absolute tolerance within which two part masses are considered equal
pub const MASS_PRECISION: Mass = Mass {
    dimension: PhantomData,
    units: PhantomData,
    value: 1e-7,
};

/// The definition of an ion part, everything except the count. This is what makes two parts the
/// same kind of part, so `+H` and `+2H` share a definition.
#[derive(Clone, Debug)]
pub enum IonPartDefinition {
    /// A part with a known mass (and possibly a known formula)
    Resolved(ResolvedPart),
    /// A charge without a known carrier, it has no name, no mass, and a charge of +1 per unit
    SilentCharge,
    /// A part of which only the name is known, for example a name that is not in the library and
    /// that could not be parsed as a formula
    Unknown(UnknownPart),
}

/// A part with a known mass
#[derive(Clone, Debug)]
pub struct ResolvedPart {
    name: Box<str>,
    formula: Option<Box<str>>,
    mass: Mass,
    charge: isize,
}

/// A part of which only the name (and charge) is known
#[derive(Clone, Debug)]
pub struct UnknownPart {
    name: Box<str>,
    charge: isize,
}

impl ResolvedPart {
    /// The name
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The formula (uncharged, for a single unit) if known
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }
    /// The mass of a single unit, including the effect of the charge on the number of electrons
    pub const fn mass(&self) -> Mass {
        self.mass
    }
    /// The charge of a single unit
    pub const fn charge(&self) -> isize {
        self.charge
    }
}

impl UnknownPart {
    /// The name
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The charge of a single unit
    pub const fn charge(&self) -> isize {
        self.charge
    }
}

fn check_name(name: &str) -> Result<(), BoxedError<'static, IonError>> {
    if name.trim().is_empty() {
        Err(BoxedError::new(
            IonError::InvalidPart,
            "Invalid ion part",
            "The name of an ion part cannot be empty, only the silent charge has no name",
            Context::none(),
        ))
    } else {
        Ok(())
    }
}

fn parse_formula(
    name: &str,
    formula: &str,
) -> Result<MolecularFormula, BoxedError<'static, IonError>> {
    MolecularFormula::pro_forma::<false>(formula).map_err(|err| {
        err.convert(|_| IonError::InvalidFormula)
            .long_description(format!("The formula for ion part '{name}' is invalid"))
            .to_owned()
    })
}

impl IonPartDefinition {
    /// Create a resolved part from a formula, the mass is calculated from the formula and the
    /// charge (every unit of charge is one electron removed).
    /// # Errors
    /// If the name is empty, the formula is invalid, or the resulting mass is negative.
    pub fn from_formula(
        name: impl Into<Box<str>>,
        formula: impl Into<Box<str>>,
        charge: isize,
    ) -> Result<Self, BoxedError<'static, IonError>> {
        let name = name.into();
        let formula = formula.into();
        check_name(&name)?;
        let parsed = parse_formula(&name, &formula)?;
        let mass = parsed.monoisotopic_mass() - MolecularFormula::electrons_mass(charge);
        Self::resolved(name, Some(formula), mass, charge)
    }

    /// Create a resolved part with a given mass, if a formula is given it is checked to be valid
    /// but the mass is not recalculated.
    /// # Errors
    /// If the name is empty, the formula is invalid, or the mass is negative or not finite.
    pub fn with_mass(
        name: impl Into<Box<str>>,
        formula: Option<Box<str>>,
        mass: Mass,
        charge: isize,
    ) -> Result<Self, BoxedError<'static, IonError>> {
        let name = name.into();
        check_name(&name)?;
        if let Some(formula) = &formula {
            parse_formula(&name, formula)?;
        }
        Self::resolved(name, formula, mass, charge)
    }

    fn resolved(
        name: Box<str>,
        formula: Option<Box<str>>,
        mass: Mass,
        charge: isize,
    ) -> Result<Self, BoxedError<'static, IonError>> {
        if !mass.value.is_finite() || mass < -MASS_PRECISION {
            return Err(BoxedError::new(
                IonError::InvalidPart,
                "Invalid ion part",
                format!("The mass of ion part '{name}' has to be a finite positive number"),
                Context::show(format!("{} Da", mass.value)),
            ));
        }
        Ok(Self::Resolved(ResolvedPart {
            name,
            formula,
            mass: if mass.value < 0.0 { da(0.0) } else { mass },
            charge,
        }))
    }

    /// Create a part for which only the name is known.
    /// # Errors
    /// If the name is empty.
    pub fn unknown(
        name: impl Into<Box<str>>,
        charge: isize,
    ) -> Result<Self, BoxedError<'static, IonError>> {
        let name = name.into();
        check_name(&name)?;
        Ok(Self::Unknown(UnknownPart { name, charge }))
    }

    /// The name, this is empty for the silent charge
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved(part) => &part.name,
            Self::SilentCharge => "",
            Self::Unknown(part) => &part.name,
        }
    }

    /// The formula text if known
    pub fn formula(&self) -> Option<&str> {
        match self {
            Self::Resolved(part) => part.formula.as_deref(),
            Self::SilentCharge | Self::Unknown(_) => None,
        }
    }

    /// The mass of a single unit, zero if unknown
    pub fn abs_single_mass(&self) -> Mass {
        match self {
            Self::Resolved(part) => part.mass,
            Self::SilentCharge | Self::Unknown(_) => da(0.0),
        }
    }

    /// The charge of a single unit
    pub const fn single_charge(&self) -> isize {
        match self {
            Self::Resolved(part) => part.charge,
            Self::SilentCharge => 1,
            Self::Unknown(part) => part.charge,
        }
    }

    /// Get the parsed formula (without charge) if this is a resolved part with a formula
    pub fn molecular_formula(&self) -> Option<MolecularFormula> {
        self.formula()
            .and_then(|formula| MolecularFormula::pro_forma::<false>(formula).ok())
    }

    /// The key used in the library to identify this definition, the name combined with the charge
    pub fn key(&self) -> String {
        let charge = self.single_charge();
        if charge == 0 {
            self.name().to_string()
        } else {
            format!("{}{charge:+}", self.name())
        }
    }

    /// Get this definition with a different charge, the mass is corrected for the number of
    /// electrons. For parts with a formula the mass is recalculated from the formula.
    /// # Errors
    /// If the mass is not known (silent charge and unknown parts).
    pub fn with_single_charge(&self, charge: isize) -> Result<Self, BoxedError<'static, IonError>> {
        match self {
            Self::Resolved(part) => {
                let mass = self.molecular_formula().map_or_else(
                    || part.mass + MolecularFormula::electrons_mass(part.charge - charge),
                    |formula| formula.monoisotopic_mass() - MolecularFormula::electrons_mass(charge),
                );
                Self::resolved(part.name.clone(), part.formula.clone(), mass, charge)
            }
            Self::SilentCharge | Self::Unknown(_) => Err(BoxedError::new(
                IonError::UnresolvedMass,
                "Invalid charge change",
                format!(
                    "The charge of ion part '{}' cannot be changed because its mass is not known",
                    self.name()
                ),
                Context::none(),
            )),
        }
    }

    const fn variant_index(&self) -> u8 {
        match self {
            Self::Resolved(_) => 0,
            Self::SilentCharge => 1,
            Self::Unknown(_) => 2,
        }
    }
}

impl PartialEq for IonPartDefinition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Resolved(a), Self::Resolved(b)) => {
                a.name == b.name
                    && a.formula == b.formula
                    && a.charge == b.charge
                    && (a.mass - b.mass).abs() <= MASS_PRECISION
            }
            (Self::SilentCharge, Self::SilentCharge) => true,
            (Self::Unknown(a), Self::Unknown(b)) => a.name == b.name && a.charge == b.charge,
            _ => false,
        }
    }
}

impl Eq for IonPartDefinition {}

impl Hash for IonPartDefinition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // The mass is compared with a tolerance so it cannot be part of the hash
        self.variant_index().hash(state);
        self.name().hash(state);
        self.formula().hash(state);
        self.single_charge().hash(state);
    }
}

/// The different ways of showing an ion part as text
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IonPartStringFlavor {
    /// Sign, count, and name: `+2H`, `-H2O`
    SimpleNoCharge,
    /// Sign, count, name, and the charge of a single unit for charged parts: `+2(H+1)`, `-H2O`
    SimpleWithCharge,
    /// As [`Self::SimpleWithCharge`] followed by the total mass: `+2(H+1) (2.0146 Da)`
    FullWithMass,
}

/// A signed, repeatable chemical modification: an adduct, a neutral loss, or a cluster molecule.
/// A negative count is a loss, a positive count an addition.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "IonPartData", into = "IonPartData")]
pub struct IonPart {
    definition: Arc<IonPartDefinition>,
    count: isize,
}

impl IonPart {
    /// Create a new part
    pub fn new(definition: impl Into<Arc<IonPartDefinition>>, count: isize) -> Self {
        Self {
            definition: definition.into(),
            count,
        }
    }

    /// A silent charge with the given count (and so total charge)
    pub fn silent_charge(count: isize) -> Self {
        Self::new(IonPartDefinition::SilentCharge, count)
    }

    /// The definition of this part
    pub fn definition(&self) -> &IonPartDefinition {
        &self.definition
    }

    /// The shared definition of this part
    pub const fn shared_definition(&self) -> &Arc<IonPartDefinition> {
        &self.definition
    }

    /// The name, empty for the silent charge
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The formula text if known
    pub fn formula(&self) -> Option<&str> {
        self.definition.formula()
    }

    /// The mass of a single unit
    pub fn abs_single_mass(&self) -> Mass {
        self.definition.abs_single_mass()
    }

    /// The charge of a single unit
    pub fn single_charge(&self) -> isize {
        self.definition.single_charge()
    }

    /// The number of times this part is added (positive) or lost (negative)
    pub const fn count(&self) -> isize {
        self.count
    }

    /// The total (signed) mass: `abs_single_mass * count`
    pub fn total_mass(&self) -> Mass {
        self.abs_single_mass() * self.count as f64
    }

    /// The total charge: `single_charge * count`, saturating at the integer bounds. See
    /// [`Self::checked_total_charge`] to detect overflow.
    pub fn total_charge(&self) -> isize {
        self.single_charge().saturating_mul(self.count)
    }

    /// The total charge: `single_charge * count`, or None if that does not fit
    pub fn checked_total_charge(&self) -> Option<isize> {
        self.single_charge().checked_mul(self.count)
    }

    /// If this part is lost
    pub const fn is_loss(&self) -> bool {
        self.count < 0
    }

    /// If this part is added
    pub const fn is_addition(&self) -> bool {
        self.count > 0
    }

    /// If a single unit of this part carries a charge
    pub fn is_charged(&self) -> bool {
        self.single_charge() != 0
    }

    /// If this is a neutral modification (an uncharged loss or addition)
    pub fn is_neutral_modification(&self) -> bool {
        !self.is_charged()
    }

    /// If this is the silent charge
    pub fn is_silent_charge(&self) -> bool {
        matches!(*self.definition, IonPartDefinition::SilentCharge)
    }

    /// If this part is of unknown mass
    pub fn is_unknown(&self) -> bool {
        matches!(*self.definition, IonPartDefinition::Unknown(_))
    }

    /// Check if both parts are of the same kind, meaning equal when ignoring the count
    pub fn same_kind(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.definition, &other.definition) || self.definition == other.definition
    }

    /// Merge two parts of the same kind by summing their counts. The result can have a count of 0.
    /// # Errors
    /// If the two parts are not of the same kind.
    pub fn merge(&self, other: &Self) -> Result<Self, BoxedError<'static, IonError>> {
        if self.same_kind(other) {
            self.count
                .checked_add(other.count)
                .map(|count| self.with_count(count))
                .ok_or_else(|| {
                    BoxedError::new(
                        IonError::Overflow,
                        "Invalid ion part merge",
                        "The summed count does not fit",
                        Context::show(format!("{} and {}", self.count, other.count)),
                    )
                })
        } else {
            Err(BoxedError::new(
                IonError::PartMismatch,
                "Invalid ion part merge",
                "Only ion parts of the same kind can be merged",
                Context::show(format!(
                    "{} and {}",
                    self.to_string_flavor(IonPartStringFlavor::FullWithMass),
                    other.to_string_flavor(IonPartStringFlavor::FullWithMass)
                )),
            ))
        }
    }

    /// Get this part with a different count (sharing the definition)
    #[must_use]
    pub fn with_count(&self, count: isize) -> Self {
        Self {
            definition: self.definition.clone(),
            count,
        }
    }

    /// Get this part with a different charge for a single unit, see [`IonPartDefinition::with_single_charge`]
    /// # Errors
    /// If the mass of this part is not known.
    pub fn with_single_charge(&self, charge: isize) -> Result<Self, BoxedError<'static, IonError>> {
        if charge == self.single_charge() {
            Ok(self.clone())
        } else {
            Ok(Self::new(
                self.definition.with_single_charge(charge)?,
                self.count,
            ))
        }
    }

    /// Add the contribution of this part to the given formula. Parts with a formula add
    /// `count` times their formula, parts with only a mass add their uncharged mass as additional
    /// mass, and unknown and silent parts add nothing. If `ionize` is set the charge of this part
    /// is added as well (as missing electrons).
    /// # Errors
    /// If any element count of the resulting formula does not fit, the formula is left unchanged.
    pub fn add_to_formula(
        &self,
        formula: &mut MolecularFormula,
        ionize: bool,
    ) -> Result<(), BoxedError<'static, IonError>> {
        let overflow = || {
            BoxedError::new(
                IonError::Overflow,
                "Invalid formula",
                "The element counts of the formula do not fit",
                Context::show(self.to_string_flavor(IonPartStringFlavor::SimpleWithCharge)),
            )
        };
        let mut result = match &*self.definition {
            IonPartDefinition::Resolved(part) => {
                if let Some(own) = self.definition.molecular_formula() {
                    i32::try_from(self.count)
                        .ok()
                        .and_then(|count| own.checked_mul(count))
                        .and_then(|own| formula.checked_add(&own))
                        .ok_or_else(overflow)?
                } else {
                    let mut result = formula.clone();
                    result.add_mass(
                        (part.mass + MolecularFormula::electrons_mass(part.charge))
                            * self.count as f64,
                    );
                    result
                }
            }
            IonPartDefinition::SilentCharge | IonPartDefinition::Unknown(_) => formula.clone(),
        };
        if ionize {
            let electrons = self
                .checked_total_charge()
                .and_then(|charge| i32::try_from(charge).ok())
                .and_then(i32::checked_neg)
                .and_then(|electrons| {
                    MolecularFormula::new(&[(Element::Electron, None, electrons)]).ok()
                })
                .ok_or_else(overflow)?;
            result = result.checked_add(&electrons).ok_or_else(overflow)?;
        }
        *formula = result;
        Ok(())
    }

    /// Show this part as text in the given flavor
    pub fn to_string_flavor(&self, flavor: IonPartStringFlavor) -> String {
        let mut text = String::new();
        text.push(if self.count < 0 { '-' } else { '+' });
        if self.count.abs() != 1 {
            let _ = write!(text, "{}", self.count.abs());
        }
        let name = if self.is_silent_charge() {
            "?"
        } else {
            self.name()
        };
        if flavor != IonPartStringFlavor::SimpleNoCharge && self.is_charged() {
            let _ = write!(text, "({name}{:+})", self.single_charge());
        } else {
            text.push_str(name);
        }
        if flavor == IonPartStringFlavor::FullWithMass {
            let _ = write!(text, " ({:.4} Da)", self.total_mass().value);
        }
        text
    }

    /// The text used for this part in the canonical name of an ion type. The charge of a single
    /// unit is left out only if the name without charge resolves to the same charge: for the
    /// single charge of a built-in part (`+Na`, `-H`) and for uncharged parts that are not
    /// built-in. Otherwise it is written out (`+(Fe+3)`, `+(H-1)`, `+(Xyz+1)`).
    pub(crate) fn notation(&self) -> String {
        let charge = self.single_charge();
        let implied = self.is_silent_charge()
            || (charge.abs() <= 1
                && default_charge(self.name()).map_or(charge == 0, |default| default == charge));
        if implied {
            self.to_string_flavor(IonPartStringFlavor::SimpleNoCharge)
        } else {
            let mut text = self.to_string_flavor(IonPartStringFlavor::SimpleNoCharge);
            text.truncate(text.len() - self.name().len());
            let _ = write!(text, "({}{charge:+})", self.name());
            text
        }
    }

    /// The canonical ordering of parts: neutral before charged parts, losses before additions,
    /// then by name, total charge, and total mass.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.is_charged()
            .cmp(&other.is_charged())
            .then_with(|| other.is_loss().cmp(&self.is_loss()))
            .then_with(|| self.name().cmp(other.name()))
            .then_with(|| self.total_charge().cmp(&other.total_charge()))
            .then_with(|| {
                self.total_mass()
                    .value
                    .total_cmp(&other.total_mass().value)
            })
            .then_with(|| self.formula().cmp(&other.formula()))
            .then_with(|| {
                self.definition
                    .variant_index()
                    .cmp(&other.definition.variant_index())
            })
    }
}

impl PartialEq for IonPart {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.same_kind(other)
    }
}

impl Eq for IonPart {}

impl Hash for IonPart {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.definition.hash(state);
        self.count.hash(state);
    }
}

impl Display for IonPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.to_string_flavor(IonPartStringFlavor::SimpleWithCharge)
        )
    }
}

impl ParseJson for IonPart {
    fn from_json_value(value: Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        use_serde(value)
    }
}

/// The flat representation of an ion part as stored on disk
#[derive(Clone, Debug, Deserialize, Serialize)]
struct IonPartData {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mass: Option<f64>,
    #[serde(default)]
    charge: isize,
    #[serde(default = "default_count")]
    count: isize,
}

const fn default_count() -> isize {
    1
}

impl TryFrom<IonPartData> for IonPart {
    type Error = BoxedError<'static, IonError>;
    fn try_from(value: IonPartData) -> Result<Self, Self::Error> {
        let definition = if value.name.trim().is_empty() {
            if value.mass.unwrap_or_default() != 0.0 || value.charge != 1 || value.formula.is_some()
            {
                return Err(BoxedError::new(
                    IonError::InvalidPart,
                    "Invalid ion part",
                    "An ion part without a name is a silent charge, which has to have no formula, no mass, and a charge of 1",
                    Context::show(format!(
                        "formula: {:?}, mass: {:?}, charge: {}",
                        value.formula, value.mass, value.charge
                    )),
                ));
            }
            IonPartDefinition::SilentCharge
        } else {
            match (value.formula, value.mass) {
                (Some(formula), None) => {
                    IonPartDefinition::from_formula(value.name, formula, value.charge)?
                }
                (formula, Some(mass)) => IonPartDefinition::with_mass(
                    value.name,
                    formula.map(String::into_boxed_str),
                    da(mass),
                    value.charge,
                )?,
                (None, None) => IonPartDefinition::unknown(value.name, value.charge)?,
            }
        };
        Ok(Self::new(definition, value.count))
    }
}

impl From<IonPart> for IonPartData {
    fn from(value: IonPart) -> Self {
        let (formula, mass) = match &*value.definition {
            IonPartDefinition::Resolved(part) => {
                (
                    part.formula.as_ref().map(ToString::to_string),
                    Some(part.mass.value),
                )
            }
            IonPartDefinition::SilentCharge => (None, Some(0.0)),
            IonPartDefinition::Unknown(_) => (None, None),
        };
        Self {
            name: value.name().to_string(),
            formula,
            mass,
            charge: value.single_charge(),
            count: value.count,
        }
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::chemistry::ELECTRON_MASS;

    fn part(name: &str, formula: &str, charge: isize) -> IonPart {
        IonPart::new(
            IonPartDefinition::from_formula(name, formula, charge).unwrap(),
            1,
        )
    }

    #[test]
    fn count_excluding_identity() {
        let h = part("H", "H", 1);
        let one = h.with_count(1);
        let two = h.with_count(2);
        assert!(one.same_kind(&two));
        assert_ne!(one, two);
        // Separately constructed definitions are equal too
        let other = part("H", "H", 1).with_count(2);
        assert!(other.same_kind(&one));
        assert_eq!(other, two);
        assert!(!part("Fe", "Fe", 2).same_kind(&part("Fe", "Fe", 3)));
    }

    #[test]
    fn merge() {
        let h = part("H", "H", 1);
        assert_eq!(h.with_count(2).merge(&h.with_count(3)).unwrap(), h.with_count(5));
        assert_eq!(h.with_count(2).merge(&h.with_count(-2)).unwrap().count(), 0);
        assert_eq!(
            h.merge(&part("Na", "Na", 1)).unwrap_err().get_kind(),
            &IonError::PartMismatch
        );
    }

    #[test]
    fn masses() {
        let h = part("H", "H", 1);
        assert!((h.abs_single_mass() - da(1.007_276_452)).abs() < MASS_PRECISION);
        let loss = part("H2O", "H2O", 0).with_count(-2);
        assert!(loss.is_loss());
        assert!(!loss.is_charged());
        assert!((loss.total_mass().value + 2.0 * 18.010_564_684).abs() < 1e-6);
        let fe = part("Fe", "Fe", 3).with_count(2);
        assert_eq!(fe.total_charge(), 6);
        assert!(
            (fe.abs_single_mass().value - (55.934_936_33 - 3.0 * ELECTRON_MASS.value)).abs() < 1e-9
        );
    }

    #[test]
    fn single_charge() {
        let fe2 = part("Fe", "Fe", 2);
        let fe3 = fe2.with_single_charge(3).unwrap();
        assert_eq!(fe3, part("Fe", "Fe", 3));
        let electron = IonPart::new(
            IonPartDefinition::with_mass("e", None, ELECTRON_MASS, -1).unwrap(),
            1,
        );
        let two = electron.with_single_charge(-2).unwrap();
        assert!((two.abs_single_mass() - ELECTRON_MASS * 2.0).abs() < da(1e-12));
        assert_eq!(
            IonPart::silent_charge(1)
                .with_single_charge(2)
                .unwrap_err()
                .get_kind(),
            &IonError::UnresolvedMass
        );
        let unknown = IonPart::new(IonPartDefinition::unknown("Xyz", 0).unwrap(), 1);
        assert!(unknown.with_single_charge(1).is_err());
    }

    #[test]
    fn invalid_definitions() {
        assert!(IonPartDefinition::from_formula("", "H", 1).is_err());
        assert!(IonPartDefinition::from_formula("  ", "H", 1).is_err());
        assert!(IonPartDefinition::from_formula("X", "Xx", 1).is_err());
        assert!(IonPartDefinition::with_mass("X", None, da(-1.0), 0).is_err());
        assert!(IonPartDefinition::with_mass("X", None, da(f64::NAN), 0).is_err());
        assert!(IonPartDefinition::unknown("", 0).is_err());
    }

    #[test]
    fn strings() {
        let fe = part("Fe", "Fe", 3).with_count(2);
        assert_eq!(fe.to_string_flavor(IonPartStringFlavor::SimpleNoCharge), "+2Fe");
        assert_eq!(
            fe.to_string_flavor(IonPartStringFlavor::SimpleWithCharge),
            "+2(Fe+3)"
        );
        let water = part("H2O", "H2O", 0).with_count(-1);
        assert_eq!(water.to_string(), "-H2O");
        assert_eq!(
            water.to_string_flavor(IonPartStringFlavor::FullWithMass),
            "-H2O (-18.0106 Da)"
        );
        assert_eq!(IonPart::silent_charge(-2).to_string(), "-2(?+1)");
    }

    #[test]
    fn formula() {
        let mut formula = molecular_formula!(C 6 H 12 O 6);
        part("H2O", "H2O", 0)
            .with_count(-1)
            .add_to_formula(&mut formula, false)
            .unwrap();
        part("Na", "Na", 1)
            .add_to_formula(&mut formula, true)
            .unwrap();
        assert_eq!(formula, molecular_formula!(C 6 H 10 O 5 Na 1 :z+1));
        IonPart::silent_charge(1)
            .add_to_formula(&mut formula, true)
            .unwrap();
        assert_eq!(formula.charge(), 2);
    }

    #[test]
    fn huge_counts() {
        let water = part("H2O", "H2O", 0).with_count(isize::MAX);
        let mut formula = molecular_formula!(C 6 H 12 O 6);
        assert_eq!(
            water
                .add_to_formula(&mut formula, false)
                .unwrap_err()
                .get_kind(),
            &IonError::Overflow
        );
        assert_eq!(formula, molecular_formula!(C 6 H 12 O 6));
        let water = water.with_count(2_147_483_647);
        assert!(water.add_to_formula(&mut formula, false).is_err());
        let fe = part("Fe", "Fe", 3).with_count(isize::MAX);
        assert_eq!(fe.checked_total_charge(), None);
        assert_eq!(fe.total_charge(), isize::MAX);
        assert_eq!(
            fe.merge(&fe.with_count(1)).unwrap_err().get_kind(),
            &IonError::Overflow
        );
    }

    #[test]
    fn notation() {
        assert_eq!(part("Na", "Na", 1).notation(), "+Na");
        assert_eq!(part("H", "H", 1).with_count(-2).notation(), "-2H");
        assert_eq!(part("Fe", "Fe", 3).notation(), "+(Fe+3)");
        assert_eq!(part("H", "H", -1).notation(), "+(H-1)");
        assert_eq!(part("H", "H", 0).with_count(-3).notation(), "-3(H+0)");
        assert_eq!(part("H2O", "H2O", 0).with_count(-1).notation(), "-H2O");
        assert_eq!(part("Cs", "Cs", 1).notation(), "+(Cs+1)");
        let unknown = IonPart::new(IonPartDefinition::unknown("Xyz", 1).unwrap(), 1);
        assert_eq!(unknown.notation(), "+(Xyz+1)");
        let unknown = IonPart::new(IonPartDefinition::unknown("Xyz", 0).unwrap(), 2);
        assert_eq!(unknown.notation(), "+2Xyz");
    }

    #[test]
    fn serde() {
        let fe = part("Fe", "Fe", 3).with_count(2);
        let json = serde_json::to_string(&fe).unwrap();
        let back: IonPart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fe);
        let silent: IonPart =
            serde_json::from_str(r#"{"name":"","charge":1,"count":-1,"extra":true}"#).unwrap();
        assert!(silent.is_silent_charge());
        assert_eq!(silent.total_charge(), -1);
        assert!(serde_json::from_str::<IonPart>(r#"{"name":"","mass":1.0,"charge":1}"#).is_err());
        let unknown: IonPart = serde_json::from_str(r#"{"name":"Xyz"}"#).unwrap();
        assert!(unknown.is_unknown());
        assert_eq!(unknown.count(), 1);
        let water: IonPart = serde_json::from_str(r#"{"name":"H2O","formula":"H2O"}"#).unwrap();
        assert!((water.abs_single_mass().value - 18.010_564_684).abs() < 1e-6);
    }
}
