use std::{
    fmt::{Display, Write},
    hash::Hash,
    num::NonZeroU32,
};

use context_error::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    IonError,
    chemistry::MolecularFormula,
    identities::{IonPart, IonPartPool, IonPartStringFlavor},
    parse_json::{ParseJson, use_serde},
    system::{Charge, Mass, MassOverCharge, da, e},
};

/// The polarity of an ion
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Polarity {
    /// A negative charge
    Negative,
    /// No charge
    Neutral,
    /// A positive charge
    Positive,
}

impl Polarity {
    /// Get the polarity of the given charge
    pub const fn from_charge(charge: isize) -> Self {
        if charge > 0 {
            Self::Positive
        } else if charge < 0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// The sign of this polarity
    pub const fn sign(self) -> isize {
        match self {
            Self::Negative => -1,
            Self::Neutral => 0,
            Self::Positive => 1,
        }
    }
}

impl Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Negative => "negative",
                Self::Neutral => "neutral",
                Self::Positive => "positive",
            }
        )
    }
}

/// A full ion hypothesis: a number of molecules (the `2` in `[2M+Na-H2O]+`) with a list of
/// merged and canonically sorted [`IonPart`]s. The total mass, total charge, and canonical
/// name are calculated on creation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "IonTypeData", into = "IonTypeData")]
pub struct IonType {
    parts: Vec<IonPart>,
    molecules: NonZeroU32,
    total_mass: Mass,
    total_charge: isize,
    name: String,
}

impl IonType {
    /// Create a new ion type. Parts of the same kind are merged (summing their counts), parts
    /// with a resulting count of zero are removed, and the parts are sorted in the canonical order
    /// (see [`IonPart::canonical_cmp`]).
    /// # Errors
    /// If a merged count or the total charge does not fit in an `isize`.
    pub fn create(
        parts: impl IntoIterator<Item = IonPart>,
        molecules: NonZeroU32,
    ) -> Result<Self, BoxedError<'static, IonError>> {
        let mut merged: Vec<IonPart> = Vec::new();
        for part in parts {
            if let Some(existing) = merged.iter_mut().find(|p| p.same_kind(&part)) {
                *existing = existing.merge(&part)?;
            } else {
                merged.push(part);
            }
        }
        merged.retain(|p| p.count() != 0);
        merged.sort_by(IonPart::canonical_cmp);

        let total_mass = merged
            .iter()
            .fold(da(0.0), |total, part| total + part.total_mass());
        let total_charge = merged
            .iter()
            .try_fold(0_isize, |total, part| {
                part.checked_total_charge()
                    .and_then(|charge| total.checked_add(charge))
            })
            .ok_or_else(|| {
                BoxedError::new(
                    IonError::Overflow,
                    "Invalid ion type",
                    "The total charge of the parts does not fit",
                    Context::show(
                        merged
                            .iter()
                            .map(|p| p.to_string_flavor(IonPartStringFlavor::SimpleWithCharge))
                            .collect::<String>(),
                    ),
                )
            })?;
        let name = Self::canonical_name(&merged, molecules, total_charge);
        Ok(Self {
            parts: merged,
            molecules,
            total_mass,
            total_charge,
            name,
        })
    }

    /// The same ion type with all parts replaced by their pooled instance
    pub(crate) fn interned(&self, pool: &IonPartPool) -> Self {
        Self {
            parts: self
                .parts
                .iter()
                .map(|part| pool.intern(part.clone()))
                .collect(),
            ..self.clone()
        }
    }

    fn canonical_name(parts: &[IonPart], molecules: NonZeroU32, charge: isize) -> String {
        let mut name = String::from("[");
        if molecules.get() > 1 {
            let _ = write!(name, "{molecules}");
        }
        name.push('M');
        for part in parts.iter().filter(|p| !p.is_silent_charge()) {
            name.push_str(&part.notation());
        }
        name.push(']');
        match charge {
            0 => (),
            1 => name.push('+'),
            -1 => name.push('-'),
            c if c > 0 => {
                let _ = write!(name, "{c}+");
            }
            c => {
                let _ = write!(name, "{}-", c.unsigned_abs());
            }
        }
        name
    }

    /// The merged and sorted parts
    pub fn parts(&self) -> &[IonPart] {
        &self.parts
    }

    /// The number of molecules
    pub const fn molecules(&self) -> NonZeroU32 {
        self.molecules
    }

    /// The total mass of all parts (without the molecules)
    pub const fn total_mass(&self) -> Mass {
        self.total_mass
    }

    /// The total charge of all parts
    pub const fn total_charge(&self) -> isize {
        self.total_charge
    }

    /// The absolute total charge
    pub const fn abs_charge(&self) -> usize {
        self.total_charge.unsigned_abs()
    }

    /// The polarity of the total charge
    pub const fn polarity(&self) -> Polarity {
        Polarity::from_charge(self.total_charge)
    }

    /// The canonical name, for example `[2M-H2O+Na]+`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical name followed by the total mass of the parts
    pub fn to_string_with_mass(&self) -> String {
        format!("{} ({:.4} Da)", self.name, self.total_mass.value)
    }

    /// Show all parts (including silent charges) in the given flavor
    pub fn parts_to_string(&self, flavor: IonPartStringFlavor) -> String {
        self.parts
            .iter()
            .map(|p| p.to_string_flavor(flavor))
            .collect()
    }

    /// If any part is a neutral modification (an uncharged loss or addition)
    pub fn has_neutral_modification(&self) -> bool {
        self.parts.iter().any(IonPart::is_neutral_modification)
    }

    /// If this ion type only has parts without known mass (silent charges and unknown parts)
    pub fn is_undefined(&self) -> bool {
        self.parts.iter().all(|p| p.is_silent_charge() || p.is_unknown())
    }

    /// Get the neutral mass of the molecule for an observed m/z under this hypothesis:
    /// `((mz * |charge|) - total_mass) / molecules`
    pub fn get_mass(&self, mz: MassOverCharge) -> Mass {
        (mz * Charge::new::<e>(self.abs_charge() as f64) - self.total_mass)
            / f64::from(self.molecules.get())
    }

    /// Get the m/z of this ion for a molecule with the given neutral mass:
    /// `(neutral_mass * molecules + total_mass) / |charge|`. Returns None if this ion type has no charge.
    pub fn get_mz(&self, neutral_mass: Mass) -> Option<MassOverCharge> {
        (self.total_charge != 0).then(|| {
            (neutral_mass * f64::from(self.molecules.get()) + self.total_mass)
                / Charge::new::<e>(self.abs_charge() as f64)
        })
    }

    /// Check if any part of this ion type is of the same kind as any part of the other ion type.
    /// With `ignore_loss_addition_pairs` a part that is lost on one side and added on the other
    /// is not counted as overlap.
    pub fn has_parts_overlap(&self, other: &Self, ignore_loss_addition_pairs: bool) -> bool {
        self.overlapping_parts(other, ignore_loss_addition_pairs)
            .next()
            .is_some()
    }

    /// All pairs of parts of the same kind between this and the other ion type
    pub(crate) fn overlapping_parts<'a>(
        &'a self,
        other: &'a Self,
        ignore_loss_addition_pairs: bool,
    ) -> impl Iterator<Item = (&'a IonPart, &'a IonPart)> + 'a {
        self.parts.iter().flat_map(move |a| {
            other
                .parts
                .iter()
                .filter(move |b| {
                    a.same_kind(b)
                        && !(ignore_loss_addition_pairs && a.count().signum() != b.count().signum())
                })
                .map(move |b| (a, b))
        })
    }

    /// Get the full formula of this ion for the given formula of a single molecule. Parts without
    /// formula add their mass as additional mass. With `ionize` the charge is set as well.
    /// # Errors
    /// If any element count of the resulting formula does not fit.
    pub fn formula(
        &self,
        molecule: &MolecularFormula,
        ionize: bool,
    ) -> Result<MolecularFormula, BoxedError<'static, IonError>> {
        let mut formula = i32::try_from(self.molecules.get())
            .ok()
            .and_then(|molecules| molecule.checked_mul(molecules))
            .ok_or_else(|| {
                BoxedError::new(
                    IonError::Overflow,
                    "Invalid formula",
                    "The element counts of the formula do not fit",
                    Context::show(format!("{} times {molecule}", self.molecules)),
                )
            })?;
        for part in &self.parts {
            part.add_to_formula(&mut formula, ionize)?;
        }
        Ok(formula)
    }
}

impl PartialEq for IonType {
    fn eq(&self, other: &Self) -> bool {
        self.molecules == other.molecules && self.parts == other.parts
    }
}

impl Eq for IonType {}

impl Hash for IonType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.molecules.hash(state);
        self.parts.hash(state);
    }
}

impl Display for IonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl ParseJson for IonType {
    fn from_json_value(value: Value) -> Result<Self, BoxedError<'static, BasicKind>> {
        use_serde(value)
    }
}

/// The representation of an ion type as stored on disk, the name is only stored for readability
#[derive(Clone, Debug, Deserialize, Serialize)]
struct IonTypeData {
    #[serde(default)]
    name: String,
    parts: Vec<IonPart>,
    #[serde(default = "default_molecules")]
    molecules: NonZeroU32,
}

const fn default_molecules() -> NonZeroU32 {
    NonZeroU32::MIN
}

impl TryFrom<IonTypeData> for IonType {
    type Error = BoxedError<'static, IonError>;
    fn try_from(value: IonTypeData) -> Result<Self, Self::Error> {
        Self::create(value.parts, value.molecules)
    }
}

impl From<IonType> for IonTypeData {
    fn from(value: IonType) -> Self {
        Self {
            name: value.name,
            parts: value.parts,
            molecules: value.molecules,
        }
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::{identities::IonPartDefinition, system::thomson};

    fn part(name: &str, formula: &str, charge: isize, count: isize) -> IonPart {
        IonPart::new(
            IonPartDefinition::from_formula(name, formula, charge).unwrap(),
            count,
        )
    }

    const ONE: NonZeroU32 = NonZeroU32::MIN;

    #[test]
    fn merging_and_order() {
        let ion = IonType::create(
            [
                part("Na", "Na", 1, 1),
                part("H", "H", 1, 1),
                part("H2O", "H2O", 0, -1),
                part("H", "H", 1, -2),
                part("K", "K", 1, 1),
                part("K", "K", 1, -1),
            ],
            NonZeroU32::new(2).unwrap(),
        )
        .unwrap();
        assert_eq!(ion.parts().len(), 3);
        assert_eq!(ion.name(), "[2M-H2O-H+Na]");
        assert_eq!(ion.total_charge(), 0);
        let plus = IonType::create(
            [part("H2O", "H2O", 0, -1), part("Na", "Na", 1, 1)],
            NonZeroU32::new(2).unwrap(),
        )
        .unwrap();
        assert_eq!(plus.name(), "[2M-H2O+Na]+");
    }

    #[test]
    fn equality_ignores_input_order() {
        let a = IonType::create(
            [part("Na", "Na", 1, 1), part("H2O", "H2O", 0, -1)],
            ONE,
        )
        .unwrap();
        let b = IonType::create(
            [part("H2O", "H2O", 0, -1), part("Na", "Na", 1, 1)],
            ONE,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.name(), b.name());
        assert_ne!(
            a,
            IonType::create(a.parts().to_vec(), NonZeroU32::new(2).unwrap()).unwrap()
        );
    }

    #[test]
    fn names() {
        assert_eq!(
            IonType::create([part("H", "H", 1, 2)], ONE).unwrap().name(),
            "[M+2H]2+"
        );
        assert_eq!(
            IonType::create([part("H", "H", 1, -3)], ONE).unwrap().name(),
            "[M-3H]3-"
        );
        assert_eq!(
            IonType::create([part("H", "H", 1, -2), part("Fe", "Fe", 3, 1)], ONE)
                .unwrap()
                .name(),
            "[M-2H+(Fe+3)]+"
        );
        let silent = IonType::create([IonPart::silent_charge(1)], ONE).unwrap();
        assert_eq!(silent.name(), "[M]+");
        assert_eq!(silent.to_string_with_mass(), "[M]+ (0.0000 Da)");
    }

    #[test]
    fn mass_and_mz() {
        let ion = IonType::create([part("H", "H", 1, 1)], ONE).unwrap();
        let mass = ion.get_mass(MassOverCharge::new::<thomson>(301.007_276_452));
        assert!((mass - da(300.0)).abs() < da(1e-6));
        let dimer =
            IonType::create([part("Na", "Na", 1, 1)], NonZeroU32::new(2).unwrap()).unwrap();
        for value in [50.0, 301.2, 1234.5678] {
            let mz = MassOverCharge::new::<thomson>(value);
            assert!((dimer.get_mz(dimer.get_mass(mz)).unwrap() - mz).abs().value < 1e-9);
        }
        let doubly = IonType::create([part("H", "H", 1, 2)], ONE).unwrap();
        let mz = MassOverCharge::new::<thomson>(500.25);
        assert!((doubly.get_mz(doubly.get_mass(mz)).unwrap() - mz).abs().value < 1e-9);
        let neutral = IonType::create([part("H2O", "H2O", 0, -1)], ONE).unwrap();
        assert_eq!(neutral.get_mz(da(100.0)), None);
        assert_eq!(neutral.polarity(), Polarity::Neutral);
    }

    #[test]
    fn overlap() {
        let h = IonType::create([part("H", "H", 1, 1)], ONE).unwrap();
        let h_na = IonType::create([part("H", "H", 1, 1), part("Na", "Na", 1, 1)], ONE).unwrap();
        let minus_h_na =
            IonType::create([part("H", "H", 1, -1), part("Na", "Na", 1, 2)], ONE).unwrap();
        let na = IonType::create([part("Na", "Na", 1, 1)], ONE).unwrap();
        assert!(h.has_parts_overlap(&h_na, true));
        assert!(h.has_parts_overlap(&minus_h_na, false));
        assert!(!h.has_parts_overlap(&minus_h_na, true));
        assert!(!h.has_parts_overlap(&na, false));
    }

    #[test]
    fn formula() {
        let ion = IonType::create(
            [part("H2O", "H2O", 0, -1), part("Na", "Na", 1, 1)],
            NonZeroU32::new(2).unwrap(),
        )
        .unwrap();
        let glucose = molecular_formula!(C 6 H 12 O 6);
        assert_eq!(
            ion.formula(&glucose, true).unwrap(),
            molecular_formula!(C 12 H 22 O 11 Na 1 :z+1)
        );
        assert_eq!(
            ion.formula(&glucose, false).unwrap(),
            molecular_formula!(C 12 H 22 O 11 Na 1)
        );
    }

    #[test]
    fn overflow() {
        let fe = part("Fe", "Fe", 3, isize::MAX / 2);
        assert_eq!(
            IonType::create([fe.clone()], ONE).unwrap_err().get_kind(),
            &IonError::Overflow
        );
        let h = part("H", "H", 1, isize::MAX);
        assert_eq!(
            IonType::create([h.clone(), h.with_count(1)], ONE)
                .unwrap_err()
                .get_kind(),
            &IonError::Overflow
        );
        let h = part("H", "H", 1, 2_147_483_647);
        let ion = IonType::create([h], ONE).unwrap();
        assert_eq!(ion.total_charge(), 2_147_483_647);
        assert!(ion.formula(&molecular_formula!(H 2), true).is_err());
        let multimer = IonType::create([part("H", "H", 1, 1)], NonZeroU32::MAX).unwrap();
        assert!(multimer.formula(&molecular_formula!(C 1), false).is_err());
    }

    #[test]
    fn serde() {
        let ion = IonType::create(
            [part("H2O", "H2O", 0, -1), part("Na", "Na", 1, 1)],
            NonZeroU32::new(2).unwrap(),
        )
        .unwrap();
        let json = serde_json::to_string(&ion).unwrap();
        assert!(json.contains("[2M-H2O+Na]+"));
        let back: IonType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ion);
        assert_eq!(back.name(), ion.name());
        let renamed: IonType = serde_json::from_str(
            r#"{"name":"wrong","parts":[{"name":"H","formula":"H","charge":1}]}"#,
        )
        .unwrap();
        assert_eq!(renamed.name(), "[M+H]+");
    }
}
