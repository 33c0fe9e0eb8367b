use std::{
    fmt::Write,
    num::NonZeroU16,
    ops::{Add, AddAssign, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::{
    chemistry::{ELECTRON_MASS, Element},
    system::{Mass, OrderedMass},
};

/// A molecular formula, a selection of elements of specified isotopes together forming a structure.
/// The charge is stored as a number of electrons, a formula with a charge of +1 contains -1 electrons.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MolecularFormula {
    /// Save all constituent parts as the element in question, the isotope (or None for natural distribution), and the number of this element
    elements: ThinVec<(Element, Option<NonZeroU16>, i32)>,
    /// Any addition mass, defined to be monoisotopic
    additional_mass: OrderedMass,
}

/// Create a [`MolecularFormula`], the syntax is similar to ProForma.
/// ```rust
/// # use mzion::prelude::*;
/// let formula = molecular_formula!(C 12 [13 C 1] H 24);
/// assert_eq!(formula.hill_notation(), "C12[13C1]H24");
/// let ion = molecular_formula!(H 1 :z+1);
/// assert_eq!(ion.charge(), 1);
/// ```
#[macro_export]
macro_rules! molecular_formula {
    ($($tail:tt)*) => {
        $crate::__formula_internal__!([$($tail)*] -> [])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __formula_internal__ {
    ([$e:ident $n:literal $($tail:tt)*] -> [$($output:tt)*]) => {
        $crate::__formula_internal__!([$($tail)*] -> [$($output)*($crate::chemistry::Element::$e, None, $n),])
    };
    ([[$i:literal $e:ident $n:literal] $($tail:tt)*] -> [$($output:tt)*]) => {
        $crate::__formula_internal__!([$($tail)*] -> [$($output)*($crate::chemistry::Element::$e, Some(std::num::NonZeroU16::new($i).unwrap()), $n),])
    };
    ([:z+$c:literal] -> [$($output:tt)*]) => {
        $crate::__formula_internal__!([] -> [$($output)*($crate::chemistry::Element::Electron, None, -$c),])
    };
    ([:z-$c:literal] -> [$($output:tt)*]) => {
        $crate::__formula_internal__!([] -> [$($output)*($crate::chemistry::Element::Electron, None, $c),])
    };
    ([] -> [$($output:tt)*]) => {
        $crate::chemistry::MolecularFormula::new(&[$($output)*]).unwrap()
    };
}

impl MolecularFormula {
    /// Create a new molecular formula, the elements will be sorted and simplified
    /// # Errors
    /// It returns the first element that is not valid (an isotope without known mass).
    pub fn new(
        elements: &[(Element, Option<NonZeroU16>, i32)],
    ) -> Result<Self, (Element, Option<NonZeroU16>)> {
        let mut result = Self::default();
        for element in elements {
            Self::add(&mut result, *element)?;
        }
        Ok(result)
    }

    /// Add the given element to this formula (while keeping it ordered and simplified)
    /// # Errors
    /// If the element is not valid (an isotope without known mass).
    pub fn add(
        &mut self,
        (element, isotope, number): (Element, Option<NonZeroU16>, i32),
    ) -> Result<(), (Element, Option<NonZeroU16>)> {
        if !element.is_valid(isotope) {
            return Err((element, isotope));
        }
        if number == 0 {
            return Ok(());
        }
        match self
            .elements
            .binary_search_by(|existing| (existing.0, existing.1).cmp(&(element, isotope)))
        {
            Ok(index) => {
                self.elements[index].2 += number;
                if self.elements[index].2 == 0 {
                    self.elements.remove(index);
                }
            }
            Err(index) => self.elements.insert(index, (element, isotope, number)),
        }
        Ok(())
    }

    /// Get this formula multiplied by the given factor.
    /// Returns None if any element count overflows.
    pub fn checked_mul(&self, factor: i32) -> Option<Self> {
        if factor == 0 {
            return Some(Self::default());
        }
        let mut result = self.clone();
        for element in &mut result.elements {
            element.2 = element.2.checked_mul(factor)?;
        }
        *result.additional_mass *= f64::from(factor);
        Some(result)
    }

    /// Get the sum of this formula and the other formula.
    /// Returns None if any element count overflows.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let mut result = self.clone();
        for &(element, isotope, number) in &other.elements {
            match result
                .elements
                .binary_search_by(|existing| (existing.0, existing.1).cmp(&(element, isotope)))
            {
                Ok(index) => {
                    let sum = result.elements[index].2.checked_add(number)?;
                    if sum == 0 {
                        result.elements.remove(index);
                    } else {
                        result.elements[index].2 = sum;
                    }
                }
                Err(index) => result.elements.insert(index, (element, isotope, number)),
            }
        }
        *result.additional_mass += *other.additional_mass;
        Some(result)
    }

    /// Add the given mass, defined to be monoisotopic
    pub fn add_mass(&mut self, mass: Mass) {
        *self.additional_mass += mass;
    }

    /// Get the elements making this formula
    pub fn elements(&self) -> &[(Element, Option<NonZeroU16>, i32)] {
        &self.elements
    }

    /// Get the additional mass of this formula
    pub fn additional_mass(&self) -> Mass {
        self.additional_mass.into_inner()
    }

    /// Check if the formula is empty (no elements and no additional mass)
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.additional_mass.value == 0.0
    }

    /// Get the charge of this formula, determined by the number of missing electrons
    pub fn charge(&self) -> isize {
        -self
            .elements
            .iter()
            .find(|e| e.0 == Element::Electron)
            .map_or(0, |e| e.2 as isize)
    }

    /// Set the charge of this formula by changing the number of electrons
    pub fn set_charge(&mut self, charge: isize) {
        let current = self.charge();
        let _ = self.add((Element::Electron, None, (current - charge) as i32));
    }

    /// The monoisotopic mass of this formula, including the electrons
    pub fn monoisotopic_mass(&self) -> Mass {
        self.elements
            .iter()
            .fold(self.additional_mass.into_inner(), |mass, (e, i, n)| {
                e.mass(*i).map_or(mass, |m| mass + m * f64::from(*n))
            })
    }

    /// The mass of the given number of electrons, handy to convert between charged and uncharged masses
    pub fn electrons_mass(electrons: isize) -> Mass {
        ELECTRON_MASS * electrons as f64
    }

    /// Get the same formula with the electrons removed, so the mass of the uncharged formula
    #[must_use]
    pub fn uncharged(&self) -> Self {
        let mut result = self.clone();
        result.elements.retain(|e| e.0 != Element::Electron);
        result
    }

    /// Check if this formula contains a negative number of any element (ignores a negative number of electrons).
    pub fn contains_negative_amount(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.0 != Element::Electron && e.2 < 0)
    }

    /// Create a [Hill notation](https://en.wikipedia.org/wiki/Chemical_formula#Hill_system) from this collections of elements merged with the ProForma notation for specific isotopes
    pub fn hill_notation(&self) -> String {
        let mut buffer = String::new();
        let write_element = |buffer: &mut String, element: &(Element, Option<NonZeroU16>, i32)| {
            if let Some(isotope) = element.1 {
                let _ = write!(buffer, "[{}{}{}]", isotope, element.0, element.2);
            } else {
                let _ = write!(buffer, "{}{}", element.0, element.2);
            }
        };
        let has_carbon = self.elements.iter().any(|e| e.0 == Element::C);
        if has_carbon {
            for element in self.elements.iter().filter(|e| e.0 == Element::C) {
                write_element(&mut buffer, element);
            }
            for element in self.elements.iter().filter(|e| e.0 == Element::H) {
                write_element(&mut buffer, element);
            }
        }
        let mut rest: Vec<_> = self
            .elements
            .iter()
            .filter(|e| {
                e.0 != Element::Electron && (!has_carbon || (e.0 != Element::C && e.0 != Element::H))
            })
            .collect();
        rest.sort_by(|a, b| a.0.symbol().cmp(b.0.symbol()).then(a.1.cmp(&b.1)));
        for element in rest {
            write_element(&mut buffer, element);
        }
        if self.additional_mass.value != 0.0 {
            let _ = write!(buffer, "{:+}", self.additional_mass.value);
        }
        let charge = self.charge();
        if charge != 0 {
            let _ = write!(buffer, ":z{charge:+}");
        }
        buffer
    }
}

impl Neg for &MolecularFormula {
    type Output = MolecularFormula;
    fn neg(self) -> Self::Output {
        let mut result = self.clone();
        for element in &mut result.elements {
            element.2 = -element.2;
        }
        *result.additional_mass = -*result.additional_mass;
        result
    }
}

impl Neg for MolecularFormula {
    type Output = Self;
    fn neg(self) -> Self::Output {
        -&self
    }
}

impl Add<&MolecularFormula> for &MolecularFormula {
    type Output = MolecularFormula;
    fn add(self, rhs: &MolecularFormula) -> Self::Output {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl Sub<&MolecularFormula> for &MolecularFormula {
    type Output = MolecularFormula;
    fn sub(self, rhs: &MolecularFormula) -> Self::Output {
        let mut result = self.clone();
        result += -rhs;
        result
    }
}

impl Mul<&i32> for &MolecularFormula {
    type Output = MolecularFormula;
    fn mul(self, rhs: &i32) -> Self::Output {
        let mut result = self.clone();
        if *rhs == 0 {
            return MolecularFormula::default();
        }
        for element in &mut result.elements {
            element.2 *= rhs;
        }
        *result.additional_mass *= f64::from(*rhs);
        result
    }
}

impl AddAssign<&Self> for MolecularFormula {
    fn add_assign(&mut self, rhs: &Self) {
        for element in &rhs.elements {
            // Every element in an existing formula is valid
            let _ = self.add(*element);
        }
        *self.additional_mass += *rhs.additional_mass;
    }
}

impl AddAssign<Self> for MolecularFormula {
    fn add_assign(&mut self, rhs: Self) {
        *self += &rhs;
    }
}

impl_binop_ref_cases!(impl Add, add for MolecularFormula, MolecularFormula, MolecularFormula);
impl_binop_ref_cases!(impl Sub, sub for MolecularFormula, MolecularFormula, MolecularFormula);
impl_binop_ref_cases!(impl Mul, mul for MolecularFormula, i32, MolecularFormula);

impl std::fmt::Display for MolecularFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hill_notation())
    }
}
