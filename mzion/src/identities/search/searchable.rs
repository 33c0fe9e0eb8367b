use std::{collections::BTreeMap, num::NonZeroU32};

use itertools::Itertools;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    helper_functions::gcd,
    identities::{IonSearchRow, IonType, Polarity},
    quantities::Tolerance,
    system::Mass,
};

/// All ion types with the same charge and number of molecules, sorted by total mass
#[derive(Clone, Debug)]
pub struct IonTypeGroup {
    charge: isize,
    molecules: NonZeroU32,
    ion_types: Vec<IonType>,
}

impl IonTypeGroup {
    /// The total charge of all ion types in this group
    pub const fn charge(&self) -> isize {
        self.charge
    }

    /// The number of molecules of all ion types in this group
    pub const fn molecules(&self) -> NonZeroU32 {
        self.molecules
    }

    /// The polarity of all ion types in this group
    pub const fn polarity(&self) -> Polarity {
        Polarity::from_charge(self.charge)
    }

    /// The ion types, sorted ascending by total mass
    pub fn ion_types(&self) -> &[IonType] {
        &self.ion_types
    }
}

/// A set of ion types prepared for searching which ion types could explain observed m/z values.
/// This is an immutable index, to search with a different set of ion types build a new one.
///
/// The ion types are grouped by charge and number of molecules, and sorted by total mass within
/// each group. Within a group the neutral mass calculated for a fixed m/z decreases with the
/// total mass of the ion type, which is used to stop the search as soon as no more ion types
/// can fit within the tolerance.
#[derive(Clone, Debug, Default)]
pub struct SearchableIonLibrary {
    groups: Vec<IonTypeGroup>,
}

/// A pair of rows with all pairs of ion types that explain both rows with the same neutral mass
pub type RowPairMatch<'a> = (usize, usize, Vec<(&'a IonType, &'a IonType)>);

impl SearchableIonLibrary {
    /// Build a searchable library, duplicate ion types are removed.
    pub fn new(ion_types: impl IntoIterator<Item = IonType>) -> Self {
        let mut groups: BTreeMap<(isize, NonZeroU32), Vec<IonType>> = BTreeMap::new();
        for ion_type in ion_types.into_iter().unique() {
            groups
                .entry((ion_type.total_charge(), ion_type.molecules()))
                .or_default()
                .push(ion_type);
        }
        Self {
            groups: groups
                .into_iter()
                .map(|((charge, molecules), mut ion_types)| {
                    ion_types.sort_by(|a, b| a.total_mass().value.total_cmp(&b.total_mass().value));
                    IonTypeGroup {
                        charge,
                        molecules,
                        ion_types,
                    }
                })
                .collect(),
        }
    }

    /// The groups, ordered by charge and then number of molecules
    pub fn groups(&self) -> &[IonTypeGroup] {
        &self.groups
    }

    /// The total number of ion types
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.ion_types.len()).sum()
    }

    /// Check if there are no ion types
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.ion_types.is_empty())
    }

    /// All ion types, in group order
    pub fn ion_types(&self) -> impl Iterator<Item = &IonType> {
        self.groups.iter().flat_map(|g| g.ion_types.iter())
    }

    /// The groups that could explain this row, uncharged ion types never explain an m/z
    fn groups_for<'a>(
        &'a self,
        row: &IonSearchRow,
    ) -> impl Iterator<Item = &'a IonTypeGroup> + use<'a> {
        let row = *row;
        self.groups
            .iter()
            .filter(move |g| g.charge != 0 && row.matches_charge(g.charge))
    }

    /// Find all pairs of ion types that explain both rows with the same neutral mass, within the
    /// tolerance. Each pair is given as (ion type for `a`, ion type for `b`).
    ///
    /// Pairs are rejected if the number of molecules is a trivial multiple ([`check_mol_count`]),
    /// if both ion types have a neutral modification ([`check_max_mod`]), or if they share parts
    /// in a way that makes them duplicates ([`restrict_parts_overlap_to_multimers`]).
    pub fn search_rows(
        &self,
        a: &IonSearchRow,
        b: &IonSearchRow,
        tolerance: Tolerance<Mass>,
    ) -> Vec<(&IonType, &IonType)> {
        let swapped = a.mz() > b.mz();
        let (low, high) = if swapped { (b, a) } else { (a, b) };
        let mut result = Vec::new();
        for group_low in self.groups_for(low) {
            for ion_low in &group_low.ion_types {
                let (lower, upper) = tolerance.bounds(ion_low.get_mass(low.mz()));
                for group_high in self
                    .groups_for(high)
                    .filter(|g| check_mol_count(group_low.molecules, g.molecules))
                {
                    // The highest total mass gives the lowest neutral mass
                    let Some(last) = group_high.ion_types.last() else {
                        continue;
                    };
                    if last.get_mass(high.mz()) > upper {
                        continue;
                    }
                    for ion_high in &group_high.ion_types {
                        let mass_high = ion_high.get_mass(high.mz());
                        if mass_high < lower {
                            break;
                        }
                        if mass_high <= upper
                            && check_max_mod(ion_low, ion_high)
                            && restrict_parts_overlap_to_multimers(ion_low, ion_high)
                        {
                            result.push(if swapped {
                                (ion_high, ion_low)
                            } else {
                                (ion_low, ion_high)
                            });
                        }
                    }
                }
            }
        }
        result
    }

    /// Find all ion types that explain the row with the given neutral mass, within the tolerance
    pub fn search_rows_neutral(
        &self,
        row: &IonSearchRow,
        neutral_mass: Mass,
        tolerance: Tolerance<Mass>,
    ) -> Vec<&IonType> {
        let (lower, upper) = tolerance.bounds(neutral_mass);
        let mut result = Vec::new();
        for group in self.groups_for(row) {
            for ion in &group.ion_types {
                let mass = ion.get_mass(row.mz());
                if mass < lower {
                    break;
                }
                if mass <= upper {
                    result.push(ion);
                }
            }
        }
        result
    }

    /// Search all pairs of rows, see [`Self::search_rows`]. Only pairs of rows with at least one
    /// matching pair of ion types are returned, as (index a, index b, matches) with a < b.
    pub fn search_row_pairs(
        &self,
        rows: &[IonSearchRow],
        tolerance: Tolerance<Mass>,
    ) -> Vec<RowPairMatch<'_>> {
        (0..rows.len())
            .flat_map(|a| ((a + 1)..rows.len()).map(move |b| (a, b)))
            .filter_map(|(a, b)| self.row_pair(rows, a, b, tolerance))
            .collect()
    }

    /// Search all pairs of rows in parallel fashion, see [`Self::search_row_pairs`], only
    /// available if you enable the feature "rayon" (on by default)
    #[cfg(feature = "rayon")]
    pub fn par_search_row_pairs(
        &self,
        rows: &[IonSearchRow],
        tolerance: Tolerance<Mass>,
    ) -> Vec<RowPairMatch<'_>> {
        (0..rows.len())
            .into_par_iter()
            .flat_map_iter(|a| ((a + 1)..rows.len()).map(move |b| (a, b)))
            .filter_map(|(a, b)| self.row_pair(rows, a, b, tolerance))
            .collect()
    }

    fn row_pair(
        &self,
        rows: &[IonSearchRow],
        a: usize,
        b: usize,
        tolerance: Tolerance<Mass>,
    ) -> Option<RowPairMatch<'_>> {
        let matches = self.search_rows(&rows[a], &rows[b], tolerance);
        (!matches.is_empty()).then_some((a, b, matches))
    }
}

impl FromIterator<IonType> for SearchableIonLibrary {
    fn from_iter<T: IntoIterator<Item = IonType>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Check if ion types with these numbers of molecules can be paired. This is true if either has
/// a single molecule or if the numbers share no common divisor, so 2M and 4M cannot be paired
/// but 2M and 5M can.
pub const fn check_mol_count(a: NonZeroU32, b: NonZeroU32) -> bool {
    a.get() == 1 || b.get() == 1 || (a.get() != b.get() && gcd(a.get(), b.get()) == 1)
}

/// Check that at most one of the ion types has a neutral modification
pub fn check_max_mod(a: &IonType, b: &IonType) -> bool {
    !(a.has_neutral_modification() && b.has_neutral_modification())
}

/// Check that two ion types do not share parts, except when they differ in number of molecules
/// and the shared parts do not scale with the number of molecules. So `[M+H]+` and `[2M+H]+` can
/// be paired, but `[M+H]+` and `[2M+2H]2+` (the same ion counted twice) and `[M+H]+` and
/// `[M+H+Na]2+` cannot. A part lost in one and added in the other is not seen as shared.
pub fn restrict_parts_overlap_to_multimers(a: &IonType, b: &IonType) -> bool {
    let mut overlap = a.overlapping_parts(b, true).peekable();
    if overlap.peek().is_none() {
        return true;
    }
    if a.molecules() == b.molecules() {
        return false;
    }
    let molecules_a = a.molecules().get() as isize;
    let molecules_b = b.molecules().get() as isize;
    !overlap.any(|(part_a, part_b)| part_a.count() * molecules_b == part_b.count() * molecules_a)
}
