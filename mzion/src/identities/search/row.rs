use serde::{Deserialize, Serialize};

use crate::{identities::Polarity, system::MassOverCharge};

/// The information needed from an observed feature (a row in a feature list) to search for ion
/// identities
pub trait FeatureRow {
    /// The average observed m/z
    fn average_mz(&self) -> MassOverCharge;

    /// The representative charge state, if known
    fn representative_charge(&self) -> Option<isize>;

    /// The polarity, by default derived from the sign of the charge (and unknown if there is no
    /// charge or the charge is zero)
    fn polarity(&self) -> Option<Polarity> {
        self.representative_charge()
            .filter(|c| *c != 0)
            .map(Polarity::from_charge)
    }
}

/// A query for the ion identity search: an observed m/z with optionally its charge and polarity.
/// Any information that is present is used to limit the ion types that are considered.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct IonSearchRow {
    mz: MassOverCharge,
    signed_charge: Option<isize>,
    abs_charge: Option<usize>,
    polarity: Option<Polarity>,
}

impl IonSearchRow {
    /// A row with only an m/z
    pub const fn new(mz: MassOverCharge) -> Self {
        Self {
            mz,
            signed_charge: None,
            abs_charge: None,
            polarity: None,
        }
    }

    /// A row with a known signed charge, a charge of zero is treated as unknown
    pub const fn with_charge(mz: MassOverCharge, charge: isize) -> Self {
        if charge == 0 {
            Self::new(mz)
        } else {
            Self {
                mz,
                signed_charge: Some(charge),
                abs_charge: Some(charge.unsigned_abs()),
                polarity: Some(Polarity::from_charge(charge)),
            }
        }
    }

    /// A row with a known absolute charge and possibly a known polarity. A charge of zero is
    /// treated as unknown.
    pub const fn with_abs_charge(
        mz: MassOverCharge,
        abs_charge: usize,
        polarity: Option<Polarity>,
    ) -> Self {
        let polarity = match polarity {
            Some(Polarity::Neutral) => None,
            p => p,
        };
        Self {
            mz,
            signed_charge: match polarity {
                Some(Polarity::Positive) if abs_charge != 0 && abs_charge <= isize::MAX as usize => {
                    Some(abs_charge as isize)
                }
                Some(Polarity::Negative) if abs_charge != 0 && abs_charge <= isize::MAX as usize => {
                    Some(-(abs_charge as isize))
                }
                _ => None,
            },
            abs_charge: if abs_charge == 0 {
                None
            } else {
                Some(abs_charge)
            },
            polarity,
        }
    }

    /// A row for the given feature
    pub fn from_feature(feature: &(impl FeatureRow + ?Sized)) -> Self {
        let mz = feature.average_mz();
        match (feature.representative_charge(), feature.polarity()) {
            (Some(charge), polarity) if charge != 0 => Self::with_abs_charge(
                mz,
                charge.unsigned_abs(),
                polarity.or(Some(Polarity::from_charge(charge))),
            ),
            (_, polarity) => Self::with_abs_charge(mz, 0, polarity),
        }
    }

    /// The observed m/z
    pub const fn mz(&self) -> MassOverCharge {
        self.mz
    }

    /// The signed charge, if known
    pub const fn signed_charge(&self) -> Option<isize> {
        self.signed_charge
    }

    /// The absolute charge, if known
    pub const fn abs_charge(&self) -> Option<usize> {
        self.abs_charge
    }

    /// The polarity, if known
    pub const fn polarity(&self) -> Option<Polarity> {
        self.polarity
    }

    /// Check if an ion type group with this charge could explain this row
    pub(crate) fn matches_charge(&self, charge: isize) -> bool {
        if let Some(signed) = self.signed_charge {
            signed == charge
        } else if let Some(abs) = self.abs_charge {
            abs == charge.unsigned_abs()
                && self
                    .polarity
                    .is_none_or(|p| p == Polarity::from_charge(charge))
        } else if let Some(polarity) = self.polarity {
            polarity == Polarity::from_charge(charge)
        } else {
            true
        }
    }
}

impl<T: FeatureRow + ?Sized> From<&T> for IonSearchRow {
    fn from(value: &T) -> Self {
        Self::from_feature(value)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::system::thomson;

    fn th(value: f64) -> MassOverCharge {
        MassOverCharge::new::<thomson>(value)
    }

    struct Feature {
        mz: MassOverCharge,
        charge: Option<isize>,
    }

    impl FeatureRow for Feature {
        fn average_mz(&self) -> MassOverCharge {
            self.mz
        }
        fn representative_charge(&self) -> Option<isize> {
            self.charge
        }
    }

    struct NegativeMode(Feature);

    impl FeatureRow for NegativeMode {
        fn average_mz(&self) -> MassOverCharge {
            self.0.mz
        }
        fn representative_charge(&self) -> Option<isize> {
            self.0.charge
        }
        fn polarity(&self) -> Option<Polarity> {
            Some(Polarity::Negative)
        }
    }

    #[test]
    fn constructors() {
        let row = IonSearchRow::with_charge(th(100.0), -2);
        assert_eq!(row.signed_charge(), Some(-2));
        assert_eq!(row.abs_charge(), Some(2));
        assert_eq!(row.polarity(), Some(Polarity::Negative));
        assert_eq!(IonSearchRow::with_charge(th(100.0), 0), IonSearchRow::new(th(100.0)));
        let row = IonSearchRow::with_abs_charge(th(100.0), 2, None);
        assert_eq!(row.signed_charge(), None);
        assert_eq!(row.abs_charge(), Some(2));
        let row = IonSearchRow::with_abs_charge(th(100.0), 2, Some(Polarity::Positive));
        assert_eq!(row, IonSearchRow::with_charge(th(100.0), 2));
        let row = IonSearchRow::with_abs_charge(th(100.0), 0, Some(Polarity::Negative));
        assert_eq!(row.abs_charge(), None);
        assert_eq!(row.polarity(), Some(Polarity::Negative));
    }

    #[test]
    fn features() {
        let row = IonSearchRow::from(&Feature {
            mz: th(301.0),
            charge: Some(1),
        });
        assert_eq!(row, IonSearchRow::with_charge(th(301.0), 1));
        let row = IonSearchRow::from(&Feature {
            mz: th(301.0),
            charge: None,
        });
        assert_eq!(row, IonSearchRow::new(th(301.0)));
        let row = IonSearchRow::from(&NegativeMode(Feature {
            mz: th(301.0),
            charge: Some(1),
        }));
        assert_eq!(row.signed_charge(), Some(-1));
        let row = IonSearchRow::from(&NegativeMode(Feature {
            mz: th(301.0),
            charge: None,
        }));
        assert_eq!(row.polarity(), Some(Polarity::Negative));
        assert_eq!(row.abs_charge(), None);
    }

    #[test]
    fn charge_filter() {
        assert!(IonSearchRow::new(th(1.0)).matches_charge(-3));
        assert!(IonSearchRow::with_charge(th(1.0), 2).matches_charge(2));
        assert!(!IonSearchRow::with_charge(th(1.0), 2).matches_charge(-2));
        assert!(IonSearchRow::with_abs_charge(th(1.0), 2, None).matches_charge(-2));
        assert!(!IonSearchRow::with_abs_charge(th(1.0), 2, None).matches_charge(1));
        let negative = IonSearchRow::with_abs_charge(th(1.0), 0, Some(Polarity::Negative));
        assert!(negative.matches_charge(-1));
        assert!(!negative.matches_charge(1));
    }
}
