//! The [`IonError`] which makes it easy for downstream users of the error type to match on the exact error.

use context_error::ErrorKind;

/// The kind of error that happened while handling ion parts, ion types, or the ion library.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum IonError {
    /// An ion part definition breaks one of its invariants (like a blank name with a mass)
    #[default]
    InvalidPart,
    /// Two ion parts with a different identity were merged
    PartMismatch,
    /// The charge of an ion part without a known mass was changed
    UnresolvedMass,
    /// A molecular formula could not be parsed
    InvalidFormula,
    /// A count or charge does not fit in an integer
    Overflow,
    /// A tolerance could not be parsed
    InvalidTolerance,
    /// The library store could not be opened
    StoreCouldNotBeOpened,
    /// The library store could not be parsed
    StoreCouldNotBeParsed,
    /// The library store could not be saved
    StoreCouldNotBeSaved,
}

impl ErrorKind for IonError {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        true
    }
}
