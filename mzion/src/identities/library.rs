use serde::{Deserialize, Serialize};

use crate::identities::{IonType, SearchableIonLibrary, defaults::DEFAULTS};

/// A named collection of ion types, for example all ion types to consider in positive mode
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct IonLibrary {
    name: String,
    ion_types: Vec<IonType>,
}

impl IonLibrary {
    /// Create a new library, duplicate ion types are removed (keeping the first)
    pub fn new(name: impl Into<String>, ion_types: impl IntoIterator<Item = IonType>) -> Self {
        let mut unique: Vec<IonType> = Vec::new();
        for ion_type in ion_types {
            if !unique.contains(&ion_type) {
                unique.push(ion_type);
            }
        }
        Self {
            name: name.into(),
            ion_types: unique,
        }
    }

    /// The built-in positive mode ion types
    pub fn default_positive() -> Self {
        Self::new("Default positive", DEFAULTS.positive.iter().cloned())
    }

    /// The built-in negative mode ion types
    pub fn default_negative() -> Self {
        Self::new("Default negative", DEFAULTS.negative.iter().cloned())
    }

    /// All built-in ion types
    pub fn default_combined() -> Self {
        Self::new(
            "Default",
            DEFAULTS.positive.iter().chain(&DEFAULTS.negative).cloned(),
        )
    }

    /// The name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ion types
    pub fn ion_types(&self) -> &[IonType] {
        &self.ion_types
    }

    /// Build a searchable library from these ion types
    pub fn searchable(&self) -> SearchableIonLibrary {
        SearchableIonLibrary::new(self.ion_types.iter().cloned())
    }
}

impl Extend<IonType> for IonLibrary {
    fn extend<T: IntoIterator<Item = IonType>>(&mut self, iter: T) {
        for ion_type in iter {
            if !self.ion_types.contains(&ion_type) {
                self.ion_types.push(ion_type);
            }
        }
    }
}
