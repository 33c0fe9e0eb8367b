use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;

use crate::identities::{IonPart, IonPartDefinition};

/// A pool of ion part definitions, so that all structurally equal parts share a single
/// definition. Sharing only speeds up comparisons, equality never depends on it.
#[derive(Debug, Default)]
pub struct IonPartPool {
    definitions: RwLock<HashSet<Arc<IonPartDefinition>>>,
}

impl IonPartPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pooled definition equal to the given one, or add the given one to the pool and return it
    pub fn intern_definition(&self, definition: Arc<IonPartDefinition>) -> Arc<IonPartDefinition> {
        if let Some(existing) = self.definitions.read().get(&*definition) {
            return existing.clone();
        }
        let mut definitions = self.definitions.write();
        // Another writer could have added it in between releasing the read lock and getting the write lock
        if let Some(existing) = definitions.get(&*definition) {
            existing.clone()
        } else {
            definitions.insert(definition.clone());
            definition
        }
    }

    /// Get the same part but with the pooled definition
    pub fn intern(&self, part: IonPart) -> IonPart {
        IonPart::new(
            self.intern_definition(part.shared_definition().clone()),
            part.count(),
        )
    }

    /// The number of unique definitions in this pool
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn interning() {
        let pool = IonPartPool::new();
        let a = IonPart::new(IonPartDefinition::from_formula("Na", "Na", 1).unwrap(), 1);
        let b = IonPart::new(IonPartDefinition::from_formula("Na", "Na", 1).unwrap(), 3);
        assert!(!Arc::ptr_eq(a.shared_definition(), b.shared_definition()));
        let a = pool.intern(a);
        let b = pool.intern(b);
        assert!(Arc::ptr_eq(a.shared_definition(), b.shared_definition()));
        assert_eq!(b.count(), 3);
        assert_eq!(pool.len(), 1);
        let k = pool.intern(IonPart::new(
            IonPartDefinition::from_formula("K", "K", 1).unwrap(),
            1,
        ));
        assert!(!Arc::ptr_eq(a.shared_definition(), k.shared_definition()));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn concurrent() {
        let pool = IonPartPool::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for count in 1..50 {
                        let _ = pool.intern(IonPart::silent_charge(count));
                    }
                });
            }
        });
        assert_eq!(pool.len(), 1);
    }
}
