//! The library of known ion parts and ion types, optionally backed by a JSON store on disk.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
    time::SystemTime,
};

use context_error::*;
use directories::{BaseDirs, ProjectDirs};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;

use crate::{
    IonError,
    identities::{
        IonPart, IonPartPool, IonPartResolver, IonPartStringFlavor, IonType, MASS_PRECISION,
        SearchableIonLibrary, defaults::DEFAULTS,
    },
    parse_json::{ParseJson, lenient_array},
};

static GLOBAL: LazyLock<GlobalIonLibrary> = LazyLock::new(GlobalIonLibrary::open_default);

/// The library of all known ion parts and ion types. It always contains the built-in parts and
/// ion types, and if it has a store on disk all parts and ion types from that store are merged
/// in. The store is reloaded whenever its modification time changes and written back whenever
/// the merge added anything. Conflicting definitions (same name and charge but a different
/// formula or mass) are logged and the first definition is kept.
///
/// Reading is done through [`Self::snapshot`], which gives a consistent view that is never
/// changed afterwards. Any change creates a new snapshot.
#[derive(Debug)]
pub struct GlobalIonLibrary {
    path: Option<PathBuf>,
    current: RwLock<Arc<IonLibrarySnapshot>>,
    store: Mutex<StoreState>,
    pool: IonPartPool,
}

#[derive(Debug, Default)]
struct StoreState {
    checked: bool,
    modified: Option<SystemTime>,
}

impl GlobalIonLibrary {
    /// The process wide library, stored at [`Self::default_path`] (or only in memory if no
    /// suitable data directory exists). It is initialised on first use.
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// A library with only the built-in parts and ion types that is never stored
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// A library backed by the store at the given path. The store is read on first use and
    /// created (with the built-in parts and ion types) if it does not exist.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::new(Some(path.into()))
    }

    /// A library backed by the store at [`Self::default_path`], or only in memory if no suitable
    /// data directory exists.
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    /// The default store location: `libraries/global_ions.json` in the data directory for this
    /// application or in the home directory if there is no data directory.
    pub fn default_path() -> Option<PathBuf> {
        let folder = ProjectDirs::from("org", "rusteomics", "mzion")
            .map(|p| p.data_dir().to_owned())
            .or_else(|| BaseDirs::new().map(|b| b.home_dir().join(".mzion")))?;
        Some(folder.join("libraries").join("global_ions.json"))
    }

    fn new(path: Option<PathBuf>) -> Self {
        let pool = IonPartPool::new();
        let snapshot = IonLibrarySnapshot::with_defaults(&pool);
        Self {
            path,
            current: RwLock::new(Arc::new(snapshot)),
            store: Mutex::new(StoreState::default()),
            pool,
        }
    }

    /// The path of the store, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The pool that all parts in this library are interned in
    pub const fn pool(&self) -> &IonPartPool {
        &self.pool
    }

    /// Get the current state of the library, if the store changed on disk it is reloaded first.
    pub fn snapshot(&self) -> Arc<IonLibrarySnapshot> {
        self.refresh();
        self.current()
    }

    fn current(&self) -> Arc<IonLibrarySnapshot> {
        self.current.read().clone()
    }

    fn replace(&self, snapshot: IonLibrarySnapshot) -> Arc<IonLibrarySnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = snapshot.clone();
        snapshot
    }

    /// All variants of a part with this name, see [`IonLibrarySnapshot::find_parts_by_name`].
    /// To resolve several names against one state use [`Self::snapshot`].
    pub fn find_parts_by_name(&self, name: &str) -> Vec<IonPart> {
        self.snapshot().find_parts_by_name(name).to_vec()
    }

    /// All known ion types
    pub fn ion_types(&self) -> Vec<IonType> {
        self.snapshot().ion_types().to_vec()
    }

    /// Build a searchable library from all known ion types
    pub fn searchable(&self) -> SearchableIonLibrary {
        self.snapshot().searchable()
    }

    /// Add parts to the library, parts that are already known (by name and charge) are ignored.
    /// If anything was added the store is updated. Returns the number of added parts.
    pub fn add_parts(&self, parts: impl IntoIterator<Item = IonPart>) -> usize {
        self.modify(|snapshot, pool| {
            parts
                .into_iter()
                .filter(|part| snapshot.merge_part(part, pool))
                .count()
        })
    }

    /// Add ion types (and their parts) to the library, ion types that are already known (by name)
    /// are ignored. If anything was added the store is updated. Returns the number of added ion types.
    pub fn add_ion_types(&self, ion_types: impl IntoIterator<Item = IonType>) -> usize {
        let mut added_types = 0;
        self.modify(|snapshot, pool| {
            let mut added = 0;
            for ion_type in ion_types {
                let (type_added, parts_added) = snapshot.merge_ion_type(&ion_type, pool);
                added_types += usize::from(type_added);
                added += usize::from(type_added) + parts_added;
            }
            added
        });
        added_types
    }

    fn modify(
        &self,
        change: impl FnOnce(&mut IonLibrarySnapshot, &IonPartPool) -> usize,
    ) -> usize {
        self.refresh();
        let mut store = self.store.lock();
        let mut next = IonLibrarySnapshot::clone(&self.current());
        let added = change(&mut next, &self.pool);
        if added > 0 {
            next.version += 1;
            let next = self.replace(next);
            if let Some(path) = &self.path {
                match write_store(path, &next) {
                    Ok(()) => info!("Updated ion library store '{}'", path.display()),
                    Err(err) => warn!("{err}"),
                }
                store.checked = true;
                store.modified = modified_time(path);
            }
        }
        added
    }

    /// Write the current state of the library to its store. Does nothing for a library without store.
    /// # Errors
    /// If the store could not be written.
    pub fn save(&self) -> Result<(), BoxedError<'static, IonError>> {
        if let Some(path) = &self.path {
            let mut store = self.store.lock();
            write_store(path, &self.current())?;
            store.checked = true;
            store.modified = modified_time(path);
        }
        Ok(())
    }

    /// Read the store and merge it into the library, regardless of its modification time.
    /// Does nothing for a library without store.
    /// # Errors
    /// If the store could not be read or parsed, or if the merged library could not be written back.
    pub fn reload(&self) -> Result<(), BoxedError<'static, IonError>> {
        if let Some(path) = &self.path {
            let mut store = self.store.lock();
            store.checked = true;
            let result = self.load_store(path);
            store.modified = modified_time(path);
            result?;
        }
        Ok(())
    }

    /// Check the store, create it if it is missing, and merge it if it changed. Errors are logged.
    /// If another thread is already doing this the current state is used as is.
    fn refresh(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let Some(mut store) = self.store.try_lock() else {
            return;
        };
        let modified = modified_time(path);
        if store.checked && modified == store.modified {
            return;
        }
        store.checked = true;
        if path.exists() {
            debug!("Reloading ion library store '{}'", path.display());
            if let Err(err) = self.load_store(path) {
                warn!("{err}");
            }
        } else {
            match write_store(path, &self.current()) {
                Ok(()) => info!("Created ion library store '{}'", path.display()),
                Err(err) => warn!("{err}"),
            }
        }
        store.modified = modified_time(path);
    }

    /// Read the store and merge it, writing back the result if the store missed anything.
    /// The store lock has to be held.
    fn load_store(&self, path: &Path) -> Result<(), BoxedError<'static, IonError>> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BoxedError::new(
                IonError::StoreCouldNotBeOpened,
                "Ion library store could not be opened",
                e.to_string(),
                Context::none().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            BoxedError::new(
                IonError::StoreCouldNotBeParsed,
                "Ion library store could not be parsed",
                e.to_string(),
                Context::none().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        let stored = StoredLibrary::from_value(value, path);

        let mut next = IonLibrarySnapshot::clone(&self.current());
        let mut added = 0;
        for part in &stored.parts {
            added += usize::from(next.merge_part(part, &self.pool));
        }
        for ion_type in &stored.ion_types {
            let (type_added, parts_added) = next.merge_ion_type(ion_type, &self.pool);
            added += usize::from(type_added) + parts_added;
        }
        if added > 0 {
            next.version += 1;
        }
        let next = self.replace(next);

        if next.parts.len() != stored.unique_parts()
            || next.ion_types.len() != stored.unique_ion_types()
        {
            write_store(path, &next)?;
            info!(
                "Updated ion library store '{}' to {} parts and {} ion types",
                path.display(),
                next.parts.len(),
                next.ion_types.len()
            );
        }
        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A consistent state of a [`GlobalIonLibrary`]. Parts are kept in the order they were first
/// added, with the built-in parts first.
#[derive(Clone, Debug, Default)]
pub struct IonLibrarySnapshot {
    version: u64,
    parts: Vec<IonPart>,
    part_definitions: HashMap<Box<str>, Vec<IonPart>>,
    ion_types: Vec<IonType>,
}

impl IonLibrarySnapshot {
    fn with_defaults(pool: &IonPartPool) -> Self {
        let mut snapshot = Self::default();
        for part in &DEFAULTS.parts {
            snapshot.merge_part(part, pool);
        }
        for ion_type in DEFAULTS.positive.iter().chain(&DEFAULTS.negative) {
            snapshot.merge_ion_type(ion_type, pool);
        }
        snapshot
    }

    /// The version, this is increased every time the library changes
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// All known parts (with count 1)
    pub fn parts(&self) -> &[IonPart] {
        &self.parts
    }

    /// All known charge state variants of a part with this name, in order of addition. So for
    /// `Fe` this gives both Fe³⁺ and Fe²⁺.
    pub fn find_parts_by_name(&self, name: &str) -> &[IonPart] {
        self.part_definitions.get(name).map_or(&[], Vec::as_slice)
    }

    /// All known ion types
    pub fn ion_types(&self) -> &[IonType] {
        &self.ion_types
    }

    /// Build a searchable library from all known ion types
    pub fn searchable(&self) -> SearchableIonLibrary {
        SearchableIonLibrary::new(self.ion_types.iter().cloned())
    }

    /// Add a part if no part with the same name and charge is known. Returns if it was added.
    fn merge_part(&mut self, part: &IonPart, pool: &IonPartPool) -> bool {
        if part.is_silent_charge() {
            return false;
        }
        let part = part.with_count(1);
        let variants = self.part_definitions.entry(part.name().into()).or_default();
        if let Some(existing) = variants
            .iter()
            .find(|p| p.single_charge() == part.single_charge())
        {
            if !existing.same_kind(&part) {
                warn!(
                    "Conflicting definitions for ion part '{}', keeping {} and ignoring {}{}",
                    part.definition().key(),
                    existing.to_string_flavor(IonPartStringFlavor::FullWithMass),
                    part.to_string_flavor(IonPartStringFlavor::FullWithMass),
                    if (existing.abs_single_mass() - part.abs_single_mass()).abs()
                        <= MASS_PRECISION
                    {
                        " (same mass)"
                    } else {
                        ""
                    }
                );
            }
            return false;
        }
        let part = pool.intern(part);
        variants.push(part.clone());
        self.parts.push(part);
        true
    }

    /// Add an ion type (and its parts) if no ion type with the same name is known. Returns if the
    /// ion type was added and the number of added parts.
    fn merge_ion_type(&mut self, ion_type: &IonType, pool: &IonPartPool) -> (bool, usize) {
        let parts_added = ion_type
            .parts()
            .iter()
            .filter(|part| self.merge_part(part, pool))
            .count();
        if let Some(existing) = self.ion_types.iter().find(|t| t.name() == ion_type.name()) {
            if existing != ion_type {
                warn!(
                    "Conflicting definitions for ion type '{}', keeping {} and ignoring {}",
                    ion_type.name(),
                    existing.parts_to_string(IonPartStringFlavor::FullWithMass),
                    ion_type.parts_to_string(IonPartStringFlavor::FullWithMass),
                );
            }
            return (false, parts_added);
        }
        self.ion_types.push(ion_type.interned(pool));
        (true, parts_added)
    }
}

impl IonPartResolver for IonLibrarySnapshot {
    fn find_parts_by_name(&self, name: &str) -> Vec<IonPart> {
        Self::find_parts_by_name(self, name).to_vec()
    }
}

/// The content of a store as read from disk, invalid entries are skipped with a warning
#[derive(Debug, Default)]
struct StoredLibrary {
    parts: Vec<IonPart>,
    ion_types: Vec<IonType>,
}

impl StoredLibrary {
    fn from_value(value: Value, path: &Path) -> Self {
        let Value::Object(mut map) = value else {
            warn!(
                "Ion library store '{}' is not a JSON object, it is ignored",
                path.display()
            );
            return Self::default();
        };
        let mut result = Self::default();
        if let Some(Value::Object(definitions)) = map.remove("partDefinitions") {
            for (_, parts) in definitions {
                result.parts.extend(lenient(parts, "partDefinitions", path));
            }
        }
        if let Some(parts) = map.remove("singletonParts") {
            result.parts.extend(lenient(parts, "singletonParts", path));
        }
        if let Some(ion_types) = map.remove("ionTypes") {
            result.ion_types = lenient(ion_types, "ionTypes", path);
        }
        result
    }

    fn unique_parts(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| !p.is_silent_charge())
            .map(|p| p.definition().key())
            .collect::<HashSet<_>>()
            .len()
    }

    fn unique_ion_types(&self) -> usize {
        self.ion_types
            .iter()
            .map(IonType::name)
            .collect::<HashSet<_>>()
            .len()
    }
}

fn lenient<T: ParseJson>(value: Value, field: &str, path: &Path) -> Vec<T> {
    match lenient_array(value) {
        Ok((result, errors)) => {
            for error in errors {
                warn!(
                    "Skipped invalid entry in '{field}' of ion library store '{}': {error}",
                    path.display()
                );
            }
            result
        }
        Err(error) => {
            warn!(
                "Skipped '{field}' of ion library store '{}': {error}",
                path.display()
            );
            Vec::new()
        }
    }
}

/// The layout of the store on disk
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IonLibraryFile<'a> {
    part_definitions: BTreeMap<&'a str, &'a [IonPart]>,
    singleton_parts: &'a [IonPart],
    ion_types: &'a [IonType],
}

impl<'a> From<&'a IonLibrarySnapshot> for IonLibraryFile<'a> {
    fn from(value: &'a IonLibrarySnapshot) -> Self {
        Self {
            part_definitions: value
                .part_definitions
                .iter()
                .map(|(name, parts)| (name.as_ref(), parts.as_slice()))
                .collect(),
            singleton_parts: &value.parts,
            ion_types: &value.ion_types,
        }
    }
}

fn write_store(
    path: &Path,
    snapshot: &IonLibrarySnapshot,
) -> Result<(), BoxedError<'static, IonError>> {
    let error = |e: &dyn std::fmt::Display| {
        BoxedError::new(
            IonError::StoreCouldNotBeSaved,
            "Ion library store could not be saved",
            e.to_string(),
            Context::none().source(path.to_string_lossy()).to_owned(),
        )
    };
    if let Some(folder) = path.parent() {
        std::fs::create_dir_all(folder).map_err(|e| error(&e))?;
    }
    let file = std::fs::File::create(path).map_err(|e| error(&e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &IonLibraryFile::from(snapshot))
        .map_err(|e| error(&e))?;
    writer.flush().map_err(|e| error(&e))
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::{identities::IonPartDefinition, system::da};

    fn temp_path(name: &str) -> PathBuf {
        let folder =
            std::env::temp_dir().join(format!("mzion-global-{name}-{}", std::process::id()));
        drop(std::fs::remove_dir_all(&folder));
        folder.join("global_ions.json")
    }

    #[test]
    fn iron_variants() {
        let library = GlobalIonLibrary::in_memory();
        let fe = library.find_parts_by_name("Fe");
        assert_eq!(fe.len(), 2);
        assert_eq!(fe[0].single_charge(), 3);
        assert_eq!(fe[1].single_charge(), 2);
        assert!(library.find_parts_by_name("Xyz").is_empty());
    }

    #[test]
    fn shared_definitions() {
        let library = GlobalIonLibrary::in_memory();
        let snapshot = library.snapshot();
        let h = &snapshot.find_parts_by_name("H")[0];
        let in_type = snapshot
            .ion_types()
            .iter()
            .find(|t| t.name() == "[M+H]+")
            .unwrap();
        assert!(Arc::ptr_eq(
            h.shared_definition(),
            in_type.parts()[0].shared_definition()
        ));
    }

    #[test]
    fn add_parts() {
        let library = GlobalIonLibrary::in_memory();
        let version = library.snapshot().version();
        let cs = IonPart::new(IonPartDefinition::from_formula("Cs", "Cs", 1).unwrap(), 1);
        assert_eq!(library.add_parts([cs.clone(), cs.clone()]), 1);
        assert_eq!(library.find_parts_by_name("Cs"), vec![cs]);
        assert_eq!(library.snapshot().version(), version + 1);
        // Same name and charge but a different mass, the first stays
        let other = IonPart::new(
            IonPartDefinition::with_mass("Cs", None, da(1.0), 1).unwrap(),
            1,
        );
        assert_eq!(library.add_parts([other]), 0);
        assert_eq!(library.snapshot().version(), version + 1);
    }

    #[test]
    fn add_ion_types() {
        let library = GlobalIonLibrary::in_memory();
        let ion = IonType::parse_with("[M+Cs]+", &*library.snapshot()).unwrap();
        assert!(ion.parts().iter().any(|p| p.name() == "Cs"));
        assert_eq!(library.add_ion_types([ion.clone()]), 1);
        assert_eq!(library.add_ion_types([ion]), 0);
        assert_eq!(library.find_parts_by_name("Cs").len(), 1);
        assert!(library.ion_types().iter().any(|t| t.name() == "[M+Cs]+"));
    }

    #[test]
    fn only_merged_parts_are_pooled() {
        let library = GlobalIonLibrary::in_memory();
        let pooled = library.pool().len();
        let snapshot = library.snapshot();
        let ion = IonType::parse_with("[M+Xyz+Rb-CH4]2+", &*snapshot).unwrap();
        assert!(IonPart::parse_with("+(Qq+2)", &*snapshot).is_some());
        assert_eq!(library.pool().len(), pooled);
        // A known part that is parsed again is not added twice
        assert_eq!(library.add_parts(library.find_parts_by_name("Na")), 0);
        assert_eq!(library.pool().len(), pooled);
        assert_eq!(library.add_ion_types([ion]), 1);
        // The silent charge is shared with [M]+
        assert_eq!(library.pool().len(), pooled + 3);
    }

    #[test]
    fn parse_against_one_snapshot() {
        let library = GlobalIonLibrary::in_memory();
        let before = library.snapshot();
        let cs = IonPart::new(IonPartDefinition::from_formula("Cs", "Cs", 1).unwrap(), 1);
        assert_eq!(library.add_parts([cs]), 1);
        // The older snapshot does not know Cs, so it is read as a neutral formula
        let old = IonType::parse_with("[M+Cs]+", &*before).unwrap();
        assert!(old.parts().iter().any(IonPart::is_silent_charge));
        let new = IonType::parse_with("[M+Cs]+", &*library.snapshot()).unwrap();
        assert!(!new.parts().iter().any(IonPart::is_silent_charge));
        assert_eq!(new.parts()[0].single_charge(), 1);
    }

    #[test]
    fn refresh_does_not_wait_for_store() {
        let path = temp_path("busy");
        let library = GlobalIonLibrary::with_path(&path);
        let version = library.snapshot().version();
        let store = library.store.lock();
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(library.snapshot().version(), version);
        assert_eq!(library.find_parts_by_name("Fe").len(), 2);
        drop(store);
        drop(std::fs::remove_dir_all(path.parent().unwrap()));
    }

    #[test]
    fn store_created() {
        let path = temp_path("created");
        let library = GlobalIonLibrary::with_path(&path);
        let parts = library.snapshot().parts().len();
        assert!(path.exists());
        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["singletonParts"].as_array().unwrap().len(), parts);
        assert_eq!(value["partDefinitions"]["Fe"].as_array().unwrap().len(), 2);
        assert!(value["ionTypes"].as_array().unwrap().len() > 10);
        drop(std::fs::remove_dir_all(path.parent().unwrap()));
    }

    #[test]
    fn store_persists_additions() {
        let path = temp_path("additions");
        let library = GlobalIonLibrary::with_path(&path);
        let ion = IonType::create(
            [IonPart::new(
                IonPartDefinition::from_formula("Cs", "Cs", 1).unwrap(),
                1,
            )],
            NonZeroU32::new(2).unwrap(),
        )
        .unwrap();
        assert_eq!(library.add_ion_types([ion]), 1);
        let reopened = GlobalIonLibrary::with_path(&path);
        assert!(reopened.ion_types().iter().any(|t| t.name() == "[2M+(Cs+1)]+"));
        assert_eq!(reopened.find_parts_by_name("Cs").len(), 1);
        drop(std::fs::remove_dir_all(path.parent().unwrap()));
    }

    #[test]
    fn store_invalid() {
        let path = temp_path("invalid");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        let library = GlobalIonLibrary::with_path(&path);
        assert_eq!(library.find_parts_by_name("Fe").len(), 2);
        assert_eq!(
            library.reload().unwrap_err().get_kind(),
            &IonError::StoreCouldNotBeParsed
        );
        drop(std::fs::remove_dir_all(path.parent().unwrap()));
    }

    #[test]
    fn in_memory_save() {
        let library = GlobalIonLibrary::in_memory();
        assert!(library.path().is_none());
        assert!(library.save().is_ok());
        assert!(library.reload().is_ok());
    }
}
