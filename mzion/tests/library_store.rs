#![allow(clippy::missing_panics_doc)]
//! Integration tests for the ion library store on disk
use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

use mzion::prelude::*;

fn init_logging() {
    drop(env_logger::builder().is_test(true).try_init());
}

/// A fresh folder in the temporary directory, with the path of the store inside of it
fn store(name: &str) -> PathBuf {
    let folder = std::env::temp_dir().join(format!("mzion-store-{name}-{}", std::process::id()));
    drop(std::fs::remove_dir_all(&folder));
    std::fs::create_dir_all(&folder).unwrap();
    folder.join("global_ions.json")
}

fn cleanup(path: &std::path::Path) {
    drop(std::fs::remove_dir_all(path.parent().unwrap()));
}

#[test]
fn created_when_missing() {
    init_logging();
    let path = store("missing");
    let library = GlobalIonLibrary::with_path(&path);
    assert!(!path.exists());
    let snapshot = library.snapshot();
    assert!(path.exists());
    let reopened = GlobalIonLibrary::with_path(&path);
    assert_eq!(reopened.snapshot().parts(), snapshot.parts());
    assert_eq!(reopened.snapshot().ion_types(), snapshot.ion_types());
    cleanup(&path);
}

#[test]
fn user_entries_are_merged() {
    init_logging();
    let path = store("merged");
    std::fs::write(
        &path,
        r#"{
            "version": 12,
            "partDefinitions": {
                "Cs": [{"name": "Cs", "formula": "Cs", "charge": 1, "comment": "ignored"}]
            },
            "singletonParts": [
                {"name": "TFA", "formula": "C2HF3O2", "charge": 0},
                {"name": "Broken", "formula": "Xx", "charge": 0}
            ],
            "ionTypes": [
                {"name": "[M+Cs]+", "parts": [{"name": "Cs", "formula": "Cs", "charge": 1}], "molecules": 1},
                {"parts": [{"name": "TFA", "formula": "C2HF3O2", "charge": 0}, {"name": "", "charge": 1, "mass": 0.0, "count": -1}], "molecules": 1},
                {"parts": "invalid"}
            ]
        }"#,
    )
    .unwrap();
    let library = GlobalIonLibrary::with_path(&path);
    assert_eq!(library.find_parts_by_name("Cs").len(), 1);
    assert_eq!(library.find_parts_by_name("TFA").len(), 1);
    assert!(library.find_parts_by_name("Broken").is_empty());
    let names: Vec<_> = library
        .ion_types()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert!(names.iter().any(|n| n == "[M+(Cs+1)]+"));
    assert!(names.iter().any(|n| n == "[M+TFA]-"));
    assert!(names.iter().any(|n| n == "[M+H]+"));
    // The store missed the built-in entries, so it was written back
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written["singletonParts"].as_array().unwrap().len(),
        library.snapshot().parts().len()
    );
    // The user entries are in the store and can be used for parsing
    let ion = IonType::parse_with("[M+TFA-H]-", &*library.snapshot()).unwrap();
    assert!(!ion.is_undefined());
    cleanup(&path);
}

#[test]
fn conflicts_keep_first() {
    init_logging();
    let path = store("conflict");
    std::fs::write(
        &path,
        r#"{"singletonParts": [{"name": "Na", "mass": 1.0, "charge": 1}]}"#,
    )
    .unwrap();
    let library = GlobalIonLibrary::with_path(&path);
    let na = library.find_parts_by_name("Na");
    assert_eq!(na.len(), 1);
    assert!((na[0].abs_single_mass() - da(22.989_220_7)).abs() < da(1e-6));
    cleanup(&path);
}

#[test]
fn external_changes_are_picked_up() {
    init_logging();
    let path = store("external");
    let library = GlobalIonLibrary::with_path(&path);
    let version = library.snapshot().version();
    assert!(library.find_parts_by_name("Rb").is_empty());

    let other = GlobalIonLibrary::with_path(&path);
    let rb = IonPart::parse_with("+(Rb+1)", &*other.snapshot()).unwrap();
    assert_eq!(other.add_parts([rb]), 1);

    library.reload().unwrap();
    assert_eq!(library.find_parts_by_name("Rb").len(), 1);
    assert!(library.snapshot().version() > version);
    cleanup(&path);
}

/// A store rewritten by someone else is merged on the next read, without an explicit reload
#[test]
fn rewritten_store_is_read_on_next_use() {
    init_logging();
    let path = store("rewritten");
    let library = GlobalIonLibrary::with_path(&path);
    let version = library.snapshot().version();
    assert!(library.find_parts_by_name("Rb").is_empty());

    std::fs::write(
        &path,
        r#"{"singletonParts": [{"name": "Rb", "formula": "Rb", "charge": 1}]}"#,
    )
    .unwrap();
    // Make sure the modification time differs even on file systems with a coarse clock
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();

    let rb = library.find_parts_by_name("Rb");
    assert_eq!(rb.len(), 1);
    assert_eq!(rb[0].single_charge(), 1);
    assert!(library.snapshot().version() > version);
    // The built-ins were missing from the rewritten store, so it was completed again
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written["singletonParts"].as_array().unwrap().len(),
        library.snapshot().parts().len()
    );
    cleanup(&path);
}

/// Reading a store that has nothing new does not write it again
#[test]
fn complete_store_is_not_rewritten() {
    init_logging();
    let path = store("complete");
    let library = GlobalIonLibrary::with_path(&path);
    let version = library.snapshot().version();
    let text = std::fs::read_to_string(&path).unwrap();
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

    let reopened = GlobalIonLibrary::with_path(&path);
    assert_eq!(reopened.snapshot().parts(), library.snapshot().parts());
    library.reload().unwrap();
    assert_eq!(library.snapshot().version(), version);

    assert_eq!(
        std::fs::metadata(&path).unwrap().modified().unwrap(),
        modified
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    cleanup(&path);
}

#[test]
fn unreadable_store_falls_back_to_defaults() {
    init_logging();
    let path = store("unreadable");
    std::fs::write(&path, "{ this is not json").unwrap();
    let library = GlobalIonLibrary::with_path(&path);
    assert_eq!(library.find_parts_by_name("Fe").len(), 2);
    assert!(library.reload().is_err());
    // The broken store is not overwritten
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{ this is not json"
    );
    cleanup(&path);
}

#[test]
fn concurrent_readers() {
    init_logging();
    let path = store("concurrent");
    let library = GlobalIonLibrary::with_path(&path);
    std::thread::scope(|scope| {
        for i in 0..4 {
            let library = &library;
            scope.spawn(move || {
                for _ in 0..20 {
                    assert_eq!(library.find_parts_by_name("Fe").len(), 2);
                    assert!(IonType::parse_with("[M+H]+", &*library.snapshot()).is_some());
                }
                if i == 0 {
                    let cs = IonPart::parse_with("Cs", &*library.snapshot()).unwrap();
                    library.add_parts([cs]);
                }
            });
        }
    });
    assert_eq!(library.find_parts_by_name("Cs").len(), 1);
    cleanup(&path);
}
