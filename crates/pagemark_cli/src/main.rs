//! Command-line summary of annotation files.
//!
//! # Responsibility
//! - Verify `pagemark_core` linkage.
//! - Summarize how an annotation JSON file splits across pages and overlays.
//!
//! Usage: `pagemark_cli [ANNOTATIONS.json]`

use pagemark_core::{
    classify, Annotation, AnnotationRepository, MemoryAnnotationStore, Partition,
};
use serde_json::Value;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pagemark_core version={}", pagemark_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match summarize(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(path: &str) -> Result<(), String> {
    let raw = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let document: Value =
        serde_json::from_str(&raw).map_err(|err| format!("`{path}` is not JSON: {err}"))?;
    let entries = match document {
        Value::Array(entries) => entries,
        single @ Value::Object(_) => vec![single],
        _ => return Err("expected an annotation object or a list of annotations".to_string()),
    };

    let mut valid = Vec::with_capacity(entries.len());
    let mut invalid = 0usize;
    for entry in entries {
        match serde_json::from_value::<Annotation>(entry) {
            Ok(annotation) if annotation.validate().is_ok() => valid.push(annotation),
            _ => invalid += 1,
        }
    }

    let mut store = MemoryAnnotationStore::new();
    store.set_annotations(valid);
    let pages: Vec<_> = store.pages().collect();
    for page in pages {
        let Partition { text, image } = classify(store.get_annotations(page));
        println!("page={page} text={} image={}", text.len(), image.len());
    }
    println!(
        "placed={} unplaced={} invalid={invalid}",
        store.len(),
        store.unplaced().len()
    );
    Ok(())
}
