use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[allow(dead_code)]
#[path = "src/keys.rs"]
mod keys;

use keys::KeySet;

const CATALOG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShortcutEntry {
    id: String,
    keys: String,
    description: String,
    category: String,
    action: toml::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShortcutCatalog {
    schema_version: u32,
    shortcuts: Vec<ShortcutEntry>,
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let path = crate_root.join("shortcuts.toml");
    println!("cargo:rerun-if-changed={}", path.display());
    println!("cargo:rerun-if-changed=src/keys.rs");

    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let catalog: ShortcutCatalog = toml::from_str(&raw)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    if catalog.schema_version != CATALOG_SCHEMA_VERSION {
        panic!(
            "catalog schema mismatch in {}: expected {CATALOG_SCHEMA_VERSION} found {}",
            path.display(),
            catalog.schema_version
        );
    }

    let mut seen_ids = HashSet::new();
    let mut seen_keys: HashMap<KeySet, &str> = HashMap::new();
    for entry in &catalog.shortcuts {
        if entry.id.trim().is_empty() || entry.keys.trim().is_empty() {
            panic!("catalog entry in {} has an empty id or key combo", path.display());
        }
        if !seen_ids.insert(entry.id.as_str()) {
            panic!("duplicate shortcut id `{}` in {}", entry.id, path.display());
        }
        let keys: KeySet = entry.keys.parse().unwrap_or_else(|err| {
            panic!("shortcut `{}` in {}: {err}", entry.id, path.display())
        });
        if keys.is_modifier_only() {
            panic!("shortcut `{}` in {} needs a non-modifier key", entry.id, path.display());
        }
        if let Some(first) = seen_keys.insert(keys.clone(), entry.id.as_str()) {
            panic!(
                "shortcuts `{first}` and `{}` in {} are both bound to {keys}",
                entry.id,
                path.display()
            );
        }
    }

    // Registration order is significant; entries are emitted exactly as listed.
    let json = serde_json::to_string_pretty(&catalog).expect("serialize shortcut catalog");
    let generated = format!(
        "/// Build-time generated built-in shortcut catalog JSON.\n\
pub const SHORTCUT_CATALOG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("shortcut_catalog_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
