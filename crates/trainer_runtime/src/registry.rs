//! Shortcut definitions, bound actions, and the startup-validated registry.
//!
//! The registry is immutable once built. Construction fails fast on configuration errors, most
//! importantly two definitions sharing the same key-set, which would otherwise leave the later
//! definition silently unreachable.

use std::collections::{HashMap, HashSet};

use leptos::logging;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::KeySet;
use crate::model::OpenWindowRequest;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/shortcut_catalog_generated.rs"));
}

pub use generated::SHORTCUT_CATALOG_JSON;

/// Catalog schema version accepted by [`ShortcutRegistry`] loaders.
pub const SHORTCUT_CATALOG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortcutCategory {
    Navigation,
    Window,
    System,
    Application,
}

impl ShortcutCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::Window => "Window",
            Self::System => "System",
            Self::Application => "Application",
        }
    }
}

/// Operation a shortcut performs when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ActionKind {
    /// Open a new synthetic window.
    OpenWindow {
        title: String,
        icon_id: String,
        content_id: String,
    },
    /// Close the focused window.
    CloseActive,
    /// Minimize the focused window.
    MinimizeActive,
    /// Maximize or un-maximize the focused window.
    ToggleMaximizeActive,
    /// Minimize everything, or restore everything when all windows are minimized.
    ToggleShowDesktop,
    /// Move focus to the next window in creation order.
    CycleFocus,
    /// Scored for practice but has no effect on the desktop (copy, paste, ...).
    PracticeOnly,
}

impl ActionKind {
    /// Builds the window-open request for [`ActionKind::OpenWindow`].
    pub fn open_request(&self) -> Option<OpenWindowRequest> {
        match self {
            Self::OpenWindow {
                title,
                icon_id,
                content_id,
            } => Some(OpenWindowRequest::new(
                title.clone(),
                icon_id.clone(),
                content_id.clone(),
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutDefinition {
    pub id: String,
    pub keys: KeySet,
    pub description: String,
    pub category: ShortcutCategory,
    pub action: ActionKind,
}

impl ShortcutDefinition {
    pub fn new(
        id: impl Into<String>,
        keys: KeySet,
        description: impl Into<String>,
        category: ShortcutCategory,
        action: ActionKind,
    ) -> Self {
        Self {
            id: id.into(),
            keys,
            description: description.into(),
            category,
            action,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShortcutCatalog {
    schema_version: u32,
    shortcuts: Vec<ShortcutDefinition>,
}

#[derive(Debug, Error)]
/// Configuration errors detected while building a [`ShortcutRegistry`].
pub enum RegistryError {
    /// Two definitions share an id.
    #[error("duplicate shortcut id `{0}`")]
    DuplicateId(String),
    /// Two definitions share an identical key-set; the later one could never fire.
    #[error("shortcuts `{first}` and `{second}` are both bound to {keys}")]
    DuplicateKeys {
        /// Earlier-registered shortcut id.
        first: String,
        /// Later-registered shortcut id.
        second: String,
        /// Display form of the shared key-set.
        keys: String,
    },
    /// A definition has no keys or only modifiers, so no key press can ever match it.
    #[error("shortcut `{0}` needs a non-modifier key")]
    UnreachableKeys(String),
    /// The catalog declares a schema version this build does not understand.
    #[error("unsupported shortcut catalog schema version {0}")]
    UnsupportedSchema(u32),
    /// The catalog JSON could not be decoded.
    #[error("invalid shortcut catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The catalog TOML could not be decoded.
    #[error("invalid shortcut catalog TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Ordered, validated list of shortcut definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortcutRegistry {
    definitions: Vec<ShortcutDefinition>,
}

impl ShortcutRegistry {
    /// Builds a registry, preserving `definitions` order as matching priority.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`], [`RegistryError::DuplicateKeys`], or
    /// [`RegistryError::UnreachableKeys`] for an inconsistent shortcut table.
    pub fn new(definitions: Vec<ShortcutDefinition>) -> Result<Self, RegistryError> {
        validate_definitions(&definitions)?;
        Ok(Self { definitions })
    }

    /// Loads the catalog embedded at build time from `shortcuts.toml`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the embedded catalog is inconsistent.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_json_str(SHORTCUT_CATALOG_JSON)
    }

    /// Loads a catalog from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Json`] for malformed input, plus any validation error from
    /// [`ShortcutRegistry::new`].
    pub fn from_json_str(raw: &str) -> Result<Self, RegistryError> {
        let catalog: ShortcutCatalog = serde_json::from_str(raw)?;
        Self::from_catalog(catalog)
    }

    /// Loads a catalog from TOML in the same layout as the built-in `shortcuts.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Toml`] for malformed input, plus any validation error from
    /// [`ShortcutRegistry::new`].
    pub fn from_toml_str(raw: &str) -> Result<Self, RegistryError> {
        let catalog: ShortcutCatalog = toml::from_str(raw)?;
        Self::from_catalog(catalog)
    }

    fn from_catalog(catalog: ShortcutCatalog) -> Result<Self, RegistryError> {
        if catalog.schema_version != SHORTCUT_CATALOG_SCHEMA_VERSION {
            return Err(RegistryError::UnsupportedSchema(catalog.schema_version));
        }
        Self::new(catalog.shortcuts)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> &[ShortcutDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: &str) -> Option<&ShortcutDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn validate_definitions(definitions: &[ShortcutDefinition]) -> Result<(), RegistryError> {
    let mut ids = HashSet::new();
    let mut key_owners: HashMap<&KeySet, &str> = HashMap::new();

    for definition in definitions {
        if !ids.insert(definition.id.as_str()) {
            logging::warn!("rejecting shortcut table: duplicate id {}", definition.id);
            return Err(RegistryError::DuplicateId(definition.id.clone()));
        }
        if definition.keys.is_empty() || definition.keys.is_modifier_only() {
            return Err(RegistryError::UnreachableKeys(definition.id.clone()));
        }
        if let Some(first) = key_owners.insert(&definition.keys, definition.id.as_str()) {
            logging::warn!(
                "rejecting shortcut table: {} shadows {first} on {}",
                definition.id,
                definition.keys
            );
            return Err(RegistryError::DuplicateKeys {
                first: first.to_string(),
                second: definition.id.clone(),
                keys: definition.keys.display_string(),
            });
        }
    }
    Ok(())
}
