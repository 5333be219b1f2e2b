//! Custom component discovery.
//!
//! A resource directory may carry additional field types for the validation
//! engine under `customComponents/`, one `.js` file per component. The
//! bridge does not load them itself; it hands their names and paths to the
//! engine.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::Serialize;

/// Sub-directory of a resource directory holding custom components.
pub const CUSTOM_COMPONENTS_DIR: &str = "customComponents";

/// A custom field type implementation found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomComponent {
    /// Component type name, the file stem.
    pub name: String,
    /// Path of the implementation file.
    pub path: PathBuf,
}

/// Lists the custom components under `<resource_dir>/customComponents`.
///
/// A missing directory yields no components. The result is sorted by name.
///
/// # Errors
///
/// Returns any I/O error raised while listing an existing directory.
pub fn discover(resource_dir: &Path) -> std::io::Result<Vec<CustomComponent>> {
    let dir = resource_dir.join(CUSTOM_COMPONENTS_DIR);
    if !dir.is_dir() {
        debug!("no custom components in {}", resource_dir.display());
        return Ok(Vec::new());
    }

    let mut components = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "js") {
            continue;
        }
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        debug!("custom component {name}: {}", path.display());
        components.push(CustomComponent { name, path });
    }
    components.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(components)
}

/// Remembers discovered components per resource directory.
///
/// Each directory is scanned at most once. Failed scans are not remembered.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    cache: Mutex<HashMap<PathBuf, Vec<CustomComponent>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The components of `resource_dir`, scanning it on first use.
    pub fn components(&self, resource_dir: &Path) -> Vec<CustomComponent> {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(found) = cache.get(resource_dir) {
            return found.clone();
        }

        match discover(resource_dir) {
            Ok(found) => {
                info!(
                    "registered {} custom components from {}",
                    found.len(),
                    resource_dir.display()
                );
                cache.insert(resource_dir.to_path_buf(), found.clone());
                found
            }
            Err(e) => {
                warn!("cannot list custom components in {}: {e}", resource_dir.display());
                Vec::new()
            }
        }
    }

    /// Number of resource directories scanned so far.
    pub fn len(&self) -> usize {
        match self.cache.lock() {
            Ok(cache) => cache.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource_dir(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let components = dir.path().join(CUSTOM_COMPONENTS_DIR);
        std::fs::create_dir(&components).unwrap();
        for file in files {
            std::fs::write(components.join(file), "module.exports = {};").unwrap();
        }
        dir
    }

    #[test]
    fn test_discover_js_files_sorted() {
        let dir = resource_dir(&["signature.js", "address.js", "notes.txt"]);
        let found = discover(dir.path()).unwrap();
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["address", "signature"]);
        assert!(found[0].path.ends_with("customComponents/address.js"));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_registry_scans_once() {
        let dir = resource_dir(&["a.js"]);
        let registry = ComponentRegistry::new();
        assert_eq!(registry.components(dir.path()).len(), 1);

        std::fs::write(dir.path().join(CUSTOM_COMPONENTS_DIR).join("b.js"), "").unwrap();
        assert_eq!(registry.components(dir.path()).len(), 1);
        assert_eq!(registry.len(), 1);

        let other = resource_dir(&["a.js", "b.js"]);
        assert_eq!(registry.components(other.path()).len(), 2);
        assert_eq!(registry.len(), 2);
    }
}
