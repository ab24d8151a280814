//! Plugin Discovery
//!
//! Scans registered locations for YAML plugin definitions, resolves them
//! against the registry's factory table, and applies stage and name
//! filtering. A malformed definition never aborts discovery of the
//! remaining candidates: the failure is logged and the candidate skipped.
//!
//! Ordering is deterministic for a fixed registry and filesystem state:
//! builtins first (lexicographic by name), then locations in lexicographic
//! order with definition files in lexicographic path order. A definition
//! declaring an already-known plugin name overrides it in place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::registry::{PluginHandle, PluginRegistry};
use crate::plugin::traits::PluginSpec;

/// File extensions treated as plugin definitions
const DEFINITION_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Parser for plugin definition files
#[derive(Debug, Default)]
pub struct PluginDefinitionParser {}

impl PluginDefinitionParser {
    /// Create a new definition parser
    pub fn new() -> Self {
        Self {}
    }

    /// Parse a YAML string into a validated plugin spec
    pub fn parse_yaml(&self, content: &str) -> PluginResult<PluginSpec> {
        let spec: PluginSpec = serde_yaml::from_str(content)
            .map_err(|e| PluginError::definition_parse_error(format!("Failed to parse YAML: {}", e)))?;
        spec.validate()?;
        Ok(spec)
    }
}

/// Discover plugins from the registry's current state
pub(crate) fn discover(
    registry: &PluginRegistry,
    stage: Option<&str>,
    name_filter: Option<&str>,
) -> PluginResult<Vec<PluginHandle>> {
    let pattern = match name_filter {
        Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
            PluginError::configuration_error(format!("Invalid name filter '{}': {}", pattern, e))
        })?),
        None => None,
    };

    let mut handles: Vec<PluginHandle> = registry.builtins().to_vec();
    handles.sort_by(|a, b| a.name().cmp(b.name()));

    let mut positions: HashMap<String, usize> = handles
        .iter()
        .enumerate()
        .map(|(index, handle)| (handle.name().to_string(), index))
        .collect();

    let mut locations = registry.registered_paths().to_vec();
    locations.sort();

    for location in &locations {
        for handle in scan_location(location, registry) {
            match positions.get(handle.name()) {
                Some(&index) => {
                    // Definition files override earlier entries by name
                    log::debug!(
                        "Plugin '{}' overridden by definition in {}",
                        handle.name(),
                        location.display()
                    );
                    handles[index] = handle;
                }
                None => {
                    positions.insert(handle.name().to_string(), handles.len());
                    handles.push(handle);
                }
            }
        }
    }

    log::debug!(
        "Discovered {} plugins from {} builtins and {} locations",
        handles.len(),
        registry.builtins().len(),
        locations.len()
    );

    Ok(handles
        .into_iter()
        .filter(|handle| stage.map_or(true, |tag| handle.stage() == tag))
        .filter(|handle| {
            pattern
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(handle.name()))
        })
        .collect())
}

/// Load every resolvable definition under one location
///
/// Each candidate is isolated: parse failures, invalid specs and
/// unresolvable entry points are logged at warn and skipped.
fn scan_location(location: &Path, registry: &PluginRegistry) -> Vec<PluginHandle> {
    let parser = PluginDefinitionParser::new();
    let mut files = Vec::new();
    collect_definition_files(location, &mut files);
    files.sort();

    files
        .iter()
        .filter_map(|path| match load_definition(&parser, path, registry) {
            Ok(handle) => Some(handle),
            Err(error) => {
                log::warn!(
                    "Skipping plugin definition {}: {}",
                    path.display(),
                    error
                );
                None
            }
        })
        .collect()
}

/// Recursively gather definition files under a directory
fn collect_definition_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let mut directories_to_scan = vec![dir.to_path_buf()];

    while let Some(current_dir) = directories_to_scan.pop() {
        let entries = match fs::read_dir(&current_dir) {
            Ok(entries) => entries,
            Err(error) => {
                // A location that vanished after registration is a
                // discovery-time candidate failure, not an abort
                log::warn!(
                    "Failed to read plugin location {}: {}",
                    current_dir.display(),
                    error
                );
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                directories_to_scan.push(path);
            } else if path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| DEFINITION_EXTENSIONS.contains(&ext))
            {
                files.push(path);
            }
        }
    }
}

/// Parse one definition file and resolve its factory
fn load_definition(
    parser: &PluginDefinitionParser,
    path: &Path,
    registry: &PluginRegistry,
) -> PluginResult<PluginHandle> {
    let content = fs::read_to_string(path).map_err(|e| {
        PluginError::discovery_failed(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let spec = parser.parse_yaml(&content)?;

    let factory = registry.factory(spec.factory_key()).ok_or_else(|| {
        PluginError::discovery_failed(format!(
            "No factory registered for entry point '{}'",
            spec.factory_key()
        ))
    })?;

    Ok(PluginHandle::new(spec, factory.clone()))
}
