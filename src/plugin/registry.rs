//! Plugin Registry
//!
//! Catalogs where plugin definitions are scanned from and how they bind
//! to constructors. A registry is an explicit, constructible object so
//! tests build independent registries instead of sharing process state,
//! and discovery is a pure function of its state at call time.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::plugin::discovery;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::{Plugin, PluginSpec};

/// Constructor binding a declared spec to a fresh plugin object
pub type PluginFactory = Arc<dyn Fn(&PluginSpec) -> Box<dyn Plugin> + Send + Sync>;

/// A discovered plugin: declared metadata coupled to its constructor
///
/// Handles are descriptions, not live plugins; [`PluginHandle::instantiate`]
/// builds a fresh object per invocation.
#[derive(Clone)]
pub struct PluginHandle {
    spec: PluginSpec,
    factory: PluginFactory,
}

impl PluginHandle {
    /// Couple a spec with its factory
    pub fn new(spec: PluginSpec, factory: PluginFactory) -> Self {
        Self { spec, factory }
    }

    /// Declared metadata
    pub fn spec(&self) -> &PluginSpec {
        &self.spec
    }

    /// Plugin type-name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Declared stage tag
    pub fn stage(&self) -> &str {
        &self.spec.stage
    }

    /// Construct a fresh plugin object
    pub fn instantiate(&self) -> Box<dyn Plugin> {
        (self.factory)(&self.spec)
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("spec", &self.spec)
            .finish()
    }
}

/// Registry of plugin scan locations, builtin plugins and factories
#[derive(Default)]
pub struct PluginRegistry {
    /// Scan locations in registration order, de-duplicated
    paths: Vec<PathBuf>,

    /// Compiled-in plugins, discoverable without a definition file
    builtins: Vec<PluginHandle>,

    /// Entry-point factory table for definition files
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filesystem location to scan for plugin definitions
    ///
    /// Fails fast with a configuration error if the path does not exist
    /// or is not a directory. Registering the same path again is safe:
    /// each location is scanned once per discovery regardless of how many
    /// times it was registered.
    pub fn register_plugin_path<P: AsRef<Path>>(&mut self, path: P) -> PluginResult<()> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PluginError::configuration_error(format!(
                "Plugin path does not exist: {}",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Err(PluginError::configuration_error(format!(
                "Plugin path is not a directory: {}",
                path.display()
            )));
        }

        let path = path.to_path_buf();
        if !self.paths.contains(&path) {
            log::debug!("Registered plugin path: {}", path.display());
            self.paths.push(path);
        }

        Ok(())
    }

    /// Clear all registered scan locations
    ///
    /// Builtins and factories are untouched. Callable at any time,
    /// including before any registration.
    pub fn deregister_all(&mut self) {
        self.paths.clear();
    }

    /// Currently registered scan locations, in registration order
    pub fn registered_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Register a compiled-in plugin
    ///
    /// Builtins are always discoverable; a definition file declaring the
    /// same plugin name overrides the builtin registration.
    pub fn register_builtin<F>(&mut self, spec: PluginSpec, factory: F) -> PluginResult<()>
    where
        F: Fn(&PluginSpec) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        spec.validate()?;

        if self.builtins.iter().any(|b| b.name() == spec.name) {
            return Err(PluginError::configuration_error(format!(
                "Builtin plugin already registered: {}",
                spec.name
            )));
        }

        self.builtins.push(PluginHandle::new(spec, Arc::new(factory)));
        Ok(())
    }

    /// Builtin plugin handles, registration order
    pub fn builtins(&self) -> &[PluginHandle] {
        &self.builtins
    }

    /// Bind an entry-point key to a plugin constructor
    ///
    /// Definition files resolve their `entry_point` (defaulting to the
    /// plugin name) through this table. Re-binding a key replaces the
    /// previous constructor.
    pub fn register_factory<S, F>(&mut self, entry_point: S, factory: F)
    where
        S: Into<String>,
        F: Fn(&PluginSpec) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(entry_point.into(), Arc::new(factory));
    }

    /// Look up a constructor by entry-point key
    pub fn factory(&self, entry_point: &str) -> Option<&PluginFactory> {
        self.factories.get(entry_point)
    }

    /// Discover plugins matching a stage tag and an optional name pattern
    ///
    /// Re-evaluates the registered locations on every call; registering
    /// or deregistering paths is immediately visible to the next call.
    /// The only error returned is an invalid `name_filter` pattern;
    /// malformed definitions are logged and skipped.
    pub fn discover(
        &self,
        stage: Option<&str>,
        name_filter: Option<&str>,
    ) -> PluginResult<Vec<PluginHandle>> {
        discovery::discover(self, stage, name_filter)
    }
}

/// Thread-safe plugin registry wrapper
pub struct SharedPluginRegistry {
    inner: Arc<RwLock<PluginRegistry>>,
}

impl SharedPluginRegistry {
    /// Create a new shared registry around an empty registry
    pub fn new() -> Self {
        Self::from_registry(PluginRegistry::new())
    }

    /// Wrap an existing registry
    pub fn from_registry(registry: PluginRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// The inner registry for direct access
    pub fn inner(&self) -> &Arc<RwLock<PluginRegistry>> {
        &self.inner
    }

    /// Acquire a read guard
    pub fn read(&self) -> RwLockReadGuard<'_, PluginRegistry> {
        self.inner.read()
    }

    /// Acquire a write guard
    pub fn write(&self) -> RwLockWriteGuard<'_, PluginRegistry> {
        self.inner.write()
    }
}

impl Clone for SharedPluginRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SharedPluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
