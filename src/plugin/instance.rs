//! Content Instances
//!
//! An [`Instance`] is a named bundle of publishable content: an ordered
//! list of content-node identifiers plus metadata used for compatibility
//! filtering and downstream tooling.
//!
//! Instances are cheap shared handles. Equality and Context membership are
//! reference identity, not name equality; two instances created with the
//! same name are distinct.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::config;

/// Metadata key routed to the typed family field
pub const FAMILY_KEY: &str = "family";

/// Metadata key routed to the typed host field
pub const HOST_KEY: &str = "host";

/// Typed instance metadata plus the open side-table
///
/// The recognized pipeline fields are typed; everything else (e.g. a
/// conform stage's `assetId`) lives in the side-table as raw JSON values.
#[derive(Debug, Clone, Default)]
pub struct InstanceData {
    /// Content classification, dotted namespace (e.g. `"geometry.mesh"`)
    pub family: Option<String>,

    /// Authoring application this instance originates from
    pub host: Option<String>,

    /// Pipeline-visibility marker; instances without it are ignored by
    /// default stage processing
    pub identifier: bool,

    /// Plugin-specific metadata
    extra: HashMap<String, Value>,
}

struct Inner {
    name: String,
    nodes: RwLock<Vec<String>>,
    data: RwLock<InstanceData>,
}

/// A unit of publishable content carried through the pipeline
pub struct Instance {
    inner: Arc<Inner>,
}

impl Instance {
    /// Create an empty instance
    ///
    /// Typically called by a selection plugin; nodes and metadata are
    /// populated incrementally. The data model never injects nodes itself.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                nodes: RwLock::new(Vec::new()),
                data: RwLock::new(InstanceData::default()),
            }),
        }
    }

    /// Instance name, unique within a Context by convention only
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Append a content-node identifier
    ///
    /// Duplicates are permitted; insertion order is preserved and
    /// significant (it represents traversal/extraction order).
    pub fn add<S: Into<String>>(&self, node: S) {
        self.inner.nodes.write().push(node.into());
    }

    /// Remove the first occurrence of a node identifier
    pub fn remove(&self, node: &str) -> bool {
        let mut nodes = self.inner.nodes.write();
        match nodes.iter().position(|n| n == node) {
            Some(index) => {
                nodes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> Vec<String> {
        self.inner.nodes.read().clone()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.inner.nodes.read().len()
    }

    /// Whether the instance holds no nodes
    pub fn is_empty(&self) -> bool {
        self.inner.nodes.read().is_empty()
    }

    /// Declared content family
    pub fn family(&self) -> Option<String> {
        self.inner.data.read().family.clone()
    }

    /// Set the content family
    pub fn set_family<S: Into<String>>(&self, family: S) {
        self.inner.data.write().family = Some(family.into());
    }

    /// Declared authoring host
    pub fn host(&self) -> Option<String> {
        self.inner.data.read().host.clone()
    }

    /// Set the authoring host
    pub fn set_host<S: Into<String>>(&self, host: S) {
        self.inner.data.write().host = Some(host.into());
    }

    /// Whether the instance is marked pipeline-visible
    pub fn is_identified(&self) -> bool {
        self.inner.data.read().identifier
    }

    /// Mark or unmark the instance as pipeline-visible
    pub fn set_identified(&self, identified: bool) {
        self.inner.data.write().identifier = identified;
    }

    /// Set a metadata value by key
    ///
    /// `"family"`, `"host"` and the configured identifier key route to the
    /// typed fields; the identifier key name comes from the installed
    /// configuration, not from a literal. Any other key lands in the
    /// side-table.
    pub fn set_value<S: Into<String>>(&self, key: S, value: Value) {
        let key = key.into();
        let mut data = self.inner.data.write();
        if key == FAMILY_KEY {
            data.family = value.as_str().map(str::to_string);
        } else if key == HOST_KEY {
            data.host = value.as_str().map(str::to_string);
        } else if key == config::identifier_key() {
            data.identifier = truthy(&value);
        } else {
            data.extra.insert(key, value);
        }
    }

    /// Read a metadata value by key
    ///
    /// Typed fields are surfaced under their key names; other keys read
    /// the side-table.
    pub fn value(&self, key: &str) -> Option<Value> {
        let data = self.inner.data.read();
        if key == FAMILY_KEY {
            data.family.clone().map(Value::String)
        } else if key == HOST_KEY {
            data.host.clone().map(Value::String)
        } else if key == config::identifier_key() {
            Some(Value::Bool(data.identifier))
        } else {
            data.extra.get(key).cloned()
        }
    }

    /// Snapshot of the typed metadata and side-table
    pub fn data(&self) -> InstanceData {
        self.inner.data.read().clone()
    }

    /// Identity equality, the same relation as `==`
    pub fn same_as(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl InstanceData {
    /// Side-table entries, excluding the typed fields
    pub fn extra(&self) -> &HashMap<String, Value> {
        &self.extra
    }
}

/// Marker truthiness for non-boolean identifier values
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Clone for Instance {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Instance {}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.data.read();
        f.debug_struct("Instance")
            .field("name", &self.inner.name)
            .field("nodes", &self.inner.nodes.read().len())
            .field("family", &data.family)
            .field("host", &data.host)
            .field("identifier", &data.identifier)
            .finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
