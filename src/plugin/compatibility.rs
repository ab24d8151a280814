//! Plugin/Instance Compatibility
//!
//! Matches plugins to instances and instances to plugins by host and
//! family. A plugin with no declared restriction on a dimension accepts
//! any instance on that dimension; an instance missing a dimension never
//! satisfies a plugin that restricts it.

use crate::plugin::context::Context;
use crate::plugin::instance::Instance;
use crate::plugin::registry::PluginHandle;
use crate::plugin::traits::PluginSpec;

/// Compatibility predicate between a declared plugin and an instance
///
/// Host matching is exact string membership; family matching is
/// case-sensitive exact membership on the dotted family string.
pub fn is_compatible(spec: &PluginSpec, instance: &Instance) -> bool {
    if !spec.hosts.is_empty() {
        match instance.host() {
            Some(host) if spec.hosts.iter().any(|h| h == &host) => {}
            _ => return false,
        }
    }

    if !spec.families.is_empty() {
        match instance.family() {
            Some(family) if spec.families.iter().any(|f| f == &family) => {}
            _ => return false,
        }
    }

    true
}

/// Plugins compatible with one instance
pub fn plugins_by_instance(plugins: &[PluginHandle], instance: &Instance) -> Vec<PluginHandle> {
    plugins
        .iter()
        .filter(|handle| is_compatible(handle.spec(), instance))
        .cloned()
        .collect()
}

/// Instances compatible with one plugin
///
/// Lazy and single-pass: instances are tested as the sequence is
/// consumed, in context order.
pub fn instances_by_plugin<'a>(
    context: &'a Context,
    spec: &'a PluginSpec,
) -> impl Iterator<Item = Instance> + 'a {
    context
        .iter()
        .filter(move |instance| is_compatible(spec, instance))
        .cloned()
}
