//! End-to-end publish flow
//!
//! Drives the crate the way a host integration would: a stage-complete
//! plugin set activated through definition files in a scan location,
//! discovered, filtered and executed against a live context.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use stagehand::plugin::{
    instances_by_plugin, plugins_by_instance, stages, Context, ErrorPolicy, Instance,
    PipelineRunner, Plugin, PluginError, PluginRegistry, PluginResult, PluginSpec,
    ProcessEvents, ProcessOutcome, SharedPluginRegistry,
};

const HOST: &str = "standalone";
const FAMILY: &str = "test.family";
const OTHER_FAMILY: &str = "test.other_family";

// ---------------------------------------------------------------------------
// The plugin set under test
// ---------------------------------------------------------------------------

struct SelectInstances {
    spec: PluginSpec,
}

struct SelectIter<'a> {
    context: &'a mut Context,
    pending: std::vec::IntoIter<&'static str>,
}

impl Iterator for SelectIter<'_> {
    type Item = ProcessOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.pending.next()?;
        let instance = Instance::new(name);
        instance.add("select_node1_PLY");
        instance.add("select_node2_PLY");
        instance.add("select_node3_GRP");
        instance.set_family(FAMILY);
        instance.set_host(HOST);
        instance.set_identified(true);
        self.context.add(instance.clone());
        Some(ProcessOutcome::ok(instance))
    }
}

impl Plugin for SelectInstances {
    fn spec(&self) -> &PluginSpec {
        &self.spec
    }

    fn process<'a>(&'a self, context: &'a mut Context) -> ProcessEvents<'a> {
        Box::new(SelectIter {
            context,
            pending: vec!["SelectedInstance"].into_iter(),
        })
    }
}

struct ValidateInstance {
    spec: PluginSpec,
}

impl Plugin for ValidateInstance {
    fn spec(&self) -> &PluginSpec {
        &self.spec
    }

    fn process_instance(&self, instance: &Instance) -> PluginResult<()> {
        for node in instance.nodes() {
            if !node.ends_with("_PLY") && !node.ends_with("_GRP") {
                return Err(PluginError::validation_failed(format!(
                    "node '{}' breaks the naming convention",
                    node
                )));
            }
        }
        Ok(())
    }
}

struct ValidateOtherFamily {
    spec: PluginSpec,
}

impl Plugin for ValidateOtherFamily {
    fn spec(&self) -> &PluginSpec {
        &self.spec
    }
}

struct ExtractInstances {
    spec: PluginSpec,
}

impl Plugin for ExtractInstances {
    fn spec(&self) -> &PluginSpec {
        &self.spec
    }

    fn process_instance(&self, instance: &Instance) -> PluginResult<()> {
        let output_dir = match instance.value("outputDir").and_then(|v| {
            v.as_str().map(PathBuf::from)
        }) {
            Some(dir) => dir,
            None => return Ok(()),
        };

        let target = output_dir.join(format!("{}.json", instance.name()));
        let payload = serde_json::json!({
            "instance": instance.name(),
            "nodes": instance.nodes(),
        });
        fs::write(&target, payload.to_string())
            .map_err(|e| PluginError::extraction_failed(e.to_string()))
    }
}

struct ExtractInstancesFail {
    spec: PluginSpec,
}

impl Plugin for ExtractInstancesFail {
    fn spec(&self) -> &PluginSpec {
        &self.spec
    }

    fn process_instance(&self, instance: &Instance) -> PluginResult<()> {
        Err(PluginError::extraction_failed(format!(
            "simulated failure extracting '{}'",
            instance.name()
        )))
    }
}

struct ConformInstances {
    spec: PluginSpec,
}

impl Plugin for ConformInstances {
    fn spec(&self) -> &PluginSpec {
        &self.spec
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn plugin_set() -> Vec<(PluginSpec, fn(&PluginSpec) -> Box<dyn Plugin>)> {
    vec![
        (
            PluginSpec::new("SelectInstances", stages::SELECTORS).with_hosts([HOST]),
            |spec| Box::new(SelectInstances { spec: spec.clone() }),
        ),
        (
            PluginSpec::new("ValidateInstance", stages::VALIDATORS)
                .with_hosts([HOST])
                .with_families([FAMILY]),
            |spec| Box::new(ValidateInstance { spec: spec.clone() }),
        ),
        (
            PluginSpec::new("ValidateOtherFamily", stages::VALIDATORS)
                .with_hosts([HOST])
                .with_families([OTHER_FAMILY]),
            |spec| Box::new(ValidateOtherFamily { spec: spec.clone() }),
        ),
        (
            PluginSpec::new("ExtractInstances", stages::EXTRACTORS)
                .with_hosts([HOST])
                .with_families([FAMILY]),
            |spec| Box::new(ExtractInstances { spec: spec.clone() }),
        ),
        (
            PluginSpec::new("ExtractInstancesFail", stages::EXTRACTORS)
                .with_hosts([HOST])
                .with_families([FAMILY]),
            |spec| Box::new(ExtractInstancesFail { spec: spec.clone() }),
        ),
        (
            PluginSpec::new("ConformInstances", stages::CONFORMS)
                .with_hosts([HOST])
                .with_families([FAMILY]),
            |spec| Box::new(ConformInstances { spec: spec.clone() }),
        ),
    ]
}

/// A registry scanning one throwaway location holding the whole set
fn setup() -> (TempDir, PluginRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = PluginRegistry::new();

    for (spec, ctor) in plugin_set() {
        fs::write(
            dir.path().join(format!("{}.yaml", spec.name)),
            serde_yaml::to_string(&spec).unwrap(),
        )
        .unwrap();
        registry.register_factory(spec.name.clone(), ctor);
    }

    registry.register_plugin_path(dir.path()).unwrap();
    (dir, registry)
}

fn publishable_instance(name: &str) -> Instance {
    let instance = Instance::new(name);
    instance.set_family(FAMILY);
    instance.set_host(HOST);
    instance.set_identified(true);
    instance
}

// ---------------------------------------------------------------------------
// The flow
// ---------------------------------------------------------------------------

#[test]
fn selection_interface() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    let selectors = registry.discover(Some(stages::SELECTORS), None).unwrap();
    assert!(!selectors.is_empty());

    for handle in &selectors {
        if !handle.spec().hosts.iter().any(|h| h == HOST) {
            continue;
        }
        let selector = handle.instantiate();
        for outcome in selector.process(&mut ctx) {
            assert!(outcome.error().is_none());
        }
    }

    assert!(!ctx.is_empty());
    let instance = ctx.pop().unwrap();
    assert!(instance.len() >= 3);
}

#[test]
fn validation_interface() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    // Manually create instance and nodes, bypassing selection
    let instance = publishable_instance("test_instance");
    instance.add("test_node1_PLY");
    instance.add("test_node2_PLY");
    instance.add("test_node3_GRP");
    ctx.add(instance);

    let validators = registry.discover(Some(stages::VALIDATORS), None).unwrap();
    assert!(!validators.is_empty());

    for handle in &validators {
        let validator = handle.instantiate();
        for outcome in validator.process(&mut ctx) {
            assert!(outcome.error().is_none());
        }
    }
}

#[test]
fn validation_failure() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    let instance = publishable_instance("test_instance");
    instance.add("test_PLY");
    instance.add("test_misnamed");
    ctx.add(instance);

    let validators = registry
        .discover(Some(stages::VALIDATORS), Some("^ValidateInstance$"))
        .unwrap();
    assert_eq!(validators.len(), 1);

    let validator = validators[0].instantiate();
    let mut escalated = None;
    for outcome in validator.process(&mut ctx) {
        if outcome.is_failure() {
            escalated = Some(outcome.into_result().unwrap_err());
            break;
        }
    }

    assert!(matches!(
        escalated,
        Some(PluginError::ValidationFailed { .. })
    ));
}

#[test]
fn extraction_interface() {
    let (_dir, registry) = setup();
    let output_dir = tempfile::tempdir().unwrap();
    let mut ctx = Context::new();

    let instance = publishable_instance("test_instance");
    instance.add("test_PLY");
    instance.set_value(
        "outputDir",
        serde_json::json!(output_dir.path().to_string_lossy()),
    );
    ctx.add(instance);

    // Assuming validations pass

    let mut extractors = registry
        .discover(Some(stages::EXTRACTORS), Some(".*ExtractInstances$"))
        .unwrap();
    let extractor = extractors.pop().unwrap();
    assert_eq!(extractor.name(), "ExtractInstances");

    for outcome in extractor.instantiate().process(&mut ctx) {
        assert!(outcome.error().is_none());
    }

    let written = output_dir.path().join("test_instance.json");
    assert!(written.exists());
    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
    assert_eq!(payload["nodes"], serde_json::json!(["test_PLY"]));
}

#[test]
fn extraction_failure() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    let instance = publishable_instance("test_instance");
    instance.add("test_PLY");
    ctx.add(instance);

    // Assuming validations pass

    let mut extractors = registry
        .discover(Some(stages::EXTRACTORS), Some(".*Fail$"))
        .unwrap();
    assert_eq!(extractors.len(), 1);
    let extractor = extractors.pop().unwrap();
    assert_eq!(extractor.name(), "ExtractInstancesFail");

    // When extraction fails it is imperative that other extractors keep
    // going; the failure surfaces through the outcome, and escalation is
    // this caller's choice
    let plugin = extractor.instantiate();
    let mut events = plugin.process(&mut ctx);
    let outcome = events.next().unwrap();
    let escalated = outcome.into_result();
    assert!(matches!(
        escalated,
        Err(PluginError::ExtractionFailed { .. })
    ));
}

#[test]
fn plugin_interface_is_uniform() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    // Every discovered plugin, regardless of stage, speaks the same
    // process protocol
    for handle in registry.discover(None, None).unwrap() {
        let plugin = handle.instantiate();
        for outcome in plugin.process(&mut ctx) {
            assert!(outcome.error().map_or(true, |e| e.is_recoverable()));
        }
    }
}

#[test]
fn selection_appends() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    let my_inst = Instance::new("MyInstance");
    my_inst.add("node1");
    my_inst.add("node2");
    my_inst.set_identified(true);
    ctx.add(my_inst.clone());
    assert_eq!(ctx.len(), 1);

    for handle in registry.discover(Some(stages::SELECTORS), None).unwrap() {
        let selector = handle.instantiate();
        for outcome in selector.process(&mut ctx) {
            assert!(outcome.error().is_none());
        }
    }

    // Selectors append rather than replace existing instances
    assert!(ctx.contains(&my_inst));
    assert!(ctx.len() > 1);
}

#[test]
fn plugins_by_instance_filters() {
    let (_dir, registry) = setup();

    let instance = publishable_instance("TestInstance");
    let validators = registry.discover(Some(stages::VALIDATORS), None).unwrap();
    let compatible = plugins_by_instance(&validators, &instance);

    // The filter discards at least one plugin
    assert!(compatible.len() < validators.len());
}

#[test]
fn instances_by_plugin_filters() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    // Two instances, only one compatible with the plugin below
    for (index, family) in [FAMILY, OTHER_FAMILY].iter().enumerate() {
        let instance = Instance::new(format!("TestInstance{}", index + 1));
        instance.set_family(*family);
        instance.set_host(HOST);
        instance.set_identified(true);
        ctx.add(instance);
    }

    let validators = registry.discover(Some(stages::VALIDATORS), None).unwrap();
    let plugin = validators
        .iter()
        .find(|h| h.name() == "ValidateInstance")
        .unwrap();

    let mut compatible = instances_by_plugin(&ctx, plugin.spec());
    assert_eq!(compatible.next().unwrap().name(), "TestInstance1");
    assert!(compatible.next().is_none());
}

#[test]
fn conform_notifies_external_parties() {
    let (_dir, registry) = setup();
    let mut ctx = Context::new();

    let instance = publishable_instance("TestInstance1");
    instance.set_value("assetId", serde_json::json!(""));
    instance.add("test1_GRP");
    instance.add("test2_GRP");
    instance.add("test3_GRP");
    ctx.add(instance);

    let runner = PipelineRunner::new(SharedPluginRegistry::from_registry(registry));
    let report = runner.run_stage(stages::CONFORMS, &mut ctx).unwrap();

    assert_eq!(report.processed(), 1);
    assert_eq!(report.failed(), 0);
}

#[test]
fn full_publish_run() {
    let (_dir, registry) = setup();
    let shared = SharedPluginRegistry::from_registry(registry);
    let mut ctx = Context::new();

    let report = PipelineRunner::new(shared.clone()).run(&mut ctx).unwrap();

    assert_eq!(ctx.len(), 1);
    assert_eq!(report.stages.len(), 4);
    // The always-failing extractor is the only failure; every other
    // plugin's work completed
    assert_eq!(report.failed(), 1);

    // An aborting rerun surfaces the same failure as an error
    let mut ctx = Context::new();
    let result = PipelineRunner::new(shared)
        .with_policy(ErrorPolicy::Abort)
        .run(&mut ctx);
    assert!(matches!(result, Err(PluginError::ExtractionFailed { .. })));
}
