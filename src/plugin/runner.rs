//! Pipeline Runner
//!
//! Sequential driver for the staged pipeline: discovers each stage's
//! plugins, runs them one at a time against the context, and collects
//! per-plugin, per-instance results into a report.
//!
//! Execution is single-threaded and cooperative. One plugin's outcome
//! sequence is fully consumed before the next plugin runs, so no two
//! plugins' side effects ever interleave.

use crate::plugin::context::Context;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::registry::SharedPluginRegistry;
use crate::plugin::traits::stages;

/// What the runner does with a per-instance failure
///
/// This is caller policy, never plugin policy: plugins always report
/// failures through outcomes, and the runner decides whether to escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record failures and keep going; all non-failing work completes
    #[default]
    Continue,

    /// Escalate the first failure, aborting the failing plugin's
    /// remaining outcomes and the rest of the run
    Abort,
}

/// Result of one plugin's run within a stage
#[derive(Debug, Default)]
pub struct PluginRun {
    /// Plugin type-name
    pub plugin: String,

    /// Outcomes consumed (created instances count for selectors)
    pub processed: usize,

    /// Outcomes carrying an error
    pub failed: usize,

    /// The carried errors, in yield order
    pub errors: Vec<PluginError>,
}

/// Results of one pipeline stage
#[derive(Debug)]
pub struct StageReport {
    /// Stage tag
    pub stage: String,

    /// One entry per plugin run, discovery order
    pub runs: Vec<PluginRun>,
}

impl StageReport {
    /// Total outcomes consumed across the stage
    pub fn processed(&self) -> usize {
        self.runs.iter().map(|run| run.processed).sum()
    }

    /// Total failed outcomes across the stage
    pub fn failed(&self) -> usize {
        self.runs.iter().map(|run| run.failed).sum()
    }
}

/// Results of a full pipeline run
#[derive(Debug, Default)]
pub struct PublishReport {
    /// One report per stage, pipeline order
    pub stages: Vec<StageReport>,
}

impl PublishReport {
    /// Total failed outcomes across all stages
    pub fn failed(&self) -> usize {
        self.stages.iter().map(|stage| stage.failed()).sum()
    }

    /// Whether any outcome failed
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Sequential pipeline driver
pub struct PipelineRunner {
    registry: SharedPluginRegistry,
    policy: ErrorPolicy,
}

impl PipelineRunner {
    /// Create a runner over a shared registry with the Continue policy
    pub fn new(registry: SharedPluginRegistry) -> Self {
        Self {
            registry,
            policy: ErrorPolicy::default(),
        }
    }

    /// Set the error policy
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the standard stages in canonical order
    pub fn run(&self, context: &mut Context) -> PluginResult<PublishReport> {
        let mut report = PublishReport::default();

        for stage in stages::ORDER {
            report.stages.push(self.run_stage(stage, context)?);
        }

        log::info!(
            "Publish run complete: {} instances in context, {} failures",
            context.len(),
            report.failed()
        );

        Ok(report)
    }

    /// Run every discovered plugin of one stage against the context
    pub fn run_stage(&self, stage: &str, context: &mut Context) -> PluginResult<StageReport> {
        // Guard dropped before any plugin executes
        let plugins = self.registry.read().discover(Some(stage), None)?;

        log::debug!("Running stage '{}' with {} plugins", stage, plugins.len());

        let mut report = StageReport {
            stage: stage.to_string(),
            runs: Vec::new(),
        };

        for handle in &plugins {
            let plugin = handle.instantiate();
            let mut run = PluginRun {
                plugin: handle.name().to_string(),
                ..PluginRun::default()
            };

            for outcome in plugin.process(context) {
                run.processed += 1;
                if outcome.is_failure() {
                    run.failed += 1;
                    log::error!(
                        "Plugin '{}' failed on instance '{}': {}",
                        handle.name(),
                        outcome.instance().name(),
                        outcome.error().map(|e| e.to_string()).unwrap_or_default()
                    );

                    match self.policy {
                        ErrorPolicy::Abort => {
                            outcome.into_result()?;
                        }
                        ErrorPolicy::Continue => {
                            if let Some(error) = outcome.error() {
                                run.errors.push(error.clone());
                            }
                        }
                    }
                }
            }

            log::debug!(
                "Plugin '{}' processed {} instances ({} failed)",
                run.plugin,
                run.processed,
                run.failed
            );
            report.runs.push(run);
        }

        Ok(report)
    }
}
