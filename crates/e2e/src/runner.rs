//! Flow orchestration: readiness probe, execution, classification, report

use std::path::{Path, PathBuf};
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::artifact::{self, ArtifactReport};
use crate::error::{E2eError, E2eResult};
use crate::flows;
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, RunOutput, StepResult};
use crate::scenario::{Scenario, Step};
use crate::server::{self, ProbeConfig};

/// Unified per-flow result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Every step completed
    Passed,

    /// The target server could not be reached (or errored during load);
    /// a best-effort diagnostic screenshot may have been captured
    NavigationFailed {
        reason: String,
        diagnostic: Option<PathBuf>,
    },

    /// An expected UI state never materialized within its bounded wait
    AssertionFailed { step: String, reason: String },
}

impl FlowOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, FlowOutcome::Passed)
    }

    pub fn is_navigation_failure(&self) -> bool {
        matches!(self, FlowOutcome::NavigationFailed { .. })
    }

    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, FlowOutcome::AssertionFailed { .. })
    }
}

/// Result of running a single flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReport {
    pub name: String,
    pub outcome: FlowOutcome,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub artifacts: Vec<ArtifactReport>,
}

/// Result of running a set of flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub navigation_failures: usize,
    pub assertion_failures: usize,
    pub duration_ms: u64,
    pub generated_at: String,
    pub results: Vec<FlowReport>,
}

impl SuiteResult {
    /// Exit code policy: assertion failures fail the run; navigation
    /// failures are an environmental precondition and only fail it in
    /// strict mode. The suite JSON carries the full picture either way.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if self.assertion_failures > 0 {
            1
        } else if strict && self.navigation_failures > 0 {
            1
        } else {
            0
        }
    }
}

/// Main verification runner
pub struct VerifyRunner {
    playwright_config: PlaywrightConfig,
    probe_config: ProbeConfig,
    results_path: PathBuf,
    skip_probe: bool,
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub playwright: PlaywrightConfig,
    pub probe: ProbeConfig,
    pub results_path: PathBuf,
    pub skip_probe: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playwright: PlaywrightConfig::default(),
            probe: ProbeConfig::default(),
            results_path: PathBuf::from("jules-scratch/verification/verify-results.json"),
            skip_probe: false,
        }
    }
}

impl VerifyRunner {
    /// Create a runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Create a runner with custom configuration
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            playwright_config: config.playwright,
            probe_config: config.probe,
            results_path: config.results_path,
            skip_probe: config.skip_probe,
        }
    }

    /// Run every built-in flow
    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        self.run_flows(&flows::all()).await
    }

    /// Run a single built-in flow by name
    pub async fn run_named(&self, name: &str) -> E2eResult<SuiteResult> {
        let flow = flows::by_name(name).ok_or_else(|| E2eError::UnknownFlow(name.to_string()))?;
        self.run_flows(&[flow]).await
    }

    /// Run a list of flows sequentially
    pub async fn run_flows(&self, flows: &[Scenario]) -> E2eResult<SuiteResult> {
        let start = Instant::now();

        if self.skip_probe {
            info!("Skipping readiness probe");
        } else {
            match server::wait_for_ready(&self.playwright_config.base_url, &self.probe_config).await
            {
                Ok(()) => {}
                Err(E2eError::ServerUnreachable(attempts)) => {
                    // Flows still run; their navigations will fail and be
                    // reported as navigation failures with diagnostics.
                    warn!(
                        "Server at {} not ready after {} probe attempts",
                        self.playwright_config.base_url, attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let playwright = PlaywrightHandle::new(self.playwright_config.clone())?;

        info!("Running {} flow(s)...", flows.len());

        let mut results = Vec::new();
        for flow in flows {
            let report = self.run_flow(&playwright, flow).await?;
            match &report.outcome {
                FlowOutcome::Passed => {
                    info!("✓ {} ({} ms)", report.name, report.duration_ms);
                }
                FlowOutcome::NavigationFailed { reason, .. } => {
                    warn!("✗ {} - navigation failed: {}", report.name, reason);
                }
                FlowOutcome::AssertionFailed { step, reason } => {
                    error!("✗ {} - {} failed: {}", report.name, step, reason);
                }
            }
            results.push(report);
        }

        let passed = results.iter().filter(|r| r.outcome.is_passed()).count();
        let navigation_failures = results
            .iter()
            .filter(|r| r.outcome.is_navigation_failure())
            .count();
        let assertion_failures = results
            .iter()
            .filter(|r| r.outcome.is_assertion_failure())
            .count();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Flow results: {} passed, {} navigation failure(s), {} assertion failure(s) ({} ms)",
            passed, navigation_failures, assertion_failures, duration_ms
        );

        Ok(SuiteResult {
            total: flows.len(),
            passed,
            navigation_failures,
            assertion_failures,
            duration_ms,
            generated_at: chrono::Utc::now().to_rfc3339(),
            results,
        })
    }

    async fn run_flow(
        &self,
        playwright: &PlaywrightHandle,
        flow: &Scenario,
    ) -> E2eResult<FlowReport> {
        let start = Instant::now();
        info!("Running flow: {}", flow.name);

        let output = playwright.run_flow(flow).await?;
        let outcome = classify(flow, &output, &self.playwright_config.output_dir);

        // A passed flow must have produced every screenshot it promised.
        let artifacts = if outcome.is_passed() {
            flow.screenshot_names()
                .into_iter()
                .map(|name| artifact::inspect(name, &self.playwright_config.output_dir))
                .collect::<E2eResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(FlowReport {
            name: flow.name.clone(),
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
            steps: output.steps,
            artifacts,
        })
    }

    /// Write the suite report to JSON
    pub fn write_results(&self, suite: &SuiteResult) -> E2eResult<PathBuf> {
        if let Some(parent) = self.results_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&self.results_path, json)?;

        info!("Results written to: {}", self.results_path.display());
        Ok(self.results_path.clone())
    }
}

impl Default for VerifyRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw driver run onto the unified outcome type
fn classify(flow: &Scenario, output: &RunOutput, output_dir: &Path) -> FlowOutcome {
    let Some(failed) = output.failed_step else {
        return FlowOutcome::Passed;
    };

    let reason = output
        .error
        .clone()
        .unwrap_or_else(|| "unknown driver error".to_string());

    let failing = flow.steps.get(failed);
    if failing.map(Step::is_navigation).unwrap_or(false) {
        let diagnostic = output_dir.join("navigation_error.png");
        FlowOutcome::NavigationFailed {
            reason,
            diagnostic: diagnostic.exists().then_some(diagnostic),
        }
    } else {
        FlowOutcome::AssertionFailed {
            step: failing
                .map(Step::name)
                .unwrap_or_else(|| format!("step:{failed}")),
            reason,
        }
    }
}
