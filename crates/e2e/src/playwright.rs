//! Playwright browser automation
//!
//! Lowers a flow to a single Node script that drives one headless browser
//! instance, then parses the per-step JSON progress lines the script prints
//! on stdout. One script run owns exactly one browser instance and one
//! browsing context, so cookies and page state persist across steps.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::scenario::{Scenario, Step, WaitState, WaitUntil};

/// Playwright browser handle
pub struct PlaywrightHandle {
    /// Base URL of the target server
    base_url: String,

    /// Directory screenshots are written into
    output_dir: PathBuf,

    /// Browser type
    browser: Browser,

    /// Headless mode
    headless: bool,

    /// Default per-step timeout
    default_timeout_ms: u64,

    /// Timeout for page navigations
    navigation_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Raw outcome of one script run, before the runner classifies it
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub steps: Vec<StepResult>,
    pub failed_step: Option<usize>,
    pub error: Option<String>,
}

/// One line of the progress protocol printed by the generated script
#[derive(Debug, Deserialize)]
struct ProgressLine {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    step: Option<usize>,
    #[serde(default)]
    ms: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_playwright_installed()?;

        // Create screenshot directory
        std::fs::create_dir_all(&config.output_dir)?;

        Ok(Self {
            base_url: config.base_url,
            output_dir: config.output_dir,
            browser: config.browser,
            headless: config.headless,
            default_timeout_ms: config.default_timeout_ms,
            navigation_timeout_ms: config.navigation_timeout_ms,
        })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run a flow end to end in one browser session
    pub async fn run_flow(&self, flow: &Scenario) -> E2eResult<RunOutput> {
        let script = self.build_script(flow);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("flow.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright script: {}", script_path.display());

        // require('playwright') resolves against the invoking project, not
        // the scratch dir the script lives in.
        let node_path = std::env::current_dir()?.join("node_modules");

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .env("NODE_PATH", &node_path)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        parse_progress(flow, &stdout, &stderr)
    }

    /// Build the Node script executing all of a flow's steps
    pub fn build_script(&self, flow: &Scenario) -> String {
        let mut script = String::new();

        let nav_steps: Vec<String> = flow
            .steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_navigation())
            .map(|(i, _)| i.to_string())
            .collect();

        let diagnostic_path = self.output_dir.join("navigation_error.png");

        // Header: one browser, one context, cookies before any page exists
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
"#,
            browser = self.browser.as_str(),
            headless = self.headless,
            width = flow.viewport.width,
            height = flow.viewport.height,
        ));

        if !flow.cookies.is_empty() {
            script.push_str(&format!(
                "  await context.addCookies({});\n",
                serde_json::to_string(&flow.cookies).unwrap_or_default()
            ));
        }

        script.push_str(&format!(
            r#"  const page = await context.newPage();
  const baseUrl = {base_url};
  const navSteps = new Set([{nav_steps}]);
  let step = 0;
  let t0 = Date.now();
  const pass = () => console.log(JSON.stringify({{ step, ok: true, ms: Date.now() - t0 }}));
  try {{
"#,
            base_url = js_string(&self.base_url),
            nav_steps = nav_steps.join(", "),
        ));

        for (i, step) in flow.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&format!("    step = {i}; t0 = Date.now();\n"));
            script.push_str(&self.step_to_js(step));
            script.push_str("    pass();\n");
        }

        // Footer: on failure after a navigation step, capture a diagnostic
        // screenshot before the browser goes away.
        script.push_str(&format!(
            r#"
    console.log(JSON.stringify({{ done: true, ok: true }}));
  }} catch (error) {{
    if (navSteps.has(step)) {{
      try {{ await page.screenshot({{ path: {diag} }}); }} catch (_) {{}}
    }}
    console.log(JSON.stringify({{
      done: true,
      ok: false,
      step,
      ms: Date.now() - t0,
      error: String((error && error.message) || error)
    }}));
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#,
            diag = js_string(&diagnostic_path.to_string_lossy()),
        ));

        script
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &Step) -> String {
        match step {
            Step::Navigate { path, wait_until, timeout_ms } => {
                let wait = match wait_until {
                    WaitUntil::Load => "load",
                    WaitUntil::NetworkIdle => "networkidle",
                };
                format!(
                    "    await page.goto(baseUrl + {}, {{ waitUntil: {}, timeout: {} }});\n",
                    js_string(path),
                    js_string(wait),
                    timeout_ms.unwrap_or(self.navigation_timeout_ms),
                )
            }
            Step::Click { selector, timeout_ms } => format!(
                "    await page.locator({}).first().click({{ timeout: {} }});\n",
                js_string(selector),
                timeout_ms.unwrap_or(self.default_timeout_ms),
            ),
            Step::Wait { selector, state, timeout_ms } => {
                format!(
                    "    await page.locator({}).first().waitFor({{ state: {}, timeout: {} }});\n",
                    js_string(selector),
                    js_string(wait_state_str(state)),
                    timeout_ms.unwrap_or(self.default_timeout_ms),
                )
            }
            Step::WaitForUrl { pattern, timeout_ms } => format!(
                "    await page.waitForURL({}, {{ timeout: {} }});\n",
                js_string(pattern),
                timeout_ms.unwrap_or(self.navigation_timeout_ms),
            ),
            Step::AssertUrl { path, timeout_ms } => format!(
                "    await page.waitForURL(baseUrl + {}, {{ timeout: {} }});\n",
                js_string(path),
                timeout_ms.unwrap_or(self.navigation_timeout_ms),
            ),
            Step::Assert { selector, visible, attribute, timeout_ms } => {
                let timeout = timeout_ms.unwrap_or(self.default_timeout_ms);
                let mut assertions = String::new();

                if let Some(visible) = visible {
                    // waitFor(hidden) also resolves when no element matches,
                    // which is the semantics "not visible" needs.
                    let state = if *visible { "visible" } else { "hidden" };
                    assertions.push_str(&format!(
                        "    await page.locator({}).first().waitFor({{ state: {}, timeout: {} }});\n",
                        js_string(selector),
                        js_string(state),
                        timeout,
                    ));
                }

                if let Some(attr) = attribute {
                    assertions.push_str(&format!(
                        r#"    {{
      const value = await page.locator({sel}).first().getAttribute({name});
      if (value !== {expected}) {{
        throw new Error('attribute ' + {name} + ' = ' + value + ', expected ' + {expected});
      }}
    }}
"#,
                        sel = js_string(selector),
                        name = js_string(&attr.name),
                        expected = js_string(&attr.value),
                    ));
                }

                assertions
            }
            Step::Screenshot { name } => {
                let path = self.output_dir.join(format!("{name}.png"));
                format!(
                    "    await page.screenshot({{ path: {}, fullPage: false }});\n",
                    js_string(&path.to_string_lossy()),
                )
            }
        }
    }
}

/// Parse the progress lines a script run printed on stdout
fn parse_progress(flow: &Scenario, stdout: &str, stderr: &str) -> E2eResult<RunOutput> {
    let step_name = |i: usize| {
        flow.steps
            .get(i)
            .map(Step::name)
            .unwrap_or_else(|| format!("step:{i}"))
    };

    let mut steps = Vec::new();
    let mut done: Option<ProgressLine> = None;

    for line in stdout.lines() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        let Ok(progress) = serde_json::from_str::<ProgressLine>(line) else {
            continue;
        };
        if progress.done {
            done = Some(progress);
            break;
        }
        if let Some(i) = progress.step {
            steps.push(StepResult {
                success: progress.ok,
                step_name: step_name(i),
                duration_ms: progress.ms.unwrap_or(0),
                error: progress.error,
            });
        }
    }

    let Some(done) = done else {
        return Err(E2eError::Playwright(format!(
            "driver exited without a result: {}",
            stderr.trim()
        )));
    };

    if done.ok {
        Ok(RunOutput { steps, failed_step: None, error: None })
    } else {
        let failed = done.step.unwrap_or(0);
        steps.push(StepResult {
            success: false,
            step_name: step_name(failed),
            duration_ms: done.ms.unwrap_or(0),
            error: done.error.clone(),
        });
        Ok(RunOutput {
            steps,
            failed_step: Some(failed),
            error: done.error,
        })
    }
}

/// Embed a string into generated JavaScript as a quoted literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_default()
}

fn wait_state_str(state: &WaitState) -> &'static str {
    match state {
        WaitState::Visible => "visible",
        WaitState::Hidden => "hidden",
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    pub default_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            output_dir: PathBuf::from("jules-scratch/verification"),
            browser: Browser::Chromium,
            headless: true,
            default_timeout_ms: 5_000,
            navigation_timeout_ms: 30_000,
        }
    }
}
