//! Declarative flow model
//!
//! A flow is a named sequence of browser steps executed inside a single
//! browsing context. Steps are plain data so the driver can lower them to a
//! Playwright script and the runner can echo them back in reports.

use serde::{Deserialize, Serialize};

/// A named verification flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this flow
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Viewport size for the browsing context
    #[serde(default)]
    pub viewport: Viewport,

    /// Cookies seeded into the context before the first navigation
    #[serde(default)]
    pub cookies: Vec<Cookie>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Names of all screenshots this flow captures when it passes
    pub fn screenshot_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                Step::Screenshot { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// A cookie in the shape Playwright's `context.addCookies` expects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// A single step in a flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a path relative to the base URL
    Navigate {
        path: String,
        #[serde(default)]
        wait_until: WaitUntil,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Click the first element matching a selector
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for an element to reach a state
    Wait {
        selector: String,
        #[serde(default)]
        state: WaitState,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for the page URL to match a glob pattern
    WaitForUrl {
        pattern: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Wait for the page URL to equal base URL + path exactly
    AssertUrl {
        path: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert element visibility and attributes
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Capture a screenshot into the output directory as `<name>.png`
    Screenshot { name: String },
}

impl Step {
    /// Short display name, used for progress logging and reports
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { path, .. } => format!("navigate:{}", path),
            Step::Click { selector, .. } => format!("click:{}", selector),
            Step::Wait { selector, .. } => format!("wait:{}", selector),
            Step::WaitForUrl { pattern, .. } => format!("wait_for_url:{}", pattern),
            Step::AssertUrl { path, .. } => format!("assert_url:{}", path),
            Step::Assert { selector, .. } => format!("assert:{}", selector),
            Step::Screenshot { name } => format!("screenshot:{}", name),
        }
    }

    /// Whether a failure here means the target server could not be reached
    pub fn is_navigation(&self) -> bool {
        matches!(self, Step::Navigate { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    #[default]
    Load,
    NetworkIdle,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Step::Navigate { path: "/dashboard".into(), wait_until: WaitUntil::NetworkIdle, timeout_ms: None }, "navigate:/dashboard", true; "navigate")]
    #[test_case(Step::Click { selector: ".product-card a".into(), timeout_ms: None }, "click:.product-card a", false; "click")]
    #[test_case(Step::Screenshot { name: "verification".into() }, "screenshot:verification", false; "screenshot")]
    fn test_step_name_and_kind(step: Step, name: &str, is_nav: bool) {
        assert_eq!(step.name(), name);
        assert_eq!(step.is_navigation(), is_nav);
    }

    #[test]
    fn test_step_serializes_with_snake_case_action_tag() {
        let step = Step::WaitForUrl { pattern: "**/checkout**".into(), timeout_ms: None };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "wait_for_url");
        assert_eq!(json["pattern"], "**/checkout**");
    }

    #[test]
    fn test_screenshot_names() {
        let flow = Scenario {
            name: "sample".into(),
            description: String::new(),
            viewport: Viewport::default(),
            cookies: vec![],
            steps: vec![
                Step::Navigate { path: "/".into(), wait_until: WaitUntil::Load, timeout_ms: None },
                Step::Screenshot { name: "before".into() },
                Step::Click { selector: "a".into(), timeout_ms: None },
                Step::Screenshot { name: "after".into() },
            ],
        };
        assert_eq!(flow.screenshot_names(), vec!["before", "after"]);
    }
}
