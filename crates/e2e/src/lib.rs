//! Storefront verification runner
//!
//! Drives the externally-running storefront web application through
//! headless Playwright, asserts expected UI state, and captures
//! verification screenshots:
//! - probes the target server for readiness (bounded retry)
//! - lowers each built-in flow to a Playwright script run by `node`
//! - classifies failures into navigation vs assertion outcomes
//! - fingerprints the screenshot artifacts and writes a JSON suite report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Verification Runner (Rust)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VerifyRunner                                               │
//! │    ├── wait_for_ready(base_url)      readiness probe        │
//! │    ├── run_flow(flow) -> FlowReport  one browser session    │
//! │    └── write_results(suite)          JSON report            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Flow (built-in)                                            │
//! │    ├── buy-now   homepage → product → Buy Now → checkout    │
//! │    ├── chat      cookie → dashboard → chat widget           │
//! │    └── top-bar   header links → products page               │
//! │          steps: navigate / click / wait / wait_for_url /    │
//! │                 assert_url / assert / screenshot            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifact;
pub mod error;
pub mod flows;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod server;

pub use error::{E2eError, E2eResult};
pub use runner::{FlowOutcome, FlowReport, SuiteResult, VerifyRunner};
pub use scenario::{Scenario, Step};
