//! Visual verification harness for the map style switcher
//!
//! Drives a running instance of the map application through a fixed
//! interaction sequence (switch the base imagery to orthophoto, then select
//! the speed route profile) and captures a screenshot at each stable state
//! for later visual comparison.
//!
//! The sequence is a typed step list ([`script`]) executed by a generated
//! Playwright program ([`playwright`]) inside a single headless browser
//! session that is closed on every exit path. [`runner`] owns the preflight
//! probe, artifact accounting and the run summary.

pub mod error;
pub mod playwright;
pub mod runner;
pub mod script;
pub mod selector;

pub use error::{VerifyError, VerifyResult};
pub use runner::{RunSummary, Runner, RunnerConfig};
pub use script::{Script, Step, Variant};
pub use selector::Selector;
