//! Run orchestration: preflight probe, drive, artifact accounting, summary

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{VerifyError, VerifyResult};
use crate::playwright::{Driver, DriverConfig, StepRecord};
use crate::script::{Script, Variant, DEFAULT_CANVAS_TIMEOUT};

/// How long the preflight probe keeps retrying before giving up.
const PREFLIGHT_BUDGET: Duration = Duration::from_secs(5);
const PREFLIGHT_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for a verification run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub target_url: String,
    pub variant: Variant,
    pub artifact_dir: PathBuf,
    pub headless: bool,
    /// Probe the target over HTTP before launching the browser, so an
    /// unreachable target fails fast instead of burning a browser startup.
    pub preflight: bool,
    pub canvas_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:3000".to_string(),
            variant: Variant::Dropdown,
            artifact_dir: PathBuf::from("verification"),
            headless: true,
            preflight: true,
            canvas_timeout: DEFAULT_CANVAS_TIMEOUT,
        }
    }
}

/// Summary of one run, written next to the screenshots for downstream
/// consumers (a reviewer or an image-diff step).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub script: String,
    pub target_url: String,
    pub ok: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
    pub artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Execute the configured script against the target. The summary is
    /// written whether the script passed or failed; screenshots captured
    /// before a failure are left on disk.
    pub async fn run(&self) -> VerifyResult<RunSummary> {
        let started = Instant::now();

        if self.config.preflight {
            self.preflight().await?;
        }

        let script = self
            .config
            .variant
            .script_with_timeout(self.config.canvas_timeout);
        info!(
            "running script '{}' against {}",
            script.name, self.config.target_url
        );

        let driver = Driver::new(DriverConfig {
            target_url: self.config.target_url.clone(),
            artifact_dir: self.config.artifact_dir.clone(),
            headless: self.config.headless,
            ..DriverConfig::default()
        })?;

        let outcome = driver.run(&script).await?;
        let mut error = outcome.error;

        if error.is_none() {
            if let Err(e) = self.verify_artifacts(&script) {
                error = Some(e);
            }
        }

        let artifacts = outcome
            .steps
            .iter()
            .filter_map(|s| s.artifact.clone())
            .collect();

        let summary = RunSummary {
            script: script.name.to_string(),
            target_url: self.config.target_url.clone(),
            ok: error.is_none(),
            duration_ms: started.elapsed().as_millis() as u64,
            steps: outcome.steps,
            artifacts,
            error: error.as_ref().map(|e| e.to_string()),
            finished_at: chrono::Utc::now(),
        };
        self.write_summary(&summary)?;

        match error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// HTTP reachability probe, retried within a short budget.
    async fn preflight(&self) -> VerifyResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let started = Instant::now();
        let mut last_failure = String::new();

        while started.elapsed() < PREFLIGHT_BUDGET {
            match client.get(&self.config.target_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("preflight ok: {} responded {}", self.config.target_url, resp.status());
                    return Ok(());
                }
                Ok(resp) => last_failure = format!("target responded {}", resp.status()),
                Err(e) => last_failure = e.to_string(),
            }
            sleep(PREFLIGHT_INTERVAL).await;
        }

        Err(VerifyError::Navigation(format!(
            "{} unreachable: {last_failure}",
            self.config.target_url
        )))
    }

    /// Confirm every screenshot the script names actually materialized.
    fn verify_artifacts(&self, script: &Script) -> VerifyResult<()> {
        for name in script.artifact_names() {
            let path = self.config.artifact_dir.join(&name);
            let metadata = std::fs::metadata(&path).map_err(|_| {
                VerifyError::Artifact(format!("missing screenshot {}", path.display()))
            })?;
            if metadata.len() == 0 {
                return Err(VerifyError::Artifact(format!(
                    "empty screenshot {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    fn write_summary(&self, summary: &RunSummary) -> VerifyResult<PathBuf> {
        std::fs::create_dir_all(&self.config.artifact_dir)?;
        let path = self.config.artifact_dir.join("run-summary.json");
        std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        info!("run summary written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_the_local_dev_address_and_dropdown_ui() {
        let config = RunnerConfig::default();
        assert_eq!(config.target_url, "http://localhost:3000");
        assert_eq!(config.variant, Variant::Dropdown);
        assert_eq!(config.artifact_dir, PathBuf::from("verification"));
        assert!(config.headless);
        assert!(config.preflight);
        assert_eq!(config.canvas_timeout, Duration::from_secs(20));
    }

    #[test]
    fn artifact_check_flags_missing_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(RunnerConfig {
            artifact_dir: dir.path().to_path_buf(),
            ..RunnerConfig::default()
        });

        let script = Variant::Dropdown.script();
        let err = runner.verify_artifacts(&script).unwrap_err();
        assert!(matches!(err, VerifyError::Artifact(_)));
        assert!(err.to_string().contains("01_initial_view.png"));
    }

    #[test]
    fn artifact_check_flags_empty_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let script = Variant::Dropdown.script();
        for name in script.artifact_names() {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let runner = Runner::new(RunnerConfig {
            artifact_dir: dir.path().to_path_buf(),
            ..RunnerConfig::default()
        });
        let err = runner.verify_artifacts(&script).unwrap_err();
        assert!(matches!(err, VerifyError::Artifact(_)));
        assert!(err.to_string().contains("empty screenshot"));
    }

    #[test]
    fn artifact_check_accepts_materialized_screenshots() {
        let dir = tempfile::tempdir().unwrap();
        let script = Variant::Dropdown.script();
        for name in script.artifact_names() {
            std::fs::write(dir.path().join(name), b"\x89PNG\r\n").unwrap();
        }

        let runner = Runner::new(RunnerConfig {
            artifact_dir: dir.path().to_path_buf(),
            ..RunnerConfig::default()
        });
        assert!(runner.verify_artifacts(&script).is_ok());
    }

    #[tokio::test]
    async fn preflight_reports_an_unreachable_target_as_navigation_failure() {
        // Reserved port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let runner = Runner::new(RunnerConfig {
            target_url: format!("http://127.0.0.1:{port}"),
            ..RunnerConfig::default()
        });
        let err = runner.preflight().await.unwrap_err();
        assert!(matches!(err, VerifyError::Navigation(_)));
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn summary_serializes_without_error_field_on_success() {
        let summary = RunSummary {
            script: "map-styles-dropdown".to_string(),
            target_url: "http://localhost:3000".to_string(),
            ok: true,
            duration_ms: 1234,
            steps: vec![],
            artifacts: vec!["verification/01_initial_view.png".to_string()],
            error: None,
            finished_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("\"error\""));
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert!(back.ok);
        assert_eq!(back.artifacts.len(), 1);
    }
}
