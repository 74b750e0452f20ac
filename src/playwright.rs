//! Playwright driver: one generated Node program per run
//!
//! The whole step list runs inside a single browser session so UI state
//! carries across steps. The generated program prints one JSON line per
//! completed step and a final line on success or failure; the browser is
//! closed in a `finally` block on every exit path.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{VerifyError, VerifyResult};
use crate::script::{artifact_file_name, Script, Step};

/// Actionability budget for a click once the selector has matched.
const CLICK_TIMEOUT_MS: u64 = 5_000;

/// Configuration for the browser session.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub target_url: String,
    pub artifact_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub headless: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            target_url: "http://localhost:3000".to_string(),
            artifact_dir: PathBuf::from("verification"),
            viewport_width: 1280,
            viewport_height: 720,
            headless: true,
        }
    }
}

/// Record of one completed step, as reported by the generated program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub name: String,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

/// A progress line printed by the generated program.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ProgressEvent {
    Step(StepRecord),
    Done {
        ok: bool,
        #[serde(default)]
        kind: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

/// What a run produced: the steps that completed, and the failure that
/// stopped it, if any. Screenshots taken before a failure stay on disk.
#[derive(Debug)]
pub struct DriverOutcome {
    pub steps: Vec<StepRecord>,
    pub error: Option<VerifyError>,
}

/// Driver for a single browser session.
pub struct Driver {
    config: DriverConfig,
    /// Absolute, so screenshot paths survive the program running from a
    /// temporary working directory.
    artifact_dir: PathBuf,
}

impl Driver {
    pub fn new(config: DriverConfig) -> VerifyResult<Self> {
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(&config.artifact_dir)?;
        let artifact_dir = config.artifact_dir.canonicalize()?;

        Ok(Self {
            config,
            artifact_dir,
        })
    }

    fn check_playwright_installed() -> VerifyResult<()> {
        let status = std::process::Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(VerifyError::DriverNotFound),
        }
    }

    /// Generate the Node program for a script.
    pub fn build_program(&self, script: &Script) -> VerifyResult<String> {
        let mut program = String::new();

        program.push_str(&format!(
            r#"const {{ chromium }} = require('playwright');

(async () => {{
  const browser = await chromium.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const targetUrl = {target};

  const fail = (kind, message) => {{
    const err = new Error(message);
    err.kind = kind;
    return err;
  }};

  try {{
"#,
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            target = serde_json::to_string(&self.config.target_url)?,
        ));

        let mut captures = 0usize;
        for (index, step) in script.steps.iter().enumerate() {
            let (code, artifact) = self.step_to_js(step, &mut captures)?;
            let name = serde_json::to_string(&step.name())?;
            let artifact_field = match artifact {
                Some(path) => format!(", artifact: {}", serde_json::to_string(&path)?),
                None => String::new(),
            };

            program.push_str(&format!("\n    // step {}: {}\n", index + 1, step.name()));
            program.push_str("    {\n      const started = Date.now();\n");
            program.push_str(&code);
            program.push_str(&format!(
                "\n      console.log(JSON.stringify({{ event: 'step', index: {index}, name: {name}, duration_ms: Date.now() - started{artifact_field} }}));\n    }}\n"
            ));
        }

        program.push_str(
            r#"
    console.log(JSON.stringify({ event: 'done', ok: true }));
  } catch (error) {
    console.log(JSON.stringify({ event: 'done', ok: false, kind: error.kind || null, message: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        Ok(program)
    }

    /// Generate the code for one step. For captures, also returns the
    /// artifact path the step writes.
    fn step_to_js(
        &self,
        step: &Step,
        captures: &mut usize,
    ) -> VerifyResult<(String, Option<String>)> {
        let code = match step {
            Step::Navigate => (
                "      await page.goto(targetUrl, { waitUntil: 'domcontentloaded' })\n        \
                 .catch(e => { throw fail('navigation', e.message); });"
                    .to_string(),
                None,
            ),
            Step::AwaitVisible { selector, timeout } => {
                let sel = serde_json::to_string(&selector.to_playwright())?;
                (
                    format!(
                        "      await page.waitForSelector({sel}, {{ state: 'visible', timeout: {} }})\n        \
                         .catch(e => {{ throw fail('timeout', e.message); }});",
                        timeout.as_millis()
                    ),
                    None,
                )
            }
            Step::Settle { duration } => (
                format!("      await page.waitForTimeout({});", duration.as_millis()),
                None,
            ),
            Step::Capture { label } => {
                *captures += 1;
                let path = self.artifact_dir.join(artifact_file_name(*captures, label));
                let path_str = path.to_string_lossy().into_owned();
                let path_js = serde_json::to_string(&path_str)?;
                (
                    format!("      await page.screenshot({{ path: {path_js} }});"),
                    Some(path_str),
                )
            }
            Step::Click { selector } => {
                let sel = serde_json::to_string(&selector.to_playwright())?;
                (
                    format!(
                        "      const target = page.locator({sel});\n      \
                         const matches = await target.count();\n      \
                         if (matches !== 1) {{\n        \
                         throw fail('element_resolution', 'selector ' + {sel} + ' matched ' + matches + ' element(s), expected exactly one');\n      \
                         }}\n      \
                         await target.click({{ timeout: {CLICK_TIMEOUT_MS} }})\n        \
                         .catch(e => {{ throw fail('element_resolution', e.message); }});"
                    ),
                    None,
                )
            }
        };
        Ok(code)
    }

    /// Run the script to completion in one browser session.
    ///
    /// `Ok` with a populated `error` means the script failed; `Err` means
    /// the harness itself could not run it.
    pub async fn run(&self, script: &Script) -> VerifyResult<DriverOutcome> {
        let program = self.build_program(script)?;

        let workdir = tempfile::tempdir()?;
        let program_path = workdir.path().join("verify.js");
        std::fs::write(&program_path, &program)?;
        debug!("driver program written to {}", program_path.display());

        let mut child = TokioCommand::new("node")
            .arg(&program_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VerifyError::Driver(format!("failed to launch node: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VerifyError::Driver("driver stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| VerifyError::Driver("driver stderr not captured".to_string()))?;

        // Drain stderr concurrently so a chatty browser cannot stall the
        // stdout progress stream.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_string(&mut buf).await;
            buf
        });

        let mut parser = ProgressParser::default();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            parser.feed(&line);
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();
        if !stderr_text.trim().is_empty() {
            debug!("driver stderr: {}", stderr_text.trim());
        }

        let outcome = parser.into_outcome(status.success(), &stderr_text);
        match &outcome.error {
            None => info!(
                "script '{}' completed, {} step(s)",
                script.name,
                outcome.steps.len()
            ),
            Some(e) => warn!(
                "script '{}' failed after {} step(s): {}",
                script.name,
                outcome.steps.len(),
                e
            ),
        }
        Ok(outcome)
    }
}

/// Accumulates the driver's progress stream into an outcome.
#[derive(Debug, Default)]
struct ProgressParser {
    steps: Vec<StepRecord>,
    failure: Option<VerifyError>,
    finished_ok: bool,
}

impl ProgressParser {
    fn feed(&mut self, line: &str) {
        match serde_json::from_str::<ProgressEvent>(line) {
            Ok(ProgressEvent::Step(record)) => {
                info!("step {} ok ({} ms)", record.name, record.duration_ms);
                self.steps.push(record);
            }
            Ok(ProgressEvent::Done { ok: true, .. }) => {
                self.finished_ok = true;
            }
            Ok(ProgressEvent::Done {
                ok: false,
                kind,
                message,
            }) => {
                let message = message.unwrap_or_else(|| "driver reported failure".to_string());
                self.failure = Some(classify(kind.as_deref(), &message));
            }
            // Anything else on stdout is browser noise.
            Err(_) => debug!("driver: {line}"),
        }
    }

    fn into_outcome(self, exited_ok: bool, stderr: &str) -> DriverOutcome {
        let mut error = self.failure;
        if error.is_none() && !self.finished_ok {
            let diagnostic = if stderr.trim().is_empty() {
                if exited_ok {
                    "driver exited without reporting completion".to_string()
                } else {
                    "driver exited abnormally with no diagnostic".to_string()
                }
            } else {
                stderr.trim().to_string()
            };
            error = Some(classify(None, &diagnostic));
        }
        DriverOutcome {
            steps: self.steps,
            error,
        }
    }
}

/// Map a driver-reported failure onto the error taxonomy. Tagged kinds come
/// from the generated program's throw sites; untagged diagnostics fall back
/// to pattern-matching Playwright's own messages.
fn classify(kind: Option<&str>, message: &str) -> VerifyError {
    match kind {
        Some("navigation") => VerifyError::Navigation(message.to_string()),
        Some("timeout") => VerifyError::Timeout(message.to_string()),
        Some("element_resolution") => VerifyError::ElementResolution(message.to_string()),
        _ => classify_diagnostic(message),
    }
}

fn classify_diagnostic(message: &str) -> VerifyError {
    static NAVIGATION_RE: OnceLock<Regex> = OnceLock::new();
    static RESOLUTION_RE: OnceLock<Regex> = OnceLock::new();
    static TIMEOUT_RE: OnceLock<Regex> = OnceLock::new();

    let navigation = NAVIGATION_RE.get_or_init(|| {
        Regex::new(r"net::ERR_|NS_ERROR_|ERR_CONNECTION|[Nn]avigation failed").expect("static regex")
    });
    let resolution = RESOLUTION_RE.get_or_init(|| {
        Regex::new(
            r"strict mode violation|resolved to \d+ elements|matched \d+ element|element is not (visible|attached|enabled)|intercepts pointer events",
        )
        .expect("static regex")
    });
    let timeout = TIMEOUT_RE
        .get_or_init(|| Regex::new(r"(?i)timeout \d+ms exceeded").expect("static regex"));

    if navigation.is_match(message) {
        VerifyError::Navigation(message.to_string())
    } else if resolution.is_match(message) {
        VerifyError::ElementResolution(message.to_string())
    } else if timeout.is_match(message) {
        VerifyError::Timeout(message.to_string())
    } else {
        VerifyError::Driver(message.to_string())
    }
}
