//! GumTree `textdiff` runner.

use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::debug;

use super::{StructuralDiff, StructuralOracle};
use crate::core::config::OracleConfig;
use crate::core::errors::{FixmineError, Result};
use crate::lang::language_info;

const CONTAINER_MOUNT: &str = "/work";
const RUNTIME_THREADS: usize = 2;

/// Runs GumTree as an external process, optionally inside a container.
///
/// Every call writes both fragments into a fresh scratch directory that is
/// removed when the call returns, whether it succeeded or not. Any failure
/// inside a call is reported as [`FixmineError::Oracle`], so callers can skip
/// the hunk and carry on.
#[derive(Debug, Clone)]
pub struct GumTreeOracle {
    config: OracleConfig,
    timeout: Duration,
    runtime: Arc<Runtime>,
}

impl GumTreeOracle {
    /// Create a runner from oracle configuration.
    pub fn new(config: OracleConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(RUNTIME_THREADS)
            .thread_name("fixmine-oracle")
            .enable_all()
            .build()
            .map_err(|e| FixmineError::io("Failed to start oracle runtime", e))?;
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            config,
            timeout,
            runtime: Arc::new(runtime),
        })
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("fixmine-oracle-");
        let dir = match &self.config.scratch_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(|e| FixmineError::oracle(format!("failed to create scratch directory: {e}")))
    }

    /// Command line for comparing `src_name` and `dest_name` inside `scratch`.
    fn build_command(&self, scratch: &Path, src_name: &str, dest_name: &str) -> Command {
        match &self.config.docker_image {
            Some(image) => {
                let mut command = Command::new("docker");
                command
                    .arg("run")
                    .arg("--rm")
                    .arg("-v")
                    .arg(format!("{}:{}", scratch.display(), CONTAINER_MOUNT))
                    .arg(image)
                    .arg(&self.config.command)
                    .args(&self.config.args)
                    .arg(format!("{CONTAINER_MOUNT}/{src_name}"))
                    .arg(format!("{CONTAINER_MOUNT}/{dest_name}"));
                command
            }
            None => {
                let mut command = Command::new(&self.config.command);
                command
                    .args(&self.config.args)
                    .arg(scratch.join(src_name))
                    .arg(scratch.join(dest_name));
                command
            }
        }
    }

    /// Spawn `command` and collect its output, killing it on timeout.
    async fn run(&self, mut command: Command) -> Result<Output> {
        let program = command.as_std().get_program().to_string_lossy().into_owned();
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FixmineError::oracle(format!("failed to spawn {program}: {e}")))?;

        tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                FixmineError::oracle(format!(
                    "{program} timed out after {:.1}s",
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| FixmineError::oracle(format!("failed to collect output of {program}: {e}")))
    }
}

impl StructuralOracle for GumTreeOracle {
    fn diff(
        &self,
        language: &str,
        condition: &[String],
        consequent: &[String],
    ) -> Result<StructuralDiff> {
        let extension = language_info(language)?.extensions[0];
        let src_name = format!("src.{extension}");
        let dest_name = format!("dest.{extension}");

        let scratch = self.scratch_dir()?;
        for (name, fragment) in [(&src_name, condition), (&dest_name, consequent)] {
            std::fs::write(scratch.path().join(name), fragment.join("\n"))
                .map_err(|e| FixmineError::oracle(format!("failed to write {name}: {e}")))?;
        }

        let command = self.build_command(scratch.path(), &src_name, &dest_name);
        debug!("Invoking oracle: {:?}", command);
        let output = self.runtime.block_on(self.run(command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FixmineError::oracle_exit(
                format!("{} exited with {}", self.config.command, output.status),
                output.status.code(),
                stderr.trim().to_string(),
            ));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            FixmineError::oracle(format!(
                "{} produced non-UTF-8 output: {e}",
                self.config.command
            ))
        })?;
        StructuralDiff::from_json(&stdout)
    }
}
