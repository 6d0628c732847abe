//! Resource wrapping the sling CLI.
//!
//! Each sync runs `sling run -c <config>` as a child process. Connection
//! definitions are handed over through per-session environment variables so
//! they never appear on the command line.

use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::{SlingSourceConnection, SlingTargetConnection};
use super::output::{self, LineLevel};
use super::replication::ReplicationRequest;
use crate::assets::MaterializeResult;
use crate::config::SlingSettings;
use crate::constants::env as env_vars;
use crate::error::{EltError, Result};
use crate::execution::{AssetExecutionContext, LogLevel};
use crate::pipes::{PipesClient, PipesClientCompletedInvocation, PipesExtras};
use crate::resources::Resource;

/// Lines of stderr kept for failure messages
const STDERR_TAIL_LINES: usize = 20;

/// Which pipe a line was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A cleaned line of sling output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub level: LineLevel,
    pub text: String,
}

/// What a successful sync reported
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub session_id: Uuid,
    pub rows_written: Option<u64>,
    pub duration: Duration,
    pub lines: Vec<OutputLine>,
}

/// Source and target connections plus how to invoke the sling executable
#[derive(Debug, Clone, PartialEq)]
pub struct SlingResource {
    pub source_connection: SlingSourceConnection,
    pub target_connection: SlingTargetConnection,
    executable: PathBuf,
    timeout: Duration,
    env: BTreeMap<String, String>,
}

impl SlingResource {
    pub fn new(
        source_connection: SlingSourceConnection,
        target_connection: SlingTargetConnection,
    ) -> Self {
        Self::from_settings(
            source_connection,
            target_connection,
            &SlingSettings::default(),
        )
    }

    pub fn from_settings(
        source_connection: SlingSourceConnection,
        target_connection: SlingTargetConnection,
        settings: &SlingSettings,
    ) -> Self {
        Self {
            source_connection,
            target_connection,
            executable: PathBuf::from(&settings.executable),
            timeout: Duration::from_secs(settings.timeout_seconds),
            env: BTreeMap::new(),
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra environment variable for the child process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one replication, forwarding each cleaned output line to `on_line`
    pub async fn sync<F>(&self, request: &ReplicationRequest, on_line: F) -> Result<SyncSummary>
    where
        F: FnMut(&OutputLine) + Send,
    {
        self.sync_with_env(request, &[], on_line).await
    }

    async fn sync_with_env<F>(
        &self,
        request: &ReplicationRequest,
        extra_env: &[(String, String)],
        mut on_line: F,
    ) -> Result<SyncSummary>
    where
        F: FnMut(&OutputLine) + Send,
    {
        request.validate()?;

        let session_id = Uuid::new_v4();
        let session = session_id.simple().to_string().to_uppercase();
        let source_var = format!("{}{session}", env_vars::SOURCE_CONNECTION_PREFIX);
        let target_var = format!("{}{session}", env_vars::TARGET_CONNECTION_PREFIX);
        let config = request.to_sling_config(&source_var, &target_var);

        info!(
            session_id = %session_id,
            executable = %self.executable.display(),
            stream = %request.source_stream,
            object = %request.target_object,
            mode = %request.mode,
            "Starting sling replication"
        );

        let mut command = Command::new(&self.executable);
        command
            .arg("run")
            .arg("-c")
            .arg(serde_json::to_string(&config)?)
            .env(
                &source_var,
                self.source_connection.to_connection_json().to_string(),
            )
            .env(
                &target_var,
                self.target_connection.to_connection_json().to_string(),
            )
            .envs(&self.env)
            .envs(extra_env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = command.spawn().map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => EltError::ExecutableNotFound {
                executable: self.executable.display().to_string(),
            },
            _ => EltError::Io(err),
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(
                stdout,
                OutputStream::Stdout,
                tx.clone(),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(
                stderr,
                OutputStream::Stderr,
                tx.clone(),
            )));
        }
        drop(tx);

        let mut lines = Vec::new();
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let drain_and_wait = async {
            while let Some(line) = rx.recv().await {
                on_line(&line);
                if line.stream == OutputStream::Stderr || line.level == LineLevel::Error {
                    if stderr_tail.len() == STDERR_TAIL_LINES {
                        stderr_tail.pop_front();
                    }
                    stderr_tail.push_back(line.text.clone());
                }
                lines.push(line);
            }
            child.wait().await
        };
        let outcome = tokio::time::timeout(self.timeout, drain_and_wait).await;

        let status = match outcome {
            Ok(status) => status?,
            Err(_) => {
                warn!(session_id = %session_id, timeout_secs = self.timeout.as_secs(), "Sling replication timed out, killing process");
                if let Err(err) = child.kill().await {
                    warn!(session_id = %session_id, error = %err, "Failed to kill sling process");
                }
                return Err(EltError::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        for joined in futures::future::join_all(readers).await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(session_id = %session_id, error = %err, "Failed reading sling output"),
                Err(err) => warn!(session_id = %session_id, error = %err, "Sling output reader panicked"),
            }
        }

        let duration = started.elapsed();
        if !status.success() {
            return Err(EltError::ReplicationFailed {
                exit_code: status.code(),
                stderr_tail: stderr_tail.into_iter().collect::<Vec<_>>().join("\n"),
            });
        }

        let rows_written = output::rows_written(lines.iter().map(|line| line.text.as_str()));
        info!(
            session_id = %session_id,
            rows_written = rows_written,
            duration_ms = duration.as_millis() as u64,
            "Sling replication finished"
        );

        Ok(SyncSummary {
            session_id,
            rows_written,
            duration,
            lines,
        })
    }

    /// Run a replication for the asset being executed and report it as a materialization
    pub async fn replicate(
        &self,
        context: &AssetExecutionContext,
        request: &ReplicationRequest,
    ) -> Result<PipesClientCompletedInvocation> {
        self.replicate_with_extras(context, request, None).await
    }

    async fn replicate_with_extras(
        &self,
        context: &AssetExecutionContext,
        request: &ReplicationRequest,
        extras: Option<PipesExtras>,
    ) -> Result<PipesClientCompletedInvocation> {
        let asset_key = context.asset_key()?.clone();

        let mut extra_env = vec![(
            env_vars::RUN_ID.to_string(),
            context.run_id().to_string(),
        )];
        if let Some(extras) = extras {
            extra_env.push((
                env_vars::PIPES_EXTRAS.to_string(),
                serde_json::to_string(&extras)?,
            ));
        }

        let summary = self
            .sync_with_env(request, &extra_env, |line| {
                context.log(log_level_for(line), line.text.clone())
            })
            .await?;

        let mut materialization = MaterializeResult::for_asset(asset_key)
            .with_metadata("target_object", request.target_object.as_str())
            .with_metadata("source_stream", request.source_stream.as_str())
            .with_metadata("mode", request.mode.as_str())
            .with_metadata("elapsed_ms", summary.duration.as_millis() as u64)
            .with_metadata("sling_session_id", summary.session_id.to_string());
        if let Some(rows) = summary.rows_written {
            materialization = materialization.with_metadata("rows_written", rows);
        }
        debug!(run_id = %context.run_id(), "Sling replication reported materialization");

        Ok(PipesClientCompletedInvocation::new(vec![
            materialization.into()
        ]))
    }
}

impl Resource for SlingResource {
    fn resource_type(&self) -> &'static str {
        "SlingResource"
    }

    fn describe(&self) -> Value {
        serde_json::json!({
            "source": self.source_connection.redacted(),
            "target": self.target_connection.redacted(),
            "executable": self.executable.display().to_string(),
            "timeout_secs": self.timeout.as_secs(),
        })
    }
}

/// A single replication bound to a resource, runnable as a pipes client
#[derive(Debug, Clone)]
pub struct SlingInvocation {
    pub resource: Arc<SlingResource>,
    pub request: ReplicationRequest,
}

#[async_trait::async_trait]
impl PipesClient for SlingInvocation {
    async fn run(
        &self,
        context: &AssetExecutionContext,
        extras: Option<PipesExtras>,
    ) -> Result<PipesClientCompletedInvocation> {
        self.resource
            .replicate_with_extras(context, &self.request, extras)
            .await
    }
}

fn log_level_for(line: &OutputLine) -> LogLevel {
    match line.level {
        LineLevel::Debug => LogLevel::Debug,
        LineLevel::Warn => LogLevel::Warn,
        LineLevel::Error => LogLevel::Error,
        LineLevel::Info => LogLevel::Info,
        LineLevel::Unknown => match line.stream {
            OutputStream::Stdout => LogLevel::Info,
            OutputStream::Stderr => LogLevel::Warn,
        },
    }
}

async fn forward_lines<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<OutputLine>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(raw) = lines.next_line().await? {
        let text = output::clean_line(&raw);
        if text.is_empty() {
            continue;
        }
        let line = OutputLine {
            stream,
            level: output::line_level(&text),
            text,
        };
        if tx.send(line).is_err() {
            break;
        }
    }
    Ok(())
}
