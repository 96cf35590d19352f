//! `gdown` adapter for the [`FolderFetcher`] port.
//!
//! Runs `gdown [extra args] --folder <url> --output <dest>` as an async child
//! process, so the runtime keeps serving other chats while a folder downloads.

use std::{
    collections::VecDeque,
    future::Future,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use async_trait::async_trait;

use gdr_core::{config::Config, errors::Error, fetch::FolderFetcher, link::FolderId, Result};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

const STDERR_TAIL_MAX_BYTES: usize = 16 * 1024;
const STDERR_TAIL_MAX_LINES: usize = 200;
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct GdownConfig {
    pub program: PathBuf,
    /// Placed before `--folder`.
    pub extra_args: Vec<String>,
    /// `None` lets a download run for as long as it takes.
    pub timeout: Option<Duration>,
}

impl From<&Config> for GdownConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            program: cfg.gdown_path.clone(),
            extra_args: cfg.gdown_args.clone(),
            timeout: cfg.fetch_timeout,
        }
    }
}

/// A concrete downloader invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

pub fn build_invocation(cfg: &GdownConfig, folder: &FolderId, dest: &Path) -> Invocation {
    let mut args = cfg.extra_args.clone();
    args.extend([
        "--folder".to_string(),
        folder.url(),
        "--output".to_string(),
        dest.to_string_lossy().to_string(),
    ]);
    Invocation {
        program: cfg.program.clone(),
        args,
    }
}

#[derive(Clone, Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
    bytes: usize,
}

impl StderrTail {
    fn push_line(&mut self, line: String) {
        self.bytes = self.bytes.saturating_add(line.len() + 1);
        self.lines.push_back(line);

        while self.lines.len() > STDERR_TAIL_MAX_LINES || self.bytes > STDERR_TAIL_MAX_BYTES {
            match self.lines.pop_front() {
                Some(front) => self.bytes = self.bytes.saturating_sub(front.len() + 1),
                None => break,
            }
        }
    }

    fn snapshot(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

/// Progress bars redraw with `\r`; only the final redraw of a line is kept.
fn last_redraw(line: &str) -> &str {
    line.rsplit('\r')
        .find(|s| !s.trim().is_empty())
        .unwrap_or("")
}

fn drain_stderr<R>(stderr: R) -> JoinHandle<StderrTail>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut tail = StderrTail::default();
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = last_redraw(&line);
            if !line.is_empty() {
                tail.push_line(line.to_string());
            }
        }
        tail
    })
}

fn drain_stdout<R>(stdout: R, folder: String) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = last_redraw(&line);
            if !line.is_empty() {
                tracing::debug!(folder = %folder, "gdown: {line}");
            }
        }
    })
}

enum Exit {
    Done(std::io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

async fn wait_limited(
    limit: Option<Duration>,
    wait: impl Future<Output = std::io::Result<ExitStatus>>,
) -> Exit {
    match limit {
        Some(d) => match tokio::time::timeout(d, wait).await {
            Ok(r) => Exit::Done(r),
            Err(_) => Exit::TimedOut(d),
        },
        None => Exit::Done(wait.await),
    }
}

async fn kill_child(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill gdown process");
    }
}

#[derive(Clone, Debug)]
pub struct GdownFetcher {
    cfg: GdownConfig,
    shutdown: CancellationToken,
}

impl GdownFetcher {
    /// `shutdown` kills any in-flight download when cancelled.
    pub fn new(cfg: GdownConfig, shutdown: CancellationToken) -> Self {
        Self { cfg, shutdown }
    }
}

#[async_trait]
impl FolderFetcher for GdownFetcher {
    async fn fetch(&self, folder: &FolderId, dest: &Path) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(Error::FetchCancelled);
        }

        let inv = build_invocation(&self.cfg, folder, dest);
        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| Error::FetchLaunch {
            program: inv.program.clone(),
            source,
        })?;
        tracing::debug!(folder = %folder, pid = child.id(), "gdown spawned");

        // Both pipes must be drained or gdown blocks once one fills.
        let stderr_task = child.stderr.take().map(drain_stderr);
        if let Some(stdout) = child.stdout.take() {
            drain_stdout(stdout, folder.to_string());
        }

        let exit = {
            let wait = child.wait();
            tokio::select! {
                _ = self.shutdown.cancelled() => Exit::Cancelled,
                exit = wait_limited(self.cfg.timeout, wait) => exit,
            }
        };

        let status = match exit {
            Exit::Done(status) => status?,
            Exit::TimedOut(limit) => {
                kill_child(&mut child).await;
                return Err(Error::FetchTimedOut(limit));
            }
            Exit::Cancelled => {
                kill_child(&mut child).await;
                return Err(Error::FetchCancelled);
            }
        };

        if status.success() {
            return Ok(());
        }

        let stderr = match stderr_task {
            Some(task) => match tokio::time::timeout(DRAIN_GRACE, task).await {
                Ok(Ok(tail)) => tail.snapshot(),
                _ => String::new(),
            },
            None => String::new(),
        };
        Err(Error::FetchFailed {
            status: status.to_string(),
            stderr,
        })
    }
}
