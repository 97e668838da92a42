use std::ffi::OsStr;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::process::Command as BaseCommand;
use tokio::time::timeout;
use tracing::debug;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("program not found in PATH: {program}")]
    NotFound {
        program: String,
        #[source]
        error: which::Error,
    },

    #[error("failed to spawn command: {command}")]
    Spawn {
        command: String,
        #[source]
        error: tokio::io::Error,
    },

    #[error("command failed ({status}): {command}\n{stderr}")]
    Failure {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("command timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },
}

#[derive(Debug)]
pub struct Command {
    cmd: BaseCommand,
    stdin: Option<Stdio>,
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cmd = self.cmd.as_std();
        let program = cmd.get_program().to_string_lossy();
        let args = cmd
            .get_args()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        if args.is_empty() {
            write!(f, "{program}",)
        } else {
            write!(f, "{program} {args}",)
        }
    }
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let mut cmd = BaseCommand::new(program);
        cmd.kill_on_drop(true);
        Self { cmd, stdin: None }
    }

    /// Resolve `program` against `PATH` (or check it directly when it is a path)
    /// before building the command, so a missing tool is reported as such
    /// rather than as a spawn failure.
    pub fn which<S: AsRef<OsStr>>(program: S) -> Result<Self, CommandError> {
        let program = program.as_ref();
        let path: PathBuf = which::which(program).map_err(|error| CommandError::NotFound {
            program: program.to_string_lossy().into_owned(),
            error,
        })?;
        debug!("resolved {} to {}", program.to_string_lossy(), path.display());
        Ok(Self::new(path))
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Command {
        self.cmd.current_dir(dir);
        self
    }

    /// Feed the child from `stdin` (for example an open file) instead of
    /// `/dev/null`. Used by the next spawn only.
    pub fn stdin<T: Into<Stdio>>(&mut self, stdin: T) -> &mut Command {
        self.stdin = Some(stdin.into());
        self
    }

    pub async fn output(&mut self) -> Result<Output, CommandError> {
        let stdin = self.stdin.take().unwrap_or_else(Stdio::null);
        self.cmd
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|error| CommandError::Spawn {
                command: self.to_string(),
                error,
            })
    }

    pub async fn run(&mut self) -> Result<Output, CommandError> {
        let out = self.output().await?;
        if out.status.success() {
            Ok(out)
        } else {
            Err(CommandError::Failure {
                command: self.to_string(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            })
        }
    }

    /// Like [`Command::run`], but gives up after `limit`. The child is killed
    /// when the timeout fires.
    pub async fn run_with_timeout(&mut self, limit: Duration) -> Result<Output, CommandError> {
        let command = self.to_string();
        match timeout(limit, self.run()).await {
            Ok(result) => result,
            Err(_) => Err(CommandError::Timeout {
                command,
                timeout: limit,
            }),
        }
    }
}
