use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt as _},
    process::{Child, Command},
    time::Instant,
};

use crate::error::{Error, Result};

/// An external program: a path plus arguments, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExecCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_owned()));
        self
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ExecCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Where the child's stdin comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Source {
    #[default]
    Null,
    File(PathBuf),
}

/// Where the child's stdout/stderr goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Sink {
    /// Collect the bytes in memory and return them in [`ExecutionResult`].
    #[default]
    Capture,
    /// Redirect the stream straight into the file (created or truncated).
    File(PathBuf),
}

impl Source {
    fn open(&self) -> Result<Stdio> {
        match self {
            Source::Null => Ok(Stdio::null()),
            Source::File(path) => Ok(fsutil::open_file(path)?.into()),
        }
    }
}

impl Sink {
    fn open(&self) -> Result<Stdio> {
        match self {
            Sink::Capture => Ok(Stdio::piped()),
            Sink::File(path) => Ok(fsutil::create_file(path)?.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Exited(i32),
    /// Killed by a signal that the harness didn't send.
    Signaled(Option<i32>),
    TimedOut,
}

impl Termination {
    pub fn success(&self) -> bool {
        *self == Termination::Exited(0)
    }

    pub fn code(&self) -> Option<i32> {
        match *self {
            Termination::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        *self == Termination::TimedOut
    }
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Termination::Exited(code);
        }
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt as _;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;
        Termination::Signaled(signal)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit status {}", code),
            Termination::Signaled(Some(sig)) => write!(f, "terminated by signal {}", sig),
            Termination::Signaled(None) => write!(f, "terminated by signal"),
            Termination::TimedOut => write!(f, "time limit exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub termination: Termination,
    /// Empty if stdout was redirected to a file (or on timeout).
    pub stdout: Vec<u8>,
    /// Empty if stderr was redirected to a file (or on timeout).
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn timed_out(&self) -> bool {
        self.termination.is_timed_out()
    }
}

/// Runs one external program with the configured stream routing and time limit.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    stdin: Source,
    stdout: Sink,
    stderr: Sink,
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdin(mut self, src: Source) -> Self {
        self.stdin = src;
        self
    }

    pub fn stdout(mut self, sink: Sink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: Sink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    /// Spawns `cmd` once and waits for it.
    ///
    /// A non-zero exit or a timeout is an `Ok` result; only a failure of the
    /// harness itself (spawn, redirection, pipe I/O) is an `Err`.
    pub async fn execute(&self, cmd: &ExecCommand) -> Result<ExecutionResult> {
        let mut child = {
            let mut std_command = std::process::Command::new(cmd.get_program());
            std_command
                .args(cmd.get_args())
                .stdin(self.stdin.open()?)
                .stdout(self.stdout.open()?)
                .stderr(self.stderr.open()?);
            // Own process group, so that whatever the program forks can be killed with it.
            #[cfg(unix)]
            std::os::unix::process::CommandExt::process_group(&mut std_command, 0);

            let mut command = Command::from(std_command);
            command.kill_on_drop(true);

            log::debug!("Spawning: {}", cmd);
            command.spawn().map_err(|e| Error::Spawn {
                program: cmd.get_program().to_string_lossy().into(),
                source: e,
            })?
            // `command` drops here, closing the parent's copies of redirected files
        };
        let pgid = child.id();

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let start_at = Instant::now();
        let deadline = self.timeout.map(|limit| start_at + limit);
        let (timed_out, elapsed, drained) = {
            let drain_all = async {
                tokio::try_join!(
                    drain(stdout_pipe.as_mut(), &mut stdout_buf),
                    drain(stderr_pipe.as_mut(), &mut stderr_buf),
                )
                .map(drop)
            };
            let exited = self::wait_for_exit(&mut child);
            tokio::pin!(drain_all);
            tokio::pin!(exited);

            // Pipes are drained alongside, or a chatty program would block on a full pipe.
            let mut drained = None;
            let timed_out = loop {
                tokio::select! {
                    res = &mut drain_all, if drained.is_none() => drained = Some(res),
                    res = &mut exited => {
                        if let Err(e) = res {
                            log::warn!("Failed to wait for '{}': {:#}", cmd, e);
                        }
                        break false;
                    }
                    _ = self::sleep_until(deadline) => break true,
                }
            };
            let elapsed = start_at.elapsed();

            // The leader is exited or running but not reaped yet, so the group id is still ours.
            if let Some(pgid) = pgid {
                self::kill_process_group(pgid).unwrap_or_else(|e| {
                    log::warn!("Failed to kill process group of '{}': {:#}", cmd, e)
                });
            }

            if drained.is_none() {
                drained = tokio::time::timeout(DRAIN_GRACE, &mut drain_all).await.ok();
                if drained.is_none() {
                    log::warn!(
                        "Output pipes of '{}' still open after exit; giving up on them",
                        cmd
                    );
                }
            }
            (timed_out, elapsed, drained)
        };

        if timed_out {
            child.start_kill().unwrap_or_else(|e| {
                log::warn!("Failed to kill timed-out process '{}': {:#}", cmd, e)
            });
        }
        let status = child.wait().await.map_err(|e| Error::Communicate {
            program: cmd.get_program().to_string_lossy().into(),
            source: e,
        })?;
        if let Some(Err(e)) = drained {
            return Err(Error::Communicate {
                program: cmd.get_program().to_string_lossy().into(),
                source: e,
            });
        }

        let termination = if timed_out {
            stdout_buf.clear();
            stderr_buf.clear();
            Termination::TimedOut
        } else {
            status.into()
        };

        log::debug!(
            "Finished: {} ({}, {}ms)",
            cmd,
            termination,
            elapsed.as_millis()
        );

        Ok(ExecutionResult {
            termination,
            stdout: stdout_buf,
            stderr: stderr_buf,
            elapsed,
        })
    }
}

/// How long to keep reading captured pipes once the process group is gone.
/// Only a process that left the group can hold them open longer.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Resolves once the child has exited, leaving it unreaped (a zombie).
#[cfg(unix)]
async fn wait_for_exit(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(())
    };
    tokio::task::spawn_blocking(move || loop {
        // SAFETY: an all-zero siginfo_t is a valid value, and waitid only writes into it.
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        let rc = unsafe {
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let e = io::Error::last_os_error();
        if e.kind() != io::ErrorKind::Interrupted {
            return Err(e);
        }
    })
    .await
    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

#[cfg(not(unix))]
async fn wait_for_exit(child: &mut Child) -> io::Result<()> {
    child.wait().await.map(drop)
}

/// Sends SIGKILL to every process in the group. An already empty group is not an error.
#[cfg(unix)]
fn kill_process_group(pgid: u32) -> io::Result<()> {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return Ok(())
    };
    // SAFETY: killpg takes plain integers and touches no memory of ours.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    match io::Error::last_os_error() {
        e if e.raw_os_error() == Some(libc::ESRCH) => Ok(()),
        e => Err(e),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) -> io::Result<()> {
    Ok(())
}

async fn drain<R>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    if let Some(pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}
