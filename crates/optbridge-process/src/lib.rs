//! Runs the external assembler and disassembler.
//!
//! Krakatau prints a line per class it touches and a full traceback when it
//! fails, so output is captured up to a fixed size instead of buffered
//! whole. A wall-clock timeout kills the whole process group, which covers
//! wrapper scripts that start the real tool as a grandchild.

use std::{
    fmt,
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

mod template;

pub use crate::template::CommandTemplate;

/// Captured stdout/stderr, truncated to [`RunOptions::max_bytes`] each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundedOutput {
    pub stdout: String,
    pub stderr: String,
    /// Set when either stream had more bytes than were kept.
    pub truncated: bool,
}

impl BoundedOutput {
    /// Both streams, stderr last.
    pub fn combined(&self) -> String {
        let mut s = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !s.is_empty() && !s.ends_with('\n') {
                s.push('\n');
            }
            s.push_str(&self.stderr);
        }
        s
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Kill the process group once this much time has passed.
    pub timeout: Option<Duration>,
    /// Bytes kept per stream.
    pub max_bytes: usize,
    /// Time between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_bytes: 1024 * 1024,
            kill_grace: Duration::from_millis(250),
        }
    }
}

impl RunOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Working directory, program and arguments of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub cwd: PathBuf,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(cwd: &Path, program: &Path, args: &[String]) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            program: program.to_path_buf(),
            args: args.to_vec(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Readable, not shell-exact.
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains([' ', '\t']) {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub output: BoundedOutput,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// A command that ran but did not succeed.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub command: CommandSpec,
    pub status: ExitStatus,
    pub output: BoundedOutput,
    pub timed_out: bool,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timed_out {
            write!(f, "`{}` timed out", self.command)?;
        } else {
            write!(f, "`{}` exited with {}", self.command, self.status)?;
        }
        if self.output.truncated {
            write!(f, " (output truncated)")?;
        }
        let output = self.output.combined();
        let output = output.trim_end();
        if !output.is_empty() {
            write!(f, "\n{output}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandFailure {}

#[derive(Debug)]
pub enum RunCommandError {
    /// A command template could not be filled in.
    Template { template: String, message: String },
    Io {
        command: CommandSpec,
        source: io::Error,
    },
    Failed(Box<CommandFailure>),
}

impl fmt::Display for RunCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { template, message } => {
                write!(f, "invalid command template `{template}`: {message}")
            }
            Self::Io { command, source } => write!(f, "failed to run `{command}`: {source}"),
            Self::Failed(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RunCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Template { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Failed(err) => Some(err.as_ref()),
        }
    }
}

/// Runs `command` and returns however it ended.
pub fn run_command(command: &CommandSpec, opts: &RunOptions) -> io::Result<CommandResult> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group, so a timeout reaches grandchildren holding the pipes.
    #[cfg(unix)]
    unsafe {
        use std::os::unix::process::CommandExt;

        cmd.pre_exec(|| {
            // SAFETY: `setpgid` is async-signal-safe and does not allocate.
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    tracing::debug!(command = %command, "spawning");
    let start = Instant::now();
    let mut child = cmd.spawn()?;

    let Some(stdout) = child.stdout.take() else {
        return Err(io::Error::other("child stdout was not captured"));
    };
    let Some(stderr) = child.stderr.take() else {
        return Err(io::Error::other("child stderr was not captured"));
    };

    let max_bytes = opts.max_bytes;
    let stdout_handle = thread::spawn(move || read_bounded(stdout, max_bytes));
    let stderr_handle = thread::spawn(move || read_bounded(stderr, max_bytes));

    let mut timed_out = false;
    let status = match opts.timeout {
        Some(timeout) => loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= timeout {
                timed_out = true;
                break terminate_process_group(&mut child, opts.kill_grace)?;
            }
            thread::sleep(Duration::from_millis(50).min(timeout.saturating_sub(start.elapsed())));
        },
        None => child.wait()?,
    };

    let (stdout_bytes, stdout_truncated) = join_reader(stdout_handle, "stdout")??;
    let (stderr_bytes, stderr_truncated) = join_reader(stderr_handle, "stderr")??;
    let elapsed = start.elapsed();
    tracing::debug!(
        command = %command,
        %status,
        timed_out,
        elapsed_ms = elapsed.as_millis() as u64,
        "finished"
    );

    Ok(CommandResult {
        status,
        output: BoundedOutput {
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            truncated: stdout_truncated || stderr_truncated,
        },
        timed_out,
        elapsed,
    })
}

/// Like [`run_command`], but a timeout or non-zero exit is an error.
pub fn run_command_checked(
    command: &CommandSpec,
    opts: &RunOptions,
) -> Result<CommandResult, RunCommandError> {
    let result = run_command(command, opts).map_err(|source| RunCommandError::Io {
        command: command.clone(),
        source,
    })?;

    if result.timed_out || !result.status.success() {
        return Err(RunCommandError::Failed(Box::new(CommandFailure {
            command: command.clone(),
            status: result.status,
            output: result.output,
            timed_out: result.timed_out,
        })));
    }
    Ok(result)
}

fn terminate_process_group(
    child: &mut std::process::Child,
    grace: Duration,
) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        // The group id is the child's pid, see `setpgid(0, 0)` above.
        let pid = child.id() as i32;
        unsafe {
            let _ = libc::kill(-pid, libc::SIGTERM);
        }

        let start = Instant::now();
        while start.elapsed() < grace {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            thread::sleep(Duration::from_millis(25));
        }

        unsafe {
            let _ = libc::kill(-pid, libc::SIGKILL);
        }
        child.wait()
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        let _ = child.kill();
        child.wait()
    }
}

fn join_reader(
    handle: thread::JoinHandle<io::Result<(Vec<u8>, bool)>>,
    stream: &'static str,
) -> io::Result<io::Result<(Vec<u8>, bool)>> {
    handle
        .join()
        .map_err(|_| io::Error::other(format!("{stream} reader thread panicked")))
}

fn read_bounded(mut reader: impl Read, max_bytes: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut out = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        let keep = max_bytes.saturating_sub(out.len()).min(n);
        out.extend_from_slice(&buf[..keep]);
        truncated |= keep < n;
    }

    Ok((out, truncated))
}
