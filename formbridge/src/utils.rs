//! Process helpers.

use std::{
    ffi::OsStr,
    ops::{Deref, DerefMut},
    path::Path,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::io::AsyncWriteExt;

use crate::error::{BridgeError, BridgeResult};

/// A command builder with variable substitution in arguments.
pub struct Command {
    inner: tokio::process::Command,
    value_replace: Box<dyn Fn(&OsStr) -> String + Send + Sync>,
}

impl Deref for Command {
    type Target = tokio::process::Command;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Command {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Everything a finished child process produced.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Command {
    /// Creates a command running `program` in `workdir`.
    ///
    /// `value_replace` is applied to every argument added afterwards.
    pub fn new<S>(
        program: S,
        workdir: &Path,
        value_replace: impl Fn(&OsStr) -> String + Send + Sync + 'static,
    ) -> Command
    where
        S: AsRef<OsStr>,
    {
        let mut cmd = tokio::process::Command::new(program);
        cmd.current_dir(workdir);

        Self {
            inner: cmd,
            value_replace: Box::new(value_replace),
        }
    }

    /// The command line, for logs.
    pub fn cmd_string(&self) -> String {
        let std = self.inner.as_std();
        let mut cmd_str = std.get_program().to_string_lossy().to_string();

        for arg in std.get_args() {
            cmd_str += " ";
            cmd_str += arg.to_string_lossy().as_ref();
        }
        cmd_str
    }

    /// Adds an argument with variable substitution.
    pub fn arg<S>(&mut self, arg: S) -> &mut Command
    where
        S: AsRef<OsStr>,
    {
        let value = (self.value_replace)(arg.as_ref());
        self.inner.arg(value);
        self
    }

    /// Adds arguments with variable substitution.
    pub fn args<I, S>(&mut self, args: I) -> &mut Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.arg(arg.as_ref());
        }
        self
    }

    /// Runs the command with `input` on stdin and collects its output.
    ///
    /// `timeout` covers the whole run, including draining stdout and
    /// stderr. When it expires the child is killed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Io`] if the child cannot be spawned or waited
    /// on, and [`BridgeError::Timeout`] if it did not finish in time.
    pub async fn output_with_timeout(
        &mut self,
        input: &[u8],
        timeout: Duration,
    ) -> BridgeResult<Captured> {
        let cmd_str = self.cmd_string();
        debug!("run: {cmd_str}");

        let mut child = self
            .inner
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // the child may exit without reading stdin
                if let Err(e) = stdin.write_all(input).await {
                    debug!("stdin closed early: {e}");
                }
            }
        };
        let run = async {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match tokio::time::timeout(timeout, run).await {
            Ok(output) => output?,
            Err(_) => {
                warn!("{cmd_str} still running after {timeout:?}, killed");
                return Err(BridgeError::Timeout(timeout));
            }
        };
        debug!(
            "{cmd_str} exited with {}, {} bytes out, {} bytes err",
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(Captured {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh", Path::new("."), |s| {
            s.to_string_lossy().replace("${greeting}", "hello")
        });
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn test_substitution() {
        let cmd = sh("echo ${greeting}");
        assert_eq!(cmd.cmd_string(), "sh -c echo hello");
    }

    #[tokio::test]
    async fn test_stdin_to_stdout() {
        let out = sh("cat")
            .output_with_timeout(b"{\"a\":1}", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout, b"{\"a\":1}");
        assert!(out.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_stderr_and_status() {
        let out = sh("echo oops >&2; exit 3")
            .output_with_timeout(b"", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stderr, b"oops\n");
    }

    #[tokio::test]
    async fn test_timeout_kills() {
        let err = sh("exec sleep 10")
            .output_with_timeout(b"", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_timeout_covers_inherited_pipes() {
        // the shell exits at once, the background sleep keeps stdout open
        let started = Instant::now();
        let res = sh("sleep 4 & echo ok")
            .output_with_timeout(b"", Duration::from_millis(500))
            .await;
        assert!(matches!(res, Err(BridgeError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
