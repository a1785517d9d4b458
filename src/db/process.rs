//! Running database client binaries (`mysqldump`, `psql`, ...).

use anyhow::{Context, Result, bail};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// A client binary invocation.
///
/// Secrets go through environment variables so they never show up in
/// `ps` output or in [`ClientCommand::display`].
#[derive(Debug, Clone)]
pub(crate) struct ClientCommand {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl ClientCommand {
    /// Resolves `name` inside `binary_dir` when given, else through `PATH`.
    pub(crate) fn new(binary_dir: Option<&Path>, name: &str) -> Self {
        let program = match binary_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        Self {
            program,
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub(crate) fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub(crate) fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[cfg(test)]
    pub(crate) fn arg_list(&self) -> &[String] {
        &self.args
    }

    #[cfg(test)]
    pub(crate) fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Program and arguments, for logs and error messages.
    pub(crate) fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    fn spawn_error(&self, err: io::Error) -> anyhow::Error {
        if err.kind() == io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Required tool '{}' not found. Install it or set dump_binary_path.",
                self.program.display()
            )
        } else {
            anyhow::Error::new(err).context(format!("Failed to execute '{}'", self.display()))
        }
    }

    /// Runs to completion and returns stdout.
    pub(crate) fn output(&self) -> Result<String> {
        tracing::debug!(command = %self.display(), "Running client");
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            bail!(
                "'{}' failed with {}: {}",
                self.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        String::from_utf8(output.stdout).context("Client output is not valid UTF-8")
    }

    /// Runs to completion, discarding stdout.
    pub(crate) fn run(&self) -> Result<()> {
        self.output().map(|_| ())
    }

    /// Runs with `input` streamed into stdin.
    pub(crate) fn run_with_stdin(&self, input: &mut dyn Read) -> Result<()> {
        tracing::debug!(command = %self.display(), "Running client with piped input");
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Drain stderr concurrently so a chatty client cannot block on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let copied = match child.stdin.take() {
            Some(mut stdin) => io::copy(input, &mut stdin),
            None => Ok(0),
        };

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for '{}'", self.display()))?;
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            bail!("'{}' failed with {}: {}", self.display(), status, stderr.trim());
        }
        copied.with_context(|| format!("Failed to stream input to '{}'", self.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_binary_dir() {
        let cmd = ClientCommand::new(Some(Path::new("/opt/mysql/bin")), "mysqldump");
        assert!(cmd.display().starts_with("/opt/mysql/bin"));
        assert!(cmd.display().contains("mysqldump"));
    }

    #[test]
    fn test_display_hides_env() {
        let cmd = ClientCommand::new(None, "psql")
            .arg("--quiet")
            .env("PGPASSWORD", "secret");
        assert_eq!(cmd.display(), "psql --quiet");
        assert_eq!(cmd.env_value("PGPASSWORD"), Some("secret"));
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let cmd = ClientCommand::new(None, "dbsnap-definitely-not-installed");
        let err = cmd.run().unwrap_err();
        assert!(err.to_string().contains("not found"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_with_stdin_streams_input() {
        let cmd = ClientCommand::new(None, "sh").args(["-c", "cat > /dev/null"]);
        let mut input: &[u8] = b"SELECT 1;\n";
        cmd.run_with_stdin(&mut input).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_includes_stderr() {
        let cmd = ClientCommand::new(None, "sh").args(["-c", "echo boom >&2; exit 3"]);
        let err = cmd.run().unwrap_err();
        assert!(err.to_string().contains("boom"), "{err}");
    }
}
