//! Wrapper around the external `pug` command-line tool.

use serde_json::Value;
use tempfile::NamedTempFile;

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use crate::RenderError;

/// Executable name used by [`PugCli::new()`], resolved through `PATH`.
pub const DEFAULT_EXECUTABLE: &str = "pug";

/// Options for invoking the external `pug` CLI.
///
/// The template text is piped to the process via standard input (backed by a transient
/// temp file that is removed once the call returns), the context travels as a
/// single-line JSON `-O` argument, and standard output is captured as the result.
/// When a source path is supplied to [`Self::render_str()`], it is passed as `-p`
/// (used by pug for relative include resolution only) and the process's working
/// directory is set to the path's parent.
///
/// # Examples
///
/// ```no_run
/// use pug_bridge::PugCli;
///
/// # fn main() -> anyhow::Result<()> {
/// let cli = PugCli::new().with_pretty(true);
/// let html = cli.render_str("h1 hello world", None, None)?;
/// assert_eq!(html.trim(), "<h1>hello world</h1>");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PugCli {
    executable: PathBuf,
    pretty: bool,
}

impl Default for PugCli {
    fn default() -> Self {
        Self::new()
    }
}

impl PugCli {
    /// Creates options invoking the [default executable](DEFAULT_EXECUTABLE).
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            pretty: false,
        }
    }

    /// Overrides the path to the executable.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Switches pretty-printed HTML output (the `-P` flag) on or off.
    /// Off by default.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Renders pug template text to HTML.
    ///
    /// `source` is the path the text originated from, if any; it never causes a
    /// re-read (the `text` argument always takes precedence) and only informs
    /// relative include resolution in the CLI. A `context` that is a JSON string
    /// is passed to the CLI verbatim; any other value is serialized to
    /// single-line JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, exits with a non-zero
    /// status, or produces non-UTF-8 output.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip(self, text, context),
            err,
            fields(executable = ?self.executable, pretty = self.pretty)
        )
    )]
    pub fn render_str(
        &self,
        text: &str,
        source: Option<&Path>,
        context: Option<&Value>,
    ) -> Result<String, RenderError> {
        let mut input = NamedTempFile::new()?;
        input.write_all(text.as_bytes())?;
        input.flush()?;
        let stdin = input.reopen()?;

        let mut command = Command::new(&self.executable);
        if let Some(context) = context {
            command.arg("-O").arg(Self::context_arg(context)?);
        }
        if let Some(source) = source {
            command.arg("-p").arg(source);
            if let Some(parent) = source.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                command.current_dir(parent);
            }
        }
        if self.pretty {
            command.arg("-P");
        }

        let (mut stdout_reader, stdout_writer) = os_pipe::pipe()?;
        let (mut stderr_reader, stderr_writer) = os_pipe::pipe()?;
        let mut child = command
            .stdin(Stdio::from(stdin))
            .stdout(stdout_writer)
            .stderr(stderr_writer)
            .spawn()?;
        #[cfg(feature = "tracing")]
        tracing::debug!("spawned pug process");

        // Drop pipe writers retained by `command`. This is necessary for the pipe
        // readers to receive EOF.
        command.stdout(Stdio::null()).stderr(Stdio::null());

        // Drain stderr on a separate thread so that a chatty process cannot fill
        // the pipe and stall before closing stdout.
        let stderr_handle = thread::spawn(move || {
            let mut stderr = vec![];
            stderr_reader.read_to_end(&mut stderr).map(|_| stderr)
        });

        let mut output = vec![];
        stdout_reader.read_to_end(&mut output)?;
        let status = child.wait()?;
        let stderr = stderr_handle
            .join()
            .ok()
            .and_then(Result::ok)
            .unwrap_or_default();
        #[cfg(feature = "tracing")]
        tracing::debug!(?status, output_len = output.len(), "pug process finished");

        if !status.success() {
            return Err(RenderError::ExternalFailure {
                status,
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }
        String::from_utf8(output).map_err(|err| {
            RenderError::Io(io::Error::new(io::ErrorKind::InvalidData, err.utf8_error()))
        })
    }

    /// Renders a pug template file to HTML by reading its contents and delegating
    /// to [`Self::render_str()`] with the path retained as the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or on any
    /// [`Self::render_str()`] failure.
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        context: Option<&Value>,
    ) -> Result<String, RenderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        self.render_str(&text, Some(path), context)
    }

    fn context_arg(context: &Value) -> Result<String, RenderError> {
        Ok(match context {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        })
    }
}
