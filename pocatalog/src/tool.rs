//! Running the gettext command line tools.

use std::{
    ffi::OsStr,
    fmt,
    path::PathBuf,
    process::Command,
};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::{config::CatalogConfig, error::Error};

lazy_static! {
    /// `file:line[:col]: [warning: |error: ]message`
    static ref LOCATED_RE: Regex =
        Regex::new(r"^(.*?):([0-9]+)(?::[0-9]+)?: (?:(warning|error): )?(.*)$")
            .unwrap();
}

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub program: String,
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Fails with [`Error::Tool`] unless the process exited successfully.
    pub fn into_result(self) -> Result<ToolOutput, Error> {
        if self.success {
            return Ok(self);
        }
        let status = match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        };
        let first_line = self.stderr.lines().find(|l| !l.trim().is_empty());
        let message = match first_line {
            Some(line) => format!("{}: {}", status, line.trim()),
            None => status,
        };
        Err(Error::tool_error(self.program, message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GettextErrorLevel {
    Warning,
    Error,
}

/// One diagnostic line printed by a gettext tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GettextError {
    pub level: GettextErrorLevel,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub text: String,
}

impl GettextError {
    pub fn has_location(&self) -> bool {
        self.line.is_some()
    }
}

impl fmt::Display for GettextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(file), Some(line)) = (&self.file, self.line) {
            write!(f, "{}:{}: ", file, line)?;
        }
        if self.level == GettextErrorLevel::Warning {
            write!(f, "warning: ")?;
        }
        write!(f, "{}", self.text)
    }
}

/// All diagnostics from one tool run, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedGettextErrors {
    pub items: Vec<GettextError>,
}

impl ParsedGettextErrors {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &GettextError> {
        self.items.iter().filter(|e| e.level == GettextErrorLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GettextError> {
        self.items.iter().filter(|e| e.level == GettextErrorLevel::Warning)
    }

    pub fn log_errors(&self) {
        for item in &self.items {
            match item.level {
                GettextErrorLevel::Error => error!("{}", item),
                GettextErrorLevel::Warning => warn!("{}", item),
            }
        }
    }
}

/// Parses the stderr of `program` into structured diagnostics.
pub fn parse_stderr(program: &str, stderr: &str) -> ParsedGettextErrors {
    let prefix = format!("{}: ", program);
    let mut items = Vec::new();

    for raw in stderr.lines() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let line = line.strip_prefix(&prefix).unwrap_or(line);

        let item = match LOCATED_RE.captures(line) {
            Some(caps) => {
                let level = match caps.get(3).map(|m| m.as_str()) {
                    Some("warning") => GettextErrorLevel::Warning,
                    _ => GettextErrorLevel::Error,
                };
                GettextError {
                    level,
                    file: Some(caps[1].to_string()),
                    line: caps[2].parse().ok(),
                    text: caps[4].to_string(),
                }
            }
            None => {
                let (level, text) = match line.strip_prefix("warning: ") {
                    Some(rest) => (GettextErrorLevel::Warning, rest),
                    None => (GettextErrorLevel::Error, line.strip_prefix("error: ").unwrap_or(line)),
                };
                GettextError {
                    level,
                    file: None,
                    line: None,
                    text: text.to_string(),
                }
            }
        };
        items.push(item);
    }

    ParsedGettextErrors { items }
}

/// Runs gettext binaries from `PATH` or from a configured directory.
#[derive(Debug, Clone, Default)]
pub struct GettextRunner {
    bin_dir: Option<PathBuf>,
}

impl GettextRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bin_dir(bin_dir: Option<PathBuf>) -> Self {
        GettextRunner { bin_dir }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::with_bin_dir(config.gettext_path.clone())
    }

    fn program_path(&self, program: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }

    /// Runs `program` with `args` and captures its output.
    ///
    /// A non-zero exit status is not an error here; only failing to start
    /// the process is.
    pub fn run<I, S>(&self, program: &str, args: I) -> Result<ToolOutput, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(self.program_path(program));
        command.args(args);
        // Diagnostics are parsed, so they must not be translated.
        command.env("LC_ALL", "C").env_remove("LANGUAGE");
        trace!("running {:?}", command);

        let output = command
            .output()
            .map_err(|e| Error::tool_error(program, format!("cannot execute: {}", e)))?;

        let result = ToolOutput {
            program: program.to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.success {
            debug!("{} exited with {:?}: {}", program, result.exit_code, result.stderr.trim());
        }
        Ok(result)
    }

    pub fn is_available(&self, program: &str) -> bool {
        self.run(program, ["--version"]).is_ok_and(|out| out.success)
    }

    pub fn parse_stderr(&self, output: &ToolOutput) -> ParsedGettextErrors {
        parse_stderr(&output.program, &output.stderr)
    }
}
