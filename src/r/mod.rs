//! R interpreter adapters (console / dependency probe / status server).
//!
//! parse_interpreter -> RInterpreter { program, args }
//! r_string: R single-quoted literal with escaping.
//! Adapters: RConsole, RDependencyManager, RStatusServer.
//!
use anyhow::{Context, Result, bail};
use shell_words::split as shell_split;
use std::fmt;
use tokio::process::Command;

mod console;
mod dependency;
mod status;

pub use console::RConsole;
pub use dependency::RDependencyManager;
pub use status::RStatusServer;

/// A parsed R interpreter command line, e.g. `Rscript --vanilla`.
///
/// Scripts are appended as `-e <script>` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RInterpreter {
    original: String,
    program: String,
    args: Vec<String>,
}

impl RInterpreter {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command that evaluates `script` with this interpreter.
    pub fn script_command(&self, script: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("-e").arg(script);
        cmd
    }
}

impl fmt::Display for RInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Parse an interpreter command line with shell-style splitting.
///
/// - "Rscript" -> program only
/// - "Rscript --vanilla" -> program + flags
/// - "'/opt/R 4.3/bin/Rscript'" -> quoted program path
pub fn parse_interpreter(raw: &str) -> Result<RInterpreter> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("R interpreter command is empty");
    }
    let parts =
        shell_split(trimmed).context("Failed to parse R interpreter command line (shell splitting)")?;
    let Some((program, args)) = parts.split_first() else {
        bail!("No tokens produced when parsing R interpreter command");
    };
    if program.is_empty() {
        bail!("Empty program name in R interpreter command");
    }
    Ok(RInterpreter {
        original: raw.to_string(),
        program: program.clone(),
        args: args.to_vec(),
    })
}

/// Quote `text` as an R single-quoted string literal.
pub fn r_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
