/*!
Terminal-backed collaborators.

  - Prompter              serialized stdin questions (one at a time across overlapping commands)
  - TerminalFileDialogs   save-file dialog as a path prompt
  - TerminalDisplay       help links + status dialog rendering

Blocking stdin reads run on the blocking pool so the single-threaded
runtime keeps driving other commands while a question is open.
*/

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, warn};
use url::Url;

use crate::cmd::format::{StyleOptions, box_header};
use crate::ports::{
    FileDialogs, FileSelection, FileSystemItem, GlobalDisplay, ProgressIndicator,
    SaveFileRequest, StatusEntry,
};

mod status;

pub use status::StatusDialog;

/* -------------------------------------------------------------------------- */
/* Prompter                                                                   */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct Prompter {
    turn: tokio::sync::Mutex<()>,
}

impl Prompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the terminal until the returned session is dropped.
    pub async fn session(&self) -> PromptSession<'_> {
        PromptSession {
            _turn: self.turn.lock().await,
        }
    }

    /// Single yes/no question in its own turn.
    pub async fn confirm(&self, question: impl AsRef<str>) -> bool {
        self.session().await.confirm(question).await
    }
}

/// Exclusive use of the terminal for a multi-step exchange.
pub struct PromptSession<'a> {
    _turn: tokio::sync::MutexGuard<'a, ()>,
}

impl PromptSession<'_> {
    pub fn say(&self, text: impl std::fmt::Display) {
        println!("{text}");
    }

    /// Ask `question` and read one line. `None` on end of input.
    pub async fn ask(&self, question: impl Into<String>) -> Result<Option<String>> {
        let question = question.into();
        tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            print!("{question}");
            io::stdout().flush()?;
            let mut line = String::new();
            if io::stdin().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
        })
        .await
        .context("prompt task failed")?
    }

    /// Yes/no question; anything but an explicit yes counts as no.
    pub async fn confirm(&self, question: impl AsRef<str>) -> bool {
        match self.ask(format!("{} [y/N]: ", question.as_ref())).await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                error!(error = %e, "failed to read answer");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/* -------------------------------------------------------------------------- */
/* File Dialogs                                                               */
/* -------------------------------------------------------------------------- */

pub struct TerminalFileDialogs {
    prompter: std::sync::Arc<Prompter>,
    style: StyleOptions,
}

impl TerminalFileDialogs {
    pub fn new(prompter: std::sync::Arc<Prompter>, style: StyleOptions) -> Self {
        Self { prompter, style }
    }
}

#[async_trait]
impl FileDialogs for TerminalFileDialogs {
    async fn save_file(&self, request: SaveFileRequest) -> Option<FileSelection> {
        let session = self.prompter.session().await;
        let subtitle = format!("in {}", request.start_dir.display());
        session.say(box_header(&request.title, Some(subtitle), &self.style));

        let answer = match session
            .ask(format!("File name (.{}): ", request.default_extension))
            .await
        {
            Ok(Some(answer)) => answer,
            Ok(None) => return None,
            Err(e) => {
                error!(error = %e, "save dialog failed");
                return None;
            }
        };

        let path = resolve_save_path(&request, &answer)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let question = format!("{} already exists. Replace it?", path.display());
            if !session.confirm(question).await {
                return None;
            }
        }

        Some(FileSelection {
            item: FileSystemItem::new(path.to_string_lossy()),
            indicator: Box::new(DialogProgress {
                title: request.title,
            }),
        })
    }
}

/// Resolve a typed answer against the dialog's start directory and extension rules.
fn resolve_save_path(request: &SaveFileRequest, answer: &str) -> Option<PathBuf> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    let mut path = request.start_dir.join(answer);
    let ext = request.default_extension.as_str();
    let has_ext = path.extension().is_some();
    if !ext.is_empty() && (request.force_extension || !has_ext) {
        path = with_appended_extension(&path, ext, request.force_extension && has_ext);
    }
    Some(path)
}

fn with_appended_extension(path: &Path, ext: &str, replace: bool) -> PathBuf {
    if replace {
        return path.with_extension(ext);
    }
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

struct DialogProgress {
    title: String,
}

impl ProgressIndicator for DialogProgress {
    fn on_completed(&self) {
        debug!(dialog = %self.title, "dialog completed");
    }
}

/* -------------------------------------------------------------------------- */
/* Display                                                                    */
/* -------------------------------------------------------------------------- */

pub struct TerminalDisplay {
    help_base: Url,
    style: StyleOptions,
    json: bool,
}

impl TerminalDisplay {
    pub fn new(help_base_url: &str, style: StyleOptions, json: bool) -> Result<Self> {
        let help_base = Url::parse(help_base_url)
            .with_context(|| format!("invalid help base URL: {help_base_url}"))?;
        Ok(Self {
            help_base,
            style,
            json,
        })
    }
}

impl GlobalDisplay for TerminalDisplay {
    fn open_link(&self, topic: &str) {
        let url = match help_link(&self.help_base, topic) {
            Ok(url) => url,
            Err(e) => {
                error!(topic, error = %e, "cannot build help link");
                return;
            }
        };
        println!("{url}");
        let mut opener = browser_command(url.as_str());
        opener
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        if let Err(e) = opener.spawn() {
            warn!(%url, error = %e, "could not launch a browser");
        }
    }

    fn show_status(&self, entries: Vec<StatusEntry>) {
        StatusDialog::new(entries).show_modal(&self.style, self.json);
    }
}

/// `<base>/<topic>`; the base is treated as a directory even without a trailing slash.
fn help_link(base: &Url, topic: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(topic)
        .with_context(|| format!("invalid help topic: {topic}"))
}

fn browser_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ext: &str, force: bool) -> SaveFileRequest {
        SaveFileRequest {
            title: "Save".into(),
            start_dir: PathBuf::from("/work/proj"),
            default_extension: ext.into(),
            force_extension: force,
        }
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[tokio::test]
    async fn session_holds_terminal_until_dropped() {
        let prompter = Prompter::new();
        let session = prompter.session().await;
        assert!(prompter.turn.try_lock().is_err());
        drop(session);
        assert!(prompter.turn.try_lock().is_ok());
    }

    #[tokio::test]
    async fn queued_prompt_waits_for_open_session() {
        let prompter = Prompter::new();
        let session = prompter.session().await;
        let queued = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            prompter.confirm("Replace it?"),
        )
        .await;
        assert!(queued.is_err());
        drop(session);
    }

    #[test]
    fn empty_answer_cancels() {
        assert_eq!(resolve_save_path(&request("zip", false), "   "), None);
    }

    #[test]
    fn relative_answer_gets_default_extension() {
        assert_eq!(
            resolve_save_path(&request("zip", false), "bundle"),
            Some(PathBuf::from("/work/proj/bundle.zip"))
        );
    }

    #[test]
    fn existing_extension_kept_unless_forced() {
        assert_eq!(
            resolve_save_path(&request("zip", false), "/tmp/proj.tar.gz"),
            Some(PathBuf::from("/tmp/proj.tar.gz"))
        );
        assert_eq!(
            resolve_save_path(&request("zip", true), "/tmp/proj.tar"),
            Some(PathBuf::from("/tmp/proj.zip"))
        );
    }

    #[test]
    fn dotted_name_without_extension_appends() {
        assert_eq!(
            resolve_save_path(&request("zip", true), "v1.2/bundle"),
            Some(PathBuf::from("/work/proj/v1.2/bundle.zip"))
        );
    }

    #[test]
    fn help_link_joins_topic() {
        let base = Url::parse("https://www.rstudio.org/links").unwrap();
        assert_eq!(
            help_link(&base, "packrat").unwrap().as_str(),
            "https://www.rstudio.org/links/packrat"
        );
        let base = Url::parse("https://docs.example/r/").unwrap();
        assert_eq!(
            help_link(&base, "packrat").unwrap().as_str(),
            "https://docs.example/r/packrat"
        );
    }

    #[test]
    fn bad_help_base_rejected() {
        assert!(TerminalDisplay::new("not a url", StyleOptions::plain(), false).is_err());
    }
}
