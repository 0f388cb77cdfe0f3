//! Collaborator seams used by the packrat command dispatcher.
//!
//! DependencyManager / ConsoleSink / FileDialogs / PackratServer / GlobalDisplay
//! plus the small records they exchange (StatusEntry, FileSystemItem, ...).
//! Concrete adapters live in `r` (R interpreter) and `term` (terminal).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/* ---- Context ---- */

/// Read-only workbench state consulted by command handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbenchContext {
    pub current_working_dir: PathBuf,
    pub active_project_dir: PathBuf,
}

impl WorkbenchContext {
    pub fn new(current_working_dir: PathBuf, active_project_dir: PathBuf) -> Self {
        Self {
            current_working_dir,
            active_project_dir,
        }
    }
}

/* ---- Data ---- */

/// One row of `packrat::status()` as reported for a tracked package.
///
/// The dispatcher only forwards these; the status dialog is the sole reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub package: String,
    #[serde(rename = "packrat.version", default)]
    pub packrat_version: Option<String>,
    #[serde(rename = "packrat.source", default)]
    pub packrat_source: Option<String>,
    #[serde(rename = "library.version", default)]
    pub library_version: Option<String>,
    #[serde(rename = "currently.used", default)]
    pub currently_used: Option<bool>,
}

impl StatusEntry {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            packrat_version: None,
            packrat_source: None,
            library_version: None,
            currently_used: None,
        }
    }
}

/// A file chosen in a file dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemItem {
    path: String,
}

impl FileSystemItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the item; `None` when the dialog produced an empty path.
    pub fn path(&self) -> Option<&str> {
        if self.path.is_empty() {
            None
        } else {
            Some(&self.path)
        }
    }
}

/// Parameters of a save-file dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFileRequest {
    pub title: String,
    pub start_dir: PathBuf,
    pub default_extension: String,
    pub force_extension: bool,
}

/// Progress indicator owned by a dialog; completed once the caller accepts the input.
pub trait ProgressIndicator: Send + Sync {
    fn on_completed(&self);
}

/// Result of a confirmed save-file dialog.
pub struct FileSelection {
    pub item: FileSystemItem,
    pub indicator: Box<dyn ProgressIndicator>,
}

impl std::fmt::Debug for FileSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSelection")
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

/* ---- Errors ---- */

/// Failure of a server-side status request.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to start R interpreter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("packrat status failed ({status}): {stderr}")]
    Exit {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("malformed packrat status output: {0}")]
    Malformed(String),
}

/* ---- Traits ---- */

/// Verifies (and possibly installs) packrat before an action runs.
#[async_trait]
pub trait DependencyManager: Send + Sync {
    /// `true` once the dependency needed for `action` is available.
    ///
    /// `false` means the action must be abandoned. An implementation may
    /// also never resolve, which leaves the command pending.
    async fn ensure_available(&self, action: &str) -> bool;
}

/// Forwards a command to the interactive R console. Fire-and-forget.
pub trait ConsoleSink: Send + Sync {
    fn submit(&self, text: &str, execute: bool, echo: bool);
}

#[async_trait]
pub trait FileDialogs: Send + Sync {
    /// `None` when the user cancelled.
    async fn save_file(&self, request: SaveFileRequest) -> Option<FileSelection>;
}

#[async_trait]
pub trait PackratServer: Send + Sync {
    async fn packrat_status(&self, project_dir: &str) -> Result<Vec<StatusEntry>, ServerError>;
}

pub trait GlobalDisplay: Send + Sync {
    /// Open the documentation link for `topic`.
    fn open_link(&self, topic: &str);

    /// Show a new modal status dialog populated with `entries`.
    fn show_status(&self, entries: Vec<StatusEntry>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_item_path_is_absent() {
        assert_eq!(FileSystemItem::new("").path(), None);
        assert_eq!(
            FileSystemItem::new("/tmp/proj.zip").path(),
            Some("/tmp/proj.zip")
        );
    }

    #[test]
    fn status_entry_uses_packrat_column_names() {
        let entry: StatusEntry = serde_json::from_value(serde_json::json!({
            "package": "digest",
            "packrat.version": "0.6.4",
            "library.version": "0.6.5",
            "currently.used": true
        }))
        .unwrap();
        assert_eq!(entry.package, "digest");
        assert_eq!(entry.packrat_version.as_deref(), Some("0.6.4"));
        assert_eq!(entry.packrat_source, None);
        assert_eq!(entry.currently_used, Some(true));

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["library.version"], "0.6.5");
    }
}
