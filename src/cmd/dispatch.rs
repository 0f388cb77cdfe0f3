/*!
dispatch.rs

Routes a `PackratCommand` to its side effects.

  help                       -> open the packrat documentation link
  snapshot / restore / clean -> ensure packrat, then send `packrat::<op>()` to the console
  bundle                     -> ensure packrat, ask for a zip path, send `packrat::bundle(...)`
  status                     -> request status for the active project, show it in a new dialog

Every handler is terminal: nothing is returned or propagated to the
caller. A declined dependency check or a cancelled dialog abandons the
command silently; a failed status request is logged and shows nothing.
*/

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::command::PackratCommand;
use crate::ports::{
    ConsoleSink, DependencyManager, FileDialogs, GlobalDisplay, PackratServer, SaveFileRequest,
    WorkbenchContext,
};
use crate::r::r_string;

pub const HELP_TOPIC: &str = "packrat";
pub const BUNDLE_DIALOG_TITLE: &str = "Save Bundled Packrat Project...";
pub const BUNDLE_EXTENSION: &str = "zip";

/// Console text for bundling into `path`.
///
/// Overwrite is forced: the save dialog has already confirmed replacing an
/// existing file.
pub fn bundle_command(path: &str) -> String {
    format!("packrat::bundle(file = {}, overwrite = TRUE)", r_string(path))
}

/// Packrat command handlers wired to their collaborators.
pub struct PackratCommands {
    context: WorkbenchContext,
    dependencies: Arc<dyn DependencyManager>,
    console: Arc<dyn ConsoleSink>,
    dialogs: Arc<dyn FileDialogs>,
    server: Arc<dyn PackratServer>,
    display: Arc<dyn GlobalDisplay>,
}

impl PackratCommands {
    pub fn new(
        context: WorkbenchContext,
        dependencies: Arc<dyn DependencyManager>,
        console: Arc<dyn ConsoleSink>,
        dialogs: Arc<dyn FileDialogs>,
        server: Arc<dyn PackratServer>,
        display: Arc<dyn GlobalDisplay>,
    ) -> Self {
        Self {
            context,
            dependencies,
            console,
            dialogs,
            server,
            display,
        }
    }

    /// Run `command` to completion of its own continuation chain.
    pub async fn dispatch(&self, command: PackratCommand) {
        debug!(%command, "dispatching packrat command");
        match command {
            PackratCommand::Help => self.on_help(),
            PackratCommand::Snapshot => self.on_snapshot().await,
            PackratCommand::Restore => self.on_restore().await,
            PackratCommand::Clean => self.on_clean().await,
            PackratCommand::Bundle => self.on_bundle().await,
            PackratCommand::Status => self.on_status().await,
        }
    }

    /// Fire-and-forget dispatch on the current `LocalSet`.
    ///
    /// Panics when called outside a `LocalSet`.
    pub fn spawn(self: &Arc<Self>, command: PackratCommand) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::task::spawn_local(async move { this.dispatch(command).await })
    }

    pub fn on_help(&self) {
        self.display.open_link(HELP_TOPIC);
    }

    pub async fn on_snapshot(&self) {
        self.fire_console_event_with_packrat(PackratCommand::Snapshot)
            .await;
    }

    pub async fn on_restore(&self) {
        self.fire_console_event_with_packrat(PackratCommand::Restore)
            .await;
    }

    pub async fn on_clean(&self) {
        self.fire_console_event_with_packrat(PackratCommand::Clean)
            .await;
    }

    pub async fn on_bundle(&self) {
        let Some(action) = PackratCommand::Bundle.console_action() else {
            return;
        };
        if !self.dependencies.ensure_available(action).await {
            debug!(action, "packrat unavailable; bundle abandoned");
            return;
        }
        self.bundle_project().await;
    }

    pub async fn on_status(&self) {
        let project_dir = self.context.active_project_dir.to_string_lossy().into_owned();
        match self.server.packrat_status(&project_dir).await {
            Ok(entries) => {
                debug!(project = %project_dir, count = entries.len(), "packrat status received");
                self.display.show_status(entries);
            }
            Err(err) => {
                error!(project = %project_dir, error = %err, "packrat status request failed");
            }
        }
    }

    /// Send the command's console text once packrat is available.
    ///
    /// The text given to the dependency manager is the same text that runs.
    async fn fire_console_event_with_packrat(&self, command: PackratCommand) {
        let Some(action) = command.console_action() else {
            return;
        };
        if !self.dependencies.ensure_available(action).await {
            debug!(action, "packrat unavailable; command abandoned");
            return;
        }
        self.console.submit(action, true, false);
    }

    async fn bundle_project(&self) {
        let request = SaveFileRequest {
            title: BUNDLE_DIALOG_TITLE.to_string(),
            start_dir: self.context.current_working_dir.clone(),
            default_extension: BUNDLE_EXTENSION.to_string(),
            force_extension: false,
        };
        let Some(selection) = self.dialogs.save_file(request).await else {
            debug!("bundle dialog cancelled");
            return;
        };
        selection.indicator.on_completed();

        let Some(path) = selection.item.path() else {
            return;
        };
        self.console.submit(&bundle_command(path), true, false);
    }
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                      */
/* -------------------------------------------------------------------------- */
