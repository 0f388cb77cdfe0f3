use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::RInterpreter;
use crate::ports::ConsoleSink;

/// Console backed by an R interpreter child process per submission.
///
/// Submissions run one at a time in submission order, like commands queued
/// in an interactive console.
pub struct RConsole {
    interpreter: RInterpreter,
    working_dir: PathBuf,
    queue: Arc<tokio::sync::Mutex<()>>,
    runs: Mutex<Vec<JoinHandle<()>>>,
}

impl RConsole {
    pub fn new(interpreter: RInterpreter, working_dir: PathBuf) -> Self {
        Self {
            interpreter,
            working_dir,
            queue: Arc::new(tokio::sync::Mutex::new(())),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Wait for every submitted run to finish.
    pub async fn drain(&self) {
        let pending = std::mem::take(&mut *self.runs.lock().unwrap_or_else(|e| e.into_inner()));
        for run in pending {
            if let Err(e) = run.await {
                error!(error = %e, "console run task failed");
            }
        }
    }

    fn execute(&self, text: &str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(command = text, "no async runtime available for console submission");
            return;
        };

        let mut cmd = self.interpreter.script_command(text);
        cmd.current_dir(&self.working_dir);
        let queue = Arc::clone(&self.queue);
        let text = text.to_string();
        let program = self.interpreter.program().to_string();

        let run = handle.spawn(async move {
            let _turn = queue.lock().await;
            debug!(command = %text, program = %program, "running console command");
            match cmd.status().await {
                Ok(status) if status.success() => {
                    debug!(command = %text, "console command finished");
                }
                Ok(status) => {
                    error!(command = %text, %status, "console command failed");
                }
                Err(e) => {
                    error!(command = %text, program = %program, error = %e, "failed to start R interpreter");
                }
            }
        });
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(run);
    }
}

impl ConsoleSink for RConsole {
    fn submit(&self, text: &str, execute: bool, echo: bool) {
        if echo {
            println!("> {text}");
        }
        if execute {
            self.execute(text);
        } else {
            // Staged only: show the command so the user can run it themselves.
            println!("{text}");
            info!(command = text, "console command staged");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::r::parse_interpreter;

    #[tokio::test]
    async fn staged_submission_spawns_nothing() {
        let console = RConsole::new(parse_interpreter("Rscript").unwrap(), PathBuf::from("."));
        console.submit("packrat::snapshot()", false, false);
        assert!(console.runs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_interpreter_is_logged_not_propagated() {
        let console = RConsole::new(
            parse_interpreter("packrat-cmd-no-such-interpreter").unwrap(),
            std::env::temp_dir(),
        );
        console.submit("packrat::clean()", true, false);
        assert_eq!(console.runs.lock().unwrap().len(), 1);
        console.drain().await;
        assert!(console.runs.lock().unwrap().is_empty());
    }
}
