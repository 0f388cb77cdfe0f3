use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{RInterpreter, r_string};
use crate::ports::DependencyManager;
use crate::term::Prompter;

/// Outcome of probing the R library for packrat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Available,
    Missing,
    Outdated,
}

impl Probe {
    /// Map the probe script's exit code.
    fn from_exit_code(code: Option<i32>) -> Option<Self> {
        match code {
            Some(0) => Some(Probe::Available),
            Some(1) => Some(Probe::Missing),
            Some(2) => Some(Probe::Outdated),
            _ => None,
        }
    }
}

/// Dependency manager that checks (and installs on consent) packrat via R.
///
/// Checks run one at a time: a caller queued behind an installation probes
/// again once it finishes instead of installing a second time.
pub struct RDependencyManager {
    interpreter: RInterpreter,
    min_version: String,
    cran_mirror: String,
    auto_install: bool,
    prompter: Arc<Prompter>,
    setup: Mutex<()>,
}

impl RDependencyManager {
    pub fn new(
        interpreter: RInterpreter,
        min_version: impl Into<String>,
        cran_mirror: impl Into<String>,
        auto_install: bool,
        prompter: Arc<Prompter>,
    ) -> Self {
        Self {
            interpreter,
            min_version: min_version.into(),
            cran_mirror: cran_mirror.into(),
            auto_install,
            prompter,
            setup: Mutex::new(()),
        }
    }

    async fn probe(&self) -> anyhow::Result<Probe> {
        let script = probe_script(&self.min_version);
        let output = self
            .interpreter
            .script_command(&script)
            .output()
            .await
            .with_context(|| format!("failed to start '{}'", self.interpreter))?;
        Probe::from_exit_code(output.status.code()).ok_or_else(|| {
            anyhow::anyhow!(
                "packrat probe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
        })
    }

    async fn install(&self) -> bool {
        let script = install_script(&self.cran_mirror);
        info!(mirror = %self.cran_mirror, "installing packrat");
        match self.interpreter.script_command(&script).status().await {
            Ok(status) if status.success() => true,
            Ok(status) => {
                error!(%status, "packrat installation failed");
                false
            }
            Err(e) => {
                error!(interpreter = %self.interpreter, error = %e, "failed to start R interpreter");
                false
            }
        }
    }

    async fn user_consents(&self, action: &str, probe: Probe) -> bool {
        if self.auto_install {
            return true;
        }
        self.prompter
            .confirm(install_question(action, probe, &self.min_version))
            .await
    }
}

#[async_trait]
impl DependencyManager for RDependencyManager {
    async fn ensure_available(&self, action: &str) -> bool {
        let _setup = self.setup.lock().await;
        let probe = match self.probe().await {
            Ok(p) => p,
            Err(e) => {
                error!(action, error = %e, "could not check for packrat");
                return false;
            }
        };
        debug!(action, ?probe, "packrat probe");
        if probe == Probe::Available {
            return true;
        }

        if !self.user_consents(action, probe).await {
            debug!(action, "packrat installation declined");
            return false;
        }
        if !self.install().await {
            return false;
        }

        match self.probe().await {
            Ok(Probe::Available) => true,
            Ok(after) => {
                warn!(action, ?after, "packrat still unavailable after installation");
                false
            }
            Err(e) => {
                error!(action, error = %e, "could not check for packrat");
                false
            }
        }
    }
}

/// Exit 0 when packrat >= `min_version` is installed, 1 when missing, 2 when older.
fn probe_script(min_version: &str) -> String {
    format!(
        "if (!requireNamespace('packrat', quietly = TRUE)) quit(status = 1); \
         if (utils::packageVersion('packrat') < {}) quit(status = 2)",
        r_string(min_version)
    )
}

fn install_script(cran_mirror: &str) -> String {
    format!(
        "utils::install.packages('packrat', repos = {})",
        r_string(cran_mirror)
    )
}

fn install_question(action: &str, probe: Probe, min_version: &str) -> String {
    match probe {
        Probe::Outdated => format!(
            "{action} requires packrat {min_version} or later. Update packrat now?"
        ),
        _ => format!("{action} requires the packrat package. Install packrat now?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_exit_codes() {
        assert_eq!(Probe::from_exit_code(Some(0)), Some(Probe::Available));
        assert_eq!(Probe::from_exit_code(Some(1)), Some(Probe::Missing));
        assert_eq!(Probe::from_exit_code(Some(2)), Some(Probe::Outdated));
        assert_eq!(Probe::from_exit_code(Some(127)), None);
        assert_eq!(Probe::from_exit_code(None), None);
    }

    #[test]
    fn probe_script_checks_version() {
        let s = probe_script("0.4.1");
        assert!(s.contains("requireNamespace('packrat'"));
        assert!(s.contains("packageVersion('packrat') < '0.4.1'"));
    }

    #[test]
    fn install_script_uses_mirror() {
        assert_eq!(
            install_script("https://cloud.r-project.org"),
            "utils::install.packages('packrat', repos = 'https://cloud.r-project.org')"
        );
    }

    #[test]
    fn question_names_action() {
        let q = install_question("packrat::snapshot()", Probe::Missing, "0.4.1");
        assert!(q.starts_with("packrat::snapshot() requires the packrat package"));
        let q = install_question("packrat::bundle()", Probe::Outdated, "0.4.1");
        assert!(q.contains("0.4.1 or later"));
    }

    #[tokio::test]
    async fn unavailable_interpreter_declines() {
        let manager = RDependencyManager::new(
            crate::r::parse_interpreter("packrat-cmd-no-such-interpreter").unwrap(),
            "0.4.1",
            "https://cloud.r-project.org",
            true,
            Arc::new(Prompter::new()),
        );
        assert!(!manager.ensure_available("packrat::snapshot()").await);
    }

    /// R stand-in: packrat is missing until the install script runs once.
    #[cfg(unix)]
    fn fake_r(dir: &std::path::Path) -> RInterpreter {
        let script = dir.join("fake-r.sh");
        let body = format!(
            "case \"$2\" in\n\
             *install.packages*) echo install >> '{d}/installs'; touch '{d}/installed'; exit 0;;\n\
             esac\n\
             [ -f '{d}/installed' ] && exit 0\n\
             exit 1\n",
            d = dir.display()
        );
        std::fs::write(&script, body).unwrap();
        crate::r::parse_interpreter(&format!("sh '{}'", script.display())).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn concurrent_checks_install_once() {
        let dir = std::env::temp_dir().join(format!("packrat-cmd-dep-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let manager = RDependencyManager::new(
            fake_r(&dir),
            "0.4.1",
            "https://cloud.r-project.org",
            true,
            Arc::new(Prompter::new()),
        );

        let ready = tokio::join!(
            manager.ensure_available("packrat::snapshot()"),
            manager.ensure_available("packrat::bundle()"),
        );
        let installs = std::fs::read_to_string(dir.join("installs"))
            .unwrap_or_default()
            .lines()
            .count();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(ready, (true, true));
        assert_eq!(installs, 1);
    }
}
