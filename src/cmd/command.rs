/*!
PackratCommand enum: the six packrat operations a user can trigger.

Variants:
  help / snapshot / restore / clean / bundle / status

Parsing goes through clap's ValueEnum: plain names, plus the IDE command
event names (packratSnapshot, ...) as aliases.

  - console_action()    console text / dependency action for gated commands
*/

use std::fmt;

/// Enumeration of packrat commands bound to IDE menu entries.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PackratCommand {
    /// Open the packrat documentation
    #[value(alias = "packratHelp")]
    Help,
    /// Snapshot the project library (packrat::snapshot)
    #[value(alias = "packratSnapshot")]
    Snapshot,
    /// Restore packages from the snapshot (packrat::restore)
    #[value(alias = "packratRestore")]
    Restore,
    /// Remove unused packages (packrat::clean)
    #[value(alias = "packratClean")]
    Clean,
    /// Bundle the project into an archive (packrat::bundle)
    #[value(alias = "packratBundle")]
    Bundle,
    /// Show the packrat status of the active project
    #[value(alias = "packratStatus")]
    Status,
}

impl PackratCommand {
    /// Text handed to the dependency manager (and, except for bundle, to the console).
    pub fn console_action(&self) -> Option<&'static str> {
        match self {
            PackratCommand::Snapshot => Some("packrat::snapshot()"),
            PackratCommand::Restore => Some("packrat::restore()"),
            PackratCommand::Clean => Some("packrat::clean()"),
            PackratCommand::Bundle => Some("packrat::bundle()"),
            PackratCommand::Help | PackratCommand::Status => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PackratCommand::Help => "help",
            PackratCommand::Snapshot => "snapshot",
            PackratCommand::Restore => "restore",
            PackratCommand::Clean => "clean",
            PackratCommand::Bundle => "bundle",
            PackratCommand::Status => "status",
        }
    }
}

impl fmt::Display for PackratCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::PackratCommand;
    use clap::ValueEnum;

    #[test]
    fn clap_accepts_event_alias() {
        assert_eq!(
            PackratCommand::from_str("packratClean", false),
            Ok(PackratCommand::Clean)
        );
        assert_eq!(
            PackratCommand::from_str("restore", false),
            Ok(PackratCommand::Restore)
        );
        assert_eq!(
            PackratCommand::from_str("SNAPSHOT", true),
            Ok(PackratCommand::Snapshot)
        );
        assert!(PackratCommand::from_str("install", true).is_err());
    }

    #[test]
    fn gated_commands_carry_console_action() {
        assert_eq!(
            PackratCommand::Snapshot.console_action(),
            Some("packrat::snapshot()")
        );
        assert_eq!(
            PackratCommand::Bundle.console_action(),
            Some("packrat::bundle()")
        );
        assert_eq!(PackratCommand::Status.console_action(), None);
        assert_eq!(PackratCommand::Help.console_action(), None);
    }

    #[test]
    fn display_output() {
        assert_eq!(PackratCommand::Clean.to_string(), "clean");
        assert_eq!(PackratCommand::Help.to_string(), "help");
    }
}
