/*!
Packrat command layer.

  command.rs   PackratCommand (identifiers, event-name binding, console text)
  dispatch.rs  PackratCommands (handlers gated on the dependency check)
  format.rs    terminal styling for dialogs

Conventions:
  - Handlers return nothing; outcomes are collaborator side effects.
  - Collaborators come in through `crate::ports`, never as globals.
*/

pub mod command;
pub mod dispatch;
pub mod format;

pub use command::PackratCommand;
pub use dispatch::PackratCommands;
