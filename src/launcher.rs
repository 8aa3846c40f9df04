//! Isolated side-effect boundary for user-configured custom commands.
//!
//! Custom commands are arbitrary user-supplied strings; nothing they do may
//! destabilize the dispatcher. The contract of [`ProcessLauncher::launch`]
//! is therefore "never propagates failure": spawn errors are logged and
//! swallowed, and the child is never waited on.

use std::process::{Command, Stdio};

use log::{debug, warn};

#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }

    /// Fire-and-forget spawn of `command`, detached from the daemon's
    /// stdio. An empty command is a valid no-op.
    pub fn launch(&self, command: &str) {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return;
        };

        let spawned = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                debug!("Launched custom command '{command}' (pid {})", child.id());
                // Dropping the handle detaches the child; we never wait.
                drop(child);
            }
            Err(e) => {
                warn!("Failed to launch custom command '{command}': {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_a_noop() {
        ProcessLauncher::new().launch("");
    }

    #[test]
    fn whitespace_only_command_is_a_noop() {
        ProcessLauncher::new().launch("   \t ");
    }

    #[test]
    fn nonexistent_binary_does_not_panic_or_propagate() {
        ProcessLauncher::new().launch("nonexistent-binary-xyz");
    }

    #[test]
    fn arguments_are_split_from_the_program() {
        // `true` exists on any test host and exits immediately.
        ProcessLauncher::new().launch("true --ignored-flag");
    }
}
