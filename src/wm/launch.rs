//! Launch Module
//!
//! Starts the external programs bound to keyboard shortcuts. Children are
//! detached: nothing waits on them and their exit status is never read.

use tokio::process::Command;
use tracing::{info, warn};

/// Spawn `argv` without waiting for it and return the child's pid.
/// Failures are logged only.
pub fn spawn(argv: &[String]) -> Option<u32> {
    let Some((program, args)) = argv.split_first() else {
        warn!("Shortcut has no command configured");
        return None;
    };

    match Command::new(program).args(args).kill_on_drop(false).spawn() {
        Ok(child) => {
            let pid = child.id();
            info!("Launched {:?} (pid {:?})", argv, pid);
            pid
        }
        Err(e) => {
            warn!("Failed to launch {:?}: {}", argv, e);
            None
        }
    }
}
