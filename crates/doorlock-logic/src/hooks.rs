//! Post-transition hook scripts.
//!
//! After every confirmed transition the handler fires the hook bound to the
//! target state. Hooks are best effort: the script runs as a detached child
//! and its outcome never reaches the request that triggered it.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use doorlock_core::DoorState;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    PostUnlock,
    PostLock,
    PostPresent,
}

impl Hook {
    /// Hook bound to a transition into `state`.
    pub fn for_state(state: DoorState) -> Self {
        match state {
            DoorState::Open => Hook::PostUnlock,
            DoorState::Closed => Hook::PostLock,
            DoorState::Present => Hook::PostPresent,
        }
    }

    pub fn script_name(self) -> &'static str {
        match self {
            Hook::PostUnlock => "post_unlock",
            Hook::PostLock => "post_lock",
            Hook::PostPresent => "post_present",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

/// Fires hooks. Must return without waiting for the hook to finish.
pub trait HookRunner: Send + Sync {
    fn run(&self, hook: Hook);
}

/// Runs `<scripts_dir>/<hook>` as a child process.
#[derive(Debug, Clone)]
pub struct ScriptHookRunner {
    scripts_dir: PathBuf,
    enabled: bool,
}

impl ScriptHookRunner {
    pub fn new(scripts_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            enabled,
        }
    }

    pub fn script_path(&self, hook: Hook) -> PathBuf {
        self.scripts_dir.join(hook.script_name())
    }
}

impl HookRunner for ScriptHookRunner {
    fn run(&self, hook: Hook) {
        if !self.enabled {
            info!(%hook, "Hooks disabled, not starting hook");
            return;
        }

        let path = self.script_path(hook);
        info!(%hook, path = %path.display(), "Starting hook");
        let child = Command::new(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match child {
            Ok(mut child) => {
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if status.success() => debug!(%hook, "Hook finished"),
                        Ok(status) => warn!(%hook, %status, "Hook exited unsuccessfully"),
                        Err(e) => warn!(%hook, error = %e, "Failed to reap hook"),
                    }
                });
            }
            Err(e) => error!(%hook, path = %path.display(), error = %e, "Failed to start hook"),
        }
    }
}
