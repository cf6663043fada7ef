//! Audible feedback on door transitions.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use doorlock_core::DoorState;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Who caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOrigin {
    /// Requested through `DoorHandler::request`.
    Commanded,
    /// Reported by the backend: a button, the controller, a poll.
    Unsolicited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Lock,
    LockButton,
    Present,
    PresentButton,
    Unlock,
    UnlockButton,
    Zonk,
}

impl SoundCue {
    /// Same state plays zonk; otherwise the target state's cue, in its
    /// button variant for unsolicited transitions.
    pub fn select(old: DoorState, new: DoorState, origin: TransitionOrigin) -> Self {
        if old == new {
            return SoundCue::Zonk;
        }
        match (new, origin) {
            (DoorState::Open, TransitionOrigin::Commanded) => SoundCue::Unlock,
            (DoorState::Open, TransitionOrigin::Unsolicited) => SoundCue::UnlockButton,
            (DoorState::Present, TransitionOrigin::Commanded) => SoundCue::Present,
            (DoorState::Present, TransitionOrigin::Unsolicited) => SoundCue::PresentButton,
            (DoorState::Closed, TransitionOrigin::Commanded) => SoundCue::Lock,
            (DoorState::Closed, TransitionOrigin::Unsolicited) => SoundCue::LockButton,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            SoundCue::Lock => "lock.wav",
            SoundCue::LockButton => "lock_button.wav",
            // There is no separate recording for the present button.
            SoundCue::Present | SoundCue::PresentButton => "present.wav",
            SoundCue::Unlock => "unlock.wav",
            SoundCue::UnlockButton => "unlock_button.wav",
            SoundCue::Zonk => "zonk.wav",
        }
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Plays cues. Must not block on playback.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, cue: SoundCue);
}

/// Plays `<sounds_dir>/<cue>` with `aplay`.
#[derive(Debug, Clone)]
pub struct AplayPlayer {
    sounds_dir: PathBuf,
    enabled: bool,
}

impl AplayPlayer {
    pub fn new(sounds_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            sounds_dir: sounds_dir.into(),
            enabled,
        }
    }
}

impl SoundPlayer for AplayPlayer {
    fn play(&self, cue: SoundCue) {
        if !self.enabled {
            return;
        }

        let path = self.sounds_dir.join(cue.file_name());
        debug!(%cue, "Playing sound");
        match Command::new("aplay")
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                tokio::spawn(async move {
                    if let Ok(status) = child.wait().await
                        && !status.success()
                    {
                        warn!(%cue, %status, "aplay failed");
                    }
                });
            }
            Err(e) => error!(%cue, error = %e, "Failed to start aplay"),
        }
    }
}

/// Player that stays silent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&self, _cue: SoundCue) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use doorlock_core::DoorState::{Closed, Open, Present};
    use crate::sound::TransitionOrigin::{Commanded, Unsolicited};

    #[rstest]
    #[case(Closed, Open, Commanded, SoundCue::Unlock)]
    #[case(Closed, Present, Commanded, SoundCue::Present)]
    #[case(Open, Closed, Commanded, SoundCue::Lock)]
    #[case(Closed, Open, Unsolicited, SoundCue::UnlockButton)]
    #[case(Open, Present, Unsolicited, SoundCue::PresentButton)]
    #[case(Present, Closed, Unsolicited, SoundCue::LockButton)]
    #[case(Open, Open, Commanded, SoundCue::Zonk)]
    #[case(Closed, Closed, Unsolicited, SoundCue::Zonk)]
    fn test_select(
        #[case] old: DoorState,
        #[case] new: DoorState,
        #[case] origin: TransitionOrigin,
        #[case] expected: SoundCue,
    ) {
        assert_eq!(SoundCue::select(old, new, origin), expected);
    }

    #[test]
    fn test_present_button_reuses_present_recording() {
        assert_eq!(SoundCue::PresentButton.file_name(), SoundCue::Present.file_name());
        assert_eq!(SoundCue::LockButton.file_name(), "lock_button.wav");
    }

    #[tokio::test]
    async fn test_disabled_player_does_nothing() {
        AplayPlayer::new("/nonexistent", false).play(SoundCue::Zonk);
    }
}
