//! Door control logic.
//!
//! [`DoorHandler`] is the state machine between requests and the backend.
//! [`Doorlock`] puts an [`Authenticator`](doorlock_auth::Authenticator) in
//! front of it. Side effects of a transition (hooks, sounds) go through the
//! [`HookRunner`] and [`SoundPlayer`] traits so they can be replaced in tests.

pub mod doorlock;
pub mod handler;
pub mod history;
pub mod hooks;
pub mod sound;

pub use doorlock::Doorlock;
pub use handler::{DoorHandler, StatusCallback, StatusUpdate};
pub use history::{MAX_HISTORY_SIZE, Transition, TransitionHistory};
pub use hooks::{Hook, HookRunner, ScriptHookRunner};
pub use sound::{AplayPlayer, Silent, SoundCue, SoundPlayer, TransitionOrigin};
