//! DoorHandler behavior against scripted and simulated backends.

mod common;

use std::time::Duration;

use common::{OPEN_CLOSED, ScriptedBackend, next_update, rig};
use doorlock_backend::{DoorBackend, SimulationBackend};
use doorlock_core::{DoorState, Response};
use doorlock_logic::{Hook, SoundCue, StatusUpdate, TransitionOrigin};

fn update(state: DoorState, response: Response) -> StatusUpdate {
    StatusUpdate { state, response }
}

#[tokio::test]
async fn test_request_current_state_has_no_side_effects() {
    let (backend, control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    assert_eq!(rig.handler.request(DoorState::Closed).await, Response::AlreadyActive);

    assert_eq!(control.calls(), 0);
    assert!(rig.hooks.fired().is_empty());
    assert!(rig.sounds.played().is_empty());
    assert!(rig.handler.history().is_empty());
    assert!(rig.updates.try_recv().is_err());
}

#[tokio::test]
async fn test_confirmed_request_runs_side_effects() {
    let (backend, control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    assert_eq!(rig.handler.request(DoorState::Open).await, Response::Success);

    assert_eq!(rig.handler.current_state().await, DoorState::Open);
    assert_eq!(control.calls(), 1);
    assert_eq!(rig.hooks.fired(), vec![Hook::PostUnlock]);
    assert_eq!(rig.sounds.played(), vec![SoundCue::Unlock]);
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Open, Response::Success)
    );

    let history = rig.handler.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from, DoorState::Closed);
    assert_eq!(history[0].to, DoorState::Open);
    assert_eq!(history[0].origin, TransitionOrigin::Commanded);
}

#[tokio::test]
async fn test_commanded_transition_is_not_reported_twice() {
    let (backend, _control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    assert_eq!(rig.handler.request(DoorState::Present).await, Response::Success);
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Present, Response::Success)
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rig.updates.try_recv().is_err());
    assert_eq!(rig.hooks.fired(), vec![Hook::PostPresent]);
}

#[tokio::test]
async fn test_backend_failure_leaves_no_trace() {
    let (backend, control) = ScriptedBackend::new();
    control.set_accept(false);
    let mut rig = rig(backend);

    assert_eq!(rig.handler.request(DoorState::Open).await, Response::BackendError);

    assert_eq!(control.calls(), 1);
    assert_eq!(rig.handler.current_state().await, DoorState::Closed);
    assert_eq!(rig.handler.backend().get_state(), DoorState::Closed);
    assert!(rig.hooks.fired().is_empty());
    assert!(rig.sounds.played().is_empty());
    assert!(rig.handler.history().is_empty());
    assert!(rig.updates.try_recv().is_err());

    control.set_accept(true);
    assert_eq!(rig.handler.request(DoorState::Open).await, Response::Success);
}

#[tokio::test]
async fn test_unsupported_state_is_invalid() {
    let (backend, control) = ScriptedBackend::with_capabilities(&OPEN_CLOSED);
    let mut rig = rig(backend);

    assert_eq!(rig.handler.request(DoorState::Present).await, Response::Invalid);
    assert_eq!(control.calls(), 0);
    assert!(rig.updates.try_recv().is_err());

    assert_eq!(rig.handler.request(DoorState::Open).await, Response::Success);
}

#[tokio::test]
async fn test_button_press_is_applied() {
    let (backend, control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    assert!(control.state.report_external(DoorState::Open));

    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Open, Response::ButtonOpen)
    );
    assert_eq!(rig.handler.current_state().await, DoorState::Open);
    assert_eq!(rig.hooks.fired(), vec![Hook::PostUnlock]);
    assert_eq!(rig.sounds.played(), vec![SoundCue::UnlockButton]);
    assert_eq!(rig.handler.history()[0].origin, TransitionOrigin::Unsolicited);
}

#[tokio::test]
async fn test_controller_relock_is_reported_as_close_button() {
    let (backend, control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    assert_eq!(rig.handler.request(DoorState::Open).await, Response::Success);
    next_update(&mut rig.updates).await;

    assert!(control.state.report_external(DoorState::Closed));
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Closed, Response::ButtonClose)
    );
    assert_eq!(rig.hooks.fired(), vec![Hook::PostUnlock, Hook::PostLock]);
    assert_eq!(rig.sounds.played(), vec![SoundCue::Unlock, SoundCue::LockButton]);
}

#[tokio::test]
async fn test_external_transitions_are_notified_in_order() {
    let (backend, control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    let sequence = [
        DoorState::Open,
        DoorState::Open,
        DoorState::Present,
        DoorState::Closed,
        DoorState::Closed,
        DoorState::Open,
    ];
    for state in sequence {
        control.state.report_external(state);
    }

    let expected = [
        update(DoorState::Open, Response::ButtonOpen),
        update(DoorState::Present, Response::ButtonPresent),
        update(DoorState::Closed, Response::ButtonClose),
        update(DoorState::Open, Response::ButtonOpen),
    ];
    for want in expected {
        assert_eq!(next_update(&mut rig.updates).await, want);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rig.updates.try_recv().is_err());
    assert_eq!(rig.handler.history().len(), 4);
}

#[tokio::test]
async fn test_report_of_current_state_is_ignored() {
    let (backend, _control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    rig.handler.state_changed(DoorState::Closed).await;

    assert!(rig.updates.try_recv().is_err());
    assert!(rig.hooks.fired().is_empty());
    assert!(rig.handler.history().is_empty());
}

#[tokio::test]
async fn test_emergency_unlock_keeps_state() {
    let (backend, control) = ScriptedBackend::new();
    let mut rig = rig(backend);

    control.state.report_emergency();

    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Closed, Response::EmergencyUnlock)
    );
    assert_eq!(rig.handler.current_state().await, DoorState::Closed);
    assert_eq!(rig.sounds.played(), vec![SoundCue::Zonk]);
    assert!(rig.hooks.fired().is_empty());
    assert!(rig.handler.history().is_empty());
}

#[tokio::test]
async fn test_concurrent_identical_requests_reach_backend_once() {
    let (backend, control) = ScriptedBackend::new();
    let rig = rig(backend.slow(Duration::from_millis(50)));

    let (first, second) = tokio::join!(
        rig.handler.request(DoorState::Open),
        rig.handler.request(DoorState::Open)
    );

    let mut responses = [first, second];
    responses.sort_by_key(|response| response.code());
    assert_eq!(responses, [Response::Success, Response::AlreadyActive]);
    assert_eq!(control.calls(), 1);
    assert_eq!(rig.hooks.fired(), vec![Hook::PostUnlock]);
}

#[tokio::test]
async fn test_events_before_start_are_delivered() {
    let (backend, control) = ScriptedBackend::new();
    control.state.report_external(DoorState::Present);

    let mut rig = rig(backend);

    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Present, Response::ButtonPresent)
    );
    assert_eq!(rig.handler.current_state().await, DoorState::Present);
}

#[tokio::test]
async fn test_simulation_end_to_end() {
    let (backend, handle) = SimulationBackend::new();
    let mut rig = rig(backend);

    assert!(handle.press_button(DoorState::Present));
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Present, Response::ButtonPresent)
    );

    assert_eq!(rig.handler.request(DoorState::Closed).await, Response::Success);
    assert_eq!(handle.state(), DoorState::Closed);
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Closed, Response::Success)
    );

    handle.emergency_unlock();
    assert_eq!(
        next_update(&mut rig.updates).await,
        update(DoorState::Closed, Response::EmergencyUnlock)
    );

    assert_eq!(
        rig.sounds.played(),
        vec![SoundCue::PresentButton, SoundCue::Lock, SoundCue::Zonk]
    );
    assert_eq!(rig.handler.history().len(), 2);
}
