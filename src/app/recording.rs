use std::time::{Duration, Instant};

use super::state::{set_phase, AppState, CapturePhase, RecordingSession, WidgetEvent};
use crate::error::CaptureError;
use crate::payload::CapturedAudio;
use crate::recorder::samples_to_wav;
use crate::ui::panel;

/// Seconds between ticker events; drives both the countdown and the budget.
const TICK: Duration = Duration::from_secs(1);

/// Open the capture device and begin the countdown. The device is opened
/// before any state is touched, so a refused open leaves the widget exactly
/// as it was, whichever phase it was in.
pub fn start_recording(state: &mut AppState) {
    let stream = match state.device.open(&state.config.preferred_sample_rates) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("could not open capture device: {e}");
            panel::flash_error(&e);
            return;
        }
    };

    log::info!("capture device open, starting countdown");

    // A new recording supersedes whatever either path had pending.
    state.preview = None;
    state.payload = None;
    state.session = Some(RecordingSession {
        stream,
        started_at: Instant::now(),
    });

    spawn_ticker(state);

    if state.config.countdown_ticks == 0 {
        begin_recording(state);
    } else {
        set_phase(
            state,
            CapturePhase::Countdown {
                remaining: state.config.countdown_ticks,
            },
        );
        panel::print_countdown(state.config.countdown_ticks);
    }
}

/// Countdown finished: the clip starts here. Anything the microphone heard
/// during the countdown is discarded.
fn begin_recording(state: &mut AppState) {
    let Some(session) = state.session.as_mut() else {
        log::warn!("countdown finished with no live session");
        set_phase(state, CapturePhase::Idle);
        return;
    };

    let preroll = session.stream.drain().len();
    if preroll > 0 {
        log::debug!("discarded {preroll} countdown samples");
    }
    session.started_at = Instant::now();

    set_phase(
        state,
        CapturePhase::Recording {
            remaining: state.config.recording_budget_secs,
        },
    );
    panel::print_recording_started(state.config.recording_budget_secs);
}

/// Advance the countdown or the recording budget by one second. Stale-epoch
/// ticks never reach this; the event handler drops them first.
pub fn handle_tick(state: &mut AppState) {
    match state.phase {
        CapturePhase::Countdown { remaining } => {
            let next = remaining.saturating_sub(1);
            if next == 0 {
                begin_recording(state);
            } else {
                set_phase(state, CapturePhase::Countdown { remaining: next });
                panel::print_countdown(next);
            }
        }
        CapturePhase::Recording { remaining } => {
            if remaining <= 1 {
                log::info!("recording budget exhausted, auto-stopping");
                stop_recording(state);
            } else {
                set_phase(
                    state,
                    CapturePhase::Recording {
                        remaining: remaining - 1,
                    },
                );
                panel::print_recording_tick(remaining - 1);
            }
        }
        // Every transition out of the timed phases stops the ticker, so a
        // current-epoch tick anywhere else is a bug worth hearing about.
        _ => log::warn!("tick in phase {:?}", state.phase),
    }
}

/// Finalize the capture into a previewable clip. The device is released on
/// every path out of here, success or not.
pub fn stop_recording(state: &mut AppState) {
    stop_ticker(state);

    let Some(mut session) = state.session.take() else {
        log::warn!("stop with no live session");
        set_phase(state, CapturePhase::Idle);
        return;
    };

    let samples = session.stream.drain();
    let sample_rate = session.stream.sample_rate();
    let wall_secs = session.started_at.elapsed().as_secs_f32();
    drop(session);

    if samples.is_empty() {
        log::warn!("no audio captured");
        panel::flash_error(&CaptureError::CaptureFailed("no audio captured".into()));
        set_phase(state, CapturePhase::Idle);
        return;
    }

    let duration_secs = samples.len() as f32 / sample_rate as f32;
    log::info!(
        "captured {} samples ({duration_secs:.1}s at {sample_rate}Hz, {wall_secs:.1}s wall clock)",
        samples.len()
    );

    let clip = match samples_to_wav(&samples, sample_rate) {
        Ok(wav) => CapturedAudio::from_recording(wav, duration_secs),
        Err(e) => {
            log::error!("could not encode capture: {e}");
            panel::flash_error(&e);
            set_phase(state, CapturePhase::Idle);
            return;
        }
    };

    panel::print_preview(&clip);
    state.preview = Some(clip);
    set_phase(state, CapturePhase::Previewing);
}

/// Promote the previewed clip to the active payload.
pub fn commit_recording(state: &mut AppState) {
    let Some(clip) = state.preview.take() else {
        log::warn!("keep with no previewed clip");
        set_phase(state, CapturePhase::Idle);
        return;
    };

    log::info!("keeping {} ({} bytes)", clip.filename, clip.size_bytes());
    panel::print_committed(&clip);
    state.payload = Some(clip);
    set_phase(state, CapturePhase::Committed);
}

/// Drop the recorded clip, previewed or kept, and go back to an empty widget.
pub fn discard_recording(state: &mut AppState) {
    state.preview = None;
    state.payload = None;
    set_phase(state, CapturePhase::Idle);
    panel::print_discarded();
}

/// Replace any live ticker with a fresh one. Ticks carry the epoch they were
/// scheduled under; the event handler drops ticks from a superseded epoch.
fn spawn_ticker(state: &mut AppState) {
    stop_ticker(state);

    let epoch = state.ticker_epoch;
    let sender = state.sender.clone();
    let handle = tokio::spawn(async move {
        let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
        loop {
            ticks.tick().await;
            if sender.send(WidgetEvent::Tick { epoch }).await.is_err() {
                break;
            }
        }
    });
    state.ticker = Some(handle);
}

/// Abort the ticker and bump the epoch. The abort kills the task; the epoch
/// bump kills any tick already sitting in the channel.
pub fn stop_ticker(state: &mut AppState) {
    if let Some(handle) = state.ticker.take() {
        handle.abort();
    }
    state.ticker_epoch += 1;
}
