use std::path::Path;

use super::pipeline::dispatch_submission;
use super::recording::{
    commit_recording, discard_recording, handle_tick, start_recording, stop_recording, stop_ticker,
};
use super::state::{set_phase, ui_state, AppState, CapturePhase, WidgetEvent};
use crate::error::CaptureError;
use crate::payload::{CapturedAudio, PayloadSource};
use crate::ui::panel;

/// Handle one widget event. This is the core state machine and the only
/// place `AppState` is mutated. Returns `false` when the loop should exit.
pub fn handle_event(state: &mut AppState, event: WidgetEvent) -> bool {
    match event {
        WidgetEvent::RecordPressed => {
            if !state.capture_supported {
                log::warn!("record requested but no capture device was found at startup");
                panel::flash_error(&CaptureError::CapabilityDenied(
                    "no audio input device on this machine".into(),
                ));
            } else if ui_state(state).can_record {
                start_recording(state);
            } else {
                panel::flash_busy(state.phase);
            }
        }
        WidgetEvent::StopPressed => {
            if ui_state(state).can_stop {
                stop_recording(state);
            } else if matches!(state.phase, CapturePhase::Countdown { .. }) {
                panel::flash_busy(state.phase);
            } else {
                panel::flash_hint("nothing is recording");
            }
        }
        WidgetEvent::KeepPressed => {
            if ui_state(state).can_keep {
                commit_recording(state);
            } else {
                log::info!("ignoring keep in phase {:?}", state.phase);
                panel::flash_hint("no recorded clip is waiting for review");
            }
        }
        WidgetEvent::DiscardPressed => {
            if ui_state(state).can_discard {
                discard_recording(state);
            } else {
                log::info!("ignoring discard in phase {:?}", state.phase);
                panel::flash_hint("no recorded clip to discard");
            }
        }
        WidgetEvent::FileChosen(path) => {
            if ui_state(state).can_choose_file {
                select_file(state, &path);
            } else {
                panel::flash_busy(state.phase);
            }
        }
        WidgetEvent::SubmitPressed => {
            if state.phase == CapturePhase::Submitting {
                panel::flash_busy(state.phase);
            } else {
                match state.payload.clone() {
                    Some(clip) if ui_state(state).can_submit => {
                        set_phase(state, CapturePhase::Submitting);
                        panel::print_submitting(&clip);
                        dispatch_submission(state, clip);
                    }
                    _ => panel::flash_hint("record a clip or choose a file first"),
                }
            }
        }
        WidgetEvent::StatusRequested => panel::print_status(state),
        WidgetEvent::HelpRequested => panel::print_help(state),
        WidgetEvent::Tick { epoch } => {
            if epoch == state.ticker_epoch {
                handle_tick(state);
            } else {
                log::debug!(
                    "dropping stale tick (epoch {epoch}, current {})",
                    state.ticker_epoch
                );
            }
        }
        WidgetEvent::SubmissionComplete(report) => {
            log::info!("analysis received ({} bytes)", report.len());
            panel::print_report(&report);
            // A delivered report consumes the payload; the widget starts over.
            state.preview = None;
            state.payload = None;
            set_phase(state, CapturePhase::Idle);
        }
        WidgetEvent::SubmissionFailed(err) => {
            panel::flash_error(&err);
            // Re-arm submit in the phase the payload was submitted from.
            let phase = match state.payload.as_ref().map(|clip| clip.source) {
                Some(PayloadSource::Recording) => CapturePhase::Committed,
                Some(PayloadSource::File) => CapturePhase::FileSelected,
                None => CapturePhase::Idle,
            };
            set_phase(state, phase);
        }
        WidgetEvent::Shutdown => {
            log::info!("shutting down");
            stop_ticker(state);
            // Dropping the session releases the capture device.
            state.session = None;
            return false;
        }
    }
    true
}

/// Validate and load a chosen file. A rejection leaves the prior state fully
/// intact, including any kept recording.
fn select_file(state: &mut AppState, path: &Path) {
    match CapturedAudio::from_file(path, state.config.max_payload_bytes) {
        Ok(clip) => {
            // The file replaces whatever the record path had pending.
            state.preview = None;
            panel::print_file_selected(&clip);
            state.payload = Some(clip);
            set_phase(state, CapturePhase::FileSelected);
        }
        Err(e) => {
            log::warn!("rejected {}: {e}", path.display());
            panel::flash_error(&e);
        }
    }
}
