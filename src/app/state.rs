use std::path::PathBuf;
use std::time::Instant;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::payload::CapturedAudio;
use crate::recorder::{CaptureDevice, CaptureStream};

/// Everything that can happen to the widget arrives here: console commands,
/// ticker ticks, submission results.
#[derive(Debug)]
pub enum WidgetEvent {
    RecordPressed,
    StopPressed,
    KeepPressed,
    DiscardPressed,
    FileChosen(PathBuf),
    SubmitPressed,
    StatusRequested,
    HelpRequested,
    /// One second elapsed. Stamped with the ticker generation so ticks from a
    /// cancelled ticker are dropped instead of advancing a later phase.
    Tick { epoch: u64 },
    SubmissionComplete(String),
    SubmissionFailed(String),
    Shutdown,
}

/// Where the widget is in the capture lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    /// Stream is open, capture armed; `remaining` ticks until recording.
    Countdown { remaining: u32 },
    /// Actively capturing; `remaining` seconds of budget left.
    Recording { remaining: u32 },
    /// A recorded clip is waiting for keep/discard.
    Previewing,
    /// A recorded clip was kept and can be submitted.
    Committed,
    /// A validated file is the active clip.
    FileSelected,
    /// A submission is in flight; the panel is locked until it resolves.
    Submitting,
}

/// Live capture session. Exists only while the device is held; dropping it
/// releases the device.
pub struct RecordingSession {
    pub stream: Box<dyn CaptureStream>,
    pub started_at: Instant,
}

/// Central widget state. Lives inside the event loop future; handlers take
/// `&mut` and never hold it across an await.
pub struct AppState {
    pub phase: CapturePhase,
    pub config: Config,
    pub device: Box<dyn CaptureDevice>,
    pub capture_supported: bool,
    pub session: Option<RecordingSession>,
    /// Recorded clip awaiting keep/discard.
    pub preview: Option<CapturedAudio>,
    /// The active clip, from either path. At most one at a time.
    pub payload: Option<CapturedAudio>,
    pub sender: async_channel::Sender<WidgetEvent>,
    pub ticker: Option<JoinHandle<()>>,
    pub ticker_epoch: u64,
}

impl AppState {
    pub fn new(
        config: Config,
        sender: async_channel::Sender<WidgetEvent>,
        device: Box<dyn CaptureDevice>,
    ) -> Self {
        let capture_supported = device.is_available();
        Self {
            phase: CapturePhase::Idle,
            config,
            device,
            capture_supported,
            session: None,
            preview: None,
            payload: None,
            sender,
            ticker: None,
            ticker_epoch: 0,
        }
    }
}

/// Helper to switch phase with a log line for the transition.
pub fn set_phase(state: &mut AppState, phase: CapturePhase) {
    if state.phase != phase {
        log::info!("phase: {:?} -> {:?}", state.phase, phase);
    }
    state.phase = phase;
}

/// Which controls are live right now. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiState {
    pub can_record: bool,
    pub can_stop: bool,
    pub can_keep: bool,
    pub can_discard: bool,
    pub can_choose_file: bool,
    pub can_submit: bool,
}

pub fn ui_state(state: &AppState) -> UiState {
    let settled = matches!(
        state.phase,
        CapturePhase::Idle
            | CapturePhase::FileSelected
            | CapturePhase::Previewing
            | CapturePhase::Committed
    );
    UiState {
        can_record: state.capture_supported && settled,
        can_stop: matches!(state.phase, CapturePhase::Recording { .. }),
        can_keep: state.phase == CapturePhase::Previewing,
        can_discard: matches!(
            state.phase,
            CapturePhase::Previewing | CapturePhase::Committed
        ),
        can_choose_file: settled,
        can_submit: state.payload.is_some()
            && matches!(
                state.phase,
                CapturePhase::Committed | CapturePhase::FileSelected
            ),
    }
}
