mod event_handler;
mod pipeline;
mod recording;
mod state;

pub use event_handler::handle_event;
pub use state::{ui_state, AppState, CapturePhase, UiState, WidgetEvent};
