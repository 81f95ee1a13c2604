use super::state::{AppState, WidgetEvent};
use crate::payload::CapturedAudio;
use crate::submitter;

/// POST the clip to the analysis service on a background task. The outcome
/// comes back through the event channel, so the widget stays responsive and
/// the handler never blocks on the network.
pub fn dispatch_submission(state: &AppState, clip: CapturedAudio) {
    let server_url = state.config.server_url.clone();
    let sender = state.sender.clone();

    tokio::spawn(async move {
        match submitter::submit(&server_url, clip).await {
            Ok(report) => {
                let _ = sender.send(WidgetEvent::SubmissionComplete(report)).await;
            }
            Err(e) => {
                log::error!("{e}");
                let _ = sender.send(WidgetEvent::SubmissionFailed(e.to_string())).await;
            }
        }
    });
}
