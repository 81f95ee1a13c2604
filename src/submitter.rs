use std::time::Duration;

use crate::error::CaptureError;
use crate::payload::CapturedAudio;

/// Multipart field name the service reads the clip from.
const PAYLOAD_FIELD: &str = "file";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Analysis of a full-size clip can take a while server-side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SNIPPET_CHARS: usize = 200;

/// POST the clip to the analysis service and return the raw response body.
pub async fn submit(server_url: &str, payload: CapturedAudio) -> Result<String, CaptureError> {
    log::info!(
        "Submitting {} ({}, {} bytes) to {server_url}",
        payload.filename,
        payload.media_type.mime(),
        payload.data.len()
    );

    let part = reqwest::multipart::Part::bytes(payload.data)
        .file_name(payload.filename)
        .mime_str(payload.media_type.mime())
        .map_err(|e| CaptureError::TransportFailed(format!("could not package clip: {e}")))?;
    let form = reqwest::multipart::Form::new().part(PAYLOAD_FIELD, part);

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| CaptureError::TransportFailed(format!("could not build http client: {e}")))?;

    let resp = client
        .post(server_url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            CaptureError::TransportFailed(format!("request to {server_url} failed: {e}"))
        })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(CaptureError::TransportFailed(format!(
            "service answered {status}: {}",
            snippet(&text)
        )));
    }

    resp.text()
        .await
        .map_err(|e| CaptureError::TransportFailed(format!("could not read response body: {e}")))
}

/// Trim a response body down to something that fits in an error message.
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    let mut out: String = trimmed.chars().take(SNIPPET_CHARS).collect();
    if trimmed.chars().count() > SNIPPET_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> CapturedAudio {
        CapturedAudio::from_recording(vec![0u8; 32], 0.5)
    }

    #[test]
    fn snippet_keeps_short_bodies_and_trims_long_ones() {
        assert_eq!(snippet("  ok  "), "ok");
        let long = "x".repeat(500);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_transport_failure() {
        // Port 9 (discard) is not listening in the test environment.
        let err = submit("http://127.0.0.1:9/", clip()).await.unwrap_err();
        assert!(matches!(err, CaptureError::TransportFailed(_)));
    }

    #[tokio::test]
    async fn invalid_url_maps_to_transport_failure() {
        let err = submit("not a url", clip()).await.unwrap_err();
        assert!(matches!(err, CaptureError::TransportFailed(_)));
    }
}
