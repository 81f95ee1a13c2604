use std::fs;
use std::path::Path;

use chrono::Local;

use crate::error::CaptureError;

/// Audio container formats the analysis service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Wav,
    Mp3,
    M4a,
    Flac,
    Ogg,
    Webm,
}

impl MediaType {
    /// Accepted formats in preference order.
    pub const ALL: [MediaType; 6] = [
        MediaType::Wav,
        MediaType::Mp3,
        MediaType::M4a,
        MediaType::Flac,
        MediaType::Ogg,
        MediaType::Webm,
    ];

    /// Match a file extension against the allow list, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<MediaType> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(MediaType::Wav),
            "mp3" => Some(MediaType::Mp3),
            "m4a" => Some(MediaType::M4a),
            "flac" => Some(MediaType::Flac),
            "ogg" => Some(MediaType::Ogg),
            "webm" => Some(MediaType::Webm),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<MediaType> {
        let ext = path.extension()?.to_str()?;
        MediaType::from_extension(ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Wav => "wav",
            MediaType::Mp3 => "mp3",
            MediaType::M4a => "m4a",
            MediaType::Flac => "flac",
            MediaType::Ogg => "ogg",
            MediaType::Webm => "webm",
        }
    }

    /// MIME type attached to the multipart upload.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Wav => "audio/wav",
            MediaType::Mp3 => "audio/mpeg",
            MediaType::M4a => "audio/m4a",
            MediaType::Flac => "audio/flac",
            MediaType::Ogg => "audio/ogg",
            MediaType::Webm => "audio/webm",
        }
    }

    /// Comma-separated extension list for error and help text.
    pub fn allowed_list() -> String {
        MediaType::ALL
            .iter()
            .map(|m| m.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Where a clip came from. Controls which phase the widget re-arms into
/// after a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Recording,
    File,
}

/// A finished clip, ready to preview or submit. At most one of these is
/// active at a time, whichever path produced it.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub data: Vec<u8>,
    pub media_type: MediaType,
    pub filename: String,
    pub source: PayloadSource,
    pub captured_at: String,
    pub duration_secs: Option<f32>,
}

impl CapturedAudio {
    /// Wrap finalized WAV bytes from a recording session.
    pub fn from_recording(wav: Vec<u8>, duration_secs: f32) -> CapturedAudio {
        let now = Local::now();
        CapturedAudio {
            data: wav,
            media_type: MediaType::Wav,
            filename: format!("recorded-{}.wav", now.format("%Y%m%d-%H%M%S")),
            source: PayloadSource::Recording,
            captured_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            duration_secs: Some(duration_secs),
        }
    }

    /// Validate and load a file chosen by the user. Rejections leave the
    /// caller's state untouched.
    pub fn from_file(path: &Path, max_bytes: u64) -> Result<CapturedAudio, CaptureError> {
        let media_type = MediaType::from_path(path).ok_or_else(|| {
            CaptureError::ValidationFailed(format!(
                "{} is not a supported audio file (allowed: {})",
                path.display(),
                MediaType::allowed_list()
            ))
        })?;

        let meta = fs::metadata(path).map_err(|e| {
            CaptureError::ValidationFailed(format!("could not read {}: {e}", path.display()))
        })?;
        if meta.len() > max_bytes {
            return Err(CaptureError::ValidationFailed(format!(
                "{} is {}, over the {} limit",
                path.display(),
                human_size(meta.len()),
                human_size(max_bytes)
            )));
        }
        if meta.len() == 0 {
            return Err(CaptureError::ValidationFailed(format!(
                "{} is empty",
                path.display()
            )));
        }

        let data = fs::read(path).map_err(|e| {
            CaptureError::ValidationFailed(format!("could not read {}: {e}", path.display()))
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("clip.{}", media_type.extension()));

        Ok(CapturedAudio {
            data,
            media_type,
            filename,
            source: PayloadSource::File,
            captured_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            duration_secs: None,
        })
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Render a byte count for panel text, binary units.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("soundcheck-payload-{}-{name}", std::process::id()))
    }

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(MediaType::from_extension("WAV"), Some(MediaType::Wav));
        assert_eq!(MediaType::from_extension("Mp3"), Some(MediaType::Mp3));
        assert_eq!(MediaType::from_extension("webm"), Some(MediaType::Webm));
        assert_eq!(MediaType::from_extension("txt"), None);
        assert_eq!(MediaType::from_extension(""), None);
    }

    #[test]
    fn path_without_extension_is_rejected() {
        assert_eq!(MediaType::from_path(Path::new("/tmp/audio")), None);
        assert_eq!(
            MediaType::from_path(Path::new("/tmp/clip.FLAC")),
            Some(MediaType::Flac)
        );
    }

    #[test]
    fn every_media_type_has_audio_mime() {
        for m in MediaType::ALL {
            assert!(m.mime().starts_with("audio/"), "{:?} -> {}", m, m.mime());
        }
    }

    #[test]
    fn from_file_accepts_clip_within_limit() {
        let path = temp_path("ok.wav");
        fs::write(&path, vec![0u8; 64]).unwrap();

        let clip = CapturedAudio::from_file(&path, 64).unwrap();
        assert_eq!(clip.media_type, MediaType::Wav);
        assert_eq!(clip.source, PayloadSource::File);
        assert_eq!(clip.size_bytes(), 64);
        assert_eq!(clip.filename, path.file_name().unwrap().to_string_lossy());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_file_rejects_clip_over_limit() {
        let path = temp_path("big.mp3");
        fs::write(&path, vec![0u8; 65]).unwrap();

        let err = CapturedAudio::from_file(&path, 64).unwrap_err();
        assert!(matches!(err, CaptureError::ValidationFailed(_)));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_file_rejects_unknown_extension() {
        let path = temp_path("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let err = CapturedAudio::from_file(&path, 1024).unwrap_err();
        assert!(matches!(err, CaptureError::ValidationFailed(_)));
        assert!(err.to_string().contains("not a supported audio file"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_file_rejects_empty_and_missing_files() {
        let empty = temp_path("empty.ogg");
        fs::write(&empty, b"").unwrap();
        let err = CapturedAudio::from_file(&empty, 1024).unwrap_err();
        assert!(matches!(err, CaptureError::ValidationFailed(_)));
        fs::remove_file(&empty).unwrap();

        let missing = temp_path("missing.wav");
        let err = CapturedAudio::from_file(&missing, 1024).unwrap_err();
        assert!(matches!(err, CaptureError::ValidationFailed(_)));
    }

    #[test]
    fn recorded_clip_is_named_and_typed() {
        let clip = CapturedAudio::from_recording(vec![1, 2, 3], 2.5);
        assert_eq!(clip.media_type, MediaType::Wav);
        assert_eq!(clip.source, PayloadSource::Recording);
        assert!(clip.filename.starts_with("recorded-"));
        assert!(clip.filename.ends_with(".wav"));
        assert_eq!(clip.duration_secs, Some(2.5));
    }

    #[test]
    fn human_size_picks_sensible_units() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(10 * 1024 * 1024), "10.0 MiB");
    }
}
