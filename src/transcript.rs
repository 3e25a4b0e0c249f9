//! Diarized transcript input model.
//!
//! Transcripts arrive as JSON produced by an external transcription and
//! diarization step: an ordered list of segments with speaker labels and
//! timestamps. Kontekst consumes them as query text for the live context
//! loop; no transcription happens here.

use crate::error::{KontekstError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete diarized transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Individual transcript segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Load a transcript from a JSON file (`{"segments": [...]}`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KontekstError::InvalidDocument(format!(
                "cannot read transcript {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            KontekstError::InvalidDocument(format!(
                "malformed transcript {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Total duration in seconds (end of the last segment).
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end_seconds).unwrap_or(0.0)
    }
}

/// A single segment of a transcript with speaker and timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Speaker label (e.g., "SPEAKER_00"), if diarization ran.
    #[serde(default)]
    pub speaker: Option<String>,
    /// Start time in seconds.
    #[serde(rename = "start")]
    pub start_seconds: f64,
    /// End time in seconds.
    #[serde(rename = "end")]
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            speaker: None,
            start_seconds,
            end_seconds,
            text,
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_parse_diarized_json() {
        let json = r#"
        {
            "segments": [
                {"start": 0.0, "end": 4.2, "speaker": "SPEAKER_00", "text": "Hello there."},
                {"start": 4.2, "end": 9.8, "speaker": "SPEAKER_01", "text": "Hi, welcome."},
                {"start": 9.8, "end": 12.0, "text": "No speaker label here."}
            ]
        }
        "#;

        let transcript: Transcript = serde_json::from_str(json).unwrap();
        assert_eq!(transcript.segments.len(), 3);
        assert_eq!(
            transcript.segments[0].speaker.as_deref(),
            Some("SPEAKER_00")
        );
        assert!(transcript.segments[2].speaker.is_none());
        assert_eq!(transcript.duration_seconds(), 12.0);
    }

    #[test]
    fn test_load_malformed_transcript() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json at all").unwrap();

        let err = Transcript::load(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDocument);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Transcript::load(Path::new("/nonexistent/transcript.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDocument);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }
}
