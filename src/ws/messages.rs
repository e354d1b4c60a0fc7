use serde::{Deserialize, Serialize};

/// Transcript message received from the recognition backend.
///
/// Unknown fields are ignored; a missing `transcription` field reads as an
/// empty string, which downstream treats as an ignorable fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub transcription: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transcription_field() {
        let msg: TranscriptMessage = serde_json::from_str(r#"{"transcription": "hello"}"#).unwrap();
        assert_eq!(msg.transcription, "hello");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let msg: TranscriptMessage =
            serde_json::from_str(r#"{"transcription": "hi", "confidence": 0.9}"#).unwrap();
        assert_eq!(msg.transcription, "hi");
    }

    #[test]
    fn missing_field_reads_as_empty() {
        let msg: TranscriptMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(msg.transcription, "");
    }
}
