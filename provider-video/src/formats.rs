//! Format-table model and audio format selection.
//!
//! Video platforms publish each upload as a table of muxed and
//! single-stream formats. For audio playback the interesting entries are
//! the audio-only ones (no video codec); among those, the highest audio
//! bitrate wins. A table with no audio-only entry falls back to the best
//! muxed format that carries audio at all.

use serde::Deserialize;

/// Codec value the platforms use for "this stream has none".
const CODEC_NONE: &str = "none";

/// The pre-extracted format table attached to a track as `raw_info`.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatTable {
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
}

/// One downloadable format of an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaFormat {
    /// Direct media URL.
    pub url: String,

    /// Audio codec name, or `"none"` for video-only streams.
    #[serde(default)]
    pub acodec: Option<String>,

    /// Video codec name, or `"none"` for audio-only streams.
    #[serde(default)]
    pub vcodec: Option<String>,

    /// Audio bitrate in kbit/s.
    #[serde(default)]
    pub abr: Option<f64>,
}

impl MediaFormat {
    fn has_audio(&self) -> bool {
        matches!(&self.acodec, Some(codec) if codec != CODEC_NONE)
    }

    fn is_audio_only(&self) -> bool {
        self.has_audio()
            && match &self.vcodec {
                Some(codec) => codec == CODEC_NONE,
                None => true,
            }
    }

    fn bitrate(&self) -> f64 {
        self.abr.unwrap_or(0.0)
    }
}

/// Picks the format to stream: the audio-only entry with the highest
/// bitrate, else the best entry that carries audio, else `None`.
pub fn select_audio_format(table: &FormatTable) -> Option<&MediaFormat> {
    let best = |audio_only: bool| {
        table
            .formats
            .iter()
            .filter(|f| if audio_only { f.is_audio_only() } else { f.has_audio() })
            .max_by(|a, b| a.bitrate().total_cmp(&b.bitrate()))
    };
    best(true).or_else(|| best(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(url: &str, acodec: &str, vcodec: &str, abr: Option<f64>) -> MediaFormat {
        MediaFormat {
            url: url.to_string(),
            acodec: Some(acodec.to_string()),
            vcodec: Some(vcodec.to_string()),
            abr,
        }
    }

    #[test]
    fn test_highest_bitrate_audio_only_wins() {
        let table = FormatTable {
            formats: vec![
                format("low", "opus", "none", Some(64.0)),
                format("high", "opus", "none", Some(160.0)),
                format("muxed", "aac", "avc1", Some(192.0)),
            ],
        };
        assert_eq!(select_audio_format(&table).unwrap().url, "high");
    }

    #[test]
    fn test_falls_back_to_muxed_audio() {
        let table = FormatTable {
            formats: vec![
                format("video-only", "none", "avc1", None),
                format("muxed", "aac", "avc1", Some(128.0)),
            ],
        };
        assert_eq!(select_audio_format(&table).unwrap().url, "muxed");
    }

    #[test]
    fn test_no_audio_anywhere_is_none() {
        let table = FormatTable {
            formats: vec![format("video-only", "none", "avc1", None)],
        };
        assert!(select_audio_format(&table).is_none());
        assert!(select_audio_format(&FormatTable { formats: vec![] }).is_none());
    }

    #[test]
    fn test_missing_vcodec_counts_as_audio_only() {
        let table = FormatTable {
            formats: vec![MediaFormat {
                url: "bare".to_string(),
                acodec: Some("mp4a".to_string()),
                vcodec: None,
                abr: None,
            }],
        };
        assert_eq!(select_audio_format(&table).unwrap().url, "bare");
    }

    #[test]
    fn test_parse_table_from_json() {
        let json = r#"{
            "formats": [
                { "url": "https://v.example/a", "acodec": "opus", "vcodec": "none", "abr": 160.0 },
                { "url": "https://v.example/b", "acodec": "none", "vcodec": "vp9" }
            ]
        }"#;

        let table: FormatTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.formats.len(), 2);
        assert_eq!(select_audio_format(&table).unwrap().url, "https://v.example/a");
    }
}
