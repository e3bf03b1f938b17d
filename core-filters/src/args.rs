//! # Transcoder Argument Builder
//!
//! Turns a [`FilterSet`] and an optional seek offset into the full ffmpeg
//! argument vector for the transcode pipeline.
//!
//! ## Argument layout
//!
//! ffmpeg distinguishes input options (before `-i`) from output options
//! (after), and the builder owns that layout so no later stage has to
//! reorder anything:
//!
//! ```text
//! -analyzeduration 0 -loglevel 0        probe/log flags
//! [-ss <secs>]                          input-side seek
//! -i pipe:0                             raw stream on stdin
//! -preset veryfast -f s16le -ar 48000 -ac 2 -vn
//! [-af <graph>]                         filter chain, insertion order
//! pipe:1                                framed PCM on stdout
//! ```
//!
//! The seek is deliberately an *input* option: ffmpeg then seeks before
//! decoding instead of decoding the skipped prefix and throwing it away.

use crate::filter_set::FilterSet;

/// Output sample rate of the transcoded PCM stream.
pub const SAMPLE_RATE_HZ: u32 = 48_000;

/// Output channel count.
pub const CHANNEL_COUNT: u32 = 2;

/// Builder for one transcoder invocation's argument vector.
///
/// Borrows the filter set; building never mutates it.
#[derive(Debug, Clone)]
pub struct TranscodeArgs<'a> {
    filters: &'a FilterSet,
    seek_seconds: Option<u64>,
}

impl<'a> TranscodeArgs<'a> {
    pub fn new(filters: &'a FilterSet) -> Self {
        Self {
            filters,
            seek_seconds: None,
        }
    }

    /// Start decoding at an absolute offset (whole seconds).
    pub fn with_seek(mut self, seconds: u64) -> Self {
        self.seek_seconds = Some(seconds);
        self
    }

    /// Returns `true` if this invocation actually needs the transcoder.
    ///
    /// With no filters and no seek, the raw stream can be wrapped directly
    /// into a resource and the external process is skipped entirely.
    pub fn requires_transcode(&self) -> bool {
        !self.filters.is_empty() || self.seek_seconds.is_some()
    }

    /// Builds the argument vector.
    pub fn build(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-analyzeduration".into(),
            "0".into(),
            "-loglevel".into(),
            "0".into(),
        ];

        if let Some(seconds) = self.seek_seconds {
            args.push("-ss".into());
            args.push(seconds.to_string());
        }

        args.push("-i".into());
        args.push("pipe:0".into());

        args.extend([
            "-preset".to_string(),
            "veryfast".to_string(),
            "-f".to_string(),
            "s16le".to_string(),
            "-ar".to_string(),
            SAMPLE_RATE_HZ.to_string(),
            "-ac".to_string(),
            CHANNEL_COUNT.to_string(),
            "-vn".to_string(),
        ]);

        if !self.filters.is_empty() {
            args.push("-af".into());
            args.push(self.filters.graph());
        }

        args.push("pipe:1".into());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_arg(args: &[String]) -> Option<&String> {
        args.iter()
            .position(|a| a == "-af")
            .map(|i| &args[i + 1])
    }

    #[test]
    fn test_empty_set_appends_no_filter_argument() {
        let filters = FilterSet::new();
        let args = TranscodeArgs::new(&filters).build();

        assert!(!args.iter().any(|a| a == "-af"));
        assert_eq!(args.last().unwrap(), "pipe:1");
    }

    #[test]
    fn test_non_empty_set_appends_exactly_one_filter_argument() {
        let mut filters = FilterSet::new();
        filters.insert("speed", 1.5).unwrap();
        filters.insert("pitch", 2).unwrap();

        let args = TranscodeArgs::new(&filters).build();
        assert_eq!(args.iter().filter(|a| *a == "-af").count(), 1);
        assert_eq!(filter_arg(&args).unwrap(), "speed=1.5,pitch=2");
    }

    #[test]
    fn test_reordering_changes_output() {
        let mut ab = FilterSet::new();
        ab.insert("speed", 1.5).unwrap();
        ab.insert("pitch", 2).unwrap();

        let mut ba = FilterSet::new();
        ba.insert("pitch", 2).unwrap();
        ba.insert("speed", 1.5).unwrap();

        assert_ne!(
            filter_arg(&TranscodeArgs::new(&ab).build()),
            filter_arg(&TranscodeArgs::new(&ba).build())
        );
    }

    #[test]
    fn test_seek_is_an_input_option() {
        let filters = FilterSet::new();
        let args = TranscodeArgs::new(&filters).with_seek(42).build();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[ss + 1], "42");
        assert!(ss < input, "-ss must precede -i");
    }

    #[test]
    fn test_no_seek_no_ss_flag() {
        let filters = FilterSet::new();
        let args = TranscodeArgs::new(&filters).build();
        assert!(!args.iter().any(|a| a == "-ss"));
    }

    #[test]
    fn test_base_output_format() {
        let filters = FilterSet::new();
        let args = TranscodeArgs::new(&filters).build();

        let ar = args.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(args[ar + 1], "48000");
        let ac = args.iter().position(|a| a == "-ac").unwrap();
        assert_eq!(args[ac + 1], "2");
        assert!(args.iter().any(|a| a == "-vn"));
        assert!(args.iter().any(|a| a == "s16le"));
    }

    #[test]
    fn test_requires_transcode() {
        let empty = FilterSet::new();
        assert!(!TranscodeArgs::new(&empty).requires_transcode());
        assert!(TranscodeArgs::new(&empty).with_seek(10).requires_transcode());

        let mut filters = FilterSet::new();
        filters.insert("speed", 1.5).unwrap();
        assert!(TranscodeArgs::new(&filters).requires_transcode());
    }

    #[test]
    fn test_build_never_mutates_the_set() {
        let mut filters = FilterSet::new();
        filters.insert("speed", 1.5).unwrap();
        let before = filters.clone();

        let _ = TranscodeArgs::new(&filters).with_seek(5).build();
        assert_eq!(filters, before);
    }
}
