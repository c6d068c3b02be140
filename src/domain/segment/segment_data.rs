//! Finalized segment value object

use std::fmt;

/// Encodings a finalized segment can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentEncoding {
    Flac,
    Wav,
}

impl SegmentEncoding {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for SegmentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for SegmentEncoding {
    fn default() -> Self {
        Self::Flac
    }
}

/// Value object representing one finalized recording segment.
/// The bytes are immutable after finalization; a failed upload resends
/// the exact same data rather than re-capturing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentData {
    data: Vec<u8>,
    encoding: SegmentEncoding,
}

impl SegmentData {
    /// Create SegmentData from raw bytes
    pub fn new(data: Vec<u8>, encoding: SegmentEncoding) -> Self {
        Self { data, encoding }
    }

    /// Get the raw segment bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume and return the raw bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Get the encoding
    pub fn encoding(&self) -> SegmentEncoding {
        self.encoding
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_as_str() {
        assert_eq!(SegmentEncoding::Flac.as_str(), "audio/flac");
        assert_eq!(SegmentEncoding::Wav.as_str(), "audio/wav");
    }

    #[test]
    fn encoding_extension() {
        assert_eq!(SegmentEncoding::Flac.extension(), "flac");
        assert_eq!(SegmentEncoding::Wav.extension(), "wav");
    }

    #[test]
    fn default_encoding_is_flac() {
        assert_eq!(SegmentEncoding::default(), SegmentEncoding::Flac);
    }

    #[test]
    fn segment_size() {
        let data = SegmentData::new(vec![0u8; 1024], SegmentEncoding::Flac);
        assert_eq!(data.size_bytes(), 1024);
    }

    #[test]
    fn human_readable_size_bytes() {
        let data = SegmentData::new(vec![0u8; 500], SegmentEncoding::Wav);
        assert_eq!(data.human_readable_size(), "500 B");
    }

    #[test]
    fn human_readable_size_kb() {
        let data = SegmentData::new(vec![0u8; 2048], SegmentEncoding::Flac);
        assert_eq!(data.human_readable_size(), "2.0 KB");
    }

    #[test]
    fn human_readable_size_mb() {
        let data = SegmentData::new(vec![0u8; 2 * 1024 * 1024], SegmentEncoding::Flac);
        assert_eq!(data.human_readable_size(), "2.0 MB");
    }
}
