//! Container detection for uploaded audio
//!
//! Only MP3 and WAV are accepted. The extension wins when present; otherwise
//! the leading bytes are sniffed.

use std::path::Path;

use crate::error::{ClassifyError, Result};

/// Audio containers the pipeline accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// Canonical file extension (also used as the temp-file suffix)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Resolve from a file extension (case-insensitive, leading dot allowed)
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" | "wave" => Ok(Self::Wav),
            other => Err(ClassifyError::UnsupportedFormat(format!(
                "'.{}' files are not supported (expected mp3 or wav)",
                other
            ))),
        }
    }

    /// Detect the container from the first bytes of the stream
    ///
    /// Returns `None` when nothing recognizable is found.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(Self::Wav);
        }
        if bytes.starts_with(b"ID3") {
            return Some(Self::Mp3);
        }
        // MPEG audio frame sync: 11 set bits, layer bits non-zero
        if bytes.len() >= 2 && bytes[0] == 0xFF && (bytes[1] & 0xE0) == 0xE0 && (bytes[1] & 0x06) != 0 {
            return Some(Self::Mp3);
        }
        None
    }

    /// Resolve the format of a file on disk, by extension or content
    pub fn for_path(path: &Path) -> Result<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            return Self::from_extension(ext);
        }

        let mut head = [0u8; 12];
        let n = read_head(path, &mut head).map_err(|e| {
            ClassifyError::Decode(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::sniff(&head[..n]).ok_or_else(|| {
            ClassifyError::UnsupportedFormat(format!(
                "could not recognize the container of {}",
                path.display()
            ))
        })
    }

    /// Resolve the format of an in-memory upload
    ///
    /// `name_hint` is the original file name, if the caller has one.
    pub fn for_upload(bytes: &[u8], name_hint: Option<&str>) -> Result<Self> {
        let ext = name_hint
            .map(Path::new)
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str());
        if let Some(ext) = ext {
            return Self::from_extension(ext);
        }
        Self::sniff(bytes).ok_or_else(|| {
            ClassifyError::UnsupportedFormat("could not recognize the uploaded container".to_string())
        })
    }
}

fn read_head(path: &Path, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
