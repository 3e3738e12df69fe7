//! Audio file decoding via Symphonia
//!
//! Decodes MP3/WAV to mono f32 at the file's own sample rate. No resampling is
//! applied: the model was trained on spectrograms computed at native rate.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::format::AudioFormat;
use super::AudioSignal;
use crate::error::{ClassifyError, Result};

/// Decode an audio file into a mono [`AudioSignal`]
///
/// # Errors
///
/// - [`ClassifyError::UnsupportedFormat`] if the container is not MP3/WAV or the
///   codec inside it has no decoder
/// - [`ClassifyError::Decode`] if the file can't be read, can't be probed as the
///   container it claims to be, or yields no samples
pub fn decode_file(path: &Path) -> Result<AudioSignal> {
    let format = AudioFormat::for_path(path)?;

    let file = File::open(path).map_err(|e| {
        ClassifyError::Decode(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| {
            ClassifyError::Decode(format!(
                "{} is not a readable {} stream: {}",
                path.display(),
                format.extension(),
                e
            ))
        })?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ClassifyError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| ClassifyError::Decode("Unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| match e {
            SymphoniaError::Unsupported(what) => ClassifyError::UnsupportedFormat(what.to_string()),
            other => ClassifyError::Decode(other.to_string()),
        })?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut channels: usize = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet from {}: {}", path.display(), e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => {
                return Err(ClassifyError::Decode(format!(
                    "Decoder failed on {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if interleaved.is_empty() || channels == 0 {
        return Err(ClassifyError::Decode(format!(
            "No audio could be decoded from {}",
            path.display()
        )));
    }

    if skipped_packets > 0 {
        log::warn!("{} corrupt packets skipped in {}", skipped_packets, path.display());
    }

    let samples = downmix_to_mono(&interleaved, channels);

    log::debug!(
        "Decoded {}: {} frames, {} Hz, {} channel(s)",
        path.display(),
        samples.len(),
        sample_rate,
        channels
    );

    Ok(AudioSignal {
        samples,
        sample_rate,
        channels: channels as u16,
    })
}

/// Average interleaved channels into a single mono channel
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 | 1 => interleaved.to_vec(),
        n => interleaved
            .chunks(n)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect(),
    }
}
