//! Rendering of classification results
//!
//! Text output: icon, upper-cased genre and confidence, then a bar per genre
//! in label order. JSON output is one object per line.

use serde::Serialize;
use timbre_core::dedup::ContentHash;
use timbre_core::{Classification, ClassifyError, PredictionSummary};

/// Width of a full (100%) probability bar in characters
const BAR_WIDTH: usize = 30;

/// JSON record for one successfully classified input
#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub path: &'a str,
    pub hash: &'a ContentHash,
    /// Result reused from an identical earlier input
    pub cached: bool,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_secs: f64,
    #[serde(flatten)]
    pub summary: PredictionSummary,
}

impl<'a> FileReport<'a> {
    pub fn new(path: &'a str, hash: &'a ContentHash, cached: bool, result: &Classification) -> Self {
        Self {
            path,
            hash,
            cached,
            sample_rate: result.sample_rate,
            channels: result.channels,
            duration_secs: result.duration_secs,
            summary: result.prediction.summary(),
        }
    }
}

/// JSON record for one input that failed
#[derive(Debug, Serialize)]
pub struct ErrorReport<'a> {
    pub path: &'a str,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl<'a> ErrorReport<'a> {
    pub fn new(path: &'a str, error: &ClassifyError) -> Self {
        Self {
            path,
            error: ErrorBody {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }
}

/// Horizontal bar for a probability in [0, 1]
pub fn bar(probability: f32) -> String {
    let filled = ((probability.clamp(0.0, 1.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
    let mut s = "█".repeat(filled);
    s.push_str(&"░".repeat(BAR_WIDTH - filled));
    s
}

/// Human-readable report for one classified input
pub fn render_text(path: &str, cached: bool, result: &Classification) -> String {
    let prediction = &result.prediction;
    let (genre, probability) = prediction.top();

    let mut out = String::new();
    out.push_str(&format!(
        "{} ({:.1}s, {} Hz{})\n",
        path,
        result.duration_secs,
        result.sample_rate,
        if cached { ", already analyzed" } else { "" }
    ));
    out.push_str(&format!(
        "  {} {}  {:.1}%\n",
        genre.icon(),
        genre.label().to_uppercase(),
        probability * 100.0
    ));
    out.push_str("  Genre Probabilities\n");
    for gp in prediction.distribution() {
        out.push_str(&format!(
            "    {} {:<10} {} {:>5.1}%\n",
            gp.genre.icon(),
            gp.genre.label(),
            bar(gp.probability),
            gp.probability * 100.0
        ));
    }
    out
}

pub fn render_error_text(path: &str, error: &ClassifyError) -> String {
    format!("{}\n  error ({}): {}\n", path, error.kind(), error)
}
