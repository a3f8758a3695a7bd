//! Single-frame probing and re-encoding for the pulse analysis pipeline.
//!
//! A captured camera frame enters as raw JPEG bytes and leaves as a smaller
//! JPEG, resized to fit a [`CompressionProfile`] target box. Frames with
//! damaged metadata or corrupt JPEG structure are recovered through an
//! ordered ladder of fallback strategies instead of being dropped.

pub mod error;
pub mod profile;

pub use error::FrameError;
pub use profile::CompressionProfile;

use crates_image::imageops::FilterType;
use crates_image::{DynamicImage, ImageEncoder, ImageFormat, ImageReader};
use log::{debug, info, warn};
use pulse_base::format_bytes;
use std::io::Cursor;

/// Fixed output box for the forced-small fallback strategy.
const FALLBACK_SIZE: (u32, u32) = (480, 360);
/// Quality reduction applied by the forced-small fallback.
const FALLBACK_QUALITY_DROP: u8 = 20;
/// Output box for the final minimal attempt.
const MINIMAL_SIZE: (u32, u32) = (320, 240);
/// Fixed quality for the final minimal attempt.
const MINIMAL_QUALITY: u8 = 40;

/// Re-encode strategies, tried in order until one succeeds.
///
/// Each rung decodes differently, so frames unreadable by one rung can
/// still be recovered by a later one.
#[derive(Clone, Copy, Debug)]
enum Strategy {
    /// Strict format-guessing decode, resize to the profile box, re-encode
    /// as JPEG.
    Direct,
    /// Force each enabled decoder in turn, bypassing magic-byte guessing,
    /// then normalize through a lossless PNG round-trip before the resize
    /// and re-encode.
    PngNormalized,
    /// Salvage decode (re-scan for the JPEG start-of-image marker, skipping
    /// damaged leading bytes), PNG-normalized at a fixed small box with
    /// reduced quality.
    ForcedSmall,
    /// Final attempt: salvage decode into a bounded thumbnail at fixed low
    /// quality, no metadata-dependent logic.
    Minimal,
}

const STRATEGIES: [Strategy; 4] = [
    Strategy::Direct,
    Strategy::PngNormalized,
    Strategy::ForcedSmall,
    Strategy::Minimal,
];

/// Reads image dimensions from the header without a full decode.
///
/// Returns `None` when the metadata is missing or unreadable; never errors.
pub fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format().ok()?;
    reader.into_dimensions().ok()
}

fn decode(data: &[u8]) -> Result<DynamicImage, FrameError> {
    Ok(crates_image::load_from_memory(data)?)
}

/// Decode with each enabled format forced in turn, bypassing magic-byte
/// guessing. Recovers frames whose leading bytes defeat format detection
/// but whose stream a decoder still accepts.
fn decode_forced(data: &[u8]) -> Result<DynamicImage, FrameError> {
    crates_image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .or_else(|_| crates_image::load_from_memory_with_format(data, ImageFormat::Png))
        .map_err(FrameError::from)
}

/// Salvage decode: re-scan for the JPEG start-of-image marker and decode
/// from there, skipping damaged leading bytes (broken EXIF prefixes,
/// corrupt container headers).
fn decode_salvaged(data: &[u8]) -> Result<DynamicImage, FrameError> {
    let start = data
        .windows(3)
        .position(|w| w == [0xFF, 0xD8, 0xFF])
        .ok_or_else(|| FrameError::Decode("no JPEG start-of-image marker".to_string()))?;
    crates_image::load_from_memory_with_format(&data[start..], ImageFormat::Jpeg)
        .map_err(FrameError::from)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, FrameError> {
    // JPEG has no alpha; everything goes through Rgb8.
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut buffer = Vec::new();
    let encoder = crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(rgb.as_raw(), width, height, crates_image::ExtendedColorType::Rgb8)
        .map_err(|e| FrameError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Round-trips the pixels through lossless PNG so that byte-level JPEG
/// quirks (bad progressive segments, damaged metadata) do not survive into
/// the re-encode.
fn normalize_png(img: &DynamicImage) -> Result<DynamicImage, FrameError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| FrameError::Encode(e.to_string()))?;
    decode(&buffer)
}

fn resize_to_profile(img: DynamicImage, profile: &CompressionProfile) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let (out_w, out_h) = profile.fit(width, height);
    if (out_w, out_h) != (width, height) {
        info!(
            "resizing frame {}x{} -> {}x{} at q{}",
            width,
            height,
            out_w,
            out_h,
            profile.quality()
        );
        img.resize_exact(out_w, out_h, FilterType::Triangle)
    } else {
        debug!(
            "frame {}x{} already fits target box, quality-only re-encode at q{}",
            width,
            height,
            profile.quality()
        );
        img
    }
}

fn apply_strategy(
    data: &[u8],
    profile: &CompressionProfile,
    strategy: Strategy,
) -> Result<Vec<u8>, FrameError> {
    match strategy {
        Strategy::Direct => {
            let img = resize_to_profile(decode(data)?, profile);
            encode_jpeg(&img, profile.quality())
        }
        Strategy::PngNormalized => {
            let img = resize_to_profile(normalize_png(&decode_forced(data)?)?, profile);
            encode_jpeg(&img, profile.quality())
        }
        Strategy::ForcedSmall => {
            let quality = profile
                .quality()
                .saturating_sub(FALLBACK_QUALITY_DROP)
                .max(20);
            let small = CompressionProfile::new(FALLBACK_SIZE.0, FALLBACK_SIZE.1, quality);
            let img = resize_to_profile(normalize_png(&decode_salvaged(data)?)?, &small);
            encode_jpeg(&img, quality)
        }
        Strategy::Minimal => {
            let img = decode_salvaged(data)?.thumbnail(MINIMAL_SIZE.0, MINIMAL_SIZE.1);
            encode_jpeg(&img, MINIMAL_QUALITY)
        }
    }
}

/// Re-encodes one frame according to the given profile.
///
/// Strategies are tried in ladder order; the first success wins. The frame
/// is never enlarged and its aspect ratio is preserved. When every strategy
/// fails the last error is returned; the frame is never silently dropped.
///
/// # Errors
///
/// Returns `FrameError` when the data cannot be decoded or re-encoded by
/// any strategy on the ladder.
pub fn recompress_frame_inner(
    data: &[u8],
    profile: &CompressionProfile,
) -> Result<Vec<u8>, FrameError> {
    if probe_dimensions(data).is_none() {
        debug!("frame dimension metadata unreadable, relying on full decode");
    }

    let mut last_err = FrameError::Decode("empty frame".to_string());
    for strategy in STRATEGIES {
        match apply_strategy(data, profile, strategy) {
            Ok(out) => {
                if !matches!(strategy, Strategy::Direct) {
                    warn!(
                        "frame recovered via fallback strategy {:?} ({})",
                        strategy,
                        format_bytes(out.len())
                    );
                }
                return Ok(out);
            }
            Err(err) => {
                debug!("re-encode strategy {:?} failed: {err}", strategy);
                last_err = err;
            }
        }
    }
    Err(last_err)
}

/// Async wrapper over [`recompress_frame_inner`].
///
/// The CPU-bound decode/resize/encode work runs on tokio's blocking thread
/// pool.
pub async fn recompress_frame(
    data: Vec<u8>,
    profile: CompressionProfile,
) -> Result<Vec<u8>, FrameError> {
    tokio::task::spawn_blocking(move || recompress_frame_inner(&data, &profile))
        .await
        .map_err(|e| FrameError::Encode(format!("re-encode task failed: {e}")))?
}
