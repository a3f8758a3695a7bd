use crate::config::CompressorConfig;
use crate::error::AnalysisError;
use crate::payload::payload_size;
use log::{debug, info, warn};
use pulse_base::format_bytes;
use pulse_image::{recompress_frame, CompressionProfile};
use serde_json::Value;

/// A frame batch whose serialized payload fits the configured ceiling.
#[derive(Debug)]
pub struct CompressedBatch {
    /// The surviving frames in capture order, possibly re-encoded and
    /// truncated from the tail.
    pub frames: Vec<Vec<u8>>,
    /// Measured size of the serialized envelope for these frames.
    pub payload_size_bytes: usize,
}

/// Re-encode every frame of one attempt in parallel on the blocking pool.
///
/// Tasks are joined in spawn order so the output sequence matches the input
/// sequence regardless of completion order. A frame that exhausts its local
/// fallback ladder aborts the batch with its index.
async fn recompress_batch(
    frames: Vec<Vec<u8>>,
    profile: CompressionProfile,
) -> Result<Vec<Vec<u8>>, AnalysisError> {
    let mut tasks = Vec::with_capacity(frames.len());
    for frame in frames {
        tasks.push(tokio::spawn(recompress_frame(frame, profile)));
    }

    let mut out = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.into_iter().enumerate() {
        let frame = task
            .await
            .map_err(|e| AnalysisError::FrameEncode {
                index,
                source: pulse_image::FrameError::Encode(format!("encode task failed: {e}")),
            })?
            .map_err(|source| AnalysisError::FrameEncode { index, source })?;
        out.push(frame);
    }
    Ok(out)
}

/// Shrink a frame batch until its serialized payload fits the configured
/// limits.
///
/// Batches already under the compression threshold pass through untouched.
/// Otherwise the controller walks the profile ladder, re-encoding the whole
/// batch per attempt and re-measuring, dropping trailing frames when
/// compression alone stops helping, and finally truncating harder if the
/// hard ceiling is still exceeded. Between target and ceiling the result is
/// accepted with a warning; above the ceiling the run fails.
///
/// Frame order is never changed: truncation only removes from the tail,
/// because the earliest frames anchor the temporal signal.
///
/// # Errors
///
/// - `AnalysisError::EmptyInput` when no frames are supplied.
/// - `AnalysisError::FrameEncode` when a frame exhausts its re-encode
///   fallback ladder; carries the frame index.
/// - `AnalysisError::PayloadTooLarge` when the payload still exceeds the
///   hard ceiling after every compression and truncation step.
pub async fn compress_frames(
    mut frames: Vec<Vec<u8>>,
    sensor_data: Option<&Value>,
    user_profile: Option<&Value>,
    config: &CompressorConfig,
) -> Result<CompressedBatch, AnalysisError> {
    if frames.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    if frames.len() > config.max_frames() {
        warn!(
            "dropping {} surplus frames beyond the {}-frame cap",
            frames.len() - config.max_frames(),
            config.max_frames()
        );
        frames.truncate(config.max_frames());
    }

    let initial_size = payload_size(&frames, sensor_data, user_profile)?;
    if initial_size <= config.compression_threshold_bytes() {
        debug!(
            "payload {} under the {} threshold, no compression needed",
            format_bytes(initial_size),
            format_bytes(config.compression_threshold_bytes())
        );
        return Ok(CompressedBatch {
            frames,
            payload_size_bytes: initial_size,
        });
    }

    let starting_rung = config.starting_rung(initial_size);
    info!(
        "payload {} exceeds the {} threshold, compressing {} frames from rung {}",
        format_bytes(initial_size),
        format_bytes(config.compression_threshold_bytes()),
        frames.len(),
        starting_rung
    );

    let mut size = initial_size;
    let mut attempts_used = 0;
    for attempt in 1..=config.max_attempts() {
        attempts_used = attempt;
        let profile = config.profile_for_attempt(starting_rung, attempt);
        frames = recompress_batch(frames, profile).await?;

        let before = size;
        size = payload_size(&frames, sensor_data, user_profile)?;
        let ratio = before.saturating_sub(size) as f64 / before.max(1) as f64;
        info!(
            "attempt {}: {} -> {} ({:.0}% saved)",
            attempt,
            format_bytes(before),
            format_bytes(size),
            ratio * 100.0
        );

        if size <= config.target_payload_bytes() {
            break;
        }

        // Compression alone is not helping; reduce volume from the tail.
        if attempt >= 2
            && ratio < config.low_effectiveness_ratio()
            && frames.len() > config.min_frames()
        {
            warn!(
                "attempt {} saved under {:.0}%, dropping trailing frames {} -> {}",
                attempt,
                config.low_effectiveness_ratio() * 100.0,
                frames.len(),
                config.min_frames()
            );
            frames.truncate(config.min_frames());
            size = payload_size(&frames, sensor_data, user_profile)?;
            if size <= config.target_payload_bytes() {
                break;
            }
        }
    }

    // Escalate: compression is exhausted, truncate harder if the hard
    // ceiling is still exceeded.
    if size > config.max_payload_bytes() {
        let keep = ((config.max_payload_bytes() as f64 / size as f64) * frames.len() as f64)
            .floor() as usize;
        let keep = keep.max(1).min(frames.len());
        if keep < frames.len() {
            warn!(
                "payload {} still over the {} ceiling, truncating {} -> {} frames",
                format_bytes(size),
                format_bytes(config.max_payload_bytes()),
                frames.len(),
                keep
            );
            frames.truncate(keep);
            size = payload_size(&frames, sensor_data, user_profile)?;
        }
        if size > config.max_payload_bytes() {
            return Err(AnalysisError::PayloadTooLarge {
                size_bytes: size,
                max_bytes: config.max_payload_bytes(),
            });
        }
    }

    if size > config.target_payload_bytes() {
        warn!(
            "payload {} exceeds the {} target but fits the hard ceiling",
            format_bytes(size),
            format_bytes(config.target_payload_bytes())
        );
    }

    info!(
        "compression run: {} -> {} over {} attempts, {} frames kept",
        format_bytes(initial_size),
        format_bytes(size),
        attempts_used,
        frames.len()
    );
    Ok(CompressedBatch {
        frames,
        payload_size_bytes: size,
    })
}
