use pulse_base::bytes::mib;
use pulse_image::CompressionProfile;

/// Limits and ladder for one compression run.
///
/// Defaults are the most defensive parameter set: compression starts above
/// 10 MB, aims for 8 MB, and hard-fails above 16 MB.
#[derive(Clone, Debug)]
pub struct CompressorConfig {
    max_frames: usize,
    min_frames: usize,
    compression_threshold_bytes: usize,
    target_payload_bytes: usize,
    max_payload_bytes: usize,
    max_attempts: usize,
    low_effectiveness_ratio: f64,
    ladder: Vec<CompressionProfile>,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_frames: 12,
            min_frames: 6,
            compression_threshold_bytes: mib(10),
            target_payload_bytes: mib(8),
            max_payload_bytes: mib(16),
            max_attempts: 4,
            low_effectiveness_ratio: 0.10,
            ladder: vec![
                CompressionProfile::new(1280, 960, 80),
                CompressionProfile::new(1024, 768, 70),
                CompressionProfile::new(800, 600, 60),
                CompressionProfile::new(640, 480, 50),
                CompressionProfile::new(480, 360, 40),
                CompressionProfile::new(320, 240, 30),
            ],
        }
    }
}

impl CompressorConfig {
    /// Set the frame cap applied at controller entry.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Set the floor for low-effectiveness frame dropping.
    pub fn with_min_frames(mut self, min_frames: usize) -> Self {
        self.min_frames = min_frames;
        self
    }

    /// Set the payload size above which compression starts.
    pub fn with_compression_threshold_bytes(mut self, bytes: usize) -> Self {
        self.compression_threshold_bytes = bytes;
        self
    }

    /// Set the best-effort payload size target.
    pub fn with_target_payload_bytes(mut self, bytes: usize) -> Self {
        self.target_payload_bytes = bytes;
        self
    }

    /// Set the hard payload ceiling.
    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    /// Set the maximum number of compression attempts before escalation.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the bytes-saved ratio below which an attempt counts as
    /// ineffective.
    pub fn with_low_effectiveness_ratio(mut self, ratio: f64) -> Self {
        self.low_effectiveness_ratio = ratio;
        self
    }

    /// Replace the profile ladder (ordered mild to aggressive).
    pub fn with_ladder(mut self, ladder: Vec<CompressionProfile>) -> Self {
        self.ladder = ladder;
        self
    }

    // Getters
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn min_frames(&self) -> usize {
        self.min_frames
    }

    pub fn compression_threshold_bytes(&self) -> usize {
        self.compression_threshold_bytes
    }

    pub fn target_payload_bytes(&self) -> usize {
        self.target_payload_bytes
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn low_effectiveness_ratio(&self) -> f64 {
        self.low_effectiveness_ratio
    }

    pub fn ladder(&self) -> &[CompressionProfile] {
        &self.ladder
    }

    /// Starting ladder rung for a run, a pure function of the initial
    /// payload size: larger initial payloads skip the mild rungs.
    ///
    /// Bands are multiples of the compression threshold: up to 2x starts at
    /// rung 0, up to 4x at rung 1, up to 8x at rung 2, beyond that rung 3.
    pub fn starting_rung(&self, initial_size: usize) -> usize {
        let threshold = self.compression_threshold_bytes.max(1);
        let rung = if initial_size <= threshold * 2 {
            0
        } else if initial_size <= threshold * 4 {
            1
        } else if initial_size <= threshold * 8 {
            2
        } else {
            3
        };
        rung.min(self.ladder.len().saturating_sub(1))
    }

    /// Profile for a given attempt: one rung past the previous attempt,
    /// clamped to the most aggressive rung.
    pub fn profile_for_attempt(&self, starting_rung: usize, attempt: usize) -> CompressionProfile {
        let last = self.ladder.len().saturating_sub(1);
        let rung = (starting_rung + attempt.saturating_sub(1)).min(last);
        self.ladder[rung]
    }
}
