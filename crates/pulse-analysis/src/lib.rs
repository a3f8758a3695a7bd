//! Adaptive payload compression for camera-based vitals analysis.
//!
//! A batch of captured video frames must reach the remote vitals-estimation
//! service as a single bounded-size base64 JSON payload. This crate owns
//! the feedback loop that gets it there: measure the serialized size, walk
//! a ladder of re-encode profiles until the payload fits, drop trailing
//! frames when compression stops paying, and fail loudly when the hard
//! ceiling cannot be met.
//!
//! The caller keeps frames in capture order; the batch that comes back is
//! always an order-preserving prefix of what went in. Issuing the outbound
//! HTTP call is the caller's job.

pub mod compressor;
pub mod config;
pub mod error;
pub mod payload;

pub use compressor::{compress_frames, CompressedBatch};
pub use config::CompressorConfig;
pub use error::AnalysisError;
pub use payload::{build_payload, payload_size, single_image_payload, AnalysisPayload};
