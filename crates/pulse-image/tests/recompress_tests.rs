use crates_image::{ImageEncoder, Rgb, RgbImage};
use pulse_image::{probe_dimensions, recompress_frame, CompressionProfile};

/// Encode a checkerboard test pattern as JPEG bytes.
fn checkerboard_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([20, 40, 60])
        }
    });
    let mut buffer = Vec::new();
    let encoder = crates_image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(
            img.as_raw(),
            width,
            height,
            crates_image::ExtendedColorType::Rgb8,
        )
        .expect("fixture encode failed");
    buffer
}

fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
    let img = crates_image::load_from_memory(data).expect("decode failed");
    (img.width(), img.height())
}

#[tokio::test]
async fn test_recompress_downscales_to_box() {
    let frame = checkerboard_jpeg(1280, 960, 90);
    let profile = CompressionProfile::new(640, 480, 60);

    let out = recompress_frame(frame, profile).await.expect("recompress failed");
    assert_eq!(decoded_dimensions(&out), (640, 480));
}

#[tokio::test]
async fn test_recompress_preserves_aspect_ratio() {
    // 2:1 landscape constrained by width
    let frame = checkerboard_jpeg(1200, 600, 90);
    let profile = CompressionProfile::new(600, 480, 60);

    let out = recompress_frame(frame, profile).await.expect("recompress failed");
    assert_eq!(decoded_dimensions(&out), (600, 300));
}

#[tokio::test]
async fn test_recompress_never_upscales() {
    let frame = checkerboard_jpeg(320, 240, 90);
    let profile = CompressionProfile::new(1280, 960, 80);

    let out = recompress_frame(frame, profile).await.expect("recompress failed");
    // Larger target box must not enlarge the frame
    assert_eq!(decoded_dimensions(&out), (320, 240));
}

#[tokio::test]
async fn test_recompress_quality_only_shrinks_bytes() {
    let frame = checkerboard_jpeg(320, 240, 95);
    let original_len = frame.len();
    let profile = CompressionProfile::new(1280, 960, 30);

    let out = recompress_frame(frame, profile).await.expect("recompress failed");
    assert_eq!(decoded_dimensions(&out), (320, 240));
    assert!(
        out.len() < original_len,
        "q30 re-encode should be smaller than q95 original ({} vs {})",
        out.len(),
        original_len
    );
}

#[tokio::test]
async fn test_recompress_recovers_garbage_prefixed_jpeg() {
    // Damaged leading bytes defeat both format guessing and a forced
    // decode from offset zero; only the marker-rescan fallback rungs can
    // recover this frame
    let mut frame = vec![0u8; 32];
    frame.extend_from_slice(&checkerboard_jpeg(640, 480, 90));
    let profile = CompressionProfile::new(640, 480, 60);

    let out = recompress_frame(frame, profile)
        .await
        .expect("salvage decode should recover the frame");
    let (w, h) = decoded_dimensions(&out);
    assert!(w <= 640 && h <= 480);
}

#[tokio::test]
async fn test_recompress_tolerates_truncated_jpeg() {
    // A transfer cut off mid-scan must still yield a usable frame, or at
    // worst a FrameError, never an unrelated failure
    let full = checkerboard_jpeg(640, 480, 90);
    let truncated = full[..full.len() * 9 / 10].to_vec();
    let profile = CompressionProfile::new(640, 480, 60);

    let out = recompress_frame(truncated, profile)
        .await
        .expect("truncated JPEG should still re-encode");
    let (w, h) = decoded_dimensions(&out);
    assert!(w <= 640 && h <= 480);
}

#[tokio::test]
async fn test_recompress_rejects_garbage() {
    let garbage = vec![0x42u8; 4096];
    let profile = CompressionProfile::new(640, 480, 60);

    let result = recompress_frame(garbage, profile).await;
    assert!(result.is_err(), "garbage bytes must not re-encode");
}

#[test]
fn test_probe_dimensions_valid_jpeg() {
    let frame = checkerboard_jpeg(640, 480, 80);
    assert_eq!(probe_dimensions(&frame), Some((640, 480)));
}

#[test]
fn test_probe_dimensions_garbage() {
    assert_eq!(probe_dimensions(&[0u8; 64]), None);
    assert_eq!(probe_dimensions(&[]), None);
}
