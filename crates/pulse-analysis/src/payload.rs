use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

/// The envelope sent to the remote vitals-estimation service.
///
/// Frames are base64-encoded JPEG bytes in capture order. Sensor data and
/// user profile are opaque pass-through metadata: they count toward the
/// payload size but are never transformed here.
#[derive(Debug, Serialize)]
pub struct AnalysisPayload {
    pub frames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<Value>,
}

/// Build the outbound envelope for a frame batch.
pub fn build_payload(
    frames: &[Vec<u8>],
    sensor_data: Option<&Value>,
    user_profile: Option<&Value>,
) -> AnalysisPayload {
    AnalysisPayload {
        frames: frames.iter().map(|f| STANDARD.encode(f)).collect(),
        sensor_data: sensor_data.cloned(),
        user_profile: user_profile.cloned(),
    }
}

/// Build the single-image envelope: one raw buffer base64-encoded and
/// forwarded as-is, no compression loop.
pub fn single_image_payload(
    data: &[u8],
    sensor_data: Option<&Value>,
    user_profile: Option<&Value>,
) -> AnalysisPayload {
    AnalysisPayload {
        frames: vec![STANDARD.encode(data)],
        sensor_data: sensor_data.cloned(),
        user_profile: user_profile.cloned(),
    }
}

/// Exact serialized byte size of the outbound envelope.
///
/// This is the compression loop's termination oracle: it measures the full
/// JSON envelope, base64 expansion included, exactly as the wire would see
/// it.
pub fn payload_size(
    frames: &[Vec<u8>],
    sensor_data: Option<&Value>,
    user_profile: Option<&Value>,
) -> Result<usize, serde_json::Error> {
    let payload = build_payload(frames, sensor_data, user_profile);
    Ok(serde_json::to_vec(&payload)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_size_matches_serialized_length() {
        let frames = vec![vec![1u8, 2, 3], vec![4u8; 100]];
        let payload = build_payload(&frames, None, None);
        let expected = serde_json::to_vec(&payload).unwrap().len();
        assert_eq!(payload_size(&frames, None, None).unwrap(), expected);
    }

    #[test]
    fn test_metadata_counts_toward_size() {
        let frames = vec![vec![0u8; 64]];
        let bare = payload_size(&frames, None, None).unwrap();
        let sensor = json!({"ppg": [72, 71, 73], "device": "wrist-01"});
        let with_sensor = payload_size(&frames, Some(&sensor), None).unwrap();
        assert!(with_sensor > bare);

        let profile = json!({"age": 41, "gender": "f"});
        let with_both = payload_size(&frames, Some(&sensor), Some(&profile)).unwrap();
        assert!(with_both > with_sensor);
    }

    #[test]
    fn test_absent_metadata_omitted_from_json() {
        let payload = build_payload(&[vec![9u8; 8]], None, None);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("sensor_data"));
        assert!(!json.contains("user_profile"));
    }

    #[test]
    fn test_single_image_payload_is_raw_base64() {
        let data = vec![0xFFu8, 0xD8, 0xFF, 0xE0];
        let payload = single_image_payload(&data, None, None);
        assert_eq!(payload.frames.len(), 1);
        assert_eq!(payload.frames[0], STANDARD.encode(&data));
    }

    #[test]
    fn test_frames_keep_capture_order() {
        let frames = vec![vec![1u8], vec![2u8], vec![3u8]];
        let payload = build_payload(&frames, None, None);
        let decoded: Vec<Vec<u8>> = payload
            .frames
            .iter()
            .map(|f| STANDARD.decode(f).unwrap())
            .collect();
        assert_eq!(decoded, frames);
    }
}
