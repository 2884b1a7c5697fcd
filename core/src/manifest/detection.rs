use crate::prelude::ViewerResult;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::io::Read;

/// Class assigned to detections whose class is missing, empty or not a name.
pub const UNKNOWN_CLASS: &str = "unknown";

/// Per-video detection manifest as written by the backend.
///
/// Deserialization is lenient: odd records are kept as raw values and repaired
/// later by the index builder, so only syntactically broken JSON is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence_threshold: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub frames: Vec<FrameRecord>,
}

impl DetectionManifest {
    pub fn from_json(contents: &str) -> ViewerResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> ViewerResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn total_detections(&self) -> usize {
        self.frames.iter().map(|frame| frame.detections.len()).sum()
    }
}

/// One sampled frame and everything detected in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(rename = "frame", alias = "name", default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub detections: Vec<RawDetection>,
}

impl FrameRecord {
    pub fn new(name: impl Into<String>, detections: Vec<RawDetection>) -> Self {
        Self {
            name: name.into(),
            detections,
        }
    }
}

/// Detection exactly as received; fields may be missing or mistyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub class: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub bbox: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub conf: Value,
}

impl RawDetection {
    pub fn new(class: &str, bbox: [f64; 4], conf: f64) -> Self {
        Self {
            class: json!(class),
            bbox: json!(bbox),
            conf: json!(conf),
        }
    }

    /// Class name, or [`UNKNOWN_CLASS`] when absent or empty.
    pub fn class_name(&self) -> String {
        match &self.class {
            Value::String(name) if !name.is_empty() => name.clone(),
            Value::Number(number) => number.to_string(),
            _ => UNKNOWN_CLASS.to_string(),
        }
    }

    /// Exactly four components; anything missing or non-numeric becomes 0.
    pub fn normalized_bbox(&self) -> [f64; 4] {
        let mut bbox = [0.0; 4];
        if let Value::Array(values) = &self.bbox {
            for (slot, value) in bbox.iter_mut().zip(values.iter()) {
                *slot = coerce_number(value).unwrap_or(0.0);
            }
        }
        bbox
    }

    pub fn normalized_conf(&self) -> f64 {
        coerce_number(&self.conf).unwrap_or(0.0)
    }

    pub fn normalize(&self) -> Detection {
        Detection {
            bbox: self.normalized_bbox(),
            conf: self.normalized_conf(),
        }
    }
}

/// Normalized detection stored in the class index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: [f64; 4],
    pub conf: f64,
}

impl Detection {
    /// Raw values as shown in the viewer's detail rows.
    pub fn raw_text(&self) -> String {
        json!({ "bbox": self.bbox, "conf": self.conf }).to_string()
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value).unwrap_or(0.0))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_reads_backend_layout() {
        let manifest = DetectionManifest::from_json(
            r#"{"video_id":"abc123","confidence_threshold":0.5,"frames":[
                {"frame":"frame_0001.jpg","detections":[{"class":"car","bbox":[1,2,3,4],"conf":0.9}]},
                {"frame":"frame_0002.jpg","detections":[]}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.video_id.as_deref(), Some("abc123"));
        assert_eq!(manifest.frames.len(), 2);
        assert_eq!(manifest.frames[0].name, "frame_0001.jpg");
        assert_eq!(manifest.total_detections(), 1);
    }

    #[test]
    fn malformed_records_are_repaired_not_rejected() {
        let manifest = DetectionManifest::from_json(
            r#"{"confidence_threshold":"high","frames":[
                {"name":"frame_3.jpg","detections":[
                    {"bbox":[1,"x",null]},
                    {"class":"","bbox":"nope","conf":"0.25"},
                    {"class":7,"bbox":[1,2,3,4,5],"conf":true}]},
                {"frame":"frame_4.jpg","detections":null}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.confidence_threshold, 0.0);
        let detections = &manifest.frames[0].detections;
        assert_eq!(detections[0].class_name(), UNKNOWN_CLASS);
        assert_eq!(detections[0].normalized_bbox(), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(detections[0].normalized_conf(), 0.0);
        assert_eq!(detections[1].class_name(), UNKNOWN_CLASS);
        assert_eq!(detections[1].normalized_bbox(), [0.0; 4]);
        assert_eq!(detections[1].normalized_conf(), 0.25);
        assert_eq!(detections[2].class_name(), "7");
        assert_eq!(detections[2].normalized_bbox(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(detections[2].normalized_conf(), 0.0);
        assert!(manifest.frames[1].detections.is_empty());
    }

    #[test]
    fn broken_json_is_an_error() {
        assert!(DetectionManifest::from_json("{\"frames\": [").is_err());
    }

    #[test]
    fn raw_text_lists_bbox_and_conf() {
        let detection = RawDetection::new("car", [1.0, 2.0, 3.0, 4.0], 0.5).normalize();
        assert_eq!(detection.raw_text(), r#"{"bbox":[1.0,2.0,3.0,4.0],"conf":0.5}"#);
    }
}
