use std::io::Read;
use std::path::Path;

use serde_derive::Deserialize;

use crate::bbox::{BBox, BoxFormat};
use crate::detection::{Detection, Keypoint};
use crate::error::{FormatError, Result};

/// One record of pose-estimator output. Accepts both AlphaPose field names
/// (`image_id`, `score`) and the canonical ones (`frame_id`, `confidence`).
#[derive(Deserialize, Debug, Clone)]
pub struct RawDetection {
    #[serde(alias = "image_id")]
    pub frame_id: String,
    pub keypoints: Vec<f32>,
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
    #[serde(alias = "score", default)]
    pub confidence: f32,
}

/// Validates raw records and brings their boxes into corner form.
#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
    pub box_format: BoxFormat,
    pub keypoint_count: Option<usize>,
}

impl Ingestor {
    pub fn new(box_format: BoxFormat, keypoint_count: Option<usize>) -> Self {
        Self {
            box_format,
            keypoint_count,
        }
    }

    pub fn ingest<I>(&self, records: I) -> Result<Vec<Detection>>
    where
        I: IntoIterator<Item = RawDetection>,
    {
        let mut expected = self.keypoint_count;

        records
            .into_iter()
            .map(|raw| self.detection(raw, &mut expected))
            .collect()
    }

    pub fn parse_json(&self, src: &str) -> Result<Vec<Detection>> {
        let records: Vec<RawDetection> = serde_json::from_str(src)?;
        self.ingest(records)
    }

    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<Detection>> {
        let records: Vec<RawDetection> = serde_json::from_reader(reader)?;
        self.ingest(records)
    }

    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Detection>> {
        let file = std::fs::File::open(path)?;
        self.read(std::io::BufReader::new(file))
    }

    fn detection(&self, raw: RawDetection, expected: &mut Option<usize>) -> Result<Detection> {
        let found = raw.keypoints.len();
        if found % 3 != 0 {
            return Err(FormatError::KeypointArity {
                frame_id: raw.frame_id,
                found,
            }
            .into());
        }

        let count = found / 3;
        match *expected {
            Some(k) if k != count => {
                return Err(FormatError::MixedKeypointCount {
                    frame_id: raw.frame_id,
                    expected: k,
                    found: count,
                }
                .into())
            }
            Some(_) => {}
            None => *expected = Some(count),
        }

        let bbox = BBox::from_format(raw.bbox, self.box_format);
        if bbox.has_negative_extent() {
            return Err(FormatError::NegativeExtent {
                frame_id: raw.frame_id,
            }
            .into());
        }

        let keypoints = raw
            .keypoints
            .chunks_exact(3)
            .map(|t| Keypoint::new(t[0], t[1], t[2]))
            .collect();

        Ok(Detection::new(raw.frame_id, keypoints, bbox, raw.confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn parses_alphapose_records() {
        let src = r#"[
            {"image_id": "0.jpg", "category_id": 1, "keypoints": [1, 2, 0.9, 3, 4, 0.8],
             "score": 2.5, "box": [10, 20, 30, 40], "idx": [0]}
        ]"#;

        let dets = Ingestor::new(BoxFormat::Ltwh, None)
            .parse_json(src)
            .unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].frame_id, "0.jpg");
        assert_eq!(dets[0].keypoints[1], Keypoint::new(3.0, 4.0, 0.8));
        assert_eq!(dets[0].bbox.as_slice(), &[10.0, 20.0, 40.0, 60.0]);
        assert_eq!(dets[0].confidence, 2.5);
    }

    #[test]
    fn rejects_partial_triples() {
        let src = r#"[{"frame_id": "0", "keypoints": [1, 2], "box": [0, 0, 1, 1]}]"#;

        let err = Ingestor::new(BoxFormat::Ltrb, None)
            .parse_json(src)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Format(FormatError::KeypointArity { found: 2, .. })
        ));
    }

    #[test]
    fn rejects_changing_keypoint_count() {
        let src = r#"[
            {"frame_id": "0", "keypoints": [1, 2, 1], "box": [0, 0, 1, 1]},
            {"frame_id": "1", "keypoints": [1, 2, 1, 3, 4, 1], "box": [0, 0, 1, 1]}
        ]"#;

        let err = Ingestor::new(BoxFormat::Ltrb, None)
            .parse_json(src)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Format(FormatError::MixedKeypointCount {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_extent() {
        let src = r#"[{"frame_id": "0", "keypoints": [], "box": [5, 5, 1, 9]}]"#;

        let err = Ingestor::new(BoxFormat::Ltrb, Some(0))
            .parse_json(src)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Format(FormatError::NegativeExtent { .. })
        ));
    }
}
