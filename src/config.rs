use std::ops::Range;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::bbox::BoxFormat;
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::interpolate::Interpolator;
use crate::scoring::{BoxRelativeMotion, CoordinateSpread, Scorer, HALPE_FACE_KEYPOINTS};
use crate::tracker::Associator;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AssociationConfig {
    pub overlap_threshold: f32,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    #[default]
    Motion,
    Spread,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub strategy: ScoringStrategy,
    pub step: usize,
    pub confidence_threshold: f32,
    /// Keypoint indices excluded from motion scoring.
    pub face_keypoints: Range<usize>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::Motion,
            step: 5,
            confidence_threshold: 0.5,
            face_keypoints: HALPE_FACE_KEYPOINTS,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InterpolationConfig {
    pub threshold: f32,
    pub max_missing_percent: f32,
    pub default_position: (f32, f32),
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            max_missing_percent: 0.7,
            default_position: (0.0, 0.0),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SignerConfig {
    /// Layout of boxes in the estimator output.
    pub box_format: BoxFormat,
    /// Keypoints per detection; the first record decides when unset.
    pub keypoint_count: Option<usize>,
    pub association: AssociationConfig,
    pub scoring: ScoringConfig,
    pub interpolation: InterpolationConfig,
    /// Layout of the ROI in exported records.
    pub roi_format: BoxFormat,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            box_format: BoxFormat::Ltwh,
            keypoint_count: None,
            association: AssociationConfig::default(),
            scoring: ScoringConfig::default(),
            interpolation: InterpolationConfig::default(),
            roi_format: BoxFormat::Ltrb,
        }
    }
}

impl SignerConfig {
    pub fn from_json_str(src: &str) -> Result<Self> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.box_format, self.keypoint_count)
    }

    pub fn associator(&self) -> Associator {
        Associator::new(self.association.overlap_threshold)
    }

    pub fn scorer(&self) -> Scorer {
        let s = &self.scoring;
        match s.strategy {
            ScoringStrategy::Motion => Scorer::Motion(BoxRelativeMotion::new(
                s.step,
                s.confidence_threshold,
                s.face_keypoints.clone(),
            )),
            ScoringStrategy::Spread => Scorer::Spread(CoordinateSpread),
        }
    }

    pub fn interpolator(&self) -> Interpolator {
        let i = &self.interpolation;
        Interpolator::new(i.threshold, i.max_missing_percent, i.default_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = SignerConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, SignerConfig::default());
        assert_eq!(cfg.scoring.face_keypoints, 26..94);
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let cfg = SignerConfig::from_json_str(
            r#"{
                "box_format": "ltrb",
                "scoring": {"step": 3, "strategy": "spread"},
                "interpolation": {"default_position": [-1.0, -1.0]}
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.box_format, BoxFormat::Ltrb);
        assert_eq!(cfg.scoring.step, 3);
        assert_eq!(cfg.scoring.confidence_threshold, 0.5);
        assert!(matches!(cfg.scorer(), Scorer::Spread(_)));
        assert_eq!(cfg.interpolation.default_position, (-1.0, -1.0));
        assert_eq!(cfg.interpolation.threshold, 0.2);
    }

    #[test]
    fn face_range_is_configurable() {
        let cfg = SignerConfig::from_json_str(
            r#"{"scoring": {"face_keypoints": {"start": 33, "end": 501}}}"#,
        )
        .unwrap();

        match cfg.scorer() {
            Scorer::Motion(m) => assert_eq!(m.face, 33..501),
            other => panic!("unexpected scorer {other:?}"),
        }
    }
}
