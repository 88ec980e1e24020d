use crate::bbox::{BBox, Ltrb};

/// Single estimator landmark: position in frame pixels plus its confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    #[inline]
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Placeholder for a frame where the person was not detected.
    #[inline]
    pub fn missing() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn with_position(&self, (x, y): (f32, f32)) -> Self {
        Self { x, y, ..*self }
    }

    #[inline(always)]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// One person observed in one frame. Box is always in canonical corner form.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub frame_id: String,
    pub keypoints: Vec<Keypoint>,
    pub bbox: BBox<Ltrb>,
    pub confidence: f32,
}

impl Detection {
    pub fn new(
        frame_id: impl Into<String>,
        keypoints: Vec<Keypoint>,
        bbox: BBox<Ltrb>,
        confidence: f32,
    ) -> Self {
        Self {
            frame_id: frame_id.into(),
            keypoints,
            bbox,
            confidence,
        }
    }

    #[inline]
    pub fn keypoint_count(&self) -> usize {
        self.keypoints.len()
    }

    /// Flattened `x, y, c` triples, as estimators emit them.
    pub fn flat_keypoints(&self) -> Vec<f32> {
        self.keypoints
            .iter()
            .flat_map(|k| [k.x, k.y, k.confidence])
            .collect()
    }
}
