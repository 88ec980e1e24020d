use std::ops::Range;

use nalgebra as na;

use crate::bbox::{BBox, Ltrb};
use crate::detection::{Detection, Keypoint};
use crate::track::Track;

/// Ranks a track by how much its person moves; higher means more signing.
pub trait MovementScore {
    fn score(&self, track: &Track) -> f32;

    fn score_all(&self, tracks: &[Track]) -> Vec<f32> {
        tracks.iter().map(|t| self.score(t)).collect()
    }
}

/// Halpe-136 face landmarks; body comes before, hands after.
pub const HALPE_FACE_KEYPOINTS: Range<usize> = 26..94;

#[inline]
fn relative_pos(kp: &Keypoint, bbox: &BBox<Ltrb>) -> na::Vector2<f32> {
    let (cx, cy) = bbox.center();
    na::Point2::new(kp.x, kp.y) - na::Point2::new(cx, cy)
}

/// Box-relative displacement of body and hand keypoints between frames
/// `step` apart, averaged over the sampled frame pairs.
#[derive(Debug, Clone)]
pub struct BoxRelativeMotion {
    pub step: usize,
    pub confidence_threshold: f32,
    pub face: Range<usize>,
}

impl Default for BoxRelativeMotion {
    fn default() -> Self {
        Self::new(5, 0.5, HALPE_FACE_KEYPOINTS)
    }
}

impl BoxRelativeMotion {
    pub fn new(step: usize, confidence_threshold: f32, face: Range<usize>) -> Self {
        Self {
            step: step.max(1),
            confidence_threshold,
            face,
        }
    }

    /// Frame pairs `(i, i + step)` for `i = 0, step, 2 * step, ...`.
    pub fn frame_pairs(&self, len: usize) -> impl Iterator<Item = (usize, usize)> {
        let step = self.step;
        (0..len)
            .step_by(step)
            .take_while(move |i| i + step < len)
            .map(move |i| (i, i + step))
    }

    fn pair_distance(&self, a: &Detection, b: &Detection) -> f32 {
        let thr = self.confidence_threshold;

        a.keypoints
            .iter()
            .zip(&b.keypoints)
            .enumerate()
            .filter(|(idx, _)| !self.face.contains(idx))
            .filter(|(_, (ka, kb))| ka.confidence > thr && kb.confidence > thr)
            .map(|(_, (ka, kb))| (relative_pos(ka, &a.bbox) - relative_pos(kb, &b.bbox)).norm())
            .sum()
    }
}

impl MovementScore for BoxRelativeMotion {
    fn score(&self, track: &Track) -> f32 {
        let mut pairs = 0usize;
        let mut distance = 0.0f32;

        for (i, j) in self.frame_pairs(track.len()) {
            pairs += 1;

            if let (Some(a), Some(b)) = (track.get(i), track.get(j)) {
                distance += self.pair_distance(a, b);
            }
        }

        if pairs == 0 {
            return 0.0;
        }

        distance / pairs as f32
    }
}

/// Sum over all keypoints (face included) of the diagonal of the area each
/// keypoint sweeps, weighted by its mean confidence. Not length-normalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateSpread;

impl MovementScore for CoordinateSpread {
    fn score(&self, track: &Track) -> f32 {
        let Some(count) = track.keypoint_count() else {
            return 0.0;
        };

        (0..count)
            .map(|idx| {
                let mut min = na::Point2::new(f32::INFINITY, f32::INFINITY);
                let mut max = na::Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
                let mut conf_sum = 0.0;
                let mut n = 0usize;

                for kp in track.detections().filter_map(|d| d.keypoints.get(idx)) {
                    min = na::Point2::new(min.x.min(kp.x), min.y.min(kp.y));
                    max = na::Point2::new(max.x.max(kp.x), max.y.max(kp.y));
                    conf_sum += kp.confidence;
                    n += 1;
                }

                if n == 0 {
                    return 0.0;
                }

                na::distance(&min, &max) * conf_sum / n as f32
            })
            .sum()
    }
}

/// Scoring strategy chosen by configuration.
#[derive(Debug, Clone)]
pub enum Scorer {
    Motion(BoxRelativeMotion),
    Spread(CoordinateSpread),
}

impl MovementScore for Scorer {
    #[inline]
    fn score(&self, track: &Track) -> f32 {
        match self {
            Scorer::Motion(s) => s.score(track),
            Scorer::Spread(s) => s.score(track),
        }
    }
}
