use crate::detection::Keypoint;
use crate::selector::FrameKeypoints;

/// Replaces low-confidence keypoint positions with values taken from the
/// nearest confident frames. Confidence values are never altered.
#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    pub threshold: f32,
    pub max_missing_percent: f32,
    pub default_position: (f32, f32),
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(0.2, 0.7, (0.0, 0.0))
    }
}

impl Interpolator {
    pub fn new(threshold: f32, max_missing_percent: f32, default_position: (f32, f32)) -> Self {
        Self {
            threshold,
            max_missing_percent,
            default_position,
        }
    }

    #[inline]
    fn is_valid(&self, kp: &Keypoint) -> bool {
        kp.confidence >= self.threshold
    }

    pub fn missing_ratio(&self, seq: &[Keypoint]) -> f32 {
        if seq.is_empty() {
            return 0.0;
        }

        let missing = seq.iter().filter(|k| !self.is_valid(k)).count();
        missing as f32 / seq.len() as f32
    }

    /// Repairs one keypoint's sequence over the frames of a clip.
    pub fn interpolate(&self, seq: &[Keypoint]) -> Vec<Keypoint> {
        let ratio = self.missing_ratio(seq);
        if ratio > self.max_missing_percent {
            return seq
                .iter()
                .map(|k| k.with_position(self.default_position))
                .collect();
        }

        let n = seq.len();
        let mut next_valid = vec![None; n];
        let mut upcoming = None;
        for i in (0..n).rev() {
            next_valid[i] = upcoming;
            if self.is_valid(&seq[i]) {
                upcoming = Some(i);
            }
        }

        let mut prev = None;
        let mut out = Vec::with_capacity(n);

        for (i, kp) in seq.iter().enumerate() {
            if self.is_valid(kp) {
                out.push(*kp);
                prev = Some(i);
                continue;
            }

            let pos = match (prev, next_valid[i]) {
                (Some(p), Some(q)) => {
                    let (a, b) = (seq[p], seq[q]);
                    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
                }
                (Some(p), None) => seq[p].position(),
                (None, Some(q)) => seq[q].position(),
                (None, None) => self.default_position,
            };

            out.push(kp.with_position(pos));
        }

        out
    }

    /// Repairs every keypoint index of a per-frame sequence independently.
    pub fn apply(&self, frames: &[FrameKeypoints]) -> Vec<FrameKeypoints> {
        let mut out = frames.to_vec();
        let count = frames.iter().map(|f| f.keypoints.len()).max().unwrap_or(0);

        for idx in 0..count {
            let column: Vec<Keypoint> = frames
                .iter()
                .map(|f| f.keypoints.get(idx).copied().unwrap_or_else(Keypoint::missing))
                .collect();

            let ratio = self.missing_ratio(&column);
            if ratio > self.max_missing_percent {
                tracing::debug!(
                    keypoint = idx,
                    missing_ratio = ratio,
                    "insufficient confidence, using default position"
                );
            }

            for (frame, kp) in out.iter_mut().zip(self.interpolate(&column)) {
                if let Some(slot) = frame.keypoints.get_mut(idx) {
                    *slot = kp;
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use approx::assert_relative_eq;

    fn seq(points: &[(f32, f32)]) -> Vec<Keypoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, c))| Keypoint::new(x, i as f32 * 10.0, c))
            .collect()
    }

    #[test]
    fn confident_sequence_is_untouched() {
        let s = seq(&[(1.0, 0.2), (2.0, 0.9), (3.0, 1.0)]);
        assert_eq!(Interpolator::default().interpolate(&s), s);
    }

    #[test]
    fn alternating_confidence_is_filled_from_neighbours() {
        let s = seq(&[(0.0, 0.1), (4.0, 0.9), (0.0, 0.1), (8.0, 0.9), (0.0, 0.1)]);

        let out = Interpolator::default().interpolate(&s);

        assert_eq!(out[0].position(), (4.0, 10.0));
        assert_eq!(out[1], s[1]);
        assert_relative_eq!(out[2].x, 6.0);
        assert_relative_eq!(out[2].y, 20.0);
        assert_eq!(out[3], s[3]);
        assert_eq!(out[4].position(), (8.0, 30.0));
        assert!(out.iter().zip(&s).all(|(a, b)| a.confidence == b.confidence));
    }

    #[test]
    fn unreliable_keypoint_falls_back_to_default() {
        let s: Vec<_> = (0..10).map(|i| Keypoint::new(i as f32, 3.0, 0.0)).collect();

        let out = Interpolator::default().interpolate(&s);

        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|k| k.position() == (0.0, 0.0)));
    }

    #[test]
    fn budget_is_inclusive() {
        let i = Interpolator::new(0.2, 0.5, (-1.0, -1.0));
        let s = seq(&[(0.0, 0.0), (2.0, 1.0)]);

        assert_eq!(i.interpolate(&s)[0].position(), (2.0, 10.0));
    }

    #[test]
    fn no_valid_neighbour_uses_default_position() {
        let i = Interpolator::new(0.2, 1.0, (-7.0, -7.0));
        let s = seq(&[(1.0, 0.0), (2.0, 0.1), (3.0, 0.0)]);

        let out = i.interpolate(&s);

        assert!(out.iter().all(|k| k.position() == (-7.0, -7.0)));
        assert_eq!(out[1].confidence, 0.1);
    }

    #[test]
    fn apply_works_per_keypoint() {
        let frame = |a: Keypoint, b: Keypoint| FrameKeypoints {
            frame_id: String::new(),
            keypoints: vec![a, b],
            bbox: BBox::zero(),
        };
        let frames = vec![
            frame(Keypoint::new(1.0, 1.0, 1.0), Keypoint::new(7.0, 7.0, 0.0)),
            frame(Keypoint::new(9.0, 9.0, 0.0), Keypoint::new(5.0, 5.0, 1.0)),
            frame(Keypoint::new(3.0, 3.0, 1.0), Keypoint::new(7.0, 7.0, 0.0)),
        ];

        let out = Interpolator::default().apply(&frames);

        assert_eq!(out[1].keypoints[0].position(), (2.0, 2.0));
        assert_eq!(out[0].keypoints[1].position(), (5.0, 5.0));
        assert_eq!(out[2].keypoints[1].position(), (5.0, 5.0));
        assert_eq!(frames[1].keypoints[0].position(), (9.0, 9.0));
    }
}
