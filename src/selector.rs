use crate::bbox::{BBox, Ltrb};
use crate::detection::{Detection, Keypoint};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::track::Track;

/// Signer keypoints for one frame of the clip.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameKeypoints {
    pub frame_id: String,
    pub keypoints: Vec<Keypoint>,
    pub bbox: BBox<Ltrb>,
}

impl FrameKeypoints {
    fn detected(frame_id: &str, det: &Detection) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            keypoints: det.keypoints.clone(),
            bbox: det.bbox,
        }
    }

    fn missing(frame_id: &str, count: usize) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            keypoints: vec![Keypoint::missing(); count],
            bbox: BBox::zero(),
        }
    }

    /// Keypoints translated so that keypoint `anchor` sits at the origin.
    pub fn relative_to(&self, anchor: usize) -> Option<Self> {
        let (ax, ay) = self.keypoints.get(anchor)?.position();

        Some(Self {
            keypoints: self
                .keypoints
                .iter()
                .map(|k| k.with_position((k.x - ax, k.y - ay)))
                .collect(),
            ..self.clone()
        })
    }
}

/// Per-clip result: every track's score, plus ROI and keypoints of the winner.
#[derive(Debug, Clone, PartialEq)]
pub struct SignerRecord {
    /// Discovery index of the selected track.
    pub signer_index: usize,
    pub scores: Vec<f32>,
    pub roi: BBox<Ltrb>,
    pub keypoints: Vec<FrameKeypoints>,
}

impl SignerRecord {
    /// Winner's share of the total score; 0 if nobody moved.
    pub fn confidence(&self) -> f32 {
        let total: f32 = self.scores.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }

        let Some(&best) = self.scores.get(self.signer_index) else {
            return 0.0;
        };

        best / total
    }

    /// Distance between the best and the runner-up score.
    pub fn margin(&self) -> f32 {
        let Some(&best) = self.scores.get(self.signer_index) else {
            return 0.0;
        };
        let runner_up = self
            .scores
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != self.signer_index)
            .map(|(_, &s)| s)
            .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));

        runner_up.map_or(best, |r| best - r)
    }

    pub fn with_keypoints(self, keypoints: Vec<FrameKeypoints>) -> Self {
        Self { keypoints, ..self }
    }
}

/// Index of the highest score; ties go to the earliest track.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &s) in scores.iter().enumerate() {
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }

    best.map(|(i, _)| i)
}

/// Box enclosing every detection of the track.
pub fn roi(track: &Track) -> BBox<Ltrb> {
    track
        .detections()
        .map(|d| d.bbox)
        .reduce(|acc, b| acc.union(&b))
        .unwrap_or_else(BBox::zero)
}

pub fn select_signer(frames: &[Frame], tracks: &[Track], scores: Vec<f32>) -> Result<SignerRecord> {
    let signer_index = argmax(&scores).ok_or(Error::NoSignerFound)?;
    let track = tracks.get(signer_index).ok_or(Error::NoSignerFound)?;
    let count = track.keypoint_count().unwrap_or(0);

    let keypoints = frames
        .iter()
        .enumerate()
        .map(|(idx, frame)| match track.get(idx) {
            Some(det) => FrameKeypoints::detected(&frame.frame_id, det),
            None => FrameKeypoints::missing(&frame.frame_id, count),
        })
        .collect();

    tracing::debug!(signer = signer_index, ?scores, "selected signer");

    Ok(SignerRecord {
        signer_index,
        roi: roi(track),
        scores,
        keypoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Associator;
    use approx::assert_relative_eq;

    fn record(scores: Vec<f32>) -> SignerRecord {
        SignerRecord {
            signer_index: argmax(&scores).unwrap(),
            scores,
            roi: BBox::zero(),
            keypoints: vec![],
        }
    }

    #[test]
    fn argmax_prefers_earliest_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn no_tracks_is_no_signer() {
        let err = select_signer(&[], &[], vec![]).unwrap_err();
        assert!(matches!(err, Error::NoSignerFound));
    }

    #[test]
    fn confidence_and_margin() {
        let r = record(vec![1.0, 3.0, 0.0]);
        assert_relative_eq!(r.confidence(), 0.75);
        assert_relative_eq!(r.margin(), 2.0);

        let single = record(vec![2.0]);
        assert_relative_eq!(single.confidence(), 1.0);
        assert_relative_eq!(single.margin(), 2.0);

        assert_eq!(record(vec![0.0, 0.0]).confidence(), 0.0);
    }

    #[test]
    fn stale_signer_index_scores_zero() {
        let r = SignerRecord {
            signer_index: 3,
            ..record(vec![1.0, 2.0])
        };

        assert_eq!(r.confidence(), 0.0);
        assert_eq!(r.margin(), 0.0);
    }

    #[test]
    fn gaps_become_missing_keypoints() {
        let kp = vec![Keypoint::new(1.0, 2.0, 0.9)];
        let frames = vec![
            Frame {
                frame_id: "0".into(),
                detections: vec![],
            },
            Frame {
                frame_id: "1".into(),
                detections: vec![Detection::new("1", kp.clone(), BBox::ltrb(0.0, 0.0, 4.0, 4.0), 1.0)],
            },
        ];
        let tracks = Associator::default().associate(&frames);

        let r = select_signer(&frames, &tracks, vec![0.0]).unwrap();

        assert_eq!(r.keypoints.len(), 2);
        assert_eq!(r.keypoints[0].frame_id, "0");
        assert_eq!(r.keypoints[0].keypoints, vec![Keypoint::missing()]);
        assert_eq!(r.keypoints[1].keypoints, kp);
        assert_eq!(r.roi.as_slice(), &[0.0, 0.0, 4.0, 4.0]);
    }

    #[test]
    fn relative_to_anchor_keeps_confidence() {
        let fk = FrameKeypoints {
            frame_id: "0".into(),
            keypoints: vec![Keypoint::new(10.0, 10.0, 0.9), Keypoint::new(12.0, 7.0, 0.3)],
            bbox: BBox::zero(),
        };

        let rel = fk.relative_to(0).unwrap();
        assert_eq!(rel.keypoints[0], Keypoint::new(0.0, 0.0, 0.9));
        assert_eq!(rel.keypoints[1], Keypoint::new(2.0, -3.0, 0.3));
        assert!(fk.relative_to(5).is_none());
    }
}
