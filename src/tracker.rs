use crate::detection::Detection;
use crate::frame::Frame;
use crate::track::Track;

/// Greedy, threshold-gated association of per-frame detections into
/// frame-dense tracks.
#[derive(Debug, Clone, Copy)]
pub struct Associator {
    pub overlap_threshold: f32,
}

impl Default for Associator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Associator {
    pub fn new(overlap_threshold: f32) -> Self {
        Self { overlap_threshold }
    }

    /// Returns `(track, detection, overlap)` matches and the detections left
    /// unmatched, both in detection order.
    ///
    /// Each detection, in order, goes to the unclaimed track whose last valid
    /// box it overlaps most, provided the overlap exceeds the threshold.
    /// Ties go to the earlier track.
    pub fn assignment(
        &self,
        tracks: &[Track],
        dets: &[Detection],
    ) -> (Vec<(usize, usize, f32)>, Vec<usize>) {
        let mut claimed = vec![false; tracks.len()];
        let mut assignments = Vec::with_capacity(dets.len().min(tracks.len()));
        let mut missed = Vec::new();

        for (j, det) in dets.iter().enumerate() {
            let mut best: Option<(usize, f32)> = None;

            for (i, track) in tracks.iter().enumerate() {
                if claimed[i] {
                    continue;
                }

                let Some(last) = track.last_valid_box() else {
                    continue;
                };

                let ratio = det.bbox.overlap_ratio(last);
                if ratio <= self.overlap_threshold {
                    continue;
                }

                if best.map_or(true, |(_, score)| ratio > score) {
                    best = Some((i, ratio));
                }
            }

            match best {
                Some((i, score)) => {
                    claimed[i] = true;
                    assignments.push((i, j, score));
                }
                None => missed.push(j),
            }
        }

        (assignments, missed)
    }

    /// Extends every track by one entry for frame `frame_idx`, spawning new
    /// tracks for unmatched detections.
    pub fn update(&self, tracks: &mut Vec<Track>, frame_idx: usize, frame: &Frame) {
        let (assignments, missed) = self.assignment(tracks, &frame.detections);

        let mut matched = vec![None; tracks.len()];
        for (i, j, _) in assignments {
            matched[i] = Some(j);
        }

        for (track, det) in tracks.iter_mut().zip(matched) {
            match det {
                Some(j) => track.push(frame.detections[j].clone()),
                None => track.push_gap(),
            }
        }

        for j in missed {
            let id = tracks.len();
            tracks.push(Track::spawn(id, frame_idx, frame.detections[j].clone()));
        }
    }

    pub fn associate(&self, frames: &[Frame]) -> Vec<Track> {
        let mut tracks = Vec::new();

        for (frame_idx, frame) in frames.iter().enumerate() {
            self.update(&mut tracks, frame_idx, frame);
        }

        tracing::debug!(
            frames = frames.len(),
            tracks = tracks.len(),
            "associated detections into tracks"
        );

        tracks
    }
}
