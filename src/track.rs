use crate::bbox::{BBox, Ltrb};
use crate::detection::Detection;

#[derive(Debug, Clone, PartialEq)]
pub enum TrackEntry {
    Detected(Detection),
    Gap,
}

impl TrackEntry {
    #[inline]
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            TrackEntry::Detected(det) => Some(det),
            TrackEntry::Gap => None,
        }
    }

    #[inline]
    pub fn is_gap(&self) -> bool {
        matches!(self, TrackEntry::Gap)
    }
}

/// One inferred person across a whole clip: exactly one entry per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Discovery order within the clip.
    pub track_id: usize,
    /// Frame in which the track was first seen.
    pub first_frame: usize,
    entries: Vec<TrackEntry>,
    last_box: Option<BBox<Ltrb>>,
}

impl Track {
    /// New track first seen at frame `frame_idx`; earlier frames are gaps.
    pub(crate) fn spawn(track_id: usize, frame_idx: usize, det: Detection) -> Self {
        let mut entries = Vec::with_capacity(frame_idx + 1);
        entries.resize(frame_idx, TrackEntry::Gap);

        let mut track = Self {
            track_id,
            first_frame: frame_idx,
            entries,
            last_box: None,
        };
        track.push(det);
        track
    }

    pub(crate) fn push(&mut self, det: Detection) {
        if !det.bbox.is_degenerate() {
            self.last_box = Some(det.bbox);
        }

        self.entries.push(TrackEntry::Detected(det));
    }

    pub(crate) fn push_gap(&mut self) {
        self.entries.push(TrackEntry::Gap);
    }

    /// Most recent box with non-zero area.
    #[inline]
    pub fn last_valid_box(&self) -> Option<&BBox<Ltrb>> {
        self.last_box.as_ref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[TrackEntry] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, frame_idx: usize) -> Option<&Detection> {
        self.entries.get(frame_idx)?.detection()
    }

    pub fn detections(&self) -> impl Iterator<Item = &Detection> {
        self.entries.iter().filter_map(TrackEntry::detection)
    }

    pub fn hits(&self) -> usize {
        self.detections().count()
    }

    /// Keypoints per detection, if the track has any detection at all.
    pub fn keypoint_count(&self) -> Option<usize> {
        self.detections().next().map(Detection::keypoint_count)
    }
}
