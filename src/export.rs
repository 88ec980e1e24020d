use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::BoxFormat;
use crate::error::Result;
use crate::selector::{FrameKeypoints, SignerRecord};
use crate::track::Track;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum Roi {
    Corners { x1: f32, y1: f32, x2: f32, y2: f32 },
    Sized { x1: f32, y1: f32, width: f32, height: f32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame_id: String,
    pub keypoints: Vec<f32>,
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
}

impl From<&FrameKeypoints> for FrameRecord {
    fn from(f: &FrameKeypoints) -> Self {
        Self {
            frame_id: f.frame_id.clone(),
            keypoints: f
                .keypoints
                .iter()
                .flat_map(|k| [k.x, k.y, k.confidence])
                .collect(),
            bbox: *f.bbox.as_slice(),
        }
    }
}

/// Wire form of a `SignerRecord`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignerFile {
    pub scores: Vec<f32>,
    pub roi: Roi,
    pub keypoints: Vec<FrameRecord>,
}

impl SignerFile {
    pub fn new(record: &SignerRecord, roi_format: BoxFormat) -> Self {
        let [a, b, c, d] = record.roi.to_format(roi_format);
        let roi = match roi_format {
            BoxFormat::Ltrb => Roi::Corners {
                x1: a,
                y1: b,
                x2: c,
                y2: d,
            },
            BoxFormat::Ltwh => Roi::Sized {
                x1: a,
                y1: b,
                width: c,
                height: d,
            },
        };

        Self {
            scores: record.scores.clone(),
            roi,
            keypoints: record.keypoints.iter().map(Into::into).collect(),
        }
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// One candidate track as dense matrices; gap frames are zero rows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackMatrix {
    /// frames x (3 * keypoints), `x, y, c` interleaved
    pub keypoints: Array2<f32>,
    /// frames x 4, corner form
    pub boxes: Array2<f32>,
}

impl From<&Track> for TrackMatrix {
    fn from(track: &Track) -> Self {
        let frames = track.len();
        let features = 3 * track.keypoint_count().unwrap_or(0);

        let keypoints = Array2::from_shape_fn((frames, features), |(i, j)| {
            track
                .get(i)
                .and_then(|d| d.keypoints.get(j / 3))
                .map_or(0.0, |k| [k.x, k.y, k.confidence][j % 3])
        });

        let boxes = Array2::from_shape_fn((frames, 4), |(i, j)| {
            track.get(i).map_or(0.0, |d| d.bbox.as_slice()[j])
        });

        Self { keypoints, boxes }
    }
}

/// Every candidate track of many clips, keyed by clip id.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ClipStore {
    clips: BTreeMap<String, Vec<TrackMatrix>>,
}

impl ClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clip_id: impl Into<String>, tracks: &[Track]) {
        self.clips
            .insert(clip_id.into(), tracks.iter().map(Into::into).collect());
    }

    #[inline]
    pub fn get(&self, clip_id: &str) -> Option<&[TrackMatrix]> {
        self.clips.get(clip_id).map(Vec::as_slice)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TrackMatrix])> {
        self.clips.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
