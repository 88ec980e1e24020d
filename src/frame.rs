use std::collections::HashMap;

use crate::detection::Detection;
use crate::error::{FormatError, Result};

/// All detections sharing one `frame_id`, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub frame_id: String,
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            detections: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Splits a flat detection stream into per-frame groups in one pass.
///
/// Frames are keyed by `frame_id`; a frame that shows up again after a
/// different frame has started is a stream-order violation. Every detection
/// must have a non-inverted box and the same keypoint count as the first one.
pub fn group_frames<I>(detections: I) -> Result<Vec<Frame>>
where
    I: IntoIterator<Item = Detection>,
{
    let mut frames: Vec<Frame> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut expected: Option<usize> = None;

    for det in detections {
        check_detection(&det, &mut expected)?;

        match index.get(&det.frame_id).copied() {
            Some(idx) if idx + 1 == frames.len() => frames[idx].detections.push(det),
            Some(_) => {
                return Err(FormatError::NonContiguousFrame {
                    frame_id: det.frame_id,
                }
                .into())
            }
            None => {
                index.insert(det.frame_id.clone(), frames.len());
                let mut frame = Frame::new(det.frame_id.clone());
                frame.detections.push(det);
                frames.push(frame);
            }
        }
    }

    tracing::trace!(frames = frames.len(), "grouped detections");

    Ok(frames)
}

fn check_detection(det: &Detection, expected: &mut Option<usize>) -> Result<()> {
    if det.bbox.has_negative_extent() {
        return Err(FormatError::NegativeExtent {
            frame_id: det.frame_id.clone(),
        }
        .into());
    }

    let found = det.keypoint_count();
    match *expected {
        Some(k) if k != found => Err(FormatError::MixedKeypointCount {
            frame_id: det.frame_id.clone(),
            expected: k,
            found,
        }
        .into()),
        Some(_) => Ok(()),
        None => {
            *expected = Some(found);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::detection::Keypoint;
    use crate::error::Error;

    fn det(frame: &str, x: f32) -> Detection {
        Detection::new(frame, vec![], BBox::ltrb(x, 0.0, x + 1.0, 1.0), 1.0)
    }

    #[test]
    fn groups_contiguous_runs() {
        let stream = vec![
            det("a", 0.0),
            det("a", 1.0),
            det("b", 2.0),
            det("c", 3.0),
            det("c", 4.0),
            det("c", 5.0),
        ];

        let frames = group_frames(stream.clone()).unwrap();

        let ids: Vec<_> = frames.iter().map(|f| f.frame_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(frames[2].len(), 3);

        let flat: Vec<_> = frames.into_iter().flat_map(|f| f.detections).collect();
        assert_eq!(flat, stream);
    }

    #[test]
    fn keeps_within_frame_order() {
        let frames = group_frames(vec![det("a", 9.0), det("a", 1.0)]).unwrap();
        assert_eq!(frames[0].detections[0].bbox.left(), 9.0);
        assert_eq!(frames[0].detections[1].bbox.left(), 1.0);
    }

    #[test]
    fn empty_stream_has_no_frames() {
        assert!(group_frames(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn reappearing_frame_is_rejected() {
        let err = group_frames(vec![det("a", 0.0), det("b", 0.0), det("a", 0.0)]).unwrap_err();

        match err {
            Error::Format(FormatError::NonContiguousFrame { frame_id }) => assert_eq!(frame_id, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inverted_box_is_rejected() {
        let err = group_frames(vec![det("a", 0.0), det("b", 0.0)].into_iter().chain([
            Detection::new("c", vec![], BBox::ltrb(10.0, 10.0, 0.0, 0.0), 1.0),
        ]))
        .unwrap_err();

        match err {
            Error::Format(FormatError::NegativeExtent { frame_id }) => assert_eq!(frame_id, "c"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn changing_keypoint_count_is_rejected() {
        let with_keypoints = Detection::new(
            "b",
            vec![Keypoint::new(1.0, 1.0, 1.0)],
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            1.0,
        );

        let err = group_frames(vec![det("a", 0.0), with_keypoints]).unwrap_err();

        assert!(matches!(
            err,
            Error::Format(FormatError::MixedKeypointCount {
                expected: 0,
                found: 1,
                ..
            })
        ));
    }
}
