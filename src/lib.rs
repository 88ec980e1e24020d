pub mod bbox;
pub mod config;
pub mod detection;
pub mod error;
pub mod export;
pub mod frame;
pub mod ingest;
pub mod interpolate;
pub mod scoring;
pub mod selector;
pub mod tracker;

mod track;

pub use config::SignerConfig;
pub use detection::{Detection, Keypoint};
pub use error::{Error, Result};
pub use frame::Frame;
pub use selector::SignerRecord;
pub use track::{Track, TrackEntry};

use std::path::Path;

use rayon::prelude::*;

use interpolate::Interpolator;
use scoring::{MovementScore, Scorer};
use tracker::Associator;

/// Result of one clip in a batch run.
#[derive(Debug)]
pub struct ClipOutcome {
    pub clip_id: String,
    pub result: Result<SignerRecord>,
}

/// Picks the signer of a clip out of every person the pose estimator saw.
///
/// Stages run in order over clip-local data: frame grouping, track
/// association, movement scoring, signer selection and keypoint repair.
pub struct SignerPipeline {
    config: SignerConfig,
    associator: Associator,
    scorer: Scorer,
    interpolator: Interpolator,
}

impl SignerPipeline {
    pub fn new(config: SignerConfig) -> Self {
        Self {
            associator: config.associator(),
            scorer: config.scorer(),
            interpolator: config.interpolator(),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Groups the stream into frames and associates it into tracks.
    pub fn tracks(&self, detections: Vec<Detection>) -> Result<(Vec<Frame>, Vec<Track>)> {
        let frames = frame::group_frames(detections)?;
        let tracks = self.associator.associate(&frames);

        Ok((frames, tracks))
    }

    pub fn process(&self, detections: Vec<Detection>) -> Result<SignerRecord> {
        let (frames, tracks) = self.tracks(detections)?;
        let scores = self.scorer.score_all(&tracks);
        let record = selector::select_signer(&frames, &tracks, scores)?;
        let keypoints = self.interpolator.apply(&record.keypoints);

        Ok(record.with_keypoints(keypoints))
    }

    /// Reads a clip's raw estimator output and processes it.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<SignerRecord> {
        let detections = self.config.ingestor().read_path(path)?;
        self.process(detections)
    }

    /// Processes independent clips in parallel. Outcomes keep input order and
    /// a failing clip never stops the others.
    pub fn process_batch(&self, clips: Vec<(String, Vec<Detection>)>) -> Vec<ClipOutcome> {
        let outcomes: Vec<ClipOutcome> = clips
            .into_par_iter()
            .map(|(clip_id, detections)| {
                let result = self.process(detections);

                if let Err(err) = &result {
                    tracing::warn!(clip = %clip_id, error = %err, "skipping clip");
                }

                ClipOutcome { clip_id, result }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(clips = outcomes.len(), failed, "batch finished");

        outcomes
    }
}

impl Default for SignerPipeline {
    fn default() -> Self {
        Self::new(SignerConfig::default())
    }
}
