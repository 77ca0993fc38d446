//! Load-once, read-only access to the shipped pipeline.
//!
//! An [`ArtifactHandle`] reads its artifact on first use and hands out
//! shared references for the rest of its lifetime. Concurrent first callers
//! serialize on an internal mutex, so the file is decoded at most once.
//! Nothing is mutated after load, so readers need no further coordination.

use crate::error::{PipelineError, Result};
use crate::pipeline::FittedPipeline;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// Lazily loaded, immutable pipeline.
///
/// ```no_run
/// use obesity_pipeline::loading::ArtifactHandle;
///
/// let handle = ArtifactHandle::new("obesity_pipeline.obp");
/// // Fails with MissingArtifact before any request is served.
/// let pipeline = handle.get().unwrap();
/// assert!(handle.is_loaded());
/// # let _ = pipeline;
/// ```
#[derive(Debug)]
pub struct ArtifactHandle {
    path: PathBuf,
    pipeline: OnceLock<FittedPipeline>,
    init: Mutex<()>,
}

impl ArtifactHandle {
    /// Handle for the artifact at `path`; nothing is read yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pipeline: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Handle around an already fitted pipeline.
    #[must_use]
    pub fn from_pipeline(pipeline: FittedPipeline) -> Self {
        Self {
            path: PathBuf::new(),
            pipeline: OnceLock::from(pipeline),
            init: Mutex::new(()),
        }
    }

    /// Artifact location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once the pipeline is in memory.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.pipeline.get().is_some()
    }

    /// The loaded pipeline, reading the artifact on first call.
    ///
    /// A failed load leaves the handle empty; callers are expected to stop
    /// rather than retry.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingArtifact`] if the artifact cannot be
    /// read or decoded.
    pub fn get(&self) -> Result<&FittedPipeline> {
        if let Some(pipeline) = self.pipeline.get() {
            return Ok(pipeline);
        }
        let _guard = self
            .init
            .lock()
            .map_err(|_| PipelineError::Other("artifact loader lock poisoned".into()))?;
        if let Some(pipeline) = self.pipeline.get() {
            return Ok(pipeline);
        }
        let pipeline = FittedPipeline::load(&self.path)?;
        Ok(self.pipeline.get_or_init(|| pipeline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::bmi_labelled;
    use crate::pipeline::PipelineSpec;

    fn fitted() -> FittedPipeline {
        let spec = PipelineSpec {
            n_estimators: 5,
            ..PipelineSpec::default()
        };
        FittedPipeline::fit(&bmi_labelled(70, 3), &spec).unwrap()
    }

    #[test]
    fn test_missing_artifact_fails_and_stays_empty() {
        let dir = tempfile::tempdir().unwrap();
        let handle = ArtifactHandle::new(dir.path().join("absent.obp"));
        assert!(matches!(
            handle.get(),
            Err(PipelineError::MissingArtifact { .. })
        ));
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.obp");
        let pipeline = fitted();
        pipeline.save(&path).unwrap();

        let handle = ArtifactHandle::new(&path);
        let addresses: Vec<usize> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..4)
                .map(|_| s.spawn(|| handle.get().unwrap() as *const FittedPipeline as usize))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(handle.get().unwrap(), &pipeline);
    }

    #[test]
    fn test_from_pipeline_is_loaded() {
        let pipeline = fitted();
        let handle = ArtifactHandle::from_pipeline(pipeline.clone());
        assert!(handle.is_loaded());
        assert_eq!(handle.get().unwrap(), &pipeline);
    }
}
