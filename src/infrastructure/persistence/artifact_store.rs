//! On-disk storage for the trained demand model.
//!
//! The artifact is a single JSON document holding the ensemble, the ordered
//! feature names and the encoding vocabulary. Saving overwrites any previous
//! artifact at the same path.

use crate::application::ml::artifact::ModelArtifact;
use crate::domain::errors::DemandError;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ArtifactStore {
    file_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    pub fn load(&self) -> Result<ModelArtifact, DemandError> {
        let content = fs::read(&self.file_path).map_err(|e| self.io_error(e))?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&content).map_err(|e| DemandError::MalformedData {
                path: self.file_path.clone(),
                reason: format!("Failed to parse model artifact: {}", e),
            })?;
        artifact.validate()?;

        info!(
            "Loaded model artifact from {:?} ({} trees, schema {})",
            self.file_path,
            artifact.forest.n_trees(),
            artifact.schema.version
        );
        Ok(artifact)
    }

    pub fn save(&self, artifact: &ModelArtifact) -> Result<(), DemandError> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        let file = fs::File::create(&temp_path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, artifact).map_err(|e| DemandError::MalformedData {
            path: temp_path.clone(),
            reason: format!("Failed to serialize model artifact: {}", e),
        })?;
        writer
            .into_inner()
            .map_err(|e| self.io_error(e.into_error()))?
            .sync_all()
            .map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.file_path).map_err(|e| self.io_error(e))?;

        info!(
            "Saved model artifact to {:?} (schema {})",
            self.file_path, artifact.schema.version
        );
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> DemandError {
        DemandError::Io {
            path: self.file_path.clone(),
            source,
        }
    }
}
