//! Model artifact lookup and loading utilities.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ort::session::Session;

use crate::error::{Error, Result};

/// Pretrained denoising models that can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// DnCNN - residual learning denoiser with batch normalization.
    DnCnn,
    /// RIDNet - real image denoiser with feature attention.
    RidNet,
}

impl ModelKind {
    /// All supported models, in menu order.
    pub const ALL: [Self; 2] = [Self::DnCnn, Self::RidNet];

    /// Get the artifact filename for this model.
    #[must_use]
    pub const fn filename(&self) -> &'static str {
        match self {
            Self::DnCnn => "dncnn.onnx",
            Self::RidNet => "ridnet.onnx",
        }
    }

    /// Human-readable model name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::DnCnn => "DnCNN",
            Self::RidNet => "RIDNet",
        }
    }

    /// Short lowercase identifier used on the command line and in file names.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Self::DnCnn => "dncnn",
            Self::RidNet => "ridnet",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidParameter {
                name: "model".to_string(),
                reason: format!("unknown model {s:?}, expected dncnn or ridnet"),
            })
    }
}

/// Locates model artifacts in a directory and opens them.
#[derive(Debug, Clone)]
pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    /// Create a store rooted at `model_dir`.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    /// Directory the artifacts are read from.
    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Get the path to a model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist.
    pub fn model_path(&self, kind: ModelKind) -> Result<PathBuf> {
        let path = self.model_dir.join(kind.filename());

        if !path.is_file() {
            return Err(Error::ModelNotFound {
                name: kind.filename().to_string(),
                path,
            });
        }

        Ok(path)
    }

    /// Size of a model artifact in MiB.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be inspected.
    #[allow(clippy::cast_precision_loss)]
    pub fn file_size_mb(&self, kind: ModelKind) -> Result<f64> {
        let path = self.model_path(kind)?;
        let bytes = fs::metadata(&path)?.len();
        Ok(bytes as f64 / (1024.0 * 1024.0))
    }

    /// Load an ONNX model session.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be found or loaded.
    pub fn load_session(&self, kind: ModelKind) -> Result<Session> {
        let path = self.model_path(kind)?;

        Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: kind.filename().to_string(),
                source,
            })?
            .commit_from_file(&path)
            .map_err(|source| Error::ModelLoad {
                name: kind.filename().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_kind() {
        assert_eq!("dncnn".parse::<ModelKind>().unwrap(), ModelKind::DnCnn);
        assert_eq!("RIDNet".parse::<ModelKind>().unwrap(), ModelKind::RidNet);
        assert_eq!(" DNCNN ".parse::<ModelKind>().unwrap(), ModelKind::DnCnn);
        assert!("unet".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(ModelKind::DnCnn.to_string(), "DnCNN");
        assert_eq!(ModelKind::RidNet.filename(), "ridnet.onnx");
    }

    #[test]
    fn test_missing_artifact() {
        let store = ModelStore::new("no/such/dir");
        assert!(matches!(
            store.model_path(ModelKind::DnCnn),
            Err(Error::ModelNotFound { .. })
        ));
        assert!(store.file_size_mb(ModelKind::RidNet).is_err());
    }

    #[test]
    fn test_file_size_in_mib() {
        let dir = std::env::temp_dir().join(format!("denoiselab-models-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("dncnn.onnx"), vec![0u8; 512 * 1024]).unwrap();

        let store = ModelStore::new(&dir);
        let size = store.file_size_mb(ModelKind::DnCnn).unwrap();
        assert!((size - 0.5).abs() < f64::EPSILON);

        fs::remove_dir_all(&dir).unwrap();
    }
}
