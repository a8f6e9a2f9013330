use crate::config::ModelConfig;
use crate::inference::normalizer::{FEATURE_LEN, FeatureVector};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use shared::FeatureScale;
use std::path::Path;
use std::sync::Arc;

/// A loaded, read-only model mapping a feature vector to a digit label.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError>;

    /// The intensity range the model was trained on, when it is known.
    fn feature_scale(&self) -> Option<FeatureScale> {
        None
    }
}

pub type ClassifierHandle = Arc<dyn Classifier>;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("non-finite decision score for class {0}")]
    NonFiniteScore(i64),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Failed to read model artifact {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse model artifact {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid model artifact: {0}")]
    Invalid(String),
    #[error("Model was trained on {artifact} features but the service is configured for {configured}")]
    ScaleMismatch {
        artifact: FeatureScale,
        configured: FeatureScale,
    },
}

/// On-disk form of a multinomial linear model: one coefficient row and one
/// intercept per class label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
    #[serde(default)]
    pub feature_scale: Option<FeatureScale>,
}

#[derive(Debug)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coef: Array2<f32>,
    intercept: Array1<f32>,
    feature_scale: Option<FeatureScale>,
}

impl LinearClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let display = path.display().to_string();
        let raw = std::fs::read(path).map_err(|source| ModelLoadError::Read {
            path: display.clone(),
            source,
        })?;
        let artifact: LinearArtifact =
            serde_json::from_slice(&raw).map_err(|source| ModelLoadError::Parse {
                path: display,
                source,
            })?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, ModelLoadError> {
        let n_classes = artifact.classes.len();
        if n_classes == 0 {
            return Err(ModelLoadError::Invalid("no class labels".into()));
        }
        if artifact.coef.len() != n_classes || artifact.intercept.len() != n_classes {
            return Err(ModelLoadError::Invalid(format!(
                "{} classes but {} coefficient rows and {} intercepts",
                n_classes,
                artifact.coef.len(),
                artifact.intercept.len()
            )));
        }
        if let Some((row, bad)) = artifact
            .coef
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != FEATURE_LEN)
        {
            return Err(ModelLoadError::Invalid(format!(
                "coefficient row {} has {} columns, expected {}",
                row,
                bad.len(),
                FEATURE_LEN
            )));
        }

        let flat: Vec<f32> = artifact.coef.into_iter().flatten().collect();
        let coef = Array2::from_shape_vec((n_classes, FEATURE_LEN), flat)
            .map_err(|e| ModelLoadError::Invalid(e.to_string()))?;

        Ok(Self {
            classes: artifact.classes,
            coef,
            intercept: Array1::from(artifact.intercept),
            feature_scale: artifact.feature_scale,
        })
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
        let x = ArrayView1::from(features.as_slice());
        let scores = self.coef.dot(&x) + &self.intercept;

        let mut best: Option<(usize, f32)> = None;
        for (idx, &score) in scores.iter().enumerate() {
            if !score.is_finite() {
                return Err(ClassifierError::NonFiniteScore(self.classes[idx]));
            }
            match best {
                Some((_, top)) if top >= score => {}
                _ => best = Some((idx, score)),
            }
        }

        best.map(|(idx, _)| self.classes[idx])
            .ok_or_else(|| ClassifierError::Internal("model produced no scores".into()))
    }

    fn feature_scale(&self) -> Option<FeatureScale> {
        self.feature_scale
    }
}

/// Loads the classifier named by the config and checks that the artifact's
/// declared feature scale agrees with the configured one.
pub fn load_classifier(config: &ModelConfig) -> Result<ClassifierHandle, ModelLoadError> {
    let classifier = LinearClassifier::load(&config.path)?;
    if let Some(artifact) = classifier.feature_scale() {
        if artifact != config.feature_scale {
            return Err(ModelLoadError::ScaleMismatch {
                artifact,
                configured: config.feature_scale,
            });
        }
    }
    Ok(Arc::new(classifier))
}
