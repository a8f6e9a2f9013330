use super::classifier::{ClassifierError, ClassifierHandle};
use super::decoder::{DecodeError, ImageDecoder};
use super::envelope::{self, EncodedImagePayload, EnvelopeError};
use super::normalizer::{ImageNormalizer, PreprocessError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::{ErrorResponse, PredictionResponse};

const ENVELOPE_STATUS: u16 = 600;
const BASE64_STATUS: u16 = 601;
const IMAGE_STATUS: u16 = 602;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Error reading or preprocessing image: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("Error in the prediction: {0}")]
    Inference(#[from] ClassifierError),
}

impl PipelineError {
    /// Client-side failures are expected traffic; only inference failures
    /// point at the service itself.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PipelineError::Inference(_))
    }
}

impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Envelope(_) => custom_status(ENVELOPE_STATUS),
            PipelineError::Decode(DecodeError::Base64(_)) => custom_status(BASE64_STATUS),
            PipelineError::Decode(DecodeError::Image(_)) | PipelineError::Preprocess(_) => {
                custom_status(IMAGE_STATUS)
            }
            PipelineError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

fn custom_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionResult {
    pub label: i64,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        PredictionResponse {
            prediction: result.label,
        }
    }
}

/// Envelope -> decode -> normalize -> classify. Holds nothing mutable, so one
/// instance is shared by every worker.
#[derive(Clone)]
pub struct PredictionPipeline {
    decoder: ImageDecoder,
    normalizer: ImageNormalizer,
    classifier: ClassifierHandle,
}

impl PredictionPipeline {
    pub fn new(
        decoder: ImageDecoder,
        normalizer: ImageNormalizer,
        classifier: ClassifierHandle,
    ) -> Self {
        Self {
            decoder,
            normalizer,
            classifier,
        }
    }

    pub fn handle_predict(&self, body: &[u8]) -> Result<PredictionResult, PipelineError> {
        let payload = envelope::extract_payload(body)?;
        log::debug!("Extracted payload: {:?}", payload);
        self.predict_payload(&payload)
    }

    pub fn predict_payload(
        &self,
        payload: &EncodedImagePayload,
    ) -> Result<PredictionResult, PipelineError> {
        let image = self.decoder.decode(&payload.data)?;
        let features = self.normalizer.normalize(&image)?;
        let label = self.classifier.predict(&features)?;
        Ok(PredictionResult { label })
    }
}
