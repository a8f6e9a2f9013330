use serde_json::{Map, Value};
use shared::{LegacyEnvelope, PredictEnvelope, StructuredEnvelope, Subject};

const IMAGE_SUBJECT_TYPE: &str = "Image";
const BASE64_ENCODING: &str = "base64";

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
    #[error("Subject_type is not 'Image'")]
    InvalidSubjectType,
    #[error("Subject field must be an object with 'type' and 'value'")]
    MissingSubject,
    #[error("Type field (image encoded) must be 'base64'")]
    UnsupportedEncoding,
    #[error("Value field (subject.value) must be a base64 string")]
    MissingSubjectValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Base64,
}

/// The encoded image extracted from a request, plus the legacy metadata
/// fields that are only carried along for logging.
#[derive(Clone, PartialEq)]
pub struct EncodedImagePayload {
    pub encoding: ImageEncoding,
    pub data: String,
    pub request_id: Option<String>,
    pub model_name: Option<String>,
}

impl std::fmt::Debug for EncodedImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EncodedImagePayload {{ encoding: {:?}, data: <{} chars>, request_id: {:?}, model_name: {:?} }}",
            self.encoding,
            self.data.len(),
            self.request_id,
            self.model_name
        )
    }
}

/// Parses a raw request body into one of the accepted envelopes and pulls out
/// the encoded image.
pub fn extract_payload(body: &[u8]) -> Result<EncodedImagePayload, EnvelopeError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| EnvelopeError::MalformedBody(e.to_string()))?;
    resolve(parse_envelope(value)?)
}

/// A body carrying `subject_type` is a structured envelope, anything else is
/// read as the legacy shape.
pub fn parse_envelope(value: Value) -> Result<PredictEnvelope, EnvelopeError> {
    let Value::Object(mut fields) = value else {
        return Err(EnvelopeError::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    };

    match fields.remove("subject_type") {
        Some(subject_type) => parse_structured(&subject_type, fields.remove("subject")),
        None => serde_json::from_value(Value::Object(fields))
            .map(PredictEnvelope::Legacy)
            .map_err(|e| EnvelopeError::MalformedBody(e.to_string())),
    }
}

// Checked in order: subject_type, subject, subject.type, subject.value.
fn parse_structured(
    subject_type: &Value,
    subject: Option<Value>,
) -> Result<PredictEnvelope, EnvelopeError> {
    if subject_type.as_str() != Some(IMAGE_SUBJECT_TYPE) {
        return Err(EnvelopeError::InvalidSubjectType);
    }
    let subject: Map<String, Value> = match subject {
        Some(Value::Object(subject)) => subject,
        _ => return Err(EnvelopeError::MissingSubject),
    };
    if subject.get("type").and_then(Value::as_str) != Some(BASE64_ENCODING) {
        return Err(EnvelopeError::UnsupportedEncoding);
    }
    let value = subject
        .get("value")
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::MissingSubjectValue)?;

    Ok(PredictEnvelope::Structured(StructuredEnvelope {
        subject_type: IMAGE_SUBJECT_TYPE.to_string(),
        subject: Subject {
            encoding: BASE64_ENCODING.to_string(),
            value: value.to_string(),
        },
    }))
}

pub fn resolve(envelope: PredictEnvelope) -> Result<EncodedImagePayload, EnvelopeError> {
    match envelope {
        PredictEnvelope::Legacy(legacy) => Ok(from_legacy(legacy)),
        PredictEnvelope::Structured(structured) => from_structured(structured),
    }
}

fn from_legacy(envelope: LegacyEnvelope) -> EncodedImagePayload {
    EncodedImagePayload {
        encoding: ImageEncoding::Base64,
        data: envelope.image,
        request_id: Some(envelope.request_id),
        model_name: Some(envelope.modelo),
    }
}

fn from_structured(envelope: StructuredEnvelope) -> Result<EncodedImagePayload, EnvelopeError> {
    // subject_type is checked before the subject itself is inspected
    if envelope.subject_type != IMAGE_SUBJECT_TYPE {
        return Err(EnvelopeError::InvalidSubjectType);
    }
    if envelope.subject.encoding != BASE64_ENCODING {
        return Err(EnvelopeError::UnsupportedEncoding);
    }
    Ok(EncodedImagePayload {
        encoding: ImageEncoding::Base64,
        data: envelope.subject.value,
        request_id: None,
        model_name: None,
    })
}
