use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Legacy request body: the base64 image sits at the top level next to two
/// opaque fields the service only echoes into its logs.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LegacyEnvelope {
    pub request_id: String,
    pub modelo: String,
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Subject {
    #[serde(rename = "type")]
    pub encoding: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StructuredEnvelope {
    pub subject_type: String,
    pub subject: Subject,
}

/// Every request shape accepted by `POST /predict`. Clients serialize it
/// as-is; the service picks the variant from the presence of `subject_type`
/// and validates the fields one at a time.
#[derive(Serialize, Clone, Debug)]
#[serde(untagged)]
pub enum PredictEnvelope {
    Structured(StructuredEnvelope),
    Legacy(LegacyEnvelope),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    pub prediction: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RootMessage {
    pub msg: String,
}

/// Value range of the 64 intensities handed to the classifier.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FeatureScale {
    /// Grayscale intensities as decoded, 0 to 255.
    Raw,
    /// `round(v / 255 * 16)`, the 0 to 16 range of the 8x8 digits dataset.
    #[default]
    Digits16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn legacy_envelope_serializes_flat() {
        let envelope = PredictEnvelope::Legacy(LegacyEnvelope {
            request_id: "uuid".into(),
            modelo: "clf.json".into(),
            image: "aGVsbG8=".into(),
        });
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({"request_id": "uuid", "modelo": "clf.json", "image": "aGVsbG8="})
        );
    }

    #[test]
    fn structured_envelope_serializes_subject_type_field() {
        let envelope = PredictEnvelope::Structured(StructuredEnvelope {
            subject_type: "Image".into(),
            subject: Subject {
                encoding: "base64".into(),
                value: "x".into(),
            },
        });
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            serde_json::json!({"subject_type": "Image", "subject": {"type": "base64", "value": "x"}})
        );
    }

    #[test]
    fn legacy_body_parses() {
        let body = r#"{"request_id": "uuid", "modelo": "clf.pickle", "image": "aGVsbG8="}"#;
        let env: LegacyEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(env.request_id, "uuid");
        assert_eq!(env.image, "aGVsbG8=");
    }

    #[test]
    fn feature_scale_names() {
        assert_eq!(FeatureScale::from_str("raw").unwrap(), FeatureScale::Raw);
        assert_eq!(FeatureScale::from_str("digits16").unwrap(), FeatureScale::Digits16);
        assert_eq!(FeatureScale::Digits16.to_string(), "digits16");
        assert_eq!(
            serde_json::to_string(&FeatureScale::Raw).unwrap(),
            "\"raw\""
        );
        assert!(FeatureScale::from_str("bogus").is_err());
    }
}
