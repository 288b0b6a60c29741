use thiserror::Error;

pub type Result<T> = std::result::Result<T, MutationError>;

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("unmarshaling request failed with {0}")]
    DecodeAdmissionReview(#[source] serde_json::Error),

    #[error("admission request {0} does not carry an object")]
    MissingObject(String),

    #[error("unable to unmarshal pod json object: {0}")]
    DecodePod(#[source] serde_json::Error),

    #[error("cannot encode JSON patch: {0}")]
    EncodePatch(#[source] serde_json::Error),

    #[error("cannot encode AdmissionReview: {0}")]
    EncodeAdmissionReview(#[source] serde_json::Error),
}
