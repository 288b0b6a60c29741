pub mod errors;
pub mod options;

use std::{collections::HashMap, sync::Arc};

use base64::{engine::general_purpose, Engine as _};
use json_patch::{jsonptr::PointerBuf, AddOperation, Patch, PatchOperation, RemoveOperation};
use k8s_openapi::api::core::v1::Pod;
use tracing::{info, Span};

use crate::admission_review::{
    AdmissionRequest, AdmissionResponse, AdmissionResponseStatus, AdmissionReview, PatchType,
};
use errors::{MutationError, Result};
use options::MutateOptions;

const AUDIT_ANNOTATION_KEY: &str = "mutateme";
const AUDIT_ANNOTATION_VALUE: &str = "add nodeSelector and taints";

/// Turns Pod admission reviews into JSON-Patch responses enforcing the
/// configured placement policy.
#[derive(Clone, Debug)]
pub struct Mutator {
    options: Arc<MutateOptions>,
    verbose: bool,
}

impl Mutator {
    pub fn new(options: Arc<MutateOptions>, verbose: bool) -> Self {
        Mutator { options, verbose }
    }

    #[tracing::instrument(
        name = "mutation",
        fields(
            request_uid=tracing::field::Empty,
            name=tracing::field::Empty,
            namespace=tracing::field::Empty,
            operation=tracing::field::Empty,
            patch_operations=tracing::field::Empty,
        ),
        skip_all)]
    /// Decode an AdmissionReview, compute the patch and return the encoded
    /// AdmissionReview holding the response.
    ///
    /// A review without a request yields an empty body.
    pub fn mutate(&self, body: &[u8]) -> Result<Vec<u8>> {
        if self.verbose {
            info!(body = %String::from_utf8_lossy(body), "recv");
        }

        let mut admission_review: AdmissionReview =
            serde_json::from_slice(body).map_err(MutationError::DecodeAdmissionReview)?;

        let response_body = match admission_review.request.as_ref() {
            None => Vec::new(),
            Some(request) => {
                populate_span_with_admission_request_data(request);

                let response = self.build_response(request)?;
                admission_review.response = Some(response);
                serde_json::to_vec(&admission_review)
                    .map_err(MutationError::EncodeAdmissionReview)?
            }
        };

        if self.verbose {
            info!(body = %String::from_utf8_lossy(&response_body), "resp");
        }

        Ok(response_body)
    }

    fn build_response(&self, request: &AdmissionRequest) -> Result<AdmissionResponse> {
        let object = request
            .object
            .as_ref()
            .ok_or_else(|| MutationError::MissingObject(request.uid.clone()))?;
        let pod: Pod =
            serde_json::from_value(object.0.clone()).map_err(MutationError::DecodePod)?;

        let patch = self.build_patch(&pod)?;
        Span::current().record("patch_operations", patch.0.len());

        let encoded_patch = serde_json::to_string(&patch)
            .map(|s| general_purpose::STANDARD.encode(s))
            .map_err(MutationError::EncodePatch)?;

        Ok(AdmissionResponse {
            uid: request.uid.clone(),
            allowed: true,
            status: Some(AdmissionResponseStatus::success()),
            patch: Some(encoded_patch),
            patch_type: Some(PatchType::JSONPatch),
            audit_annotations: Some(HashMap::from([(
                AUDIT_ANNOTATION_KEY.to_owned(),
                AUDIT_ANNOTATION_VALUE.to_owned(),
            )])),
        })
    }

    /// The order of the operations is part of the contract: the affinity
    /// removal comes first, then the node selector, then the tolerations.
    pub fn build_patch(&self, pod: &Pod) -> Result<Patch> {
        let mut operations = Vec::with_capacity(3);

        if self.options.remove_node_affinity && has_node_affinity(pod) {
            operations.push(PatchOperation::Remove(RemoveOperation {
                path: PointerBuf::from_tokens(["spec", "affinity", "nodeAffinity"]),
            }));
        }

        operations.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["spec", "nodeSelector"]),
            value: serde_json::to_value(&self.options.node_selector)
                .map_err(MutationError::EncodePatch)?,
        }));

        operations.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["spec", "tolerations"]),
            value: serde_json::to_value(&self.options.tolerations)
                .map_err(MutationError::EncodePatch)?,
        }));

        Ok(Patch(operations))
    }
}

fn has_node_affinity(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.affinity.as_ref())
        .is_some_and(|affinity| affinity.node_affinity.is_some())
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("request_uid", adm_req.uid.as_str());
    Span::current().record("name", adm_req.name.clone().unwrap_or_default().as_str());
    Span::current().record(
        "namespace",
        adm_req.namespace.clone().unwrap_or_default().as_str(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
}
