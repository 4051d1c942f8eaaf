//! `churn predict`: one request against a persisted model.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use churn_classifiers::data_handling::Scalar;
use churn_classifiers::inference::{InferenceService, PredictionRequest, PredictionResult};

/// Accepted request bodies: `{"features": {...}}` or the bare feature map.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequestBody {
    Wrapped(PredictionRequest),
    Bare(BTreeMap<String, Scalar>),
}

pub fn parse_request(text: &str) -> Result<PredictionRequest> {
    let body: RequestBody =
        serde_json::from_str(text).context("Request must be a JSON object of feature values")?;
    Ok(match body {
        RequestBody::Wrapped(request) => request,
        RequestBody::Bare(features) => PredictionRequest::new(features),
    })
}

pub fn read_request<P: AsRef<Path>>(path: P) -> Result<PredictionRequest> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read request: {}", path.as_ref().display()))?;
    parse_request(&content)
}

pub fn run_prediction<P: AsRef<Path>, Q: AsRef<Path>>(
    model_path: P,
    schema_path: Q,
    request: &PredictionRequest,
) -> Result<PredictionResult> {
    let service = InferenceService::load(model_path, schema_path);
    let result = service.predict(request)?;
    Ok(result)
}
