// Dialect normalizer: rewrites PUT and composite PATCH bodies into atomic PatchOp documents

use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::scim::error::ScimError;
use crate::scim::membership::FetchMembers;
use crate::scim::operations::OperationBuilder;
use crate::scim::types::{
    AtomicOperation, MutationRequest, NormalizedBody, NormalizedRequest, PatchDocument, ScimMethod,
    RESERVED_ATTRIBUTES,
};

/// Produce the downstream-compliant form of `request`
///
/// PUT and PATCH bodies are decomposed into atomic operations, with `members`
/// replacements turned into a delta against the group's current membership.
/// Other methods pass through untouched. The request itself is never modified.
pub async fn normalize<F>(request: &MutationRequest, fetch: &F) -> Result<NormalizedRequest, ScimError>
where
    F: FetchMembers + ?Sized,
{
    match request.method {
        ScimMethod::Patch => split_patch(request, fetch).await,
        ScimMethod::Put => split_put(request, fetch).await,
        ScimMethod::Get | ScimMethod::Post | ScimMethod::Delete => Ok(NormalizedRequest {
            method: request.method,
            headers: request.headers.clone(),
            path: request.path.clone(),
            data: request.body.clone().map(NormalizedBody::Passthrough),
        }),
    }
}

/// Composite PATCH: each embedded operation's value object is decomposed on its own
async fn split_patch<F>(request: &MutationRequest, fetch: &F) -> Result<NormalizedRequest, ScimError>
where
    F: FetchMembers + ?Sized,
{
    let body = body_object(request)?;
    let embedded = body
        .get("Operations")
        .and_then(Value::as_array)
        .ok_or_else(|| ScimError::invalid_body("PATCH body must carry an Operations array"))?;

    let builder = OperationBuilder::new(fetch, &request.path);

    let per_operation = try_join_all(embedded.iter().enumerate().map(|(index, operation)| {
        let builder = &builder;
        async move {
            let value = operation.get("value").and_then(Value::as_object).ok_or_else(|| {
                ScimError::invalid_body(format!("Operations[{}].value must be an object", index))
            })?;
            builder.build_all(decomposable(value)).await
        }
    }))
    .await?;

    let operations: Vec<AtomicOperation> = per_operation.into_iter().flatten().collect();

    tracing::debug!(
        "Split PATCH {} with {} embedded operations into {} atomic operations",
        request.path,
        embedded.len(),
        operations.len()
    );

    Ok(NormalizedRequest {
        method: ScimMethod::Patch,
        headers: request.headers.clone(),
        path: request.path.clone(),
        data: Some(NormalizedBody::Patch(PatchDocument::with_envelope(body.clone(), operations))),
    })
}

/// Full replacement: every top-level attribute becomes its own operation, sent as PATCH
async fn split_put<F>(request: &MutationRequest, fetch: &F) -> Result<NormalizedRequest, ScimError>
where
    F: FetchMembers + ?Sized,
{
    let body = body_object(request)?;
    let builder = OperationBuilder::new(fetch, &request.path);
    let operations = builder.build_all(decomposable(body)).await?;

    tracing::debug!("Split PUT {} into {} atomic operations", request.path, operations.len());

    Ok(NormalizedRequest {
        method: ScimMethod::Patch,
        headers: request.headers.clone(),
        path: request.path.clone(),
        data: Some(NormalizedBody::Patch(PatchDocument::new(operations))),
    })
}

fn body_object(request: &MutationRequest) -> Result<&Map<String, Value>, ScimError> {
    request
        .body
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| ScimError::invalid_body(format!("{} body must be a JSON object", request.method)))
}

/// Attributes of a resource minus `id` and `schemas`
fn decomposable(resource: &Map<String, Value>) -> impl Iterator<Item = (&str, &Value)> {
    resource
        .iter()
        .filter(|(key, _)| !RESERVED_ATTRIBUTES.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value))
}
