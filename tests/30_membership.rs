mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{BROKEN_GROUP, GHOST_TENANT, TENANT, USERS};
use scim_bridge::scim::PATCH_OP_SCHEMA;

#[tokio::test]
async fn test_put_group_becomes_patch_with_member_delta() -> Result<()> {
    let harness = common::spawn().await?;
    let path = format!("{}/Groups/g1", TENANT);

    let res = harness
        .client
        .put(harness.url(&path))
        .bearer_auth("test-token")
        .json(&json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
            "id": "g1",
            "displayName": "Engineering Team",
            "members": [{"value": "u2"}, {"value": "u3"}]
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({"id": "g1"}));

    // One directory listing plus one relationship check per user
    let gets = harness.downstream.requests_with("GET");
    assert_eq!(gets.len(), 1 + USERS.len());
    assert!(gets
        .iter()
        .all(|r| r.headers.get("authorization").map(String::as_str) == Some("Bearer test-token")));

    assert!(harness.downstream.requests_with("PUT").is_empty());
    let patches = harness.downstream.requests_with("PATCH");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].path, path);
    assert_eq!(
        patches[0].body,
        Some(json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": [
                {"op": "replace", "path": "displayName", "value": "Engineering Team"},
                {"op": "add", "path": "members", "value": [{"value": "u3"}]},
                {"op": "remove", "path": "members", "value": [{"value": "u1"}]}
            ]
        }))
    );

    Ok(())
}

#[tokio::test]
async fn test_patch_embedded_value_is_split() -> Result<()> {
    let harness = common::spawn().await?;
    let path = format!("{}/Groups/g1", TENANT);

    let res = harness
        .client
        .patch(harness.url(&path))
        .json(&json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": [{
                "op": "replace",
                "value": {"displayName": "Platform", "members": [{"value": "u1"}]}
            }]
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    let patches = harness.downstream.requests_with("PATCH");
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0].body,
        Some(json!({
            "schemas": [PATCH_OP_SCHEMA],
            "Operations": [
                {"op": "replace", "path": "displayName", "value": "Platform"},
                {"op": "remove", "path": "members", "value": [{"value": "u2"}]}
            ]
        }))
    );

    Ok(())
}

#[tokio::test]
async fn test_attributes_without_members_skip_directory() -> Result<()> {
    let harness = common::spawn().await?;

    let res = harness
        .client
        .put(harness.url(&format!("{}/Groups/g1", TENANT)))
        .json(&json!({"displayName": "Renamed"}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(harness.downstream.requests_with("GET").is_empty());
    assert_eq!(harness.downstream.requests_with("PATCH").len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_relationship_failure_is_propagated() -> Result<()> {
    let harness = common::spawn().await?;

    let res = harness
        .client
        .put(harness.url(&format!("{}/Groups/{}", TENANT, BROKEN_GROUP)))
        .json(&json!({"members": [{"value": "u1"}]}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json::<Value>().await?, json!({"detail": "Directory unavailable"}));
    assert!(harness.downstream.requests_with("PATCH").is_empty());

    Ok(())
}

#[tokio::test]
async fn test_malformed_patch_is_rejected() -> Result<()> {
    let harness = common::spawn().await?;

    let res = harness
        .client
        .patch(harness.url(&format!("{}/Groups/g1", TENANT)))
        .json(&json!({"schemas": [PATCH_OP_SCHEMA]}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "BAD_REQUEST", "unexpected error body: {}", body);
    assert!(harness.downstream.requests().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_malformed_directory_listing_is_bad_gateway() -> Result<()> {
    let harness = common::spawn().await?;

    let res = harness
        .client
        .put(harness.url(&format!("{}/Groups/g1", GHOST_TENANT)))
        .json(&json!({"members": [{"value": "u1"}]}))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "BAD_GATEWAY", "unexpected error body: {}", body);
    assert!(harness.downstream.requests_with("PATCH").is_empty());

    Ok(())
}
