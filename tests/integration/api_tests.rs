//! API integration tests
//!
//! Run against a server started on a migrated database.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Look up a definition id by tag
async fn definition_id(client: &Client, tag: &str) -> i64 {
    let response = client
        .get(format!("{}/definitions/tag/{}", BASE_URL, tag))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success(), "no definition for tag {}", tag);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in definition")
}

async fn create_record(client: &Client, payload: Value) -> Value {
    let response = client
        .post(format!("{}/records", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse response")
}

async fn delete_record(client: &Client, id: i64) {
    let response = client
        .delete(format!("{}/records/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_definition_by_tag() {
    let client = Client::new();

    let response = client
        .get(format!("{}/definitions/tag/200", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["kind"], "data");
    assert_eq!(body["tag"], "200");

    let response = client
        .get(format!("{}/definitions/tag/20", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_seed_unknown_template_is_empty() {
    let client = Client::new();

    let response = client
        .get(format!("{}/templates/999999/seed", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["control_fields"], json!([]));
    assert_eq!(body["data_fields"], json!([]));
}

#[tokio::test]
#[ignore]
async fn test_record_lifecycle() {
    let client = Client::new();
    let identifier = definition_id(&client, "001").await;
    let title = definition_id(&client, "200").await;
    let author = definition_id(&client, "700").await;

    let created = create_record(
        &client,
        json!({
            "control_fields": [{ "definition_id": identifier, "value": "REC-1" }],
            "data_fields": [{
                "definition_id": title,
                "ind1": "1",
                "subfields": [{ "value": "Madame Bovary" }, { "value": "Texte imprimé" }]
            }]
        }),
    )
    .await;

    let id = created["id"].as_i64().expect("No id in record");
    assert_eq!(created["metadata"]["fields"]["001"], "REC-1");
    assert_eq!(created["metadata"]["fields"]["200"]["indicators"], "1 ");
    assert_eq!(created["metadata"]["fields"]["200"]["subfields"]["a"], "Madame Bovary");
    assert_eq!(created["data_fields"][0]["definition"]["tag"], "200");

    // Keep the identifier, drop the title, add an author
    let control_id = created["control_fields"][0]["id"].clone();
    let response = client
        .put(format!("{}/records/{}", BASE_URL, id))
        .json(&json!({
            "control_fields": [{ "id": control_id, "definition_id": identifier, "value": "REC-1b" }],
            "data_fields": [{
                "definition_id": author,
                "subfields": [{ "value": "Flaubert" }, { "value": "Gustave" }]
            }]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["control_fields"].as_array().map(Vec::len), Some(1));
    assert_eq!(updated["control_fields"][0]["id"], control_id);
    assert_eq!(updated["metadata"]["fields"]["001"], "REC-1b");
    assert!(updated["metadata"]["fields"]["200"].is_null());
    assert_eq!(updated["metadata"]["fields"]["700"]["subfields"]["a"], "Flaubert");

    let response = client
        .get(format!("{}/records", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let list: Value = response.json().await.expect("Failed to parse response");
    let summary = list
        .as_array()
        .and_then(|records| records.iter().find(|r| r["id"] == id))
        .expect("Record missing from list")
        .clone();
    assert_eq!(summary["title"], "Sem título");
    assert_eq!(summary["author"], "Flaubert");

    delete_record(&client, id).await;

    let response = client
        .get(format!("{}/records/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_update_rejects_foreign_field_id() {
    let client = Client::new();
    let identifier = definition_id(&client, "001").await;

    let first = create_record(
        &client,
        json!({ "control_fields": [{ "definition_id": identifier, "value": "A" }] }),
    )
    .await;
    let second = create_record(
        &client,
        json!({ "control_fields": [{ "definition_id": identifier, "value": "B" }] }),
    )
    .await;
    let first_id = first["id"].as_i64().expect("No id in record");
    let second_id = second["id"].as_i64().expect("No id in record");

    let response = client
        .put(format!("{}/records/{}", BASE_URL, second_id))
        .json(&json!({
            "control_fields": [{
                "id": first["control_fields"][0]["id"],
                "definition_id": identifier,
                "value": "hijacked"
            }]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!("{}/records/{}", BASE_URL, first_id))
        .send()
        .await
        .expect("Failed to send request");
    let unchanged: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(unchanged["control_fields"][0]["value"], "A");

    delete_record(&client, first_id).await;
    delete_record(&client, second_id).await;
}

#[tokio::test]
#[ignore]
async fn test_create_from_template() {
    let client = Client::new();

    let response = client
        .get(format!("{}/templates", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let templates: Value = response.json().await.expect("Failed to parse response");
    let Some(template_id) = templates[0]["id"].as_i64() else {
        return;
    };

    let created = create_record(&client, json!({ "template_id": template_id })).await;
    let data_fields = created["data_fields"].as_array().expect("No data fields");
    assert!(!data_fields.is_empty());
    for field in data_fields {
        assert_eq!(field["subfields"].as_array().map(Vec::len), Some(1));
    }

    delete_record(&client, created["id"].as_i64().expect("No id in record")).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_unknown_record() {
    let client = Client::new();

    let response = client
        .delete(format!("{}/records/999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_encode_preview_reports_unknown_definitions() {
    let client = Client::new();

    let response = client
        .post(format!("{}/records/encode", BASE_URL))
        .json(&json!({
            "control_fields": [{ "definition_id": 999999, "value": "lost" }]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["skipped"][0]["definition_id"], 999999);
    assert_eq!(body["document"]["fields"], json!({}));
}
