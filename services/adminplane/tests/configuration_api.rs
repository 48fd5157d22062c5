mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestApp, app, read_json};
use http_helpers::{empty_request, json_request};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn post(app: &TestApp, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/configuration", body))
        .await
        .expect("post");
    let status = response.status();
    (status, read_json(response).await)
}

async fn send(app: &TestApp, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(empty_request(method, uri))
        .await
        .expect("request");
    let status = response.status();
    (status, read_json(response).await)
}

async fn seed_policies(app: &TestApp) {
    let (status, body) = post(
        app,
        json!({
            "MessageHub": {"H1": {}},
            "ConnectionPolicy": {"CP1": {"ClientID": "*"}},
            "TopicPolicy": {"TP1": {"Topic": "*", "ActionList": "Publish", "ClientID": "*"}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

fn endpoint_body() -> Value {
    json!({"Endpoint": {"E1": {
        "Port": 1493,
        "ConnectionPolicies": "CP1",
        "TopicPolicies": "TP1",
        "MessageHub": "H1"
    }}})
}

#[tokio::test]
async fn endpoint_requires_existing_references() {
    let app = app();
    let (status, body) = post(&app, endpoint_body()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["Version"], "v1");
    assert_eq!(body["Code"], "CWLNA0136");
    assert!(
        body["Message"]
            .as_str()
            .expect("message")
            .contains("Type: ConnectionPolicy Name: CP1")
    );

    seed_policies(&app).await;
    let (status, body) = post(&app, endpoint_body()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Code"], "CWLNA6011");
    assert_eq!(
        body["Message"],
        "The requested configuration change has completed successfully."
    );

    let (status, body) = send(&app, "GET", "/v1/configuration/Endpoint/E1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Version"], "v1");
    let endpoint = &body["Endpoint"]["E1"];
    assert_eq!(endpoint["Port"], 1493);
    assert_eq!(endpoint["Enabled"], true);
    assert_eq!(endpoint["MaxSendSize"], 16384);
    assert_eq!(endpoint["MessageHub"], "H1");
}

#[tokio::test]
async fn endpoint_with_connection_policy_only() {
    let app = app();
    let body = json!({"Endpoint": {"E1": {
        "Port": 1493,
        "ConnectionPolicies": "CP1",
        "MessageHub": "H1"
    }}});
    let (status, response) = post(&app, body.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["Code"], "CWLNA0136");
    assert_eq!(
        response["Message"],
        "The item or object cannot be found. Type: ConnectionPolicy Name: CP1 Referenced by: Endpoint E1"
    );

    let (status, _) = post(
        &app,
        json!({
            "MessageHub": {"H1": {}},
            "ConnectionPolicy": {"CP1": {"ClientID": "*"}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, response) = post(&app, body).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_eq!(response["Code"], "CWLNA6011");

    let (_, response) = send(&app, "GET", "/v1/configuration/Endpoint/E1").await;
    assert_eq!(response["Endpoint"]["E1"]["Enabled"], true);
    assert_eq!(response["Endpoint"]["E1"]["ConnectionPolicies"], "CP1");
}

#[tokio::test]
async fn referenced_objects_cannot_be_deleted() {
    let app = app();
    seed_policies(&app).await;
    let (status, _) = post(&app, endpoint_body()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "DELETE", "/v1/configuration/ConnectionPolicy/CP1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Code"], "CWLNA0376");
    assert_eq!(
        body["Message"],
        "The Object: ConnectionPolicies, Name: CP1 is still being used by Object: Endpoint, Name: E1"
    );

    let (status, _) = send(&app, "DELETE", "/v1/configuration/Endpoint/E1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", "/v1/configuration/Endpoint/E1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["Code"], "CWLNA0136");

    let (status, _) = send(&app, "DELETE", "/v1/configuration/ConnectionPolicy/CP1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", "/v1/configuration/ConnectionPolicy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ConnectionPolicy"], json!({}));
}

#[tokio::test]
async fn failed_batch_applies_nothing() {
    let app = app();
    let (status, body) = post(
        &app,
        json!({
            "MessageHub": {"H1": {"Description": "first"}, "H2": {"Bogus": true}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Code"], "CWLNA0138");

    let (status, body) = send(&app, "GET", "/v1/configuration/MessageHub").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["MessageHub"], json!({}));
}

#[tokio::test]
async fn singletons_read_update_and_refuse_delete() {
    let app = app();
    let (status, body) = send(&app, "GET", "/v1/configuration/LDAP").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["LDAP"]["Timeout"], 30);
    assert_eq!(body["LDAP"]["Enabled"], false);

    let (status, _) = post(&app, json!({"LDAP": {"BindPassword": "secret", "Timeout": 20}})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", "/v1/configuration/LDAP").await;
    assert_eq!(body["LDAP"]["BindPassword"], "XXXXXX");
    assert_eq!(body["LDAP"]["Timeout"], 20);

    let (status, body) = send(&app, "DELETE", "/v1/configuration/LDAP/ldapconfig").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["Code"], "CWLNA0372");
    assert_eq!(body["Message"], "Delete is not allowed for LDAP object.");
}

#[tokio::test]
async fn request_shape_errors() {
    let app = app();
    let (status, body) = send(&app, "GET", "/v1/configuration/Bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Code"], "CWLNA0137");

    let (status, body) = send(&app, "DELETE", "/v1/configuration/Bogus/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Code"], "CWLNA0137");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/configuration")
                .header("content-type", "application/json")
                .body(Body::from("{\"MessageHub\":"))
                .expect("request"),
        )
        .await
        .expect("malformed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["Code"], "CWLNA6001");

    let (status, body) = post(&app, json!({"Endpoint": null})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Message"], "The REST API call: \"Endpoint\":null is not valid.");
}

#[tokio::test]
async fn bridge_forwarder_tracks_connections() {
    let app = app();
    let (status, body) = post(
        &app,
        json!({"Connection": {"C1": {"ClientID": "bridge-1"}}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["Code"], "CWLNA0139");

    let (status, body) = post(
        &app,
        json!({
            "Connection": {
                "C1": {"MQTTServerList": ["mqtt.example.com:1883"], "ClientID": "bridge-1"},
                "C2": {"EventStreamsBrokerList": ["broker:9093"], "ClientID": "bridge-2", "Password": "pw"}
            },
            "Forwarder": {"F1": {"Source": "C1", "Destination": "C2", "Topic": "a/b"}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = send(&app, "GET", "/v1/configuration/Forwarder/F1").await;
    let forwarder = &body["Forwarder"]["F1"];
    assert_eq!(forwarder["Topic"], json!(["a/b"]));
    assert_eq!(forwarder["Enabled"], true);
    assert!(forwarder.get("Selector").is_none());

    let (_, body) = send(&app, "GET", "/v1/configuration/Connection/C2").await;
    assert_eq!(body["Connection"]["C2"]["Password"], "XXXXXX");

    let (status, body) = send(&app, "DELETE", "/v1/configuration/Connection/C1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["Message"],
        "The Object: Source, Name: C1 is still being used by Object: Forwarder, Name: F1"
    );

    let (status, _) = post(
        &app,
        json!({"Forwarder": {"F1": null}, "Connection": {"C1": null}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
