// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire-level tests for the Strava client against a mock server.

use serde_json::json;
use strava_sync::config::Config;
use strava_sync::services::{ProviderError, StravaApi, StravaClient};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StravaClient {
    let mut config = Config::test_default();
    config.strava_api_base_url = format!("{}/api/v3", server.uri());
    config.strava_oauth_base_url = format!("{}/oauth", server.uri());
    StravaClient::new(&config).unwrap()
}

fn activity_json(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Morning Ride",
        "distance": 25000.5,
        "moving_time": 3600,
        "elapsed_time": 4000,
        "start_date": "2025-12-30T07:00:00Z",
        "type": "Ride",
        "kudos_count": 3
    })
}

#[tokio::test]
async fn test_refresh_posts_form_with_refresh_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old_refresh"))
        .and(body_string_contains("client_id=test_client_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "new_access",
            "refresh_token": "new_refresh",
            "expires_at": 1_767_247_200,
            "expires_in": 21600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .refresh_token("old_refresh")
        .await
        .unwrap();

    assert_eq!(response.access_token, "new_access");
    assert_eq!(response.refresh_token, "new_refresh");
    assert_eq!(response.expires_at_secs(), 1_767_247_200);
}

#[tokio::test]
async fn test_exchange_posts_form_with_code_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=one-time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access",
            "refresh_token": "refresh",
            "expires_at": 1_767_247_200,
            "athlete": {"id": 134815, "firstname": "Marianne", "lastname": "V."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .exchange_code("one-time")
        .await
        .unwrap();

    assert_eq!(response.athlete.id, 134815);
    assert_eq!(response.athlete.firstname.as_deref(), Some("Marianne"));
}

#[tokio::test]
async fn test_list_activities_sends_bearer_and_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header("authorization", "Bearer access"))
        .and(query_param("after", "1766361600"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "50"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([activity_json(1), activity_json(2)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let activities = client_for(&server)
        .list_activities("access", Some(1_766_361_600), 2, 50)
        .await
        .unwrap();

    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].id, 1);
    assert_eq!(activities[0].activity_type, "Ride");
    assert_eq!(activities[0].distance, 25000.5);
}

#[tokio::test]
async fn test_list_activities_without_window_omits_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let activities = client_for(&server)
        .list_activities("access", None, 1, 30)
        .await
        .unwrap();
    assert!(activities.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or("").contains("after"));
}

#[tokio::test]
async fn test_rate_limit_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([activity_json(9)])))
        .expect(1)
        .mount(&server)
        .await;

    let activities = client_for(&server)
        .list_activities("access", None, 1, 30)
        .await
        .unwrap();

    assert_eq!(activities[0].id, 9);
}

#[tokio::test]
async fn test_repeated_rate_limit_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate Limit Exceeded"))
        .expect(2)
        .mount(&server)
        .await;

    let err = client_for(&server).refresh_token("r").await.unwrap_err();

    assert!(err.is_rate_limited());
}

#[tokio::test]
async fn test_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"message":"Bad Request","errors":[{"resource":"RefreshToken","code":"invalid"}]}"#,
        ))
        .mount(&server)
        .await;

    let err = client_for(&server).refresh_token("bad").await.unwrap_err();

    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("RefreshToken"));
        }
        other => panic!("expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .list_activities("access", None, 1, 30)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Decode(_)));
}
