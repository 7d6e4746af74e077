//! HTTP collaborators against a mock server

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ayat_ingest::api::{build_http_client, ContentClient, OAuthClient};
use ayat_ingest::config::ContentQuery;
use ayat_ingest::{
    AuthClient, ContentError, ContentSource, Credential, IngestError, RemoteFetcher,
    VerseFetcher, VerseKey,
};
use serde_json::json;
use wiremock::{
    matchers::{body_string_contains, header, header_exists, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn verse_body(language: &str, translations: &[&str]) -> serde_json::Value {
    let words: Vec<serde_json::Value> = translations
        .iter()
        .enumerate()
        .map(|(i, t)| {
            json!({
                "id": i + 1,
                "position": i + 1,
                "char_type_name": "word",
                "text_imlaei": format!("w{}", i + 1),
                "location": format!("1:1:{}", i + 1),
                "translation": {"text": t, "language_name": language},
                "transliteration": {"text": format!("tr{}", i + 1), "language_name": "english"}
            })
        })
        .collect();

    json!({
        "verse": {
            "id": 1,
            "verse_key": "1:1",
            "verse_number": 1,
            "ruku_number": 1,
            "text_imlaei": "بِسْمِ اللَّهِ",
            "words": words
        }
    })
}

fn content_client(server: &MockServer) -> ContentClient {
    ContentClient::new(
        build_http_client(5).unwrap(),
        server.uri(),
        "client-123",
        ContentQuery::default(),
    )
}

// ============================================================================
// Content service
// ============================================================================

#[tokio::test]
async fn test_content_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/content/api/v4/verses/by_key/1:1"))
        .and(header("x-auth-token", "tok"))
        .and(header("x-client-id", "client-123"))
        .and(header("accept", "application/json"))
        .and(query_param("words", "true"))
        .and(query_param("language", "en"))
        .and(query_param("translations", "131,6"))
        .and(query_param("translation_fields", "text,language_name"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(verse_body("english", &["In (the) name"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = content_client(&server)
        .verse_by_key(VerseKey::new(1, 1), "en", &Credential::new("tok"))
        .await
        .unwrap();

    assert_eq!(response.verse.verse_key, "1:1");
    assert_eq!(response.verse.words.len(), 1);
    assert_eq!(response.verse.extra["verse_number"], json!(1));
}

#[tokio::test]
async fn test_content_status_classification() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/content/api/v4/verses/by_key/1:1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/api/v4/verses/by_key/1:2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/api/v4/verses/by_key/1:3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = content_client(&server);
    let credential = Credential::new("tok");

    let err = client.verse_by_key(VerseKey::new(1, 1), "en", &credential).await.unwrap_err();
    assert!(matches!(err, ContentError::Unauthorized(403)));
    assert!(err.is_auth_expired());

    let err = client.verse_by_key(VerseKey::new(1, 2), "en", &credential).await.unwrap_err();
    assert!(matches!(err, ContentError::Status(500)));
    assert!(!err.is_auth_expired());

    let err = client.verse_by_key(VerseKey::new(1, 3), "en", &credential).await.unwrap_err();
    assert!(matches!(err, ContentError::Decode(_)));
}

#[tokio::test]
async fn test_remote_fetcher_merges_both_locales() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verse_body(
            "english",
            &["In (the) name", "(of) Allah"],
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("language", "ur"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(verse_body("urdu", &["نام سے", "اللہ کے"])),
        )
        .mount(&server)
        .await;

    let fetcher = RemoteFetcher::new(content_client(&server), &ContentQuery::default());
    let record = fetcher
        .fetch(VerseKey::new(1, 1), &Credential::new("tok"))
        .await
        .unwrap()
        .unwrap();

    let value = serde_json::to_value(&record).unwrap();
    let word = &value["verse"]["words"][1];
    assert_eq!(word["translation_en"]["text"], json!("(of) Allah"));
    assert_eq!(word["translation_ur"]["text"], json!("اللہ کے"));
    assert_eq!(word["transliteration"]["text"], json!("tr2"));
    assert_eq!(word["position"], json!(2));
    assert!(word.get("translation").is_none());
}

#[tokio::test]
async fn test_remote_fetcher_secondary_locale_rejection_is_auth_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(verse_body("english", &["a"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("language", "ur"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = RemoteFetcher::new(content_client(&server), &ContentQuery::default());
    assert!(fetcher
        .fetch(VerseKey::new(1, 1), &Credential::new("tok"))
        .await
        .is_err());
}

// ============================================================================
// Identity provider
// ============================================================================

#[tokio::test]
async fn test_token_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued-token",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = OAuthClient::new(build_http_client(5).unwrap(), server.uri(), "id", "secret");
    let credential = auth.request_token().await.unwrap();
    assert_eq!(credential.as_str(), "issued-token");
}

#[tokio::test]
async fn test_token_rejection_is_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let auth = OAuthClient::new(build_http_client(5).unwrap(), server.uri(), "id", "wrong");
    let err = auth.request_token().await.unwrap_err();
    assert!(matches!(err, IngestError::AuthFailure(_)));
}

#[tokio::test]
async fn test_token_response_without_token_is_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_scope"})))
        .mount(&server)
        .await;

    let auth = OAuthClient::new(build_http_client(5).unwrap(), server.uri(), "id", "secret");
    let err = auth.request_token().await.unwrap_err();
    assert!(matches!(err, IngestError::AuthFailure(_)));
}
