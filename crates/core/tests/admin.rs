use mediapilot_core::{Credentials, DeleteOptions, Error, MediaClient, ResourceType, StorageType};
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MediaClient {
    MediaClient::new(Credentials::new("demo", "1234", "abcd"))
        .unwrap()
        .with_base_url(format!("{}/v1_1", server.uri()))
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn delete_resources_sends_every_public_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/upload"))
        .and(basic_auth("1234", "abcd"))
        .and(query_param("public_ids[]", "sample"))
        .and(query_param("public_ids[]", "other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {"sample": "deleted", "other": "not_found"},
            "partial": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .delete_resources(&ids(&["sample", "other"]), DeleteOptions::new())
        .await
        .unwrap();

    assert!(!response.partial);
    assert_eq!(
        response.statuses(),
        vec![
            ("other".to_string(), "not_found".to_string()),
            ("sample".to_string(), "deleted".to_string())
        ]
    );
}

#[tokio::test]
async fn delete_resources_routes_by_type() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/video/private"))
        .and(query_param("keep_original", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {"clip": "deleted"},
            "partial": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = DeleteOptions::new()
        .with_resource_type(ResourceType::Video)
        .with_type(StorageType::Private)
        .with_keep_original(true);
    client.delete_resources(&ids(&["clip"]), options).await.unwrap();
}

#[tokio::test]
async fn delete_by_prefix_and_all_report_partial_results() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/upload"))
        .and(query_param("prefix", "avatars/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {"avatars/a": "deleted"},
            "partial": true,
            "next_cursor": "c2f9"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/upload"))
        .and(query_param("all", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {},
            "partial": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let by_prefix = client
        .delete_resources_by_prefix("avatars/", DeleteOptions::new())
        .await
        .unwrap();
    assert!(by_prefix.partial);
    assert_eq!(by_prefix.next_cursor.as_deref(), Some("c2f9"));

    let all = client.delete_all_resources(DeleteOptions::new()).await.unwrap();
    assert!(all.statuses().is_empty());
}

#[tokio::test]
async fn delete_by_tag_and_derived() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/tags/summer"))
        .and(basic_auth("1234", "abcd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {"beach": "deleted"},
            "partial": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/derived_resources"))
        .and(query_param("derived_resource_ids[]", "8267a869b62a93a59248f35d7f124c1f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {"8267a869b62a93a59248f35d7f124c1f": "deleted"},
            "partial": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/upload"))
        .and(query_param("transformations", "w_150,h_100,c_fill"))
        .and(query_param("keep_original", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deleted": {"sample": "deleted"},
            "partial": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .delete_resources_by_tag("summer", DeleteOptions::new())
        .await
        .unwrap();
    client
        .delete_derived_resources(&ids(&["8267a869b62a93a59248f35d7f124c1f"]))
        .await
        .unwrap();
    client
        .delete_derived_by_transformation(
            &ids(&["sample"]),
            &ids(&["w_150,h_100,c_fill"]),
            DeleteOptions::new(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_by_tag_keeps_special_characters_in_the_tag() {
    let server = MockServer::start().await;
    for encoded in ["summer%20sale", "sale%232024", "a%3Fall=true", "x%2F..%2F..%2Fupload"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/v1_1/demo/resources/image/tags/{}", encoded)))
            .and(basic_auth("1234", "abcd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "deleted": {},
                "partial": false
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    for tag in ["summer sale", "sale#2024", "a?all=true", "x/../../upload"] {
        client
            .delete_resources_by_tag(tag, DeleteOptions::new())
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        assert!(request.url.path().starts_with("/v1_1/demo/resources/image/tags/"));
        assert!(request.url.query().is_none());
    }
}

#[tokio::test]
async fn delete_maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/upload"))
        .respond_with(
            ResponseTemplate::new(420)
                .set_body_json(json!({"error": {"message": "Rate Limit Exceeded"}})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1_1/demo/resources/image/tags/missing"))
        .respond_with(ResponseTemplate::new(403).set_body_string(""))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rate_limited = client
        .delete_resources(&ids(&["a"]), DeleteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(rate_limited, Error::RateLimited(ref m) if m == "Rate Limit Exceeded"));

    let forbidden = client
        .delete_resources_by_tag("missing", DeleteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(forbidden, Error::PermissionDenied(ref m) if m == "Forbidden"));
}

#[tokio::test]
async fn delete_rejects_invalid_input_without_calling_the_api() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let too_many: Vec<String> = (0..101).map(|i| format!("img{}", i)).collect();
    assert!(matches!(
        client.delete_resources(&too_many, DeleteOptions::new()).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        client.delete_resources_by_prefix(" ", DeleteOptions::new()).await,
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        client.delete_derived_resources(&[]).await,
        Err(Error::InvalidInput(_))
    ));

    assert!(server.received_requests().await.unwrap().is_empty());
}
