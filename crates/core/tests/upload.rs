use mediapilot_core::{
    Credentials, Error, MediaClient, ResourceType, SignatureAlgorithm, UploadOptions,
};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MediaClient {
    MediaClient::new(Credentials::new("demo", "1234", "topsecret"))
        .unwrap()
        .with_base_url(format!("{}/v1_1", server.uri()))
}

fn uploaded_body(public_id: &str) -> serde_json::Value {
    json!({
        "public_id": public_id,
        "version": 1312461204,
        "signature": "7332b60d1da7033c332c59cb66dac31f72acc44c",
        "width": 864,
        "height": 576,
        "format": "jpg",
        "resource_type": "image",
        "created_at": "2017-08-11T12:24:32Z",
        "tags": ["summer"],
        "bytes": 120253,
        "type": "upload",
        "etag": "5297bd123ad4ddad723483c176e35f6e",
        "placeholder": false,
        "url": "http://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg",
        "secure_url": "https://res.cloudinary.com/demo/image/upload/v1312461204/sample.jpg",
        "access_mode": "public",
        "original_filename": "sample"
    })
}

fn request_body(request: &wiremock::Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

#[tokio::test]
async fn signed_upload_from_url_sends_credentials_and_signature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("https://example.com/sample.jpg"))
        .and(body_string_contains("name=\"api_key\""))
        .and(body_string_contains("name=\"timestamp\""))
        .and(body_string_contains("name=\"signature\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(uploaded_body("sample")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .upload_image(
            "https://example.com/sample.jpg",
            UploadOptions::new().with_public_id("sample").with_tags("summer"),
        )
        .await
        .unwrap();

    assert_eq!(response.public_id, "sample");
    assert_eq!(response.tags, vec!["summer".to_string()]);
    assert_eq!(response.storage_type, "upload");
    assert!(response.verify("abcd", SignatureAlgorithm::Sha1));

    let requests = server.received_requests().await.unwrap();
    let body = request_body(&requests[0]);
    assert!(body.contains("name=\"public_id\"\r\n\r\nsample"));
    assert!(body.contains("name=\"api_key\"\r\n\r\n1234"));
    assert!(!body.contains("topsecret"), "the API secret must never be sent");
}

#[tokio::test]
async fn signed_upload_streams_local_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("filename=\"avatar.png\""))
        .and(body_string_contains("plain text pretending to be pixels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(uploaded_body("avatar")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("avatar.png");
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(b"plain text pretending to be pixels").unwrap();

    let client = client_for(&server);
    let response = client
        .upload_image(file_path.to_str().unwrap(), UploadOptions::new())
        .await;

    tokio_test::assert_ok!(&response);
    assert_eq!(response.unwrap().public_id, "avatar");
}

#[tokio::test]
async fn upload_uses_resource_type_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/raw/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_id": "notes.txt"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .upload_image(
            "https://example.com/notes.txt",
            UploadOptions::new().with_resource_type(ResourceType::Raw),
        )
        .await
        .unwrap();

    assert_eq!(response.public_id, "notes.txt");
    let body = request_body(&server.received_requests().await.unwrap()[0]);
    assert!(!body.contains("name=\"resource_type\""));
}

#[tokio::test]
async fn unsigned_upload_sends_preset_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(body_string_contains("name=\"upload_preset\"\r\n\r\nml_default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(uploaded_body("anon")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .unsigned_upload_image(
            "https://example.com/anon.jpg",
            "ml_default",
            UploadOptions::new().with_folder("guests").with_overwrite(true),
        )
        .await
        .unwrap();

    let body = request_body(&server.received_requests().await.unwrap()[0]);
    assert!(body.contains("name=\"folder\"\r\n\r\nguests"));
    assert!(!body.contains("name=\"api_key\""));
    assert!(!body.contains("name=\"signature\""));
    assert!(!body.contains("name=\"timestamp\""));
    assert!(!body.contains("name=\"overwrite\""));
}

#[tokio::test]
async fn unsigned_upload_validates_arguments_before_sending() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let no_preset = client
        .unsigned_upload_image("https://example.com/a.jpg", "  ", UploadOptions::new())
        .await;
    assert!(matches!(no_preset, Err(Error::InvalidInput(_))));

    let no_file = client
        .unsigned_upload_image("", "preset", UploadOptions::new())
        .await;
    assert!(matches!(no_file, Err(Error::InvalidInput(_))));

    let s3 = client
        .upload_image("s3://bucket/a.jpg", UploadOptions::new())
        .await;
    assert!(matches!(s3, Err(Error::UnsupportedSource(_))));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"message": "Invalid image file"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .upload_image("https://example.com/broken.jpg", UploadOptions::new())
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid image file");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn upload_reports_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Invalid Signature"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .upload_image("https://example.com/a.jpg", UploadOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(ref m) if m == "Invalid Signature"));
}
