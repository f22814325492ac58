use reqwest::StatusCode;
use reqwest::header;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use uncomment::serve::{self, config::Config};

/// Serve the app on an ephemeral port and return its base URL.
async fn spawn_app(config: Config) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let app = serve::app(&config);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });
    format!("http://{addr}")
}

async fn post_process(base: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/process"))
        .json(&body)
        .send()
        .await
        .expect("request");
    let status = response.status();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn health_reports_service() {
    let base = spawn_app(Config::default()).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "uncomment");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn process_strips_and_reports() {
    let base = spawn_app(Config::default()).await;
    let (status, body) = post_process(
        &base,
        json!({ "code": "x = 1  # comment\ny = 2\n", "language": "python" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["processed_code"], "x = 1\ny = 2\n");
    assert_eq!(body["original_lines"], 2);
    assert_eq!(body["processed_lines"], 2);
    assert_eq!(body["detected_language"], "python");
    assert_eq!(body["stats"]["removed"], 1);
    assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn process_keeps_block_comment_lines() {
    let base = spawn_app(Config::default()).await;
    let (_, body) = post_process(
        &base,
        json!({ "code": "/* line1\nline2 */\ncode();\n", "language": "cpp" }),
    )
    .await;
    assert_eq!(body["processed_code"], "\n\ncode();\n");
    assert_eq!(body["original_lines"], 3);
    assert_eq!(body["processed_lines"], 3);

    let (_, body) = post_process(
        &base,
        json!({
            "code": "/* line1\nline2 */\ncode();\n",
            "language": "cpp",
            "preserve_structure": false,
        }),
    )
    .await;
    assert_eq!(body["processed_code"], "code();\n");
    assert_eq!(body["processed_lines"], 1);
}

#[tokio::test]
async fn process_detects_language_when_missing() {
    let base = spawn_app(Config::default()).await;
    let (status, body) = post_process(
        &base,
        json!({ "code": "SELECT name FROM users WHERE id = 7; -- lookup\n" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detected_language"], "sql");
    assert_eq!(body["processed_code"], "SELECT name FROM users WHERE id = 7;\n");
}

#[tokio::test]
async fn process_rejects_bad_input_with_400() {
    let base = spawn_app(Config::default()).await;

    let (status, body) =
        post_process(&base, json!({ "code": "x", "language": "cobol" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported language: cobol");

    let (status, body) =
        post_process(&base, json!({ "code": "   \n", "language": "python" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No code provided");

    let response = reqwest::Client::new()
        .post(format!("{base}/api/process"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn process_file_uses_extension() {
    let base = spawn_app(Config::default()).await;
    let form = Form::new().part(
        "file",
        Part::text("# setup\nprint(1)\n").file_name("script.py"),
    );

    let response = reqwest::Client::new()
        .post(format!("{base}/api/process-file"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["filename"], "script.py");
    assert_eq!(body["detected_language"], "python");
    assert_eq!(body["processed_code"], "\nprint(1)\n");
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn process_file_rejects_binary() {
    let base = spawn_app(Config::default()).await;
    let form = Form::new().part(
        "file",
        Part::bytes(vec![0xff, 0xfe, 0x41]).file_name("bad.py"),
    );

    let response = reqwest::Client::new()
        .post(format!("{base}/api/process-file"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "bad.py is not valid UTF-8 text");
}

#[tokio::test]
async fn batch_reports_each_file() {
    let base = spawn_app(Config::default()).await;
    let form = Form::new()
        .part(
            "files",
            Part::text("a = 1  # one\n").file_name("a.py"),
        )
        .part(
            "files",
            Part::text("hello there\n").file_name("notes.unknown"),
        )
        .part(
            "files",
            Part::text("let b = 2; // two\n").file_name("b.js"),
        );

    let response = reqwest::Client::new()
        .post(format!("{base}/api/process-multiple"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["a.py"]["processed_code"], "a = 1\n");
    assert_eq!(body["b.js"]["processed_code"], "let b = 2;\n");
    assert_eq!(body["b.js"]["detected_language"], "javascript");
    assert_eq!(
        body["notes.unknown"]["error"],
        "Could not detect the language of the provided code"
    );
}

#[tokio::test]
async fn download_sets_attachment_headers() {
    let base = spawn_app(Config::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/remove_comments"))
        .form(&[("code", "int x; // c\n"), ("language", "c")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"processed_code.c\""
    );
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/x-c"));
    assert_eq!(response.text().await.unwrap(), "int x;\n");

    let response = client
        .post(format!("{base}/remove_comments"))
        .form(&[
            ("code", "# a\nb = 1\n"),
            ("language", "python"),
            ("filename", "src/app.py"),
            ("preserve_structure", "off"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"app.py\""
    );
    assert_eq!(response.text().await.unwrap(), "b = 1\n");
}

#[tokio::test]
async fn analyze_summarises_without_code() {
    let base = spawn_app(Config::default()).await;
    let form = Form::new()
        .text("code", "// a\nint x; // b\n/* c */\n")
        .text("language", "java");

    let body: Value = reqwest::Client::new()
        .post(format!("{base}/api/analyze"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["language"], "java");
    assert_eq!(body["removed"], 3);
    assert_eq!(body["comment_lines"], 3);
    assert!(body["estimated_reduction"].as_str().unwrap().ends_with('%'));
    assert!(body.get("processed_code").is_none());
}

#[tokio::test]
async fn languages_endpoints_list_registry() {
    let base = spawn_app(Config::default()).await;

    let ids: Vec<String> = reqwest::get(format!("{base}/api/languages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ids.len(), 17);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(ids.iter().any(|id| id == "rust"));

    let body: Value = reqwest::get(format!("{base}/api/supported-languages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 17);
    assert_eq!(body["languages"].as_array().unwrap().len(), 17);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let base = spawn_app(Config {
        max_body_bytes: 64,
        ..Config::default()
    })
    .await;

    let (status, body) = post_process(
        &base,
        json!({ "code": "x = 1\n".repeat(50), "language": "python" }),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let base = spawn_app(Config::default()).await;
    let response = reqwest::Client::new()
        .get(format!("{base}/api/languages"))
        .header(header::ORIGIN, "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
