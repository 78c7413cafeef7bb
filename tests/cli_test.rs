use serde_json::{json, Value};
use std::fs;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

mod common;
use common::{stderr, stdout, TestContext};

#[test]
fn test_settings_show_installs_defaults() {
    let ctx = TestContext::new();

    let output = ctx.run(&["settings", "show"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let shown: Value = serde_json::from_str(&stdout(&output)).expect("settings should be JSON");
    assert_eq!(shown["enabled"], json!(true));
    assert_eq!(
        shown["webhookUrl"],
        json!("http://localhost:5678/webhook-test/n8n/prompt/enhance")
    );

    let stored = fs::read_to_string(ctx.config_dir().join("settings.json"))
        .expect("defaults should be written on first run");
    assert!(stored.contains("showNotifications"));
}

#[test]
fn test_settings_set_roundtrip() {
    let ctx = TestContext::new();

    let output = ctx.run(&["settings", "set", "webhookUrl", "https://hooks.example/enhance"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let output = ctx.run(&["settings", "set", "enabled", "false"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let shown: Value = serde_json::from_str(&stdout(&ctx.run(&["settings", "show"]))).unwrap();
    assert_eq!(shown["webhookUrl"], json!("https://hooks.example/enhance"));
    assert_eq!(shown["enabled"], json!(false));
}

#[test]
fn test_settings_set_rejects_bad_values() {
    let ctx = TestContext::new();

    assert!(!ctx.run(&["settings", "set", "webhookUrl", "ftp://nope"]).status.success());
    assert!(!ctx.run(&["settings", "set", "enabled", "maybe"]).status.success());
    assert!(!ctx.run(&["settings", "set", "theme", "dark"]).status.success());
}

#[test]
fn test_enhance_rejects_short_text() {
    let ctx = TestContext::new();
    let output = ctx.run(&["enhance", "--text", "hi"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("too short"));
}

#[tokio::test]
async fn test_enhance_through_webhook() {
    let mock_server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"text": "write a haiku about crabs"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"enhancedText": "Write a 5-7-5 haiku about crabs."})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let ctx = TestContext::new();
    let url = mock_server.uri();
    let output = ctx.run_async(&["settings", "set", "webhookUrl", url.as_str()]).await;
    assert!(output.status.success(), "{}", stderr(&output));

    for extra in [None, Some("--direct")] {
        let mut args = vec!["enhance", "--text", "write a haiku about crabs"];
        args.extend(extra);
        let output = ctx.run_async(&args).await;
        assert!(output.status.success(), "{}", stderr(&output));
        assert_eq!(stdout(&output).trim(), "Write a 5-7-5 haiku about crabs.");
        assert!(stderr(&output).contains("Prompt enhanced successfully!"));
    }
}

#[tokio::test]
async fn test_connection_commands() {
    let mock_server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let ctx = TestContext::new();
    ctx.write_config(r#"{"transport": "direct", "log_level": "WARN"}"#);
    let url = mock_server.uri();
    ctx.run_async(&["settings", "set", "webhookUrl", url.as_str()]).await;

    let output = ctx.run_async(&["test-connection"]).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Connection successful"));

    let output = ctx.run_async(&["status"]).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Connected"));
}
