use crate::utils::{email_body, spawn_app, when_sending_an_email, ADMIN_EMAIL};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::{matchers::body_partial_json, ResponseTemplate};

const VALIDATION_ERROR: &str = "Valid email address is required";
const UNEXPECTED_ERROR: &str = "Failed to process your request. Please try again.";

fn full_body() -> serde_json::Value {
    json!({
        "email": "tester@example.com",
        "name": "Ada",
        "collectionType": "cameras",
        "feedbackFocus": "ai-accuracy",
    })
}

#[tokio::test]
async fn joining_returns_a_200_and_success_message_for_valid_data() {
    // Arrange
    let app = spawn_app().await;
    app.mock_send_email_endpoint_to_ok().await;

    // Act
    let response = app.post_waitlist(&full_body()).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "message": "Successfully joined the waitlist!" })
    );
}

#[tokio::test]
async fn joining_sends_an_admin_notification_and_a_welcome_email() {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(app.email_server())
        .await;

    // Act
    app.post_waitlist(&full_body()).await;

    // Assert
    let emails = app.sent_emails().await;
    assert_eq!(emails.len(), 2);

    let admin_email = emails
        .iter()
        .find(|e| e["to"] == ADMIN_EMAIL)
        .expect("No email sent to the admin");
    let admin_html = admin_email["html"].as_str().unwrap();
    assert!(admin_html.contains("tester@example.com"));
    assert!(admin_html.contains("cameras"));

    let user_email = emails
        .iter()
        .find(|e| e["to"] == "tester@example.com")
        .expect("No email sent to the submitter");
    let user_html = user_email["html"].as_str().unwrap();
    assert!(user_html.contains("Ada"));
    assert!(user_html.contains("ai-accuracy"));
    assert_ne!(admin_email["subject"], user_email["subject"]);
}

#[tokio::test]
async fn welcome_email_omits_the_name_when_none_is_given() {
    // Arrange
    let app = spawn_app().await;
    app.mock_send_email_endpoint_to_ok().await;

    // Act
    app.post_waitlist(&json!({ "email": "tester@example.com", "name": "" }))
        .await;

    // Assert
    let emails = app.sent_emails().await;
    let user_email = emails
        .iter()
        .find(|e| e["to"] == "tester@example.com")
        .expect("No email sent to the submitter");
    let user_html = user_email["html"].as_str().unwrap();
    assert!(user_html.contains("Hi,"));
    assert!(user_html.contains("General feedback"));

    let admin_email = emails.iter().find(|e| e["to"] == ADMIN_EMAIL).unwrap();
    assert!(!admin_email["html"].as_str().unwrap().contains("Name:"));
}

#[rstest]
#[case(json!({ "name": "Ada" }), "missing the email")]
#[case(json!({ "email": null }), "null email")]
#[case(json!({ "email": "" }), "empty email")]
#[case(json!({ "email": "not-an-email" }), "email without @")]
#[case(json!({}), "empty object")]
#[tokio::test]
async fn joining_returns_a_400_when_email_is_invalid(
    #[case] body: serde_json::Value,
    #[case] description: &str,
) {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(app.email_server())
        .await;

    // Act
    let response = app.post_waitlist(&body).await;

    // Assert
    assert_eq!(
        response.status(),
        StatusCode::BAD_REQUEST,
        "The API did not fail with 400 Bad Request when the payload had {}.",
        description
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": VALIDATION_ERROR }));
}

#[rstest]
#[case("this is not json", "plain text")]
#[case("null", "a null body")]
#[case(r#"{"email": 42}"#, "a numeric email")]
#[case("", "an empty body")]
#[case(r#"["tester@example.com",null,null,null]"#, "an array body")]
#[case(r#"{"email": "tester@example.com", "name": 42}"#, "a numeric name")]
#[tokio::test]
async fn joining_returns_a_500_for_malformed_bodies(
    #[case] body: &'static str,
    #[case] description: &str,
) {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(app.email_server())
        .await;

    // Act
    let response = app.post_waitlist_raw(body).await;

    // Assert
    assert_eq!(
        response.status(),
        StatusCode::INTERNAL_SERVER_ERROR,
        "The API did not fail with 500 when the payload was {}.",
        description
    );
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": UNEXPECTED_ERROR }));
}

#[tokio::test]
async fn json_body_is_accepted_without_content_type() {
    // Arrange
    let app = spawn_app().await;
    app.mock_send_email_endpoint_to_ok().await;

    // Act
    let response = app
        .post_waitlist_raw(r#"{"email": "tester@example.com"}"#)
        .await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[case(500, 500)]
#[case(500, 200)]
#[case(200, 500)]
#[tokio::test]
async fn joining_succeeds_even_if_email_delivery_fails(
    #[case] admin_status: u16,
    #[case] welcome_status: u16,
) {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .and(body_partial_json(json!({ "to": ADMIN_EMAIL })))
        .respond_with(ResponseTemplate::new(admin_status))
        .expect(1)
        .mount(app.email_server())
        .await;
    when_sending_an_email()
        .and(body_partial_json(json!({ "to": "tester@example.com" })))
        .respond_with(ResponseTemplate::new(welcome_status))
        .expect(1)
        .mount(app.email_server())
        .await;

    // Act
    let response = app.post_waitlist(&full_body()).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn joining_succeeds_when_the_email_provider_is_unreachable() {
    // Arrange
    let app = spawn_app().await;
    // Nothing is mounted, so the mock server answers 404 to every email.

    // Act
    let response = app.post_waitlist(&full_body()).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn a_stalling_email_provider_does_not_block_the_response_indefinitely() {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(app.email_server())
        .await;

    // Act
    let started = Instant::now();
    let response = app.post_waitlist(&full_body()).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn both_emails_are_sent_concurrently() {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(1)))
        .expect(2)
        .mount(app.email_server())
        .await;

    // Act
    let started = Instant::now();
    let response = app.post_waitlist(&full_body()).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    // Sequential sends would take at least two seconds.
    assert!(started.elapsed() < Duration::from_millis(1900));
}

#[tokio::test]
async fn resubmitting_the_same_email_sends_emails_again() {
    // Arrange
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(4)
        .mount(app.email_server())
        .await;

    // Act
    let first = app.post_waitlist(&full_body()).await;
    let second = app.post_waitlist(&full_body()).await;

    // Assert
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    let recipients: Vec<String> = app
        .email_server()
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| email_body(r)["to"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        recipients.iter().filter(|to| *to == "tester@example.com").count(),
        2
    );
}
