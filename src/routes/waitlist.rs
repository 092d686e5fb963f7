use crate::{
    domain::WaitlistSubmission,
    email_client::{EmailClient, EmailMessage},
    emails,
    metrics::Metrics,
    state::{AdminRecipient, AppState, TestflightUrl},
};
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use http::StatusCode;
use std::sync::Arc;
use tracing::{field::display, Span};
use utoipa::ToSchema;

pub const JOINED_MESSAGE: &str = "Successfully joined the waitlist!";

/// Body of a waitlist signup as sent by the site's signup form.
#[derive(Debug, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistRequest {
    #[schema(example = "tester@example.com")]
    email: Option<String>,
    #[schema(example = "Ada")]
    name: Option<String>,
    #[schema(example = "cameras")]
    collection_type: Option<String>,
    #[schema(example = "ai-accuracy")]
    feedback_focus: Option<String>,
}

impl WaitlistRequest {
    /// Parse a request body. Only a JSON object is accepted; serde would
    /// otherwise also read the fields positionally out of an array.
    pub fn from_json(body: &[u8]) -> anyhow::Result<Self> {
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)
            .context("Waitlist request body is not a JSON object")?;

        serde_json::from_value(serde_json::Value::Object(fields))
            .context("Failed to parse the waitlist request body")
    }
}

impl TryFrom<WaitlistRequest> for WaitlistSubmission {
    type Error = String;

    fn try_from(value: WaitlistRequest) -> Result<Self, Self::Error> {
        WaitlistSubmission::parse(
            value.email,
            value.name,
            value.collection_type,
            value.feedback_focus,
        )
    }
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct WaitlistResponse {
    success: bool,
    message: String,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    error: String,
}

/// Create a router to serve endpoints.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/api/waitlist", post(join_waitlist))
}

/// Join the beta waitlist.
///
/// The body is read as JSON whatever its `Content-Type` is. Both emails are
/// attempted, but failing to deliver them never fails the signup.
#[tracing::instrument(
    name = "Adding a new waitlist signup",
    skip(body, email_client, admin_recipient, testflight_url, metrics),
    fields(waitlist_email = tracing::field::Empty)
)]
#[utoipa::path(
    post,
    path = "/api/waitlist",
    request_body = WaitlistRequest,
    responses(
        (status = 200, description = "Joined the waitlist", body = WaitlistResponse),
        (status = 400, description = "Missing or invalid email", body = ErrorResponse),
        (status = 500, description = "Malformed request or internal failure", body = ErrorResponse),
    )
)]
pub async fn join_waitlist(
    State(email_client): State<Arc<EmailClient>>,
    State(admin_recipient): State<Arc<AdminRecipient>>,
    State(testflight_url): State<Arc<TestflightUrl>>,
    State(metrics): State<Arc<Metrics>>,
    body: Bytes,
) -> Result<impl IntoResponse, WaitlistError> {
    let request = WaitlistRequest::from_json(&body).map_err(WaitlistError::UnexpectedError)?;

    let submission: WaitlistSubmission = request.try_into().map_err(|e| {
        metrics.record_rejected_submission();
        WaitlistError::ValidationError(e)
    })?;
    Span::current().record("waitlist_email", &display(&submission.email));

    let signed_up_at = Utc::now();
    let admin_notification =
        emails::admin_notification(&submission, &admin_recipient.0, signed_up_at)
            .context("Failed to render the admin notification email")
            .map_err(WaitlistError::UnexpectedError)?;
    let welcome = emails::welcome_message(&submission, &testflight_url.0, signed_up_at)
        .context("Failed to render the welcome email")
        .map_err(WaitlistError::UnexpectedError)?;

    send_waitlist_emails(&email_client, &metrics, [admin_notification, welcome]).await;

    metrics.record_signup();
    tracing::info!("New waitlist signup has been processed");

    Ok((
        StatusCode::OK,
        Json(WaitlistResponse {
            success: true,
            message: JOINED_MESSAGE.to_string(),
        }),
    ))
}

/// Send the waitlist emails concurrently and wait for all of them to settle.
/// Failures are logged and counted, never returned.
#[tracing::instrument(name = "Send waitlist emails", skip_all)]
async fn send_waitlist_emails(
    email_client: &EmailClient,
    metrics: &Metrics,
    messages: [EmailMessage; 2],
) {
    let [first, second] = messages;
    let (first_outcome, second_outcome) = tokio::join!(
        email_client.send_email(&first),
        email_client.send_email(&second),
    );

    for (message, outcome) in [(first, first_outcome), (second, second_outcome)] {
        if let Err(e) = outcome {
            metrics.record_delivery_failure(message.kind);
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                email_kind = message.kind.as_str(),
                "Failed to deliver a waitlist email. \
                The signup is kept regardless",
            );
        }
    }
}

/// Represent the different possible errors when joining the waitlist.
#[derive(thiserror::Error)]
pub enum WaitlistError {
    #[error("Valid email address is required")]
    ValidationError(String),
    #[error("Failed to process your request. Please try again.")]
    UnexpectedError(#[source] anyhow::Error),
}

impl IntoResponse for WaitlistError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ValidationError(reason) => {
                tracing::warn!(reason = %reason, "Rejected waitlist submission");
                StatusCode::BAD_REQUEST
            }
            Self::UnexpectedError(_) => {
                tracing::error!("{self:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
