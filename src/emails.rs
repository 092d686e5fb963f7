//! Rendering of the two emails sent for every waitlist signup.
//!
//! Submitted values are HTML-escaped by the templates.

use crate::{
    domain::{WaitlistEmail, WaitlistSubmission},
    email_client::{EmailKind, EmailMessage},
};
use askama::Template;
use chrono::{DateTime, Datelike, Utc};

pub const ADMIN_NOTIFICATION_SUBJECT: &str = "🎉 New Beta Waitlist Signup!";
pub const WELCOME_SUBJECT: &str = "Welcome to the LootLook Beta Program! 🎉";
const DEFAULT_FEEDBACK_FOCUS: &str = "General feedback";

#[derive(Template)]
#[template(path = "emails/admin_notification.html")]
struct AdminNotificationTemplate<'a> {
    email: &'a str,
    name: Option<&'a str>,
    collection_type: Option<&'a str>,
    feedback_focus: Option<&'a str>,
    signed_up_at: String,
}

#[derive(Template)]
#[template(path = "emails/welcome.html")]
struct WelcomeTemplate<'a> {
    name: Option<&'a str>,
    collection_type: Option<&'a str>,
    feedback_focus: &'a str,
    testflight_url: &'a str,
    year: i32,
}

/// Build the internal notification about a new signup.
pub fn admin_notification(
    submission: &WaitlistSubmission,
    admin_recipient: &WaitlistEmail,
    signed_up_at: DateTime<Utc>,
) -> Result<EmailMessage, askama::Error> {
    let html_body = AdminNotificationTemplate {
        email: submission.email.as_ref(),
        name: submission.name.as_deref(),
        collection_type: submission.collection_type.as_deref(),
        feedback_focus: submission.feedback_focus.as_deref(),
        signed_up_at: signed_up_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
    .render()?;

    Ok(EmailMessage {
        kind: EmailKind::AdminNotification,
        recipient: admin_recipient.clone(),
        subject: ADMIN_NOTIFICATION_SUBJECT.to_string(),
        html_body,
    })
}

/// Build the welcome email sent to the person who signed up.
pub fn welcome_message(
    submission: &WaitlistSubmission,
    testflight_url: &str,
    signed_up_at: DateTime<Utc>,
) -> Result<EmailMessage, askama::Error> {
    let html_body = WelcomeTemplate {
        name: submission.name.as_deref(),
        collection_type: submission.collection_type.as_deref(),
        feedback_focus: submission
            .feedback_focus
            .as_deref()
            .unwrap_or(DEFAULT_FEEDBACK_FOCUS),
        testflight_url,
        year: signed_up_at.year(),
    }
    .render()?;

    Ok(EmailMessage {
        kind: EmailKind::Welcome,
        recipient: submission.email.clone(),
        subject: WELCOME_SUBJECT.to_string(),
        html_body,
    })
}
