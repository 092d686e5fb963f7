use crate::{domain::WaitlistEmail, email_client::EmailClient, metrics::Metrics};
use axum::extract::FromRef;
use derive_getters::Getters;
use duplicate::duplicate_item;
use std::sync::Arc;

/// Internal address notified about every waitlist signup.
#[derive(Debug)]
pub struct AdminRecipient(pub WaitlistEmail);

/// Public TestFlight invitation link included in the welcome email.
#[derive(Debug)]
pub struct TestflightUrl(pub String);

#[derive(Debug, Clone, Getters)]
pub struct AppState {
    email_client: Arc<EmailClient>,
    admin_recipient: Arc<AdminRecipient>,
    testflight_url: Arc<TestflightUrl>,
    metrics: Arc<Metrics>,
}

impl AppState {
    pub fn create(
        email_client: EmailClient,
        admin_recipient: WaitlistEmail,
        testflight_url: String,
        metrics: Metrics,
    ) -> Self {
        Self {
            email_client: Arc::new(email_client),
            admin_recipient: Arc::new(AdminRecipient(admin_recipient)),
            testflight_url: Arc::new(TestflightUrl(testflight_url)),
            metrics: Arc::new(metrics),
        }
    }
}

#[duplicate_item(
    service_type        field;
    [ EmailClient ]     [ email_client ];
    [ AdminRecipient ]  [ admin_recipient ];
    [ TestflightUrl ]   [ testflight_url ];
    [ Metrics ]         [ metrics ];
)]
impl FromRef<AppState> for Arc<service_type> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.field.clone()
    }
}
