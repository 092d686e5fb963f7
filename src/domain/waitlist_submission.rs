use super::WaitlistEmail;

/// A validated request to join the beta waitlist.
///
/// Optional fields that were submitted as empty strings are stored as `None`,
/// so templates only need to check for presence.
#[derive(Debug, Clone)]
pub struct WaitlistSubmission {
    pub email: WaitlistEmail,
    pub name: Option<String>,
    pub collection_type: Option<String>,
    pub feedback_focus: Option<String>,
}

impl WaitlistSubmission {
    pub fn parse(
        email: Option<String>,
        name: Option<String>,
        collection_type: Option<String>,
        feedback_focus: Option<String>,
    ) -> Result<Self, String> {
        let email = email.ok_or_else(|| "Missing email address.".to_string())?;

        Ok(Self {
            email: WaitlistEmail::parse(email)?,
            name: non_empty(name),
            collection_type: non_empty(collection_type),
            feedback_focus: non_empty(feedback_focus),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
