mod waitlist_email;
mod waitlist_submission;

pub use waitlist_email::WaitlistEmail;
pub use waitlist_submission::WaitlistSubmission;
