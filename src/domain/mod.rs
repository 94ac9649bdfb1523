mod contact_email;
mod message_body;
mod submission;

pub use contact_email::ContactEmail;
pub use message_body::MessageBody;
pub use submission::{CaptchaToken, Submission, SubmissionError, SubmissionForm};
