#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    /// Returns an instance of `MessageBody` if the input contains at least
    /// one non-whitespace character. The text is kept as submitted.
    pub fn parse(s: String) -> Result<MessageBody, String> {
        if s.trim().is_empty() {
            Err("The message is empty".to_string())
        } else {
            Ok(Self(s))
        }
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
