#[derive(Debug, Clone)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn parse(s: &str) -> Result<MessageBody, String> {
        if s.is_empty() {
            return Err("message is empty.".into());
        }
        Ok(Self(s.into()))
    }
}

impl AsRef<str> for MessageBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
