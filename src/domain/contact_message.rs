use super::{ContactForm, MessageBody, VisitorEmail, VisitorName};

/// 校验通过的联系消息
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: VisitorName,
    pub email: VisitorEmail,
    pub message: MessageBody,
}

impl TryFrom<ContactForm> for ContactMessage {
    type Error = String;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        let name = VisitorName::parse(&form.name)?;
        let email = VisitorEmail::parse(&form.email)?;
        let message = MessageBody::parse(&form.message)?;

        Ok(Self {
            name,
            email,
            message,
        })
    }
}

impl ContactMessage {
    pub fn subject(&self) -> String {
        format!("Portfolio Contact from {}", self.name.as_ref())
    }

    pub fn text_body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            self.name.as_ref(),
            self.email.as_ref(),
            self.message.as_ref()
        )
    }
}
