/// 访客填写的回复地址
/// 只检查是否为空，格式由邮件中继在发送时校验
#[derive(Debug, Clone)]
pub struct VisitorEmail(String);

impl VisitorEmail {
    pub fn parse(s: &str) -> Result<VisitorEmail, String> {
        if s.is_empty() {
            return Err("visitor email is empty.".into());
        }
        Ok(Self(s.into()))
    }
}

impl AsRef<str> for VisitorEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
