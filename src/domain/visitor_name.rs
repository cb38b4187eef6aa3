#[derive(Debug, Clone)]
pub struct VisitorName(String);

impl VisitorName {
    pub fn parse(s: &str) -> Result<VisitorName, String> {
        if s.is_empty() {
            return Err("visitor name is empty.".into());
        }
        Ok(Self(s.into()))
    }
}

impl AsRef<str> for VisitorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
