/// Deployment server API key, sent as a bearer token.
///
/// `Debug` never prints the key so the token can sit inside logged structs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
