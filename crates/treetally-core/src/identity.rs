use crate::services::IdentityProvider;

/// Signed-in user taken from the `[identity]` config table.
#[derive(Debug, Clone)]
pub struct ConfigIdentity {
    email: Option<String>,
}

impl ConfigIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into().trim().to_string();
        Self {
            email: (!email.is_empty()).then_some(email),
        }
    }

    pub fn signed_out() -> Self {
        Self { email: None }
    }
}

impl IdentityProvider for ConfigIdentity {
    fn resolve(&self) -> anyhow::Result<Option<String>> {
        Ok(self.email.clone())
    }
}
