use secrecy::SecretString;

/// Process-wide configuration shared with the API layer.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self { token_secret }
    }
}
