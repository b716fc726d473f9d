//! Sink credential

use std::fmt;

/// Environment variable holding the MotherDuck token
pub const TOKEN_VAR: &str = "MOTHERDUCK_TOKEN";

/// Bearer token for the sink
///
/// Never printed: `Debug` shows only whether a token is present.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(token))
        }
    }

    pub fn missing() -> Self {
        Self(None)
    }

    /// Read the token from `MOTHERDUCK_TOKEN`
    ///
    /// A missing token is not an error here; it only matters when a sink
    /// that needs one is opened.
    pub fn from_env() -> Self {
        match std::env::var(TOKEN_VAR) {
            Ok(token) => Self::new(token),
            Err(_) => Self::missing(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "Credential(<redacted>)"),
            None => write!(f, "Credential(<missing>)"),
        }
    }
}
