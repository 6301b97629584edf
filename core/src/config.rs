//! Credentials and endpoint configuration.
//!
//! The remote service authenticates every call with HTTP Basic auth using an
//! API key SID and secret. The account SID is not sent on the wire by the
//! video API but is kept alongside so a missing account configuration is
//! caught at construction time.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ApiError;

/// Production base URL of the video API.
pub const BASE_URL: &str = "https://video.twilio.com";

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_API_KEY_SID: &str = "TWILIO_API_KEY_SID";
pub const ENV_API_KEY_SECRET: &str = "TWILIO_API_KEY_SECRET";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub account_sid: String,
    pub api_key_sid: String,
    pub api_key_secret: String,
}

impl Credential {
    pub fn new(
        account_sid: impl Into<String>,
        api_key_sid: impl Into<String>,
        api_key_secret: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            api_key_sid: api_key_sid.into(),
            api_key_secret: api_key_secret.into(),
        }
    }

    /// Load credentials from the environment, reading a `.env` file first if
    /// one exists in the working directory or its parents.
    pub fn from_env() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();
        let credential = Self::new(
            env_var(ENV_ACCOUNT_SID)?,
            env_var(ENV_API_KEY_SID)?,
            env_var(ENV_API_KEY_SECRET)?,
        );
        credential.validate()?;
        Ok(credential)
    }

    /// Every field must be non-empty.
    pub fn validate(&self) -> Result<(), ApiError> {
        let fields = [
            ("account SID", &self.account_sid),
            ("API key SID", &self.api_key_sid),
            ("API key secret", &self.api_key_secret),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(ApiError::configuration(format!("{label} must not be empty")));
            }
        }
        Ok(())
    }

    /// Value for the `authorization` header.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.api_key_sid, self.api_key_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account_sid", &self.account_sid)
            .field("api_key_sid", &self.api_key_sid)
            .field("api_key_secret", &"<redacted>")
            .finish()
    }
}

fn env_var(name: &str) -> Result<String, ApiError> {
    std::env::var(name).map_err(|_| ApiError::configuration(format!("{name} is not set")))
}
