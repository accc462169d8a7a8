use std::{fmt, str::FromStr};

use derive_more::{AsRef, Display, From};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Payload of the login request.  Never written to disk.
#[derive(Debug, TypedBuilder, Serialize)]
pub struct Credentials {
    pub username: UserName,
    pub password: Password,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfa_code: Option<TfaCode>,
}

#[derive(Clone, PartialEq, Eq, Debug, From, AsRef, Display, Serialize, Deserialize)]
#[as_ref(forward)]
pub struct UserName(String);

#[derive(Clone, From, AsRef, Serialize)]
#[as_ref(forward)]
pub struct Password(String);
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// A six-digit one-time code for two-factor authentication.
#[derive(Clone, PartialEq, Eq, Debug, AsRef, Display, Serialize)]
#[as_ref(forward)]
pub struct TfaCode(String);

#[derive(Debug, thiserror::Error)]
#[error("The two-factor code must consist of exactly six digits, but {0:?} was given.")]
pub struct InvalidTfaCode(String);

impl FromStr for TfaCode {
    type Err = InvalidTfaCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").unwrap());
        if PATTERN.is_match(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidTfaCode(s.to_owned()))
        }
    }
}
