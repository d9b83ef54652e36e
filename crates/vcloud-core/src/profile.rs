//! Persisted connection profile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::error::CoreError;

/// One named connection profile, as stored in the profiles file.
///
/// Every field is optional on disk; missing values read back as empty
/// strings or `false`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub host: String,
    pub org: String,
    pub user: String,
    pub token: String,
    pub api_version: String,
    pub verify: bool,
    pub disable_warnings: bool,
    pub debug: bool,
    /// Virtual datacenter selected with `vdc use`.
    pub vdc: String,
}

impl Profile {
    pub const DEFAULT_API_VERSION: &'static str = "36.0";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether a session token has been persisted.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Selected VDC, if any.
    pub fn vdc(&self) -> Option<&str> {
        (!self.vdc.is_empty()).then_some(self.vdc.as_str())
    }

    /// Read a single field as text.
    pub fn get(&self, field: ProfileField) -> String {
        match field {
            ProfileField::Name => self.name.clone(),
            ProfileField::Host => self.host.clone(),
            ProfileField::Org => self.org.clone(),
            ProfileField::User => self.user.clone(),
            ProfileField::Token => self.token.clone(),
            ProfileField::ApiVersion => self.api_version.clone(),
            ProfileField::Verify => self.verify.to_string(),
            ProfileField::DisableWarnings => self.disable_warnings.to_string(),
            ProfileField::Debug => self.debug.to_string(),
            ProfileField::Vdc => self.vdc.clone(),
        }
    }

    /// Overwrite a single field from text.
    ///
    /// Booleans accept `true/false`, `yes/no`, `1/0`. The name is the
    /// store key and cannot be changed in place.
    pub fn set(&mut self, field: ProfileField, value: &str) -> Result<(), CoreError> {
        match field {
            ProfileField::Name => {
                return Err(CoreError::validation(
                    "name",
                    "profile names cannot be changed; create a new profile instead",
                ));
            }
            ProfileField::Host => self.host = value.to_owned(),
            ProfileField::Org => self.org = value.to_owned(),
            ProfileField::User => self.user = value.to_owned(),
            ProfileField::Token => self.token = value.to_owned(),
            ProfileField::ApiVersion => self.api_version = value.to_owned(),
            ProfileField::Verify => self.verify = parse_bool(field, value)?,
            ProfileField::DisableWarnings => self.disable_warnings = parse_bool(field, value)?,
            ProfileField::Debug => self.debug = parse_bool(field, value)?,
            ProfileField::Vdc => self.vdc = value.to_owned(),
        }
        Ok(())
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("org", &self.org)
            .field("user", &self.user)
            .field("token", &if self.token.is_empty() { "" } else { "[REDACTED]" })
            .field("api_version", &self.api_version)
            .field("verify", &self.verify)
            .field("disable_warnings", &self.disable_warnings)
            .field("debug", &self.debug)
            .field("vdc", &self.vdc)
            .finish()
    }
}

fn parse_bool(field: ProfileField, value: &str) -> Result<bool, CoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(CoreError::validation(
            field.to_string(),
            format!("expected true or false, got '{other}'"),
        )),
    }
}

/// Addressable profile fields for `profile get` / `profile set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProfileField {
    Name,
    Host,
    Org,
    User,
    Token,
    ApiVersion,
    Verify,
    DisableWarnings,
    Debug,
    Vdc,
}

impl ProfileField {
    /// Parse a field name, reporting the valid names on failure.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        Self::from_str(&name.replace('-', "_")).map_err(|_| {
            CoreError::validation(
                "field",
                format!(
                    "unknown profile field '{name}' (expected one of: {})",
                    Self::VARIANTS.join(", ")
                ),
            )
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_round_through_text() {
        let mut p = Profile::new("lab");
        p.set(ProfileField::Host, "vcd.lab").unwrap();
        p.set(ProfileField::Verify, "yes").unwrap();
        assert_eq!(p.get(ProfileField::Host), "vcd.lab");
        assert_eq!(p.get(ProfileField::Verify), "true");
    }

    #[test]
    fn bad_boolean_is_a_validation_error() {
        let mut p = Profile::new("lab");
        let err = p.set(ProfileField::Debug, "maybe").unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "debug"));
        assert!(!p.debug);
    }

    #[test]
    fn name_is_read_only() {
        let mut p = Profile::new("lab");
        assert!(p.set(ProfileField::Name, "prod").is_err());
        assert_eq!(p.name, "lab");
    }

    #[test]
    fn field_names_accept_dashes_and_case() {
        assert_eq!(ProfileField::parse("api-version").unwrap(), ProfileField::ApiVersion);
        assert_eq!(ProfileField::parse("DISABLE_WARNINGS").unwrap(), ProfileField::DisableWarnings);
        let err = ProfileField::parse("colour").unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn debug_output_hides_token() {
        let mut p = Profile::new("lab");
        p.token = "abc123".into();
        let rendered = format!("{p:?}");
        assert!(!rendered.contains("abc123"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
