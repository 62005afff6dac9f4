//! Device configuration and persisted network credentials
//!
//! [`Config`] borrows its strings from the JSON it was parsed from, so it can
//! be built from a `&'static str` baked into the firmware image or from a
//! buffer read at startup without allocating.

use alloc::vec::Vec;
use core::fmt;

use heapless::String;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Maximum SSID length allowed by 802.11
pub const SSID_MAX_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const PASSWORD_MAX_LEN: usize = 64;

/// Shortest passphrase a WPA2 access point accepts
const PORTAL_PASSWORD_MIN_LEN: usize = 8;
const PORTAL_PASSWORD_MAX_LEN: usize = 63;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config JSON: {0:?}")]
    Json(serde_json_core::de::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("SSID is empty")]
    EmptySsid,
    #[error("SSID longer than 32 bytes")]
    SsidTooLong,
    #[error("password longer than 64 bytes")]
    PasswordTooLong,
    #[error("failed to encode credentials")]
    Encode,
    #[error("stored credentials are corrupt")]
    Decode,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    #[serde(default)]
    pub internet: InternetConfig<'a>,
    #[serde(default)]
    pub portal: PortalConfig<'a>,
    #[serde(default)]
    pub weather: WeatherConfig<'a>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct InternetConfig<'a> {
    /// Network joined before any portal provisioning happened
    pub ssid: &'a str,
    pub password: &'a str,
    pub hostname: &'a str,
}

impl Default for InternetConfig<'_> {
    fn default() -> Self {
        Self {
            ssid: "",
            password: "",
            hostname: "core2-ha",
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct PortalConfig<'a> {
    pub ap_name: &'a str,
    pub ap_password: &'a str,
}

impl Default for PortalConfig<'_> {
    fn default() -> Self {
        Self {
            ap_name: "Core2-Setup",
            ap_password: "",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct WeatherConfig<'a> {
    /// Prefix of every footer line, e.g. "DK: 9°C Rain"
    pub label: &'a str,
    pub latitude: f32,
    pub longitude: f32,
    /// IANA zone name used for the daily aggregates
    pub timezone: &'a str,
}

impl Default for WeatherConfig<'_> {
    fn default() -> Self {
        Self {
            label: "DK",
            latitude: 55.6761,
            longitude: 12.5683,
            timezone: "Europe/Copenhagen",
        }
    }
}

impl<'a> Config<'a> {
    /// Parse a JSON document. Missing sections and fields fall back to the
    /// appliance defaults.
    pub fn parse(json: &'a str) -> Result<Self, ConfigError> {
        serde_json_core::from_str(json)
            .map(|(config, _)| config)
            .map_err(ConfigError::Json)
    }

    /// Access point passphrase, if one usable by WPA2 is configured.
    ///
    /// Anything shorter than 8 characters would make the radio refuse to
    /// start the AP, so the portal is opened unsecured instead.
    pub fn portal_password(&self) -> Option<&'a str> {
        let password = self.portal.ap_password;
        let len = password.len();
        if (PORTAL_PASSWORD_MIN_LEN..=PORTAL_PASSWORD_MAX_LEN).contains(&len) {
            Some(password)
        } else {
            if len > 0 {
                warn!("Portal password has {} characters, opening portal unsecured", len);
            }
            None
        }
    }

    /// Credentials supplied at build time, preferred over stored ones.
    pub fn provisioned_credentials(&self) -> Option<Credentials> {
        if self.internet.ssid.is_empty() {
            return None;
        }
        match Credentials::new(self.internet.ssid, self.internet.password) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!("Ignoring provisioned credentials: {}", e);
                None
            }
        }
    }
}

/// A network the station can join.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String<SSID_MAX_LEN>,
    pub password: String<PASSWORD_MAX_LEN>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, CredentialsError> {
        if ssid.is_empty() {
            return Err(CredentialsError::EmptySsid);
        }
        let ssid = String::try_from(ssid).map_err(|_| CredentialsError::SsidTooLong)?;
        let password =
            String::try_from(password).map_err(|_| CredentialsError::PasswordTooLong)?;
        Ok(Self { ssid, password })
    }

    /// Serialize for persistent storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, CredentialsError> {
        postcard::to_allocvec(self).map_err(|_| CredentialsError::Encode)
    }

    /// Restore from persistent storage
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CredentialsError> {
        postcard::from_bytes(bytes).map_err(|_| CredentialsError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config.internet.hostname, "core2-ha");
        assert_eq!(config.portal.ap_name, "Core2-Setup");
        assert_eq!(config.weather.label, "DK");
        assert!((config.weather.latitude - 55.6761).abs() < 1e-4);
        assert!(config.provisioned_credentials().is_none());
        assert_eq!(config.portal_password(), None);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let json = r#"{"internet":{"ssid":"HomeNet","password":"hunter22"},"weather":{"label":"CPH"}}"#;
        let config = Config::parse(json).unwrap();
        assert_eq!(config.internet.hostname, "core2-ha");
        assert_eq!(config.weather.label, "CPH");
        assert_eq!(config.weather.timezone, "Europe/Copenhagen");

        let creds = config.provisioned_credentials().unwrap();
        assert_eq!(creds.ssid.as_str(), "HomeNet");
        assert_eq!(creds.password.as_str(), "hunter22");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Config::parse("{\"internet\":").is_err());
    }

    #[test]
    fn test_portal_password_length_rules() {
        let mut config = Config::default();
        config.portal.ap_password = "short";
        assert_eq!(config.portal_password(), None);

        config.portal.ap_password = "12345678";
        assert_eq!(config.portal_password(), Some("12345678"));

        let long = "x".repeat(64);
        config.portal.ap_password = &long;
        assert_eq!(config.portal_password(), None);
    }

    #[test]
    fn test_credentials_validation() {
        assert_eq!(Credentials::new("", "pw"), Err(CredentialsError::EmptySsid));
        let long_ssid = "s".repeat(33);
        assert_eq!(
            Credentials::new(&long_ssid, "pw"),
            Err(CredentialsError::SsidTooLong)
        );
    }

    #[test]
    fn test_credentials_storage_format() {
        let creds = Credentials::new("HomeNet", "correct horse").unwrap();
        let bytes = creds.to_bytes().unwrap();
        assert_eq!(Credentials::from_bytes(&bytes).unwrap(), creds);
        assert_eq!(
            Credentials::from_bytes(&[0xff, 0xff]),
            Err(CredentialsError::Decode)
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("HomeNet", "secret-pass").unwrap();
        let printed = format!("{:?}", creds);
        assert!(printed.contains("HomeNet"));
        assert!(!printed.contains("secret-pass"));
    }
}
