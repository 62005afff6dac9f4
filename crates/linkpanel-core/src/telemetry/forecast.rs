//! Open-Meteo forecast decoding and footer text formatting

use alloc::string::String;
use core::fmt::{self, Write};

use heapless::Vec;
use serde::Deserialize;
use thiserror_no_std::Error;

use super::job::TransportError;
use crate::config::WeatherConfig;

const FORECAST_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Reasons a fetch produced no forecast. `Display` is the footer suffix
/// shown after "<label> weather: ".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    #[error("TLS init failed")]
    Transport(TransportError),
    #[error("HTTP {0}")]
    Http(u16),
    #[error("parse error")]
    Parse,
    #[error("update failed")]
    MissingData,
}

/// The subset of the forecast response the footer uses. Every field is
/// optional; a missing value never fails the decode.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub daily: DailyForecast,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct CurrentConditions {
    pub temperature_2m: Option<f32>,
    pub weather_code: Option<i32>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct DailyForecast {
    pub temperature_2m_max: Vec<Option<f32>, 8>,
    pub temperature_2m_min: Vec<Option<f32>, 8>,
    pub weather_code: Vec<Option<i32>, 8>,
}

impl Forecast {
    pub fn decode(body: &[u8]) -> Result<Self, FetchError> {
        serde_json_core::from_slice(body)
            .map(|(forecast, _)| forecast)
            .map_err(|_| FetchError::Parse)
    }

    /// Render the one-line summary, e.g. `DK: 9°C Rain | Today 5–11°C Cloudy`
    pub fn summary(&self, label: &str) -> Result<String, FetchError> {
        let temperature = self.current.temperature_2m.ok_or(FetchError::MissingData)?;
        let today_min = first(&self.daily.temperature_2m_min);
        let today_max = first(&self.daily.temperature_2m_max);
        let today_code = first(&self.daily.weather_code);

        let mut text = String::new();
        write!(
            text,
            "{}: {:.0}°C {} | Today {}–{}°C {}",
            label,
            temperature,
            condition_text(self.current.weather_code),
            Rounded(today_min),
            Rounded(today_max),
            condition_text(today_code),
        )
        .map_err(|_| FetchError::MissingData)?;
        Ok(text)
    }
}

/// Today's entry of a daily series
fn first<T: Copy, const N: usize>(values: &Vec<Option<T>, N>) -> Option<T> {
    values.first().copied().flatten()
}

/// Short description of a WMO weather code
pub fn condition_text(code: Option<i32>) -> &'static str {
    let Some(code) = code else {
        return "Weather";
    };
    match code {
        0 => "Clear",
        1 | 2 => "Mostly clear",
        3 => "Cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61..=67 => "Rain",
        71..=77 => "Snow",
        80..=82 => "Showers",
        85 | 86 => "Snow showers",
        95.. => "Thunder",
        _ => "Weather",
    }
}

/// Request URL for the current conditions and today's range
pub fn forecast_url(weather: &WeatherConfig<'_>) -> String {
    let mut url = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        url,
        "{}?latitude={:.4}&longitude={:.4}\
         &current=temperature_2m,weather_code\
         &daily=temperature_2m_max,temperature_2m_min,weather_code\
         &forecast_days=1&timezone={}",
        FORECAST_ENDPOINT,
        weather.latitude,
        weather.longitude,
        UrlEncoded(weather.timezone),
    );
    url
}

/// Whole-degree temperature, or "--" when unknown
struct Rounded(Option<f32>);

impl fmt::Display for Rounded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:.0}", value),
            None => f.write_str("--"),
        }
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set
struct UrlEncoded<'a>(&'a str);

impl fmt::Display for UrlEncoded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    f.write_char(byte as char)?
                }
                _ => write!(f, "%{:02X}", byte)?,
            }
        }
        Ok(())
    }
}
