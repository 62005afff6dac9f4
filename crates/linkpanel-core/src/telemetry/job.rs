//! One-shot background forecast job
//!
//! The job is started by whoever owns an executor (a thread in the
//! simulator, an embassy task on hardware) after the control loop obtained a
//! [`FetchTicket`] from the cell. It never touches the connectivity state and
//! never retries on its own; the cooldown re-arms it.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::future::Future;

use embassy_time::Instant;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use super::FetchTicket;
use super::forecast::{FetchError, Forecast, forecast_url};
use crate::config::WeatherConfig;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("DNS lookup failed")]
    Dns,
    #[error("connection refused")]
    Connect,
    #[error("TLS handshake failed")]
    Tls,
    #[error("request timed out")]
    Timeout,
    #[error("response body too large")]
    BodyTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// HTTPS GET client
pub trait HttpFetch {
    fn get(&mut self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>>;
}

/// Monotonic time source for code running outside the control loop
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Fetch, decode and publish one forecast. Every outcome is published, so
/// the cell always leaves the running state when this returns.
pub async fn run_fetch_job<H, C>(
    ticket: FetchTicket<'_>,
    source: &mut H,
    clock: &C,
    weather: &WeatherConfig<'_>,
) where
    H: HttpFetch,
    C: Clock,
{
    let text = match fetch_summary(source, weather).await {
        Ok(summary) => {
            info!("Forecast updated: {}", summary);
            summary
        }
        Err(e) => {
            warn!("Forecast update failed: {:?}", e);
            format!("{} weather: {}", weather.label, e)
        }
    };
    ticket.publish(&text, clock.now());
}

/// Request and format the summary line without publishing it
pub async fn fetch_summary<H: HttpFetch>(
    source: &mut H,
    weather: &WeatherConfig<'_>,
) -> Result<String, FetchError> {
    let url = forecast_url(weather);
    debug!("GET {}", url);

    let response = source.get(&url).await.map_err(FetchError::Transport)?;
    if response.status != 200 {
        return Err(FetchError::Http(response.status));
    }
    Forecast::decode(&response.body)?.summary(weather.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{FETCH_INTERVAL, TelemetryCell};
    use embassy_futures::block_on;
    use embassy_time::Duration;

    const BODY: &str = r#"{"current":{"temperature_2m":9.4,"weather_code":61},"daily":{"temperature_2m_max":[11.2],"temperature_2m_min":[5.1],"weather_code":[3]}}"#;

    struct FakeServer<'a> {
        cell: &'a TelemetryCell,
        reply: Result<(u16, &'static str), TransportError>,
        requests: Vec<String>,
    }

    impl HttpFetch for FakeServer<'_> {
        async fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
            // The cell must stay claimed for the whole request
            assert!(self.cell.read().running);
            self.requests.push(String::from(url));
            self.reply.map(|(status, body)| HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            })
        }
    }

    struct FixedClock(Instant);

    impl Clock for FixedClock {
        fn now(&self) -> Instant {
            self.0
        }
    }

    fn run(reply: Result<(u16, &'static str), TransportError>) -> (TelemetryCell, Vec<String>) {
        let cell = TelemetryCell::new();
        let requests = {
            let mut server = FakeServer {
                cell: &cell,
                reply,
                requests: Vec::new(),
            };
            let ticket = cell.try_arm(Instant::from_secs(5), true).unwrap();
            let clock = FixedClock(Instant::from_secs(7));
            block_on(run_fetch_job(ticket, &mut server, &clock, &WeatherConfig::default()));
            server.requests
        };
        (cell, requests)
    }

    #[test]
    fn test_success_publishes_summary() {
        let (cell, requests) = run(Ok((200, BODY)));
        let snapshot = cell.read();
        assert_eq!(snapshot.text.as_str(), "DK: 9°C Rain | Today 5–11°C Cloudy");
        assert!(snapshot.has_data);
        assert!(!snapshot.running);
        assert_eq!(snapshot.generation, 1);
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("latitude=55.6761"));
    }

    #[test]
    fn test_http_error_publishes_diagnostic_and_cooldown() {
        let (cell, _) = run(Ok((503, "Service Unavailable")));
        let snapshot = cell.read();
        assert_eq!(snapshot.text.as_str(), "DK weather: HTTP 503");
        assert!(snapshot.has_data);
        assert_eq!(snapshot.next_fetch_due, Instant::from_secs(7) + FETCH_INTERVAL);

        // No retry before the cooldown elapses
        let early = Instant::from_secs(7) + FETCH_INTERVAL - Duration::from_secs(1);
        assert!(cell.try_arm(early, true).is_none());
    }

    #[test]
    fn test_transport_failure() {
        let (cell, _) = run(Err(TransportError::Tls));
        assert_eq!(cell.read().text.as_str(), "DK weather: TLS init failed");
    }

    #[test]
    fn test_undecodable_body() {
        let (cell, _) = run(Ok((200, "not json")));
        assert_eq!(cell.read().text.as_str(), "DK weather: parse error");
    }

    #[test]
    fn test_missing_current_temperature() {
        let (cell, _) = run(Ok((200, r#"{"current":{"weather_code":1}}"#)));
        assert_eq!(cell.read().text.as_str(), "DK weather: update failed");
    }
}
