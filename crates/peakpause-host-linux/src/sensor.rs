//! Temperature source adapters
//!
//! Every adapter downgrades failure to "unavailable": the controller never
//! sees a sensor error, only `None` plus a logged warning. Readings carry
//! the configured bias correction already applied.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::warn;

use peakpause_config::TemperatureSource;
use peakpause_host_api::TemperatureProvider;

#[derive(Debug, Error)]
enum SensorReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Unparseable payload: {0:?}")]
    Parse(String),
}

/// Build the provider selected by the configuration.
pub fn build_sensor(source: &TemperatureSource) -> Arc<dyn TemperatureProvider> {
    match source {
        TemperatureSource::Socket {
            addr,
            bias,
            timeout,
        } => Arc::new(SocketSensor::new(addr.clone(), *bias, *timeout)),
        TemperatureSource::Http {
            url,
            token,
            bias,
            timeout,
        } => Arc::new(HttpSensor::new(url.clone(), token.clone(), *bias, *timeout)),
        TemperatureSource::Thermal { zone, bias } => {
            Arc::new(ThermalSensor::new(zone.clone(), *bias))
        }
        TemperatureSource::Disabled => Arc::new(DisabledSensor),
    }
}

/// TCP server speaking the one-line protocol: send `temp`, receive a
/// decimal reading.
pub struct SocketSensor {
    addr: String,
    bias: f64,
    timeout: Duration,
}

impl SocketSensor {
    pub fn new(addr: String, bias: f64, timeout: Duration) -> Self {
        Self {
            addr,
            bias,
            timeout,
        }
    }

    async fn read_inner(&self) -> Result<f64, SensorReadError> {
        let attempt = async {
            let mut stream = TcpStream::connect(&self.addr).await?;
            stream.write_all(b"temp").await?;

            let mut buf = [0u8; 1024];
            let n = stream.read(&mut buf).await?;
            let text = String::from_utf8_lossy(&buf[..n]);
            text.trim()
                .parse::<f64>()
                .map_err(|_| SensorReadError::Parse(text.trim().to_string()))
        };

        tokio::time::timeout(self.timeout, attempt)
            .await
            .map_err(|_| SensorReadError::Timeout)?
    }
}

#[async_trait]
impl TemperatureProvider for SocketSensor {
    async fn read(&self) -> Option<f64> {
        match self.read_inner().await {
            Ok(temp) => Some(temp + self.bias),
            Err(e) => {
                warn!(addr = %self.addr, error = %e, "Socket temperature read failed");
                None
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "socket"
    }
}

/// HTTP endpoint returning JSON (`temperature`, `temp`, or Home
/// Assistant-style `state`) or a bare number.
pub struct HttpSensor {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    bias: f64,
}

impl HttpSensor {
    pub fn new(url: String, token: Option<String>, bias: f64, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            url,
            token,
            bias,
        }
    }

    async fn read_inner(&self) -> Result<f64, SensorReadError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SensorReadError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_temperature_payload(&body).ok_or_else(|| SensorReadError::Parse(body))
    }
}

#[async_trait]
impl TemperatureProvider for HttpSensor {
    async fn read(&self) -> Option<f64> {
        match self.read_inner().await {
            Ok(temp) => Some(temp + self.bias),
            Err(e) => {
                warn!(url = %self.url, error = %e, "HTTP temperature read failed");
                None
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// sysfs thermal zone file, millidegrees Celsius.
pub struct ThermalSensor {
    zone: PathBuf,
    bias: f64,
}

impl ThermalSensor {
    pub fn new(zone: PathBuf, bias: f64) -> Self {
        Self { zone, bias }
    }

    fn read_inner(&self) -> Result<f64, SensorReadError> {
        let raw = std::fs::read_to_string(&self.zone)?;
        let millidegrees = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| SensorReadError::Parse(raw.trim().to_string()))?;
        Ok(millidegrees / 1000.0)
    }
}

#[async_trait]
impl TemperatureProvider for ThermalSensor {
    async fn read(&self) -> Option<f64> {
        match self.read_inner() {
            Ok(temp) => Some(temp + self.bias),
            Err(e) => {
                warn!(zone = %self.zone.display(), error = %e, "Thermal zone read failed");
                None
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "thermal"
    }
}

/// No sensor configured; the controller runs its conservative branch.
pub struct DisabledSensor;

#[async_trait]
impl TemperatureProvider for DisabledSensor {
    async fn read(&self) -> Option<f64> {
        None
    }

    fn source_name(&self) -> &'static str {
        "none"
    }
}

/// Extract a temperature from an HTTP payload: JSON object keys
/// `temperature`/`temp`/`state` (numeric or stringly-numeric), a bare JSON
/// number, or plain text.
fn parse_temperature_payload(body: &str) -> Option<f64> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["temperature", "temp", "state"] {
            if let Some(field) = value.get(key) {
                if let Some(t) = field.as_f64() {
                    return Some(t);
                }
                if let Some(s) = field.as_str() {
                    if let Ok(t) = s.trim().parse() {
                        return Some(t);
                    }
                }
            }
        }
        if let Some(t) = value.as_f64() {
            return Some(t);
        }
    }

    body.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn payload_parsing_variants() {
        assert_eq!(
            parse_temperature_payload(r#"{"temperature": 21.5}"#),
            Some(21.5)
        );
        assert_eq!(parse_temperature_payload(r#"{"temp": 19}"#), Some(19.0));
        assert_eq!(
            parse_temperature_payload(r#"{"state": "22.3", "unit": "C"}"#),
            Some(22.3)
        );
        assert_eq!(parse_temperature_payload("21.5"), Some(21.5));
        assert_eq!(parse_temperature_payload("  -3.5\n"), Some(-3.5));
        assert_eq!(parse_temperature_payload("not a number"), None);
        assert_eq!(parse_temperature_payload(r#"{"humidity": 40}"#), None);
    }

    #[test]
    fn thermal_reads_millidegrees_with_bias() {
        let dir = tempfile::tempdir().unwrap();
        let zone = dir.path().join("temp");
        std::fs::write(&zone, "23500\n").unwrap();

        let sensor = ThermalSensor::new(zone, 0.5);
        assert_eq!(sensor.read_inner().unwrap(), 23.5);

        let rt = tokio::runtime::Runtime::new().unwrap();
        assert_eq!(rt.block_on(sensor.read()), Some(24.0));
    }

    #[tokio::test]
    async fn thermal_missing_zone_is_unavailable() {
        let sensor = ThermalSensor::new(PathBuf::from("/nonexistent/thermal_zone99/temp"), 0.0);
        assert_eq!(sensor.read().await, None);
    }

    #[tokio::test]
    async fn disabled_sensor_is_unavailable() {
        assert_eq!(DisabledSensor.read().await, None);
        assert_eq!(DisabledSensor.source_name(), "none");
    }

    #[tokio::test]
    async fn socket_sensor_reads_and_applies_bias() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 16];
            let _ = stream.read(&mut buf).await.unwrap();
            stream.write_all(b"21.5\n").await.unwrap();
        });

        let sensor = SocketSensor::new(addr, -1.0, Duration::from_secs(2));
        assert_eq!(sensor.read().await, Some(20.5));
    }

    #[tokio::test]
    async fn socket_sensor_times_out_to_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // Accept but never answer.
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let sensor = SocketSensor::new(addr, 0.0, Duration::from_millis(200));
        assert_eq!(sensor.read().await, None);
    }

    #[tokio::test]
    async fn socket_sensor_garbage_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 16];
            let _ = stream.read(&mut buf).await.unwrap();
            stream.write_all(b"oops").await.unwrap();
        });

        let sensor = SocketSensor::new(addr, 0.0, Duration::from_secs(2));
        assert_eq!(sensor.read().await, None);
    }

    #[tokio::test]
    async fn http_sensor_parses_plain_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await.unwrap();
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\n21.5")
                .await
                .unwrap();
        });

        let sensor = HttpSensor::new(
            format!("http://{addr}/temp"),
            None,
            0.0,
            Duration::from_secs(2),
        );
        assert_eq!(sensor.read().await, Some(21.5));
    }

    #[tokio::test]
    async fn http_sensor_error_status_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await.unwrap();
            stream
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n")
                .await
                .unwrap();
        });

        let sensor = HttpSensor::new(
            format!("http://{addr}/temp"),
            None,
            0.0,
            Duration::from_secs(2),
        );
        assert_eq!(sensor.read().await, None);
    }
}
