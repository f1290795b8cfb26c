//! gpsd retriever
//!
//! Talks to a local [gpsd](https://gpsd.io) daemon over its JSON protocol.
//! Each fetch opens a connection, enables watch mode and reads reports until
//! the first `TPV` report carrying a 2D or 3D fix.
//!
//! ```text
//! → ?WATCH={"enable":true,"json":true}
//! ← {"class":"VERSION",...}
//! ← {"class":"DEVICES",...}
//! ← {"class":"WATCH",...}
//! ← {"class":"TPV","mode":3,"time":"...","lat":45.07,"lon":7.68,...}
//! ```
//!
//! The fetch itself has no deadline; the location processor bounds it with
//! `gps_timeout`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use tracing::{debug, warn};
use trackdav_core::{domain::Position, ports::ILocationRetriever};

/// Default gpsd port
pub const DEFAULT_GPSD_PORT: u16 = 2947;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true}\n";

/// Subset of a gpsd report we care about
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    time: Option<DateTime<Utc>>,
}

/// Extracts a position from one JSON line, if it is a usable `TPV` report
///
/// Reports without a capture time are stamped with the current time.
fn parse_report(line: &str) -> Option<Position> {
    let report: Report = match serde_json::from_str(line) {
        Ok(report) => report,
        Err(e) => {
            debug!(error = %e, "Skipping unparseable gpsd line");
            return None;
        }
    };
    if report.class != "TPV" || report.mode < 2 {
        return None;
    }
    let (lat, lon) = (report.lat?, report.lon?);
    Position::new(lat, lon, report.time.unwrap_or_else(Utc::now)).ok()
}

/// Retriever backed by a gpsd daemon
#[derive(Debug, Clone)]
pub struct GpsdRetriever {
    host: String,
    port: u16,
}

impl GpsdRetriever {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    async fn read_fix(&self) -> std::io::Result<Option<Position>> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let (read, mut write) = stream.into_split();
        write.write_all(WATCH_COMMAND).await?;

        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(position) = parse_report(&line) {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }
}

impl Default for GpsdRetriever {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_GPSD_PORT)
    }
}

#[async_trait]
impl ILocationRetriever for GpsdRetriever {
    async fn fetch(&self) -> Option<Position> {
        match self.read_fix().await {
            Ok(Some(position)) => {
                debug!(%position, "gpsd fix");
                Some(position)
            }
            Ok(None) => {
                debug!(host = %self.host, port = self.port, "gpsd closed the connection without a fix");
                None
            }
            Err(e) => {
                warn!(host = %self.host, port = self.port, error = %e, "gpsd unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::{io::AsyncReadExt, net::TcpListener};

    use super::*;

    #[test]
    fn test_parse_tpv_with_fix() {
        let line = r#"{"class":"TPV","device":"/dev/ttyUSB0","mode":3,"time":"2026-05-01T08:00:00.000Z","lat":45.07,"lon":7.68,"alt":240.0}"#;
        let position = parse_report(line).unwrap();
        assert_eq!(position.latitude(), 45.07);
        assert_eq!(position.longitude(), 7.68);
        assert_eq!(position.captured_at().to_rfc3339(), "2026-05-01T08:00:00+00:00");
    }

    #[test]
    fn test_parse_ignores_other_reports() {
        assert!(parse_report(r#"{"class":"VERSION","release":"3.25"}"#).is_none());
        assert!(parse_report(r#"{"class":"SKY","satellites":[]}"#).is_none());
        assert!(parse_report("garbage").is_none());
    }

    #[test]
    fn test_parse_requires_fix_mode() {
        assert!(parse_report(r#"{"class":"TPV","mode":1,"lat":45.0,"lon":7.0}"#).is_none());
        assert!(parse_report(r#"{"class":"TPV","mode":2}"#).is_none());
        assert!(parse_report(r#"{"class":"TPV","mode":2,"lat":45.0,"lon":7.0}"#).is_some());
    }

    #[tokio::test]
    async fn test_fetch_from_fake_daemon() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = socket.read(&mut buf).await.unwrap();
            assert!(buf[..n].starts_with(b"?WATCH="));
            socket
                .write_all(
                    b"{\"class\":\"VERSION\",\"release\":\"3.25\"}\n\
                      {\"class\":\"TPV\",\"mode\":1}\n\
                      {\"class\":\"TPV\",\"mode\":3,\"lat\":45.5,\"lon\":7.25}\n",
                )
                .await
                .unwrap();
        });

        let position = GpsdRetriever::new("127.0.0.1", port).fetch().await.unwrap();
        assert_eq!(position.latitude(), 45.5);
        assert_eq!(position.longitude(), 7.25);
    }

    #[tokio::test]
    async fn test_fetch_without_daemon_is_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(GpsdRetriever::new("127.0.0.1", port).fetch().await.is_none());
    }
}
