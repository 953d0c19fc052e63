//! Client for the drone camera-control server.
//!
//! The server exposes two unauthenticated GET routes that wrap an RTMP
//! push from the drone controller; acknowledgments come back as JSON or
//! plain text. Single-shot calls, no retries.

use crate::error::{Result, SkyscopeError};
use std::net::UdpSocket;
use std::time::Duration;

#[derive(Clone)]
pub struct ControlClient {
    base_url: String,
    agent: ureq::Agent,
}

/// Acknowledgment body of a control call.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAck {
    Json(serde_json::Value),
    Text(String),
}

impl ControlClient {
    /// Probe the server with a handshake GET; the server answers the bare
    /// root with the literal body `Connected`.
    pub fn connect(ip: &str, port: u16, timeout: Duration) -> Result<Self> {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .build();
        let base_url = format!("http://{}:{}", ip, port);

        let body = agent
            .get(&base_url)
            .call()
            .map_err(|e| SkyscopeError::ControlServer(e.to_string()))?
            .into_string()?;
        if body != "Connected" {
            return Err(SkyscopeError::ControlServer(format!(
                "unexpected handshake reply: {body:?}"
            )));
        }

        Ok(Self { base_url, agent })
    }

    /// Ask the server to start pushing RTMP towards the relay at
    /// `target_host` (a bare IP; the server knows the port and app path).
    pub fn start_live_stream(&self, target_host: &str) -> Result<ControlAck> {
        self.get(&format!("/startLiveStream/{target_host}"))
    }

    pub fn stop_live_stream(&self) -> Result<ControlAck> {
        self.get("/stopLiveStream")
    }

    fn get(&self, route: &str) -> Result<ControlAck> {
        let url = format!("{}{}", self.base_url, route);
        log::debug!("control request: GET {url}");

        let body = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| SkyscopeError::ControlServer(e.to_string()))?
            .into_string()?;

        Ok(match serde_json::from_str(&body) {
            Ok(value) => ControlAck::Json(value),
            Err(_) => ControlAck::Text(body),
        })
    }
}

/// The RTMP endpoint served by the local relay, advertised to the
/// control server as the stream target.
pub fn local_rtmp_url() -> String {
    format!("rtmp://{}/live/stream", local_ipv4())
}

/// Best-effort local IPv4 discovery: a connected UDP socket exposes the
/// outbound interface address without sending any packet.
pub fn local_ipv4() -> String {
    fn probe() -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    }
    probe().unwrap_or_else(|_| "127.0.0.1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tiny_http::{Response, Server};

    fn spawn_server(replies: Vec<(&'static str, &'static str)>) -> (String, u16) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        thread::spawn(move || {
            for (expected_url, reply) in replies {
                let request = match server.recv() {
                    Ok(r) => r,
                    Err(_) => return,
                };
                assert_eq!(request.url(), expected_url);
                let _ = request.respond(Response::from_string(reply));
            }
        });

        ("127.0.0.1".to_string(), port)
    }

    #[test]
    fn handshake_requires_connected_body() {
        let (ip, port) = spawn_server(vec![("/", "Connected")]);
        assert!(ControlClient::connect(&ip, port, Duration::from_secs(2)).is_ok());

        let (ip, port) = spawn_server(vec![("/", "nope")]);
        let err = ControlClient::connect(&ip, port, Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, SkyscopeError::ControlServer(_)));
    }

    #[test]
    fn start_and_stop_routes() {
        let (ip, port) = spawn_server(vec![
            ("/", "Connected"),
            ("/startLiveStream/10.0.0.5", "{\"status\":\"started\"}"),
            ("/stopLiveStream", "stopped"),
        ]);

        let client = ControlClient::connect(&ip, port, Duration::from_secs(2)).unwrap();

        let ack = client.start_live_stream("10.0.0.5").unwrap();
        assert_eq!(
            ack,
            ControlAck::Json(serde_json::json!({"status": "started"}))
        );

        let ack = client.stop_live_stream().unwrap();
        assert_eq!(ack, ControlAck::Text("stopped".to_string()));
    }

    #[test]
    fn refused_connection_is_control_error() {
        // Port 1 is essentially never listening.
        let err = ControlClient::connect("127.0.0.1", 1, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, SkyscopeError::ControlServer(_)));
    }

    #[test]
    fn rtmp_url_shape() {
        let url = local_rtmp_url();
        assert!(url.starts_with("rtmp://"));
        assert!(url.ends_with("/live/stream"));
    }
}
