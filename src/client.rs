//! # Cliente HTTP mínimo
//! src/client.rs
//!
//! Cliente de una sola request por conexión, pensado para probar el
//! servidor desde tests y desde el binario `api_client`. Lee hasta EOF
//! porque el servidor siempre cierra la conexión.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Timeout de lectura y escritura del cliente
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response tal como la recibió el cliente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ClientResponse {
    /// Parsea una response HTTP completa
    pub fn parse(raw: &str) -> io::Result<Self> {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        let mut lines = head.split("\r\n");

        let status_line = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| invalid("empty response"))?;

        let mut parts = status_line.splitn(3, ' ');
        let _version = parts.next();
        let status = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| invalid(&format!("bad status line: {}", status_line)))?;
        let reason = parts.next().unwrap_or("").to_string();

        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Ok(Self {
            status,
            reason,
            headers,
            body: body.to_string(),
        })
    }

    /// Busca un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Interpreta el body como JSON
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

/// Envía una request y espera la response completa
///
/// Si `body` no está vacío se agregan `Content-Length` y
/// `Content-Type: application/json`.
pub fn send_request<A: ToSocketAddrs>(
    addr: A,
    method: &str,
    path: &str,
    body: &str,
) -> io::Result<ClientResponse> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;

    let host = stream.peer_addr()?;
    let mut request = format!(
        "{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n",
        method, path, host
    );
    if !body.is_empty() {
        request.push_str(&format!("Content-Length: {}\r\n", body.len()));
        request.push_str("Content-Type: application/json\r\n");
    }
    request.push_str("\r\n");
    request.push_str(body);

    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;

    ClientResponse::parse(&String::from_utf8_lossy(&raw))
}
