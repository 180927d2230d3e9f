//! # Construcción de Respuestas HTTP
//!
//! API para construir respuestas y serializarlas a bytes.
//!
//! ## Formato en el wire
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Server: RedUnix-REST/1.0\r\n
//! Content-Length: 13\r\n
//! Connection: close\r\n
//! \r\n
//! {"ok": true}
//! ```
//!
//! `Content-Length` y `Connection: close` no se guardan en la respuesta:
//! se calculan al serializar.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use rest_api_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("X-Custom", "1")
//!     .with_body(r#"{"message": "Hello"}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;
use serde_json::json;

/// Identificador del servidor que va en cada respuesta
pub const SERVER_NAME: &str = "RedUnix-REST/1.0";

/// Versión que se escribe en la status line
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Headers que el serializador siempre calcula por su cuenta
const COMPUTED_HEADERS: [&str; 2] = ["Content-Length", "Connection"];

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código numérico (200 por defecto)
    status: u16,

    /// Texto de razón ("OK" por defecto)
    status_text: String,

    /// Headers en orden de inserción
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: String,
}

impl Response {
    /// Crea una respuesta con el código indicado
    ///
    /// Viene con `Content-Type: application/json` y el header `Server`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            status_text: status.reason_phrase().to_string(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Server".to_string(), SERVER_NAME.to_string()),
            ],
            body: String::new(),
        }
    }

    /// Cambia la status line a un código/texto arbitrario
    pub fn with_status(mut self, code: u16, text: &str) -> Self {
        self.status = code;
        self.status_text = text.to_string();
        self
    }

    /// Cambia el status a uno de los códigos conocidos
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status.as_u16();
        self.status_text = status.reason_phrase().to_string();
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe, se reemplaza su valor en la misma posición.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo de la respuesta
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Crea una respuesta 200 con el JSON dado
    ///
    /// # Ejemplo
    /// ```
    /// use rest_api_server::http::Response;
    ///
    /// let response = Response::json(r#"{"status": "ok"}"#);
    /// assert_eq!(response.status(), 200);
    /// ```
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok).with_body(body)
    }

    /// Crea una respuesta de error con mensaje JSON
    ///
    /// Formato del JSON: `{"error": "mensaje"}`
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = json!({ "error": message }).to_string();
        Self::new(status).with_body(&body)
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers en orden de inserción
    /// - `Content-Length` calculado en bytes
    /// - `Connection: close`
    /// - Línea vacía y body tal cual
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}\r\n", HTTP_VERSION, self.status, self.status_text);

        for (name, value) in &self.headers {
            if COMPUTED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
                continue;
            }
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n");
        head.push_str("\r\n");

        let mut result = head.into_bytes();
        result.extend_from_slice(self.body.as_bytes());
        result
    }

    /// Obtiene el código de estado
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Obtiene el texto de razón
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Obtiene los headers en orden de inserción
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene un header por nombre
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Obtiene el body
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::Ok)
    }
}
