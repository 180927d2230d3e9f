//! # Módulo HTTP
//!
//! Implementa el protocolo HTTP/1.x desde cero, sin librerías de alto nivel:
//!
//! - Parsing best-effort de requests
//! - Construcción y serialización de responses
//! - Códigos de estado
//! - Decodificación de query parameters
//!
//! El servidor siempre cierra la conexión después de una respuesta: no hay
//! keep-alive, ni chunked transfer encoding, ni bodies en streaming.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 13\r\n
//! Connection: close\r\n
//! \r\n
//! {"ok": true}
//! ```

pub mod request;   // Parsing de requests
pub mod response;  // Construcción de responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::Request;
pub use response::Response;
pub use status::StatusCode;
