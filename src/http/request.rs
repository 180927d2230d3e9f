//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Parser best-effort: nunca falla por un request malformado. Un request
//! muy roto produce campos vacíos o raros, pero nunca un panic.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /api/services/cache1/start?force=true HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Type: application/json\r\n
//! \r\n
//! {"reason": "manual"}
//! ```
//!
//! ## Pasos
//!
//! 1. **Request Line**: `METHOD /path?query VERSION`, separada por espacios
//! 2. **Query**: pares `k=v` separados por `&`, con percent-decoding y `+` → espacio
//! 3. **Headers**: hasta la primera línea vacía, separados en el primer `:`
//! 4. **Body**: el resto, sin el último salto de línea

use std::collections::HashMap;

/// Representa un request HTTP parseado
///
/// Es inmutable una vez parseado, salvo por los path parameters que agrega
/// el router al hacer match con un patrón.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Método tal como llegó (ej: "GET")
    method: String,

    /// Path sin query string (ej: "/api/services")
    path: String,

    /// Versión HTTP (ej: "HTTP/1.1")
    version: String,

    /// Headers; si una clave se repite gana el último valor
    headers: HashMap<String, String>,

    /// Body crudo (puede ser vacío)
    body: String,

    /// Query parameters decodificados
    query_params: HashMap<String, String>,

    /// Path parameters (solo después de un match con patrón)
    path_params: HashMap<String, String>,
}

impl Request {
    /// Crea un request sin headers ni body
    ///
    /// Útil para invocar handlers directamente.
    pub fn new(method: &str, path: &str) -> Self {
        let (path, query_params) = Self::split_path_and_query(path);
        Self {
            method: method.to_string(),
            path,
            version: "HTTP/1.1".to_string(),
            query_params,
            ..Default::default()
        }
    }

    /// Parsea un request desde los bytes leídos del socket
    ///
    /// Retorna `None` solo si el buffer está vacío: en ese caso no hay
    /// request y la conexión se cierra sin responder.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use rest_api_server::http::Request;
    ///
    /// let raw = b"GET /api/services?verbose=1 HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/api/services");
    /// assert_eq!(request.query_param("verbose"), Some("1"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Option<Self> {
        if buffer.is_empty() {
            return None;
        }

        let text = String::from_utf8_lossy(buffer);
        let mut rest: &str = &text;

        // 1. Request line
        let request_line = Self::next_line(&mut rest).unwrap_or("");
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or("").to_string();
        let raw_path = parts.next().unwrap_or("");
        let version = parts.next().unwrap_or("").to_string();

        // 2. Path y query
        let (path, query_params) = Self::split_path_and_query(raw_path);

        // 3. Headers
        let mut headers = HashMap::new();
        while let Some(line) = Self::next_line(&mut rest) {
            if line.is_empty() || line == "\r" {
                break;
            }

            // Líneas sin ':' se ignoran
            if let Some(colon_pos) = line.find(':') {
                let name = Self::trim_header_part(&line[..colon_pos]);
                let value = Self::trim_header_part(&line[colon_pos + 1..]);
                headers.insert(name.to_string(), value.to_string());
            }
        }

        // 4. Body
        let body = rest.strip_suffix('\n').unwrap_or(rest).to_string();

        Some(Request {
            method,
            path,
            version,
            headers,
            body,
            query_params,
            path_params: HashMap::new(),
        })
    }

    /// Extrae la siguiente línea (sin el '\n') y avanza `rest`
    fn next_line<'a>(rest: &mut &'a str) -> Option<&'a str> {
        if rest.is_empty() {
            return None;
        }

        match rest.find('\n') {
            Some(pos) => {
                let line = &rest[..pos];
                *rest = &rest[pos + 1..];
                Some(line)
            }
            None => {
                let line = *rest;
                *rest = "";
                Some(line)
            }
        }
    }

    fn trim_header_part(s: &str) -> &str {
        s.trim_start_matches([' ', '\t'])
            .trim_end_matches([' ', '\t', '\r', '\n'])
    }

    /// Separa el path de la query string
    ///
    /// Ejemplo: "/api/services?name=cache&x=1"
    /// Retorna: ("/api/services", {"name": "cache", "x": "1"})
    fn split_path_and_query(raw_path: &str) -> (String, HashMap<String, String>) {
        match raw_path.split_once('?') {
            Some((path, query)) => (path.to_string(), Self::parse_query_string(query)),
            None => (raw_path.to_string(), HashMap::new()),
        }
    }

    /// Parsea una query string en un HashMap
    ///
    /// Los pares sin '=' se descartan. Clave y valor se decodifican.
    fn parse_query_string(query: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();

        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                params.insert(Self::url_decode(key), Self::url_decode(value));
            }
        }

        params
    }

    /// Decodifica un componente de URL
    ///
    /// `+` se convierte en espacio y `%XX` en el byte correspondiente.
    /// Un `%` que no va seguido de dos dígitos hex se deja tal cual.
    ///
    /// # Ejemplo
    /// ```
    /// use rest_api_server::http::Request;
    ///
    /// assert_eq!(Request::url_decode("hello%20world+again"), "hello world again");
    /// assert_eq!(Request::url_decode("a%2Bb"), "a+b");
    /// ```
    pub fn url_decode(s: &str) -> String {
        // '+' primero, para que "%2B" quede como '+' literal
        let spaced = s.replace('+', " ");
        String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
    }

    /// Reemplaza los path parameters (lo usa el router tras un match)
    pub(crate) fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Obtiene el path del request (sin query)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico (sensible a mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Obtiene un query parameter específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Obtiene todos los path parameters
    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Obtiene un path parameter específico
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(|s| s.as_str())
    }
}
