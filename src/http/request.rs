//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.1 mínimo y permisivo.
//!
//! ## Formato de un Request HTTP/1.1
//!
//! ```text
//! GET /path HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! User-Agent: curl/7.68.0\r\n
//! \r\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path HTTP/1.1`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: bytes crudos después del separador
//!
//! ## Filosofía del parser
//!
//! El parser nunca falla: campos ausentes quedan como strings vacíos y las
//! líneas de header malformadas se ignoran. Un buffer sin el separador
//! `\r\n\r\n` produce un request completamente vacío. La decisión de si un
//! buffer está "completo" pertenece al handler de conexión, no al parser.

use std::collections::HashMap;

/// Busca el fin del bloque de headers (`\r\n\r\n`) en el buffer.
///
/// Retorna la posición del primer byte del separador, o `None` si el
/// request todavía está incompleto.
///
/// # Ejemplo
/// ```
/// use reactor_server::http::find_header_end;
///
/// assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
/// assert_eq!(find_header_end(b"GET / HTTP/1.1\r\nHost: x"), None);
/// ```
pub fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Representa un request HTTP/1.1 parseado de forma permisiva
///
/// Todos los campos textuales son strings crudos: un método desconocido o
/// una versión extraña pasan tal cual al handler de aplicación.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Método HTTP tal como llegó (ej: "GET")
    method: String,

    /// Path de la petición (ej: "/ping")
    path: String,

    /// Versión HTTP tal como llegó (ej: "HTTP/1.1")
    version: String,

    /// Headers HTTP (ej: {"Host": "localhost:8080"})
    ///
    /// Claves case-sensitive; ante claves repetidas gana la última.
    headers: HashMap<String, String>,

    /// Body del request: bytes crudos después de `\r\n\r\n`
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request HTTP desde bytes, sin fallar nunca
    ///
    /// # Argumentos
    ///
    /// * `buffer` - Buffer acumulado de la conexión
    ///
    /// # Retorna
    ///
    /// Un `Request` con lo que se pudo extraer. Si el buffer no contiene el
    /// separador `\r\n\r\n`, todos los campos quedan vacíos.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use reactor_server::http::Request;
    ///
    /// let raw = b"GET /ping HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw);
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/ping");
    /// assert_eq!(request.header("Host"), Some("x"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Self {
        let header_end = match find_header_end(buffer) {
            Some(pos) => pos,
            None => return Request::default(),
        };

        // El bloque de headers se interpreta como texto; bytes inválidos se
        // reemplazan en lugar de rechazar el request
        let head = String::from_utf8_lossy(&buffer[..header_end]);
        let mut lines = head.split("\r\n");

        let (method, path, version) = Self::parse_request_line(lines.next().unwrap_or(""));
        let headers = Self::parse_headers(lines);

        // El body son los bytes crudos después del separador; no se valida
        // contra Content-Length
        let body = buffer[header_end + 4..].to_vec();

        Request {
            method,
            path,
            version,
            headers,
            body,
        }
    }

    /// Parsea la request line (primera línea del request)
    ///
    /// Formato: `GET /path HTTP/1.1`. Los tokens ausentes quedan como
    /// strings vacíos en lugar de producir un error.
    fn parse_request_line(line: &str) -> (String, String, String) {
        let mut parts = line.split_whitespace();

        let method = parts.next().unwrap_or("").to_string();
        let path = parts.next().unwrap_or("").to_string();
        let version = parts.next().unwrap_or("").to_string();

        (method, path, version)
    }

    /// Parsea los headers HTTP
    ///
    /// Cada header tiene formato `Name: Value`. Las líneas sin `:` se
    /// ignoran; al valor se le recorta el espacio inicial. Claves repetidas:
    /// gana la última aparición.
    fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut headers = HashMap::new();

        for line in lines {
            if line.is_empty() {
                continue;
            }

            if let Some(colon_pos) = line.find(':') {
                let name = line[..colon_pos].to_string();
                let value = line[colon_pos + 1..].trim_start().to_string();
                headers.insert(name, value);
            }
        }

        headers
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Obtiene el path del request
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

    /// Obtiene un header específico (búsqueda case-sensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
