//! # Módulo HTTP
//!
//! Este módulo implementa el subconjunto de HTTP/1.1 que usa el servidor,
//! sin librerías de alto nivel. Incluye:
//!
//! - Parsing permisivo de requests HTTP/1.1
//! - Construcción de responses HTTP
//! - Manejo de status codes
//! - Detección del fin del bloque de headers (`\r\n\r\n`)
//!
//! ## Subconjunto soportado
//!
//! El servidor trata cada conexión como un intercambio único:
//! - No hay conexiones persistentes (toda respuesta lleva `Connection: close`)
//! - No hay chunked transfer encoding
//! - El parser nunca rechaza un request: campos ausentes quedan vacíos
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! Another-Header: Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! Connection: close\r\n
//! \r\n
//! <html>...</html>
//! ```

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use request::{find_header_end, Request};
pub use response::Response;
pub use status::StatusCode;
