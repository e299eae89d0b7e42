//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! El núcleo reactivo del servidor:
//! 1. `tcp::Server`: event loop edge-triggered que acepta conexiones y
//!    despacha los sockets listos al pool de workers
//! 2. `handler`: ciclo leer/parsear/responder/cerrar que corre dentro de
//!    un worker
//! 3. `Handler`: callback de aplicación que convierte un `Request` en
//!    `Response`

pub mod handler;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::{Server, StopHandle};

use crate::http::{Request, Response};

/// Firma de los handlers de aplicación
///
/// Función síncrona y pura: recibe el request ya parseado y construye la
/// respuesta. Todo el I/O y el cierre del socket corren por cuenta del
/// núcleo.
pub type Handler = fn(&Request) -> Response;

/// Handler por defecto: página HTML de eco con el path pedido
///
/// # Ejemplo
/// ```
/// use reactor_server::http::Request;
/// use reactor_server::server::default_handler;
///
/// let request = Request::parse(b"GET /ping HTTP/1.1\r\n\r\n");
/// let response = default_handler(&request);
///
/// assert_eq!(response.status().as_u16(), 200);
/// ```
pub fn default_handler(request: &Request) -> Response {
    let body = format!(
        "<html><body><h1>Reactor HTTP Server</h1><p>Requested: {}</p></body></html>",
        request.path()
    );
    Response::html(&body)
}
