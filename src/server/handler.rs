//! # Handler de Conexiones
//! src/server/handler.rs
//!
//! El ciclo completo de atención de una conexión, ejecutado dentro de un
//! worker del pool: leer hasta el fin de headers, parsear, construir la
//! respuesta, escribirla y cerrar.
//!
//! La función toma posesión del socket. Salga por donde salga (respuesta
//! enviada, cierre silencioso, error, o incluso un pánico del handler de
//! aplicación), el `Drop` del stream cierra el descriptor exactamente una
//! vez.

use crate::http::{find_header_end, Request};
use crate::metrics::MetricsCollector;
use crate::server::Handler;
use mio::net::TcpStream;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Instant;

/// Tamaño de cada lectura del socket
pub const READ_BUFFER_SIZE: usize = 4096;

/// Resultado de atender una conexión
enum ServeOutcome {
    /// Se escribió una respuesta (código de estado enviado)
    Responded(u16),

    /// Cierre sin respuesta: peer cerró antes de tiempo, request vacío o
    /// headers que nunca terminaron de llegar
    ClosedWithoutResponse,

    /// Error duro de lectura
    ReadError(io::Error),

    /// Error al escribir la respuesta
    WriteError(io::Error),
}

/// Mantiene exacto el gauge de workers activos
///
/// Incrementa al construirse y decrementa en el `Drop`. El unwinding de
/// un pánico del handler de aplicación también pasa por el `Drop`, así
/// el gauge no queda inflado cuando el worker sobrevive al pánico.
struct ActiveWorkerGuard<'a> {
    metrics: &'a MetricsCollector,
}

impl<'a> ActiveWorkerGuard<'a> {
    fn new(metrics: &'a MetricsCollector) -> Self {
        metrics.increment_active_workers();
        Self { metrics }
    }
}

impl Drop for ActiveWorkerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.decrement_active_workers();
    }
}

/// Atiende una conexión de principio a fin dentro de un worker
///
/// El socket llega desregistrado del multiplexor y con un único dueño;
/// nadie más puede tocarlo mientras esta función corre.
pub fn handle_connection(stream: TcpStream, handler: Handler, metrics: &MetricsCollector) {
    let start = Instant::now();

    let outcome = {
        let _guard = ActiveWorkerGuard::new(metrics);
        serve(stream, handler)
    };

    match outcome {
        ServeOutcome::Responded(status) => {
            metrics.record_response(status, start.elapsed());
        }
        ServeOutcome::ClosedWithoutResponse => {
            metrics.record_closed_without_response();
        }
        ServeOutcome::ReadError(e) => {
            eprintln!("   ❌ Error de lectura en la conexión: {}", e);
            metrics.record_io_error();
        }
        ServeOutcome::WriteError(e) => {
            eprintln!("   ❌ Error al escribir la respuesta: {}", e);
            metrics.record_io_error();
        }
    }
}

/// El ciclo leer/parsear/responder; consume el socket
fn serve(mut stream: TcpStream, handler: Handler) -> ServeOutcome {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_BUFFER_SIZE];

    // Leer acumulando hasta ver el fin de headers o vaciar el socket.
    // El socket es no bloqueante: WouldBlock significa "no hay más datos
    // por ahora", y en modo edge-triggered nadie nos va a volver a avisar.
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => {
                // El peer cerró sin completar el request
                return ServeOutcome::ClosedWithoutResponse;
            }
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if find_header_end(&buffer).is_some() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return ServeOutcome::ReadError(e),
        }
    }

    // Completitud = terminador de headers presente. Un buffer vacío o un
    // request que quedó a medias cuando el socket se vació se cierra sin
    // respuesta: no se responde a medias-peticiones.
    if find_header_end(&buffer).is_none() {
        return ServeOutcome::ClosedWithoutResponse;
    }

    // Parseo permisivo: nunca falla, lo que falte queda vacío
    let request = Request::parse(&buffer);

    let mut response = handler(&request);
    response.add_header("Server", "Reactor-HTTP/1.1");
    response.add_header("X-Worker-Thread", &format!("{:?}", thread::current().id()));

    // Un único write best-effort; los writes cortos no se reintentan
    let response_bytes = response.to_bytes();
    match stream.write(&response_bytes) {
        Ok(_) => ServeOutcome::Responded(response.status().as_u16()),
        Err(e) => ServeOutcome::WriteError(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::server::default_handler;
    use std::net::{TcpListener as StdTcpListener, TcpStream as StdTcpStream};
    use std::panic::{self, AssertUnwindSafe};
    use std::time::Duration;

    /// Prepara un par (lado servidor como mio TcpStream, lado cliente std)
    fn connected_pair() -> (TcpStream, StdTcpStream) {
        let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();

        let client = StdTcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();

        (to_mio(server_side), client)
    }

    /// Convierte el lado servidor a mio (no bloqueante)
    fn to_mio(stream: StdTcpStream) -> TcpStream {
        stream.set_nonblocking(true).unwrap();
        TcpStream::from_std(stream)
    }

    /// Espera hasta que el lado servidor tenga al menos `at_least` bytes
    /// listos para leer (o el peer haya cerrado)
    fn wait_for_data(stream: &TcpStream, at_least: usize) {
        let mut buf = [0u8; 2048];
        for _ in 0..500 {
            match stream.peek(&mut buf) {
                Ok(0) => return, // EOF
                Ok(n) if n >= at_least => return,
                _ => std::thread::sleep(Duration::from_millis(2)),
            }
        }
        panic!("los datos nunca llegaron al socket del servidor");
    }

    #[test]
    fn test_complete_request_gets_response() {
        let (server_side, mut client) = connected_pair();
        let metrics = MetricsCollector::new();

        let raw = b"GET /ping HTTP/1.1\r\nHost: x\r\n\r\n";
        client.write_all(raw).unwrap();
        wait_for_data(&server_side, raw.len());

        handle_connection(server_side, default_handler, &metrics);

        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        let text = String::from_utf8_lossy(&received);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html"));
        assert!(text.contains("Connection: close"));
        assert!(text.contains("Server: Reactor-HTTP/1.1"));
        assert!(text.contains("X-Worker-Thread:"));
        assert!(text.contains("/ping"));

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.responses_sent, 1);
        assert_eq!(snapshot.closed_without_response, 0);
    }

    #[test]
    fn test_zero_byte_connection_closed_silently() {
        let (server_side, client) = connected_pair();
        let metrics = MetricsCollector::new();

        // El cliente cierra sin mandar un byte
        drop(client);
        wait_for_data(&server_side, 1); // retorna al ver el EOF

        handle_connection(server_side, default_handler, &metrics);

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.responses_sent, 0);
        assert_eq!(snapshot.closed_without_response, 1);
    }

    #[test]
    fn test_incomplete_request_closed_without_response() {
        let (server_side, mut client) = connected_pair();
        let metrics = MetricsCollector::new();

        // Bytes sin el terminador de headers; el cliente queda abierto
        let partial = b"GET /pa";
        client.write_all(partial).unwrap();
        wait_for_data(&server_side, partial.len());

        handle_connection(server_side, default_handler, &metrics);

        // El servidor cierra sin responder: el cliente ve EOF sin bytes
        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        assert!(received.is_empty());

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.responses_sent, 0);
        assert_eq!(snapshot.closed_without_response, 1);
    }

    #[test]
    fn test_terminated_but_empty_request_line_gets_response() {
        let (server_side, mut client) = connected_pair();
        let metrics = MetricsCollector::new();

        // Solo el terminador: request "completo" aunque vacío; el parseo
        // permisivo deja todo en blanco y el handler responde igual
        let raw = b"\r\n\r\n";
        client.write_all(raw).unwrap();
        wait_for_data(&server_side, raw.len());

        handle_connection(server_side, default_handler, &metrics);

        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        let text = String::from_utf8_lossy(&received);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.responses_sent, 1);
    }

    #[test]
    fn test_content_length_matches_body() {
        let (server_side, mut client) = connected_pair();
        let metrics = MetricsCollector::new();

        let raw = b"GET /largo/camino/de/prueba HTTP/1.1\r\nHost: x\r\n\r\n";
        client.write_all(raw).unwrap();
        wait_for_data(&server_side, raw.len());

        handle_connection(server_side, default_handler, &metrics);

        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        let text = String::from_utf8_lossy(&received);

        // Extraer Content-Length declarado y compararlo con el body real
        let header_end = text.find("\r\n\r\n").unwrap();
        let declared: usize = text[..header_end]
            .lines()
            .find_map(|line| line.strip_prefix("Content-Length: "))
            .unwrap()
            .parse()
            .unwrap();
        let body = &text[header_end + 4..];

        assert_eq!(declared, body.len());
    }

    #[test]
    fn test_handler_panic_still_closes_socket() {
        fn broken_handler(_request: &Request) -> Response {
            panic!("handler de aplicación roto");
        }

        let (server_side, mut client) = connected_pair();
        let metrics = MetricsCollector::new();

        let raw = b"GET / HTTP/1.1\r\n\r\n";
        client.write_all(raw).unwrap();
        wait_for_data(&server_side, raw.len());

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handle_connection(server_side, broken_handler, &metrics);
        }));
        assert!(result.is_err());

        // El unwinding soltó el stream: el cliente ve EOF sin respuesta
        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        assert!(received.is_empty());

        // El gauge de workers activos también quedó liberado
        assert_eq!(metrics.active_workers(), 0);
    }
}
