//! # Multiplexor de Readiness
//! src/reactor/mod.rs
//!
//! Envuelve un `mio::Poll` (epoll en Linux) detrás de la superficie mínima
//! que necesita el event loop: registrar interés de lectura, esperar
//! eventos y desregistrar.
//!
//! ## Semántica edge-triggered
//!
//! El backend de epoll de mio trabaja en modo edge-triggered: un evento de
//! readiness se entrega una sola vez por transición de estado del socket.
//! Quien consume el evento debe drenar el socket (accept o read en loop)
//! hasta recibir `WouldBlock`, o se arriesga a no despertar nunca más.
//!
//! ## Disciplina one-shot
//!
//! mio no expone un flag one-shot; el event loop lo simula: cuando un
//! socket de conexión queda listo, lo saca de su tabla y lo desregistra
//! antes de despachar la tarea. Así ningún segundo evento puede entregar
//! el mismo socket a otro worker. Si algún día hubiera keep-alive, el
//! re-registro iría en ese mismo punto del loop.

use mio::event::Source;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::time::{Duration, Instant};

/// Multiplexor de readiness sobre `mio::Poll`
///
/// Es propiedad exclusiva del thread del event loop; no se comparte ni se
/// clona. La tabla de registros (token -> socket) vive en el `Server`, no
/// aquí: el `Poller` solo habla de interés y eventos.
pub struct Poller {
    poll: Poll,
}

impl Poller {
    /// Crea el multiplexor
    ///
    /// Falla solo si el sistema operativo no puede crear la instancia de
    /// epoll; eso es un error fatal de setup para el servidor.
    pub fn new() -> io::Result<Self> {
        Ok(Self { poll: Poll::new()? })
    }

    /// Registra interés de lectura edge-triggered sobre un socket
    ///
    /// Cada socket se registra exactamente una vez, con un token único
    /// asignado por el event loop.
    pub fn register_read<S>(&self, source: &mut S, token: Token) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        self.poll.registry().register(source, token, Interest::READABLE)
    }

    /// Quita un socket del conjunto de interés
    ///
    /// Después de esto el socket no produce más eventos, incluso si ya
    /// había readiness pendiente.
    pub fn deregister<S>(&self, source: &mut S) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        self.poll.registry().deregister(source)
    }

    /// Espera eventos de readiness
    ///
    /// Bloquea hasta que haya al menos un evento o venza el timeout. Un
    /// `EINTR` (señal durante la espera) se reintenta con el tiempo que
    /// queda del timeout, no con el timeout completo, así la espera total
    /// queda acotada aunque lleguen señales repetidas; cualquier otro
    /// error sí es fatal.
    pub fn wait(&mut self, events: &mut Events, timeout: Option<Duration>) -> io::Result<()> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
            match self.poll.poll(events, remaining) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::net::TcpListener;
    use std::io::Write;
    use std::net::TcpStream;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_wait_with_timeout_and_no_events() {
        let mut poller = Poller::new().unwrap();
        let mut events = Events::with_capacity(8);

        let start = Instant::now();
        poller
            .wait(&mut events, Some(Duration::from_millis(50)))
            .unwrap();

        assert!(events.is_empty());
        // La espera total queda acotada por el timeout pedido
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_wait_with_zero_timeout_returns_immediately() {
        let mut poller = Poller::new().unwrap();
        let mut events = Events::with_capacity(8);

        // Un deadline ya vencido equivale a un poll no bloqueante
        poller.wait(&mut events, Some(Duration::ZERO)).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_listener_becomes_readable_on_connect() {
        let mut poller = Poller::new().unwrap();
        let mut events = Events::with_capacity(8);

        let addr = "127.0.0.1:0".parse().unwrap();
        let mut listener = TcpListener::bind(addr).unwrap();
        let local_addr = listener.local_addr().unwrap();

        poller.register_read(&mut listener, Token(0)).unwrap();

        let _client = TcpStream::connect(local_addr).unwrap();

        poller
            .wait(&mut events, Some(Duration::from_secs(2)))
            .unwrap();

        let tokens: Vec<Token> = events.iter().map(|e| e.token()).collect();
        assert!(tokens.contains(&Token(0)));
    }

    #[test]
    fn test_connection_becomes_readable_on_write() {
        let mut poller = Poller::new().unwrap();
        let mut events = Events::with_capacity(8);

        let addr = "127.0.0.1:0".parse().unwrap();
        let mut listener = TcpListener::bind(addr).unwrap();
        let local_addr = listener.local_addr().unwrap();

        poller.register_read(&mut listener, Token(0)).unwrap();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(local_addr).unwrap();
            stream.write_all(b"hola").unwrap();
            // Mantener el socket abierto un momento para que el server lea
            thread::sleep(Duration::from_millis(200));
        });

        // Primero el listener queda listo
        poller
            .wait(&mut events, Some(Duration::from_secs(2)))
            .unwrap();

        // Aceptar con reintentos: el evento garantiza que hay una conexión,
        // pero el primer accept puede adelantarse al handshake
        let mut conn = None;
        for _ in 0..50 {
            match listener.accept() {
                Ok((stream, _)) => {
                    conn = Some(stream);
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => panic!("accept falló: {}", e),
            }
        }
        let mut conn = conn.expect("no llegó la conexión");

        poller.register_read(&mut conn, Token(1)).unwrap();

        // Ahora la conexión debe reportar lectura pendiente
        let mut found = false;
        for _ in 0..10 {
            poller
                .wait(&mut events, Some(Duration::from_millis(500)))
                .unwrap();
            if events.iter().any(|e| e.token() == Token(1)) {
                found = true;
                break;
            }
        }
        assert!(found, "la conexión nunca quedó readable");

        client.join().unwrap();
    }

    #[test]
    fn test_deregister_silences_socket() {
        let mut poller = Poller::new().unwrap();
        let mut events = Events::with_capacity(8);

        let addr = "127.0.0.1:0".parse().unwrap();
        let mut listener = TcpListener::bind(addr).unwrap();
        let local_addr = listener.local_addr().unwrap();

        poller.register_read(&mut listener, Token(0)).unwrap();
        poller.deregister(&mut listener).unwrap();

        let _client = TcpStream::connect(local_addr).unwrap();

        poller
            .wait(&mut events, Some(Duration::from_millis(200)))
            .unwrap();

        assert!(events.is_empty());
    }
}
