//! # Servidor TCP Reactivo
//! src/server/tcp.rs
//!
//! El event loop del servidor: un único thread de control bloqueado en el
//! multiplexor que acepta conexiones nuevas y despacha los sockets listos
//! al pool de workers. Este thread jamás lee ni escribe bytes de una
//! conexión; ese trabajo es de los workers.
//!
//! ## Una conexión, un dueño
//!
//! Cada socket aceptado se registra una sola vez con un token único y
//! queda guardado en la tabla del servidor. Cuando llega su evento de
//! readiness el loop lo saca de la tabla, lo desregistra del multiplexor
//! y lo mueve al closure de la tarea. A partir de ahí el worker es el
//! único dueño; el cierre ocurre exactamente una vez, en el `Drop`.

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::pool::ThreadPool;
use crate::reactor::Poller;
use crate::server::handler::handle_connection;
use crate::server::{default_handler, Handler};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Token};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Token fijo del socket de escucha
const LISTENER: Token = Token(0);

/// Eventos máximos por iteración del loop
const MAX_EVENTS: usize = 1024;

/// Handle para detener el servidor desde otro thread
///
/// `stop()` marca el flag; el event loop lo observa al cierre de su
/// iteración actual (a lo sumo un timeout de poll después). El apagado es
/// terminal: el servidor no se puede rearrancar.
#[derive(Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Solicita el apagado del event loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Servidor HTTP dirigido por eventos con pool de workers
pub struct Server {
    config: Config,
    listener: TcpListener,
    poller: Poller,
    pool: ThreadPool,
    handler: Handler,
    metrics: MetricsCollector,
    running: Arc<AtomicBool>,

    /// Tabla de registro: sockets aceptados esperando su readiness.
    /// Solo la toca el thread del event loop.
    connections: HashMap<Token, TcpStream>,

    /// Próximo token a asignar; los tokens no se reutilizan
    next_token: usize,
}

impl Server {
    /// Crea el servidor con el handler de eco por defecto
    ///
    /// Resuelve la dirección, hace bind del listener, crea el multiplexor
    /// y lanza el pool. Cualquier falla aquí es fatal: se propaga a `main`
    /// para terminar el proceso con código distinto de cero.
    pub fn bind(config: Config) -> io::Result<Self> {
        Self::with_handler(config, default_handler)
    }

    /// Crea el servidor con un handler de aplicación propio
    pub fn with_handler(config: Config, handler: Handler) -> io::Result<Self> {
        let address = config.address();
        println!("[*] Iniciando servidor en {}", address);

        let addr = resolve(&address)?;

        let mut listener = TcpListener::bind(addr)?;
        let poller = Poller::new()?;

        // El listener queda registrado de forma persistente (no one-shot):
        // cada evento suyo significa "hay conexiones por aceptar"
        poller.register_read(&mut listener, LISTENER)?;

        let pool = ThreadPool::new(config.workers);

        println!("[+] Servidor escuchando en {}", listener.local_addr()?);

        Ok(Self {
            config,
            listener,
            poller,
            pool,
            handler,
            metrics: MetricsCollector::new(),
            running: Arc::new(AtomicBool::new(true)),
            connections: HashMap::new(),
            next_token: 1,
        })
    }

    /// Dirección real en la que quedó escuchando (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle clonable para pedir el apagado desde otro thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Collector de métricas del servidor
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Corre el event loop hasta que se pida el apagado
    ///
    /// El poll usa un timeout finito para que un `stop()` se observe en un
    /// tiempo acotado aunque no llegue tráfico. Un error del multiplexor
    /// (que no sea `EINTR`, ya reintentado adentro) es fatal y se propaga.
    pub fn run(&mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(MAX_EVENTS);
        let timeout = Duration::from_millis(self.config.poll_timeout_ms);

        println!("[*] Event loop iniciado (timeout de poll: {} ms)\n", self.config.poll_timeout_ms);

        while self.running.load(Ordering::SeqCst) {
            self.poller.wait(&mut events, Some(timeout))?;

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_pending(),
                    token => self.dispatch(token),
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    /// Drena todas las conexiones pendientes del listener
    ///
    /// En modo edge-triggered el aviso de "hay conexiones" llega una sola
    /// vez, así que hay que aceptar en loop hasta `WouldBlock`.
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    self.metrics.record_accept();
                    self.register_connection(stream, addr);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // No quedan conexiones pendientes
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Falla transitoria de accept: se reporta y se abandona
                    // este drenado; el listener sigue registrado y el loop
                    // sigue vivo
                    eprintln!("   ❌ Error al aceptar conexión: {}", e);
                    self.metrics.record_io_error();
                    break;
                }
            }
        }
    }

    /// Registra un socket recién aceptado con interés de lectura
    fn register_connection(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        let token = Token(self.next_token);
        self.next_token += 1;

        // mio entrega los sockets aceptados ya en modo no bloqueante
        if let Err(e) = self.poller.register_read(&mut stream, token) {
            // Falla solo esta conexión: el Drop la cierra y el servidor
            // sigue atendiendo al resto
            eprintln!("   ❌ No se pudo registrar {}: {}", addr, e);
            self.metrics.record_io_error();
            return;
        }

        self.connections.insert(token, stream);
    }

    /// Despacha una conexión lista al pool
    ///
    /// Disciplina one-shot: el socket sale de la tabla y del multiplexor
    /// ANTES de encolar la tarea, así ningún evento posterior (ni uno
    /// duplicado en el mismo batch) puede entregarlo dos veces. Si hubiera
    /// keep-alive, el re-registro del socket iría aquí al terminar el
    /// worker; con conexiones de un solo intercambio no existe ese camino.
    fn dispatch(&mut self, token: Token) {
        let mut stream = match self.connections.remove(&token) {
            Some(stream) => stream,
            None => return, // evento duplicado o socket ya despachado
        };

        if let Err(e) = self.poller.deregister(&mut stream) {
            // El socket ya salió de la tabla; se atiende igual
            eprintln!("   ❌ No se pudo desregistrar el socket: {}", e);
        }

        self.metrics.record_dispatch();

        let handler = self.handler;
        let metrics = self.metrics.clone();

        let submitted = self.pool.execute(move || {
            handle_connection(stream, handler, &metrics);
        });

        if submitted.is_err() {
            // Pool en apagado: la tarea vuelve con el socket adentro y al
            // descartarla el Drop cierra la conexión
            eprintln!("   ❌ Pool en apagado: conexión descartada");
        }
    }

    /// Apagado ordenado al salir del loop
    fn shutdown(&mut self) {
        println!("\n[*] Apagando servidor...");

        // Conexiones registradas que nunca llegaron a despacharse: cerrar
        // al vaciar la tabla
        let undispatched = self.connections.len();
        if undispatched > 0 {
            println!("[*] Cerrando {} conexiones sin despachar", undispatched);
        }
        self.connections.clear();

        // El pool termina las tareas ya encoladas antes del join
        let pending = self.pool.pending();
        if pending > 0 {
            println!("[*] Esperando {} tareas pendientes", pending);
        }
        self.pool.shutdown();

        println!("[+] Servidor detenido");
    }
}

/// Resuelve `host:puerto` a la primera dirección utilizable
fn resolve(address: &str) -> io::Result<SocketAddr> {
    address.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("la dirección '{}' no resuelve a nada", address),
        )
    })
}
