//! # Reactor HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 dirigido por eventos: un event loop edge-triggered
//! (epoll vía mio) acepta conexiones y entrega los sockets listos a un
//! pool fijo de workers, que hacen el ciclo leer/parsear/responder/cerrar
//! con I/O no bloqueante.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `reactor`: Multiplexor de readiness (wrapper sobre `mio::Poll`)
//! - `server`: Event loop, despacho one-shot y handler de conexiones
//! - `pool`: Pool fijo de workers sobre una cola FIFO con condvar
//! - `http`: Parsing permisivo y serialización del subconjunto HTTP/1.1
//! - `config`: Configuración por CLI y variables de entorno
//! - `metrics`: Recolección de métricas y observabilidad
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use reactor_server::config::Config;
//! use reactor_server::server::Server;
//!
//! let config = Config::default();
//! let mut server = Server::bind(config).expect("no se pudo iniciar");
//! server.run().expect("error en el event loop");
//! ```

pub mod config;
pub mod http;
pub mod metrics;
pub mod pool;
pub mod reactor;
pub mod server;
