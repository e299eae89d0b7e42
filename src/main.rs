//! # Reactor HTTP Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: parsea la configuración, hace el setup
//! (bind + epoll + pool) y corre el event loop. Cualquier falla de setup
//! termina el proceso con código distinto de cero.

use reactor_server::config::Config;
use reactor_server::server::Server;

fn main() {
    println!("=================================");
    println!("  Reactor HTTP/1.1 Server");
    println!("  epoll edge-triggered + workers");
    println!("=================================\n");

    // Configuración desde CLI y variables de entorno
    let config = Config::new();

    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        std::process::exit(1);
    }

    config.print_summary();

    // Errores de setup (resolución, bind, creación del epoll) son fatales
    let mut server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("💥 Error fatal al iniciar: {}", e);
            std::process::exit(1);
        }
    };

    let metrics = server.metrics().clone();

    // Esto bloquea el thread hasta el apagado o un error del multiplexor
    if let Err(e) = server.run() {
        eprintln!("💥 Error fatal en el event loop: {}", e);
        std::process::exit(1);
    }

    // Apagado limpio: reporte final
    println!("\n📊 Métricas finales:");
    println!("{}", metrics.get_metrics_json());
}
