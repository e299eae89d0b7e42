//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor con soporte completo
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./reactor_server --host 0.0.0.0 --port 8080 --workers 8
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 WORKERS=8 ./reactor_server
//! ```

use clap::Parser;

/// Configuración del servidor HTTP/1.1 reactivo
#[derive(Debug, Clone, Parser)]
#[command(name = "reactor_server")]
#[command(about = "Servidor HTTP/1.1 dirigido por eventos (epoll edge-triggered) con pool de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Número de workers del pool (por defecto: paralelismo del hardware)
    #[arg(long, default_value_t = num_cpus::get(), env = "WORKERS")]
    pub workers: usize,

    /// Timeout del poll del event loop en milisegundos
    ///
    /// Acota cuánto tarda el servidor en observar una señal de apagado
    /// cuando no llega tráfico.
    #[arg(long = "poll-timeout-ms", default_value = "500", env = "POLL_TIMEOUT_MS")]
    pub poll_timeout_ms: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use reactor_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }

        if self.poll_timeout_ms == 0 {
            return Err("Poll timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║           Reactor HTTP/1.1 Server Configuration              ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:       {}", self.address());
        println!();
        println!("⚡ Event loop:");
        println!("   Modelo:        epoll edge-triggered, despacho one-shot");
        println!("   Poll timeout:  {} ms", self.poll_timeout_ms);
        println!();
        println!("👷 Worker Pool:");
        println!("   Workers:       {} threads", self.workers);
        println!("   Cola:          FIFO, drenaje completo al apagar");
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            poll_timeout_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_timeout_ms, 500);
        // num_cpus nunca reporta 0
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_workers() {
        let mut config = Config::default();
        config.workers = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Workers"));
    }

    #[test]
    fn test_validate_invalid_poll_timeout() {
        let mut config = Config::default();
        config.poll_timeout_ms = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Poll timeout"));
    }

    #[test]
    fn test_config_custom_values() {
        let mut config = Config::default();
        config.port = 3000;
        config.host = "127.0.0.1".to_string();
        config.workers = 8;
        config.poll_timeout_ms = 100;

        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_print_summary() {
        let config = Config::default();
        // No debe entrar en pánico
        config.print_summary();
    }
}
