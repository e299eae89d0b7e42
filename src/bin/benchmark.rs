//! # Benchmark - Cliente de Carga
//! src/bin/benchmark.rs
//!
//! Cliente de carga offline para medir el servidor: N threads haciendo
//! requests bloqueantes en serie durante una ventana de tiempo, con
//! reporte de RPS y latencias al final. No forma parte del núcleo del
//! servidor; es una herramienta de prueba externa.

use clap::Parser;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

/// Opciones del cliente de carga
#[derive(Debug, Parser)]
#[command(name = "benchmark")]
#[command(about = "Cliente de carga para el servidor HTTP reactivo")]
#[command(version = "0.1.0")]
struct Options {
    /// Host del servidor
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Puerto del servidor
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Threads concurrentes de carga
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Duración de la prueba en segundos
    #[arg(short, long, default_value = "10")]
    duration: u64,
}

/// Estadísticas acumuladas por un thread de carga
#[derive(Default)]
struct Stats {
    requests: u64,
    errors: u64,
    latencies_ms: Vec<f64>,
}

/// Loop de un thread de carga: requests en serie hasta agotar la ventana
fn run_worker(address: String, duration: Duration) -> Stats {
    let mut stats = Stats::default();
    let start = Instant::now();

    while start.elapsed() < duration {
        let req_start = Instant::now();

        match one_request(&address) {
            Ok(()) => {
                stats.requests += 1;
                stats
                    .latencies_ms
                    .push(req_start.elapsed().as_secs_f64() * 1000.0);
            }
            Err(_) => stats.errors += 1,
        }
    }

    stats
}

/// Un intercambio completo: conectar, pedir y drenar la respuesta
fn one_request(address: &str) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(address)?;
    stream.write_all(b"GET /test HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")?;

    // El servidor cierra al terminar; leer hasta EOF drena todo
    let mut sink = Vec::new();
    stream.read_to_end(&mut sink)?;

    Ok(())
}

/// Percentil sobre una lista ya ordenada
fn percentile(sorted: &[f64], pct: usize) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() * pct / 100).min(sorted.len() - 1);
    sorted[idx]
}

fn main() {
    let options = Options::parse();

    println!(
        "Benchmarking {}:{} con {} threads durante {}s...",
        options.host, options.port, options.concurrency, options.duration
    );

    let address = format!("{}:{}", options.host, options.port);
    let duration = Duration::from_secs(options.duration);

    let handles: Vec<_> = (0..options.concurrency)
        .map(|_| {
            let address = address.clone();
            thread::spawn(move || run_worker(address, duration))
        })
        .collect();

    let mut total_requests = 0u64;
    let mut total_errors = 0u64;
    let mut latencies = Vec::new();

    for handle in handles {
        match handle.join() {
            Ok(stats) => {
                total_requests += stats.requests;
                total_errors += stats.errors;
                latencies.extend(stats.latencies_ms);
            }
            Err(_) => eprintln!("❌ Un thread de carga terminó en pánico"),
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rps = if options.duration == 0 {
        0.0
    } else {
        total_requests as f64 / options.duration as f64
    };
    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };
    let p99 = percentile(&latencies, 99);

    println!("--- Resultados ---");
    println!("Requests totales: {}", total_requests);
    println!("Errores totales:  {}", total_errors);
    println!("RPS:              {:.1}", rps);
    println!("Latencia avg:     {:.2} ms", avg);
    println!("Latencia p99:     {:.2} ms", p99);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_percentile() {
        let sorted: Vec<f64> = (1..=100).map(|i| i as f64).collect();

        assert_eq!(percentile(&sorted, 50), 51.0);
        assert_eq!(percentile(&sorted, 99), 100.0);
        assert_eq!(percentile(&[], 99), 0.0);
    }

    #[test]
    fn test_percentile_single_sample() {
        assert_eq!(percentile(&[42.0], 50), 42.0);
        assert_eq!(percentile(&[42.0], 99), 42.0);
    }

    #[test]
    fn test_one_request_against_stub_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let mut buffer = [0u8; 1024];
            let _ = stream.read(&mut buffer);

            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                .unwrap();
            // El Drop cierra el socket y el cliente ve EOF
        });

        one_request(&addr.to_string()).unwrap();
        server.join().unwrap();
    }

    #[test]
    fn test_one_request_connection_refused() {
        // Puerto descartable: bind + drop libera el puerto sin listener
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(one_request(&addr.to_string()).is_err());
    }
}
