//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta y agrega métricas del servidor en tiempo real: conexiones
//! aceptadas, tareas despachadas, respuestas enviadas y latencias de
//! atención por conexión.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Collector de métricas thread-safe
///
/// Se clona barato (comparte el estado por `Arc`); el event loop y los
/// workers registran eventos concurrentemente.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
struct MetricsData {
    /// Conexiones aceptadas por el event loop
    connections_accepted: u64,

    /// Tareas de atención despachadas al pool
    tasks_dispatched: u64,

    /// Respuestas escritas con éxito
    responses_sent: u64,

    /// Conexiones cerradas sin respuesta (vacías, incompletas o con error)
    closed_without_response: u64,

    /// Errores de I/O (accept, registro, lectura, escritura)
    io_errors: u64,

    /// Respuestas por código de estado
    status_codes: HashMap<u16, u64>,

    /// Latencias de atención registradas (en microsegundos)
    latencies: Vec<u64>,

    /// Máximo de latencias a guardar (para calcular percentiles)
    max_latencies: usize,

    /// Workers atendiendo una conexión en este momento
    active_workers: u64,
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                connections_accepted: 0,
                tasks_dispatched: 0,
                responses_sent: 0,
                closed_without_response: 0,
                io_errors: 0,
                status_codes: HashMap::new(),
                latencies: Vec::with_capacity(10000),
                max_latencies: 10000, // Guardar últimas 10k latencias
                active_workers: 0,
            })),
            start_time: Instant::now(),
        }
    }

    /// Registra una conexión aceptada
    pub fn record_accept(&self) {
        let mut data = self.inner.lock().unwrap();
        data.connections_accepted += 1;
    }

    /// Registra una tarea despachada al pool
    pub fn record_dispatch(&self) {
        let mut data = self.inner.lock().unwrap();
        data.tasks_dispatched += 1;
    }

    /// Registra una respuesta enviada con su latencia de atención
    pub fn record_response(&self, status_code: u16, latency: Duration) {
        let mut data = self.inner.lock().unwrap();

        data.responses_sent += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;

        // Registrar latencia (en microsegundos)
        let latency_us = latency.as_micros() as u64;

        // Si tenemos demasiadas latencias, eliminar las más antiguas
        if data.latencies.len() >= data.max_latencies {
            data.latencies.remove(0);
        }
        data.latencies.push(latency_us);
    }

    /// Registra una conexión cerrada sin enviar respuesta
    pub fn record_closed_without_response(&self) {
        let mut data = self.inner.lock().unwrap();
        data.closed_without_response += 1;
    }

    /// Registra un error de I/O no fatal
    pub fn record_io_error(&self) {
        let mut data = self.inner.lock().unwrap();
        data.io_errors += 1;
    }

    /// Incrementa el contador de workers activos
    pub fn increment_active_workers(&self) {
        let mut data = self.inner.lock().unwrap();
        data.active_workers += 1;
    }

    /// Decrementa el contador de workers activos
    pub fn decrement_active_workers(&self) {
        let mut data = self.inner.lock().unwrap();
        if data.active_workers > 0 {
            data.active_workers -= 1;
        }
    }

    /// Obtiene el número de workers activos
    pub fn active_workers(&self) -> u64 {
        let data = self.inner.lock().unwrap();
        data.active_workers
    }

    /// Obtiene las métricas actuales en formato JSON
    pub fn get_metrics_json(&self) -> String {
        let data = self.inner.lock().unwrap();

        let uptime_secs = self.start_time.elapsed().as_secs();
        let (p50, p95, p99, avg) = Self::calculate_percentiles(&data.latencies);
        let stddev = Self::calculate_stddev(&data.latencies, avg);

        let status_codes: HashMap<String, u64> = data
            .status_codes
            .iter()
            .map(|(code, count)| (code.to_string(), *count))
            .collect();

        let value = serde_json::json!({
            "server": {
                "uptime_seconds": uptime_secs,
            },
            "connections": {
                "accepted": data.connections_accepted,
                "dispatched": data.tasks_dispatched,
                "responses_sent": data.responses_sent,
                "closed_without_response": data.closed_without_response,
                "io_errors": data.io_errors,
                "status_codes": status_codes,
            },
            "workers": {
                "active": data.active_workers,
            },
            "latency_us": {
                "p50": p50,
                "p95": p95,
                "p99": p99,
                "avg": avg,
                "stddev": stddev,
                "samples": data.latencies.len(),
            },
        });

        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Calcula percentiles de latencia
    fn calculate_percentiles(latencies: &[u64]) -> (u64, u64, u64, u64) {
        if latencies.is_empty() {
            return (0, 0, 0, 0);
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_unstable();

        let len = sorted.len();
        let p50 = sorted[(len * 50 / 100).min(len - 1)];
        let p95 = sorted[(len * 95 / 100).min(len - 1)];
        let p99 = sorted[(len * 99 / 100).min(len - 1)];

        let sum: u64 = sorted.iter().sum();
        let avg = sum / len as u64;

        (p50, p95, p99, avg)
    }

    /// Calcula la desviación estándar de las latencias
    fn calculate_stddev(latencies: &[u64], avg: u64) -> f64 {
        if latencies.is_empty() {
            return 0.0;
        }

        let variance: f64 = latencies
            .iter()
            .map(|&x| {
                let diff = x as f64 - avg as f64;
                diff * diff
            })
            .sum::<f64>()
            / latencies.len() as f64;

        variance.sqrt()
    }

    /// Obtiene un snapshot de las métricas
    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let data = self.inner.lock().unwrap();
        let (p50, p95, p99, avg) = Self::calculate_percentiles(&data.latencies);

        MetricsSnapshot {
            connections_accepted: data.connections_accepted,
            tasks_dispatched: data.tasks_dispatched,
            responses_sent: data.responses_sent,
            closed_without_response: data.closed_without_response,
            io_errors: data.io_errors,
            active_workers: data.active_workers,
            uptime_secs: self.start_time.elapsed().as_secs(),
            latency_p50_us: p50,
            latency_p95_us: p95,
            latency_p99_us: p99,
            latency_avg_us: avg,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de métricas (para uso externo)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub tasks_dispatched: u64,
    pub responses_sent: u64,
    pub closed_without_response: u64,
    pub io_errors: u64,
    pub active_workers: u64,
    pub uptime_secs: u64,
    pub latency_p50_us: u64,
    pub latency_p95_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
}
