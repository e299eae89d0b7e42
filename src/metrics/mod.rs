//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Este módulo implementa la recolección y agregación de métricas del servidor:
//! - Contadores de conexiones (aceptadas, despachadas, respondidas)
//! - Latencias de atención (p50, p95, p99)
//! - Workers activos/ocupados
//! - Errores de I/O no fatales

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
