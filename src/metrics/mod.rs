//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Recolección de métricas del servidor:
//! - Contadores de requests y de conexiones descartadas
//! - Requests por código de estado
//! - Latencias (p50, p95, p99)
//! - Workers ocupados

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
