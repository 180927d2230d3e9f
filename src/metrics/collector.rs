//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Contadores de requests y latencias, compartidos entre workers.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Máximo de latencias guardadas para calcular percentiles
const MAX_LATENCIES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
#[derive(Default)]
struct MetricsData {
    /// Requests respondidos
    total_requests: u64,

    /// Conexiones cerradas sin respuesta (lectura vacía, timeout)
    dropped_connections: u64,

    /// Requests por código de estado
    status_codes: BTreeMap<u16, u64>,

    /// Ventana de latencias (microsegundos)
    latencies: VecDeque<u64>,

    /// Workers procesando una conexión ahora mismo
    busy_workers: u64,
}

/// Snapshot serializable de las métricas
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub dropped_connections: u64,
    pub busy_workers: u64,
    pub uptime_secs: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub latency_p50_us: u64,
    pub latency_p95_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                latencies: VecDeque::with_capacity(MAX_LATENCIES),
                ..Default::default()
            })),
            start_time: Instant::now(),
        }
    }

    fn data(&self) -> std::sync::MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un request respondido
    pub fn record_request(&self, status_code: u16, latency: Duration) {
        let mut data = self.data();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;

        // Si la ventana está llena, descartar la más antigua
        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);
    }

    /// Registra una conexión cerrada sin respuesta
    pub fn record_dropped(&self) {
        self.data().dropped_connections += 1;
    }

    /// Un worker tomó una conexión
    pub fn worker_busy(&self) {
        self.data().busy_workers += 1;
    }

    /// Un worker terminó con su conexión
    pub fn worker_idle(&self) {
        let mut data = self.data();
        data.busy_workers = data.busy_workers.saturating_sub(1);
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data();
        let (p50, p95, p99, avg) = Self::calculate_percentiles(&data.latencies);

        MetricsSnapshot {
            total_requests: data.total_requests,
            dropped_connections: data.dropped_connections,
            busy_workers: data.busy_workers,
            uptime_secs: self.start_time.elapsed().as_secs(),
            status_codes: data.status_codes.clone(),
            latency_p50_us: p50,
            latency_p95_us: p95,
            latency_p99_us: p99,
            latency_avg_us: avg,
        }
    }

    /// Snapshot como `serde_json::Value` (para /api/status)
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }

    /// Calcula percentiles de latencia
    fn calculate_percentiles(latencies: &VecDeque<u64>) -> (u64, u64, u64, u64) {
        if latencies.is_empty() {
            return (0, 0, 0, 0);
        }

        let mut sorted: Vec<u64> = latencies.iter().copied().collect();
        sorted.sort_unstable();

        let len = sorted.len();
        let p50 = sorted[len * 50 / 100];
        let p95 = sorted[len * 95 / 100];
        let p99 = sorted[len * 99 / 100];

        let sum: u64 = sorted.iter().sum();
        let avg = sum / len as u64;

        (p50, p95, p99, avg)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
