//! # Servicio Básico
//! src/services/basic.rs
//!
//! Servicio respaldado por flags atómicos. Sirve para la demo y los tests.

use super::Service;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::info;

/// Servicio simple con estado en flags
#[derive(Debug)]
pub struct BasicService {
    kind: String,
    running: AtomicBool,
    healthy: AtomicBool,
    fail_start: AtomicBool,
    starts: AtomicU64,
}

impl BasicService {
    /// Crea un servicio detenido y saludable
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            running: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            starts: AtomicU64::new(0),
        }
    }

    /// Crea un servicio que ya está corriendo
    pub fn running(kind: &str) -> Self {
        let service = Self::new(kind);
        service.running.store(true, Ordering::SeqCst);
        service
    }

    /// Marca el servicio como (no) saludable
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Hace que los próximos `start()` fallen
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Cuántas veces arrancó con éxito
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::SeqCst)
    }
}

impl Service for BasicService {
    fn name(&self) -> String {
        self.kind.clone()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Saludable = corriendo y sin falla marcada
    fn health(&self) -> bool {
        self.is_running() && self.healthy.load(Ordering::SeqCst)
    }

    fn start(&self) -> bool {
        if self.fail_start.load(Ordering::SeqCst) {
            return false;
        }
        self.running.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        info!(kind = %self.kind, "servicio iniciado");
        true
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!(kind = %self.kind, "servicio detenido");
    }
}
