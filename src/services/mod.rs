//! # Servicios Administrados
//! src/services/mod.rs
//!
//! El servidor no crea ni posee servicios: solo los consulta y comanda a
//! través de dos traits.
//!
//! - [`Service`]: la capacidad común (nombre, running, health, start, stop)
//! - [`ServiceDirectory`]: el colaborador que resuelve nombres de instancia
//!
//! [`ServiceManager`] es una implementación explícita (sin registro global)
//! y [`BasicService`] un servicio simple basado en flags.

pub mod basic;
pub mod manager;

pub use basic::BasicService;
pub use manager::ServiceManager;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Capacidad común a todos los servicios
///
/// Todos los métodos toman `&self`: los servicios se comparten entre los
/// workers del servidor y usan mutabilidad interior.
pub trait Service: Send + Sync {
    /// Nombre del tipo de servicio (ej: "CacheService")
    fn name(&self) -> String;

    /// Indica si el servicio está corriendo
    fn is_running(&self) -> bool;

    /// Health check
    fn health(&self) -> bool;

    /// Arranca el servicio; retorna `false` si no pudo
    fn start(&self) -> bool;

    /// Detiene el servicio
    fn stop(&self);
}

/// Colaborador que consultan los handlers de la API
pub trait ServiceDirectory: Send + Sync {
    /// Todas las instancias, por nombre de instancia
    fn all_services(&self) -> BTreeMap<String, Arc<dyn Service>>;

    /// Una instancia por nombre, si existe
    fn service(&self, instance: &str) -> Option<Arc<dyn Service>>;
}
