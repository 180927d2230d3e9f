//! # Gestor de Servicios
//! src/services/manager.rs
//!
//! Registro explícito de instancias de servicio. No hay fábrica global: el
//! que arma la aplicación crea cada servicio y lo agrega aquí.
//!
//! Además del acceso uniforme por [`Service`], guarda el tipo concreto para
//! que el código que lo necesite pida `typed::<CacheService>("cache")` en vez
//! de inspeccionar tipos en runtime.

use super::{Service, ServiceDirectory};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

struct Entry {
    service: Arc<dyn Service>,
    concrete: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Orden de inserción (start en orden, stop al revés)
    order: Vec<String>,
}

/// Registro de instancias de servicio, thread-safe
#[derive(Default)]
pub struct ServiceManager {
    inner: RwLock<Inner>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega una instancia con nombre
    ///
    /// Retorna `false` si el nombre está vacío o ya existe.
    pub fn add_service<S>(&self, instance: &str, service: Arc<S>) -> bool
    where
        S: Service + 'static,
    {
        if instance.is_empty() {
            warn!("nombre de instancia vacío");
            return false;
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.entries.contains_key(instance) {
            warn!(instance, "la instancia ya existe");
            return false;
        }

        let entry = Entry {
            service: service.clone(),
            concrete: service,
        };
        inner.entries.insert(instance.to_string(), entry);
        inner.order.push(instance.to_string());

        info!(instance, "servicio agregado");
        true
    }

    /// Quita una instancia, deteniéndola si estaba corriendo
    pub fn remove_service(&self, instance: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = inner.entries.remove(instance) else {
            return false;
        };
        inner.order.retain(|name| name != instance);
        drop(inner);

        if entry.service.is_running() {
            entry.service.stop();
        }
        info!(instance, "servicio removido");
        true
    }

    /// Lookup tipado: retorna la instancia solo si es de tipo `S`
    pub fn typed<S>(&self, instance: &str) -> Option<Arc<S>>
    where
        S: Service + 'static,
    {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let concrete = inner.entries.get(instance)?.concrete.clone();
        concrete.downcast::<S>().ok()
    }

    /// Arranca todas las instancias en orden de inserción
    ///
    /// Se detiene en la primera que falla y retorna `false`.
    pub fn start_all(&self) -> bool {
        for (instance, service) in self.ordered() {
            if service.is_running() {
                continue;
            }
            if !service.start() {
                warn!(instance = %instance, "no se pudo iniciar el servicio");
                return false;
            }
        }
        true
    }

    /// Detiene todas las instancias en orden inverso
    pub fn stop_all(&self) {
        for (_, service) in self.ordered().into_iter().rev() {
            if service.is_running() {
                service.stop();
            }
        }
    }

    /// Nombres de instancia en orden de inserción
    pub fn names(&self) -> Vec<String> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copia (nombre, servicio) en orden de inserción, sin retener el lock
    fn ordered(&self) -> Vec<(String, Arc<dyn Service>)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|name| {
                inner
                    .entries
                    .get(name)
                    .map(|e| (name.clone(), Arc::clone(&e.service)))
            })
            .collect()
    }
}

impl ServiceDirectory for ServiceManager {
    fn all_services(&self) -> BTreeMap<String, Arc<dyn Service>> {
        self.ordered().into_iter().collect()
    }

    fn service(&self, instance: &str) -> Option<Arc<dyn Service>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(instance).map(|e| Arc::clone(&e.service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::BasicService;

    /// Otro tipo concreto para probar el lookup tipado
    struct Clock;

    impl Service for Clock {
        fn name(&self) -> String {
            "ClockService".to_string()
        }
        fn is_running(&self) -> bool {
            true
        }
        fn health(&self) -> bool {
            true
        }
        fn start(&self) -> bool {
            true
        }
        fn stop(&self) {}
    }

    #[test]
    fn test_add_and_lookup() {
        let manager = ServiceManager::new();
        assert!(manager.add_service("cache1", Arc::new(BasicService::new("CacheService"))));

        let service = manager.service("cache1").unwrap();
        assert_eq!(service.name(), "CacheService");
        assert!(manager.service("ghost").is_none());
    }

    #[test]
    fn test_rejects_duplicates_and_empty_names() {
        let manager = ServiceManager::new();
        assert!(manager.add_service("a", Arc::new(BasicService::new("X"))));
        assert!(!manager.add_service("a", Arc::new(BasicService::new("Y"))));
        assert!(!manager.add_service("", Arc::new(BasicService::new("Z"))));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_typed_lookup() {
        let manager = ServiceManager::new();
        manager.add_service("cache", Arc::new(BasicService::new("CacheService")));
        manager.add_service("clock", Arc::new(Clock));

        assert!(manager.typed::<BasicService>("cache").is_some());
        assert!(manager.typed::<Clock>("cache").is_none());
        assert!(manager.typed::<Clock>("clock").is_some());
        assert!(manager.typed::<Clock>("missing").is_none());
    }

    #[test]
    fn test_typed_lookup_shares_instance() {
        let manager = ServiceManager::new();
        manager.add_service("db", Arc::new(BasicService::new("DatabaseService")));

        let typed = manager.typed::<BasicService>("db").unwrap();
        typed.start();

        assert!(manager.service("db").unwrap().is_running());
    }

    #[test]
    fn test_start_all_and_stop_all() {
        let manager = ServiceManager::new();
        manager.add_service("logger", Arc::new(BasicService::new("LoggingService")));
        manager.add_service("db", Arc::new(BasicService::new("DatabaseService")));

        assert!(manager.start_all());
        assert!(manager.all_services().values().all(|s| s.is_running()));

        manager.stop_all();
        assert!(manager.all_services().values().all(|s| !s.is_running()));
    }

    #[test]
    fn test_start_all_stops_at_first_failure() {
        let manager = ServiceManager::new();
        let broken = Arc::new(BasicService::new("Broken"));
        broken.set_fail_start(true);
        let after = Arc::new(BasicService::new("After"));

        manager.add_service("broken", broken);
        manager.add_service("after", after.clone());

        assert!(!manager.start_all());
        assert!(!after.is_running());
    }

    #[test]
    fn test_remove_stops_running_service() {
        let manager = ServiceManager::new();
        let service = Arc::new(BasicService::running("CacheService"));
        manager.add_service("cache", service.clone());

        assert!(manager.remove_service("cache"));
        assert!(!service.is_running());
        assert!(!manager.remove_service("cache"));
        assert!(manager.names().is_empty());
    }

    #[test]
    fn test_all_services_sorted_by_name() {
        let manager = ServiceManager::new();
        manager.add_service("zeta", Arc::new(BasicService::new("Z")));
        manager.add_service("alpha", Arc::new(BasicService::new("A")));

        let names: Vec<String> = manager.all_services().keys().cloned().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(manager.names(), vec!["zeta", "alpha"]);
    }
}
