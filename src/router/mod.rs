//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! ## Reglas de match (en orden)
//!
//! 1. Match exacto del path literal para el método del request.
//! 2. Recorrido de los patrones del método en orden de registro; gana el
//!    primero que hace match y sus `{param}` se copian al request.
//! 3. Si el path literal está registrado con otro método → 405.
//! 4. Si no → 404.
//!
//! La tabla está protegida por un `RwLock`: el registro toma el lock de
//! escritura y el routing toma el de lectura solo durante el lookup. El
//! handler corre con el lock ya liberado.

pub mod pattern;

pub use pattern::RoutePattern;

use crate::http::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

/// Tipo de función handler
///
/// Un handler recibe un Request y retorna una Response. Se usa `Arc<dyn Fn>`
/// para que los handlers puedan capturar estado (service manager, puerto).
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// Entrada de la tabla
struct Route {
    pattern: RoutePattern,
    handler: Handler,
    /// Orden global de registro (para listar endpoints)
    seq: u64,
}

/// Tabla método → lista ordenada de (patrón, handler)
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, Vec<Route>>,
    next_seq: u64,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta una ruta; si (método, patrón) ya existe reemplaza el handler
    /// conservando su posición
    pub fn insert(&mut self, method: &str, pattern: &str, handler: Handler) {
        let routes = self.routes.entry(method.to_string()).or_default();

        if let Some(existing) = routes.iter_mut().find(|r| r.pattern.as_str() == pattern) {
            existing.handler = handler;
            return;
        }

        routes.push(Route {
            pattern: RoutePattern::parse(pattern),
            handler,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Busca un match exacto (path literal)
    pub fn find_exact(&self, method: &str, path: &str) -> Option<&Handler> {
        self.routes
            .get(method)?
            .iter()
            .find(|r| r.pattern.as_str() == path)
            .map(|r| &r.handler)
    }

    /// Busca el primer patrón registrado que hace match
    pub fn find_pattern(&self, method: &str, path: &str) -> Option<(&Handler, HashMap<String, String>)> {
        self.routes
            .get(method)?
            .iter()
            .find_map(|r| r.pattern.matches(path).map(|params| (&r.handler, params)))
    }

    /// Indica si el path literal está registrado bajo otro método
    pub fn registered_for_other_method(&self, method: &str, path: &str) -> bool {
        self.routes
            .iter()
            .filter(|(m, _)| m.as_str() != method)
            .any(|(_, routes)| routes.iter().any(|r| r.pattern.as_str() == path))
    }

    /// Lista de endpoints "METHOD pattern" en orden de registro
    pub fn endpoints(&self) -> Vec<String> {
        let mut all: Vec<(u64, String)> = self
            .routes
            .iter()
            .flat_map(|(method, routes)| {
                routes
                    .iter()
                    .map(move |r| (r.seq, format!("{} {}", method, r.pattern.as_str())))
            })
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, endpoint)| endpoint).collect()
    }

    /// Número total de rutas
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum Resolution {
    Exact(Handler),
    Pattern(Handler, HashMap<String, String>),
    MethodNotAllowed,
    NotFound,
}

/// Router thread-safe que comparten los workers
#[derive(Default)]
pub struct Router {
    table: RwLock<RouteTable>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta con su handler
    ///
    /// Registrar dos veces el mismo (método, patrón) reemplaza el handler.
    ///
    /// # Ejemplo
    /// ```
    /// use rest_api_server::router::Router;
    /// use rest_api_server::http::{Request, Response};
    ///
    /// let router = Router::new();
    /// router.register("GET", "/hello/{who}", |req: &Request| {
    ///     let who = req.path_param("who").unwrap_or("world");
    ///     Response::json(&format!(r#"{{"hello": "{}"}}"#, who))
    /// });
    ///
    /// let response = router.route(&Request::new("GET", "/hello/ana"));
    /// assert_eq!(response.body(), r#"{"hello": "ana"}"#);
    /// ```
    pub fn register<F>(&self, method: &str, pattern: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.register_handler(method, pattern, Arc::new(handler));
    }

    /// Registra un handler ya envuelto en `Arc`
    pub fn register_handler(&self, method: &str, pattern: &str, handler: Handler) {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.insert(method, pattern, handler);
        debug!(method, pattern, "ruta registrada");
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// Nunca falla: un miss produce 404/405 y un handler que hace panic
    /// produce 500.
    pub fn route(&self, request: &Request) -> Response {
        match self.resolve(request.method(), request.path()) {
            Resolution::Exact(handler) => Self::invoke(&handler, request),
            Resolution::Pattern(handler, params) => {
                let mut enriched = request.clone();
                enriched.set_path_params(params);
                Self::invoke(&handler, &enriched)
            }
            Resolution::MethodNotAllowed => Response::error(
                StatusCode::MethodNotAllowed,
                "Method not allowed for this endpoint",
            ),
            Resolution::NotFound => Response::error(StatusCode::NotFound, "Endpoint not found"),
        }
    }

    /// Busca el handler con el lock de lectura tomado
    ///
    /// El handler se ejecuta después de soltar el lock.
    fn resolve(&self, method: &str, path: &str) -> Resolution {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(handler) = table.find_exact(method, path) {
            return Resolution::Exact(Arc::clone(handler));
        }
        if let Some((handler, params)) = table.find_pattern(method, path) {
            return Resolution::Pattern(Arc::clone(handler), params);
        }
        if table.registered_for_other_method(method, path) {
            return Resolution::MethodNotAllowed;
        }
        Resolution::NotFound
    }

    /// Ejecuta el handler atrapando panics
    fn invoke(handler: &Handler, request: &Request) -> Response {
        match panic::catch_unwind(AssertUnwindSafe(|| handler(request))) {
            Ok(response) => response,
            Err(_) => {
                error!(method = request.method(), path = request.path(), "el handler hizo panic");
                Response::error(StatusCode::InternalServerError, "Handler failed")
            }
        }
    }

    /// Lista de endpoints registrados ("METHOD pattern")
    pub fn endpoints(&self) -> Vec<String> {
        self.table.read().unwrap_or_else(PoisonError::into_inner).endpoints()
    }

    /// Número de rutas registradas
    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
