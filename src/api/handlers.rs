//! # Handlers de la API de Servicios
//! src/api/handlers.rs
//!
//! Cada handler vuelve a verificar que haya un service manager configurado
//! y, si no lo hay, responde 503 en vez de fallar la conexión.
//!
//! # Ejemplo de response (`GET /api/services/cache1`)
//! ```json
//! {
//!   "name": "cache1",
//!   "type": "CacheService",
//!   "running": true,
//!   "healthy": true
//! }
//! ```

use crate::http::{Request, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::services::{Service, ServiceDirectory};
use serde_json::json;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Nombre con el que el servidor se describe en /api/status
pub const SERVICE_NAME: &str = "RestApiService";

/// Endpoints que registra el servidor por defecto
pub const BUILTIN_ENDPOINTS: [(&str, &str); 6] = [
    ("GET", "/api/services"),
    ("GET", "/api/services/{name}"),
    ("GET", "/api/health/{name}"),
    ("POST", "/api/services/{name}/start"),
    ("POST", "/api/services/{name}/stop"),
    ("GET", "/api/status"),
];

/// Estado compartido por los handlers integrados
#[derive(Clone)]
pub struct ApiState {
    services: Option<Arc<dyn ServiceDirectory>>,
    port: Arc<AtomicU16>,
    metrics: MetricsCollector,
}

impl ApiState {
    pub fn new(
        services: Option<Arc<dyn ServiceDirectory>>,
        port: Arc<AtomicU16>,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            services,
            port,
            metrics,
        }
    }

    fn directory(&self) -> Result<&Arc<dyn ServiceDirectory>, Response> {
        self.services.as_ref().ok_or_else(|| {
            Response::error(StatusCode::ServiceUnavailable, "Service manager not available")
        })
    }

    /// Resuelve el servicio nombrado en el path
    ///
    /// 503 sin service manager, 400 sin `{name}`, 404 si no existe.
    fn lookup(&self, req: &Request) -> Result<(String, Arc<dyn Service>), Response> {
        let directory = self.directory()?;

        let name = req
            .path_param("name")
            .ok_or_else(|| Response::error(StatusCode::BadRequest, "Service name not provided"))?;

        let service = directory
            .service(name)
            .ok_or_else(|| Response::error(StatusCode::NotFound, "Service not found"))?;

        Ok((name.to_string(), service))
    }
}

/// Handler para GET /api/services
pub fn list_services(state: &ApiState, _req: &Request) -> Response {
    let directory = match state.directory() {
        Ok(d) => d,
        Err(response) => return response,
    };

    let services: Vec<_> = directory
        .all_services()
        .iter()
        .map(|(name, service)| {
            json!({
                "name": name,
                "type": service.name(),
                "running": service.is_running(),
            })
        })
        .collect();

    Response::json(&json!({ "services": services }).to_string())
}

/// Handler para GET /api/services/{name}
pub fn service_info(state: &ApiState, req: &Request) -> Response {
    let (name, service) = match state.lookup(req) {
        Ok(found) => found,
        Err(response) => return response,
    };

    let body = json!({
        "name": name,
        "type": service.name(),
        "running": service.is_running(),
        "healthy": service.health(),
    });
    Response::json(&body.to_string())
}

/// Handler para GET /api/health/{name}
///
/// 503 si el servicio no está saludable.
pub fn service_health(state: &ApiState, req: &Request) -> Response {
    let (_, service) = match state.lookup(req) {
        Ok(found) => found,
        Err(response) => return response,
    };

    let healthy = service.health();
    let mut response = Response::json(&json!({ "healthy": healthy }).to_string());
    if !healthy {
        response.set_status(StatusCode::ServiceUnavailable);
    }
    response
}

/// Handler para POST /api/services/{name}/start
///
/// 500 si el servicio no pudo arrancar.
pub fn start_service(state: &ApiState, req: &Request) -> Response {
    let (name, service) = match state.lookup(req) {
        Ok(found) => found,
        Err(response) => return response,
    };

    let started = service.start();
    if started {
        info!(service = %name, "servicio iniciado vía API");
    } else {
        warn!(service = %name, "el servicio no pudo iniciar");
    }

    let mut response = Response::json(&json!({ "started": started }).to_string());
    if !started {
        response.set_status(StatusCode::InternalServerError);
    }
    response
}

/// Handler para POST /api/services/{name}/stop
pub fn stop_service(state: &ApiState, req: &Request) -> Response {
    let (name, service) = match state.lookup(req) {
        Ok(found) => found,
        Err(response) => return response,
    };

    service.stop();
    info!(service = %name, "servicio detenido vía API");

    Response::json(&json!({ "stopped": true }).to_string())
}

/// Handler para GET /api/status
///
/// Responde aunque no haya service manager: describe al propio servidor.
pub fn server_status(state: &ApiState, _req: &Request) -> Response {
    let endpoints: Vec<String> = BUILTIN_ENDPOINTS
        .iter()
        .map(|(method, path)| format!("{} {}", method, path))
        .collect();

    let body = json!({
        "service": SERVICE_NAME,
        "status": "running",
        "port": state.port.load(Ordering::SeqCst),
        "endpoints": endpoints,
        "requests": state.metrics.to_json(),
    });
    Response::json(&body.to_string())
}
