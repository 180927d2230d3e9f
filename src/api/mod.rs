//! # API de Servicios
//! src/api/mod.rs
//!
//! Endpoints integrados que consultan al service manager:
//!
//! | Método | Path | Efecto |
//! |---|---|---|
//! | GET | /api/services | lista todos los servicios |
//! | GET | /api/services/{name} | info de un servicio |
//! | GET | /api/health/{name} | health check |
//! | POST | /api/services/{name}/start | arranca el servicio |
//! | POST | /api/services/{name}/stop | detiene el servicio |
//! | GET | /api/status | descripción del servidor |

pub mod handlers;

pub use handlers::{ApiState, BUILTIN_ENDPOINTS, SERVICE_NAME};

use crate::http::{Request, Response};
use crate::router::Router;

/// Registra los endpoints integrados en el router
pub fn register_builtin_routes(router: &Router, state: ApiState) {
    let routes: [(&str, &str, fn(&ApiState, &Request) -> Response); 6] = [
        ("GET", "/api/services", handlers::list_services),
        ("GET", "/api/services/{name}", handlers::service_info),
        ("GET", "/api/health/{name}", handlers::service_health),
        ("POST", "/api/services/{name}/start", handlers::start_service),
        ("POST", "/api/services/{name}/stop", handlers::stop_service),
        ("GET", "/api/status", handlers::server_status),
    ];

    for (method, pattern, handler) in routes {
        let state = state.clone();
        router.register(method, pattern, move |req: &Request| handler(&state, req));
    }
}
