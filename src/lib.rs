//! # REST API Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 embebido, implementado sobre sockets bloqueantes, con
//! un router REST y un pool fijo de workers. Expone endpoints para
//! consultar y controlar los servicios de un `ServiceManager`.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de requests y serialización de responses
//! - `router`: tabla (método, patrón) → handler, con `{param}` en el path
//! - `server`: ciclo de vida, acceptor, cola de conexiones y workers
//! - `api`: endpoints integrados bajo `/api`
//! - `services`: trait `Service` y el registro `ServiceManager`
//! - `metrics`: contadores y latencias de requests
//! - `client`: cliente HTTP mínimo para pruebas
//! - `config`, `error`, `logging`: configuración, errores y tracing
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use rest_api_server::config::Config;
//! use rest_api_server::server::Server;
//! use rest_api_server::services::{BasicService, ServiceDirectory, ServiceManager};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(ServiceManager::new());
//! manager.add_service("cache1", Arc::new(BasicService::running("CacheService")));
//!
//! let services: Arc<dyn ServiceDirectory> = manager;
//! let mut server = Server::new(Config::default(), Some(services));
//! server.initialize()?;
//! server.start()?;
//! # Ok::<(), rest_api_server::error::ServerError>(())
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod server;
pub mod services;
