//! # REST API Server - Entry Point
//! src/main.rs
//!
//! Levanta el servidor con un service manager de demostración y dos rutas
//! propias (`/api/custom/hello` y `/api/custom/echo`).

use clap::Parser;
use rest_api_server::config::Config;
use rest_api_server::http::{Request, Response};
use rest_api_server::logging::init_tracing;
use rest_api_server::server::Server;
use rest_api_server::services::{BasicService, ServiceDirectory, ServiceManager};
use serde_json::json;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};

fn main() {
    let config = Config::parse();

    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("No se pudo inicializar el logging: {}", e);
    }

    println!("=================================");
    println!("  RedUnix REST API Server");
    println!("  Principios de Sistemas Operativos");
    println!("=================================\n");

    if let Err(e) = config.validate() {
        error!("Configuración inválida: {}", e);
        std::process::exit(1);
    }
    config.print_summary();

    let manager = Arc::new(demo_services());
    if !manager.start_all() {
        error!("No se pudieron iniciar los servicios");
        std::process::exit(1);
    }

    let services: Arc<dyn ServiceDirectory> = manager.clone();
    let mut server = Server::new(config, Some(services));
    register_custom_routes(&server);

    if let Err(e) = server.initialize().and_then(|_| server.start()) {
        error!("Error fatal: {}", e);
        std::process::exit(1);
    }

    info!("Escuchando en http://localhost:{}", server.port());
    for endpoint in server.router().endpoints() {
        info!("  {}", endpoint);
    }

    let (tx, rx) = mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = tx.send(());
    }) {
        error!("No se pudo instalar el handler de Ctrl-C: {}", e);
    }
    info!("Ctrl-C para detener el servidor");

    if server.wait_for_shutdown(&rx) {
        info!("Ctrl-C recibido, deteniendo...");
    }

    server.stop();
    manager.stop_all();
    info!("Apagado completo");
}

/// Servicios de la demo
fn demo_services() -> ServiceManager {
    let manager = ServiceManager::new();
    manager.add_service("logger", Arc::new(BasicService::new("LoggingService")));
    manager.add_service("primary_db", Arc::new(BasicService::new("DatabaseService")));
    manager.add_service("secondary_db", Arc::new(BasicService::new("DatabaseService")));
    manager.add_service("redis_cache", Arc::new(BasicService::new("CacheService")));
    manager
}

fn register_custom_routes(server: &Server) {
    server.add_route("GET", "/api/custom/hello", |_req: &Request| {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let body = json!({
            "message": "Hello from custom endpoint!",
            "timestamp": timestamp.to_string(),
        });
        Response::json(&body.to_string())
    });

    server.add_route("POST", "/api/custom/echo", |req: &Request| {
        let body = json!({
            "echo": req.body(),
            "method": req.method(),
        });
        Response::json(&body.to_string())
    });
}
