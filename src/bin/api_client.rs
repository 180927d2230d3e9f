//! # Cliente de prueba
//! src/bin/api_client.rs
//!
//! Manda una request al servidor y muestra la response.
//!
//! ```bash
//! api_client GET /api/services
//! api_client POST /api/custom/echo --body '{"test": "hola"}'
//! api_client --demo
//! ```

use clap::Parser;
use rest_api_server::client::send_request;

/// Cliente HTTP para la API de servicios
#[derive(Debug, Parser)]
#[command(name = "api_client")]
#[command(about = "Cliente de prueba para el servidor REST")]
struct Args {
    /// Método HTTP
    #[arg(default_value = "GET")]
    method: String,

    /// Path del endpoint
    #[arg(default_value = "/api/status")]
    path: String,

    /// Body de la request
    #[arg(short, long, default_value = "")]
    body: String,

    /// Host del servidor
    #[arg(long, default_value = "127.0.0.1", env = "API_HOST")]
    host: String,

    /// Puerto del servidor
    #[arg(short, long, default_value = "8080", env = "API_PORT")]
    port: u16,

    /// Recorre todos los endpoints de la demo
    #[arg(long)]
    demo: bool,
}

/// Secuencia de la demo: lecturas, control de servicios y casos de error
const DEMO_REQUESTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/status", ""),
    ("GET", "/api/services", ""),
    ("GET", "/api/services/logger", ""),
    ("GET", "/api/services/primary_db", ""),
    ("GET", "/api/health/logger", ""),
    ("GET", "/api/custom/hello", ""),
    ("POST", "/api/custom/echo", r#"{"test": "Hello from test client!"}"#),
    ("POST", "/api/services/logger/stop", ""),
    ("GET", "/api/services/logger", ""),
    ("POST", "/api/services/logger/start", ""),
    ("GET", "/api/services/logger", ""),
    ("GET", "/api/services/nonexistent", ""),
    ("GET", "/api/nonexistent/endpoint", ""),
    ("POST", "/api/services", ""),
];

fn main() {
    let args = Args::parse();
    let addr = (args.host.as_str(), args.port);

    if args.demo {
        for (method, path, body) in DEMO_REQUESTS {
            run(addr, method, path, body);
        }
        return;
    }

    run(addr, &args.method, &args.path, &args.body);
}

fn run(addr: (&str, u16), method: &str, path: &str, body: &str) {
    println!("\n--- {} {} ---", method, path);

    match send_request(addr, method, path, body) {
        Ok(response) => {
            println!("{} {}", response.status, response.reason);
            println!("{}", response.body);
        }
        Err(e) => eprintln!("Request falló: {}", e),
    }
}
