//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor REST con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./rest_api_server --port 8080 --workers 10 --read-timeout 30000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! API_PORT=8080 API_HOST=127.0.0.1 API_WORKERS=4 ./rest_api_server
//! ```

use clap::Parser;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor REST
#[derive(Debug, Clone, Parser)]
#[command(name = "rest_api_server")]
#[command(about = "Servidor HTTP embebido con router REST y pool de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = puerto efímero)
    #[arg(short, long, default_value = "8080", env = "API_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "API_HOST")]
    pub host: String,

    /// Número fijo de workers que atienden conexiones
    #[arg(long, default_value = "10", env = "API_WORKERS")]
    pub workers: usize,

    /// Timeout de lectura por conexión en milisegundos
    #[arg(long = "read-timeout", default_value = "30000", env = "API_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Tamaño del buffer de lectura (un solo read por conexión)
    #[arg(long = "buffer-size", default_value = "4096", env = "API_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Backlog del listen()
    #[arg(long, default_value = "10", env = "API_BACKLOG")]
    pub backlog: i32,

    /// Nivel de log (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "API_LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use rest_api_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de lectura como `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.buffer_size == 0 {
            return Err("Buffer size must be >= 1".to_string());
        }
        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be > 0".to_string());
        }
        if self.backlog <= 0 {
            return Err("Backlog must be > 0".to_string());
        }

        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn print_summary(&self) {
        info!(
            address = %self.address(),
            workers = self.workers,
            read_timeout_ms = self.read_timeout_ms,
            buffer_size = self.buffer_size,
            backlog = self.backlog,
            "configuración del servidor"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            workers: 10,
            read_timeout_ms: 30_000,
            buffer_size: 4096,
            backlog: 10,
            log_level: "info".to_string(),
        }
    }
}
