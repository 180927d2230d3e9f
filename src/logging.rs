//! # Logging
//! src/logging.rs
//!
//! Inicialización de `tracing`. `RUST_LOG` tiene prioridad sobre el nivel
//! configurado por CLI.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Instala el subscriber `fmt` con filtro por nivel
///
/// Retorna error si ya había un subscriber global instalado.
pub fn init_tracing(level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| e.to_string())?;

    info!("Tracing inicializado con nivel: {}", level);
    Ok(())
}
