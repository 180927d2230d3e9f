//! # Errores del Servidor
//! src/error.rs
//!
//! Errores de configuración y de arranque del servidor. Los errores que
//! ocurren mientras se atiende una conexión nunca llegan aquí: se loguean y
//! la conexión se cierra.

use std::io;
use thiserror::Error;

/// Errores que puede producir el ciclo de vida del servidor
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuración inválida (workers = 0, buffer = 0, etc.)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No se pudo crear el socket
    #[error("Failed to create socket for port {port}: {source}")]
    Socket {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// No se pudo configurar SO_REUSEADDR
    #[error("Failed to set socket options for port {port}: {source}")]
    SocketOption {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// El bind falló (puerto ocupado, permisos, dirección inválida)
    #[error("Failed to bind to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// El listen falló
    #[error("Failed to listen on port {port}: {source}")]
    Listen {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Se llamó a `start()` sin un `initialize()` exitoso
    #[error("Server is not initialized")]
    NotInitialized,

    /// El servidor ya fue detenido; hay que crear una instancia nueva
    #[error("Server was stopped and cannot be restarted")]
    AlreadyStopped,

    /// No se pudo lanzar un thread (acceptor o worker)
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    /// Puerto asociado al error de setup, si lo hay
    pub fn port(&self) -> Option<u16> {
        match self {
            ServerError::Socket { port, .. }
            | ServerError::SocketOption { port, .. }
            | ServerError::Bind { port, .. }
            | ServerError::Listen { port, .. } => Some(*port),
            _ => None,
        }
    }
}

/// Result con el error del servidor
pub type Result<T> = std::result::Result<T, ServerError>;
