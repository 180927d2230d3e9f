//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! ```text
//! acceptor ──push──→ ConnectionQueue ──pop──→ worker-0..N
//!                                              │
//!                                   read → parse → route → write → close
//! ```
//!
//! - `tcp`: ciclo de vida del servidor y thread acceptor
//! - `queue`: cola de conexiones pendientes (Mutex + Condvar)
//! - `worker`: pool fijo de workers
//! - `connection`: atención de una conexión individual

pub mod connection;
pub mod queue;
pub mod tcp;
pub mod worker;

pub use connection::ConnectionHandler;
pub use queue::ConnectionQueue;
pub use tcp::{Server, ServerState};
pub use worker::WorkerPool;
