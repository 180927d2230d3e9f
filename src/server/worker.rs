//! # Pool de Workers
//! src/server/worker.rs
//!
//! Número fijo de threads de larga vida. Cada uno repite:
//!
//! ```text
//! esperar conexión o stop → si stop, salir → procesar la conexión completa
//! ```
//!
//! El shutdown cierra la cola (lo que despierta a todos los workers
//! bloqueados) y hace join de cada thread antes de retornar.

use super::queue::ConnectionQueue;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info_span};

/// Pool de workers que consume una `ConnectionQueue`
pub struct WorkerPool<C> {
    queue: Arc<ConnectionQueue<C>>,
    handles: Vec<JoinHandle<()>>,
}

impl<C: Send + 'static> WorkerPool<C> {
    /// Lanza `size` workers que llaman a `process` por cada elemento
    ///
    /// Si algún thread no se puede crear, los ya lanzados se detienen y se
    /// retorna el error.
    pub fn spawn<F>(size: usize, queue: Arc<ConnectionQueue<C>>, process: F) -> io::Result<Self>
    where
        F: Fn(C) + Send + Sync + 'static,
    {
        let process = Arc::new(process);
        let mut pool = Self {
            queue: Arc::clone(&queue),
            handles: Vec::with_capacity(size),
        };

        for id in 0..size {
            let queue = Arc::clone(&queue);
            let process = Arc::clone(&process);

            let handle = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || Self::worker_loop(id, &queue, process.as_ref()));

            match handle {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(e);
                }
            }
        }

        Ok(pool)
    }

    /// Loop principal del worker
    fn worker_loop<F>(id: usize, queue: &ConnectionQueue<C>, process: &F)
    where
        F: Fn(C),
    {
        let span = info_span!("worker", id);
        let _enter = span.enter();
        debug!("worker iniciado");

        while let Some(item) = queue.pop() {
            // Un panic no debe matar al worker; la conexión se cierra al
            // hacer unwind
            if panic::catch_unwind(AssertUnwindSafe(|| process(item))).is_err() {
                error!("panic procesando una conexión");
            }
        }

        debug!("worker terminado");
    }

    /// Número de workers vivos (aún no unidos)
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Cierra la cola y espera a todos los workers
    ///
    /// Retorna las conexiones que quedaron sin atender. Es idempotente.
    pub fn shutdown(&mut self) -> Vec<C> {
        let pending = self.queue.close();

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("un worker terminó con panic");
            }
        }

        pending
    }
}

impl<C> Drop for WorkerPool<C> {
    fn drop(&mut self) {
        drop(self.queue.close());
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
