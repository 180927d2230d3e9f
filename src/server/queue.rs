//! # Cola de Conexiones
//! src/server/queue.rs
//!
//! Buffer compartido entre el acceptor y los workers, protegido por un
//! `Mutex` más un `Condvar`.
//!
//! ## Disciplina
//!
//! LIFO (pila): la conexión aceptada más recientemente se atiende primero.
//! Bajo carga esto favorece latencia de las conexiones nuevas a costa de
//! las viejas, que pueden esperar hasta su timeout.
//!
//! La cola no tiene límite ni backpressure.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct QueueState<C> {
    items: Vec<C>,
    stopped: bool,
}

/// Cola de conexiones pendientes, thread-safe
pub struct ConnectionQueue<C> {
    state: Mutex<QueueState<C>>,
    condvar: Condvar,
}

impl<C> ConnectionQueue<C> {
    /// Crea una cola vacía y abierta
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: Vec::new(),
                stopped: false,
            }),
            condvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola una conexión y despierta a un worker
    ///
    /// Si la cola ya fue cerrada la conexión se devuelve al llamador.
    pub fn push(&self, item: C) -> Result<(), C> {
        {
            let mut state = self.lock();
            if state.stopped {
                return Err(item);
            }
            state.items.push(item);
        }

        // Notificar a un worker esperando
        self.condvar.notify_one();
        Ok(())
    }

    /// Desencola la conexión más reciente
    ///
    /// Bloquea hasta que haya una conexión o la cola se cierre. Retorna
    /// `None` en cuanto la cola está cerrada, aunque queden elementos.
    pub fn pop(&self) -> Option<C> {
        let state = self.lock();
        let mut state = self
            .condvar
            .wait_while(state, |s| s.items.is_empty() && !s.stopped)
            .unwrap_or_else(PoisonError::into_inner);

        if state.stopped {
            return None;
        }
        state.items.pop()
    }

    /// Cierra la cola y despierta a todos los workers
    ///
    /// Las conexiones pendientes se devuelven para que el llamador las
    /// cierre.
    pub fn close(&self) -> Vec<C> {
        let pending = {
            let mut state = self.lock();
            state.stopped = true;
            std::mem::take(&mut state.items)
        };

        self.condvar.notify_all();
        pending
    }

    /// Indica si la cola fue cerrada
    pub fn is_closed(&self) -> bool {
        self.lock().stopped
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> Default for ConnectionQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}
