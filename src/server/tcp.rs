//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Ciclo de vida del servidor:
//!
//! ```text
//! Created ──initialize()──→ Initialized ──start()──→ Running
//!    │                          │                       │
//!    └──────────────stop()──────┴───────────stop()──────┴──→ Stopped
//! ```
//!
//! - `initialize()` crea el socket (SO_REUSEADDR), hace bind y listen y
//!   lanza el pool de workers.
//! - `start()` lanza el thread acceptor, que encola cada conexión aceptada.
//! - `stop()` baja el flag, cierra el listener (lo que desbloquea el
//!   `accept`), hace join del acceptor y luego de todos los workers.
//!
//! Un servidor detenido no se puede reiniciar: hay que crear otra instancia.

use super::connection::ConnectionHandler;
use super::queue::ConnectionQueue;
use super::worker::WorkerPool;
use crate::api::{self, ApiState};
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::http::{Request, Response};
use crate::metrics::MetricsCollector;
use crate::router::Router;
use crate::services::ServiceDirectory;
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::io;
use std::net::{
    IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs,
};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pausa tras un error de accept para no girar en vacío (p.ej. EMFILE)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Timeout de la conexión que despierta al acceptor durante `stop()`
const WAKE_TIMEOUT: Duration = Duration::from_millis(200);

/// Cada cuánto se revisa el estado mientras se espera la señal de apagado
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Estado del ciclo de vida
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Initialized,
    Running,
    Stopped,
}

/// Servidor HTTP embebido con pool de workers
pub struct Server {
    config: Config,
    state: ServerState,
    /// Puerto efectivo (el real si se configuró 0); lo lee /api/status
    port: Arc<AtomicU16>,
    running: Arc<AtomicBool>,
    router: Arc<Router>,
    metrics: MetricsCollector,
    queue: Arc<ConnectionQueue<TcpStream>>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    workers: Option<WorkerPool<TcpStream>>,
    acceptor: Option<JoinHandle<()>>,
}

impl Server {
    /// Crea un servidor con los endpoints integrados ya registrados
    ///
    /// `services` es el directorio que consultan los handlers de `/api`;
    /// sin él esos handlers responden 503.
    pub fn new(config: Config, services: Option<Arc<dyn ServiceDirectory>>) -> Self {
        let port = Arc::new(AtomicU16::new(config.port));
        let router = Arc::new(Router::new());
        let metrics = MetricsCollector::new();

        api::register_builtin_routes(
            &router,
            ApiState::new(services, Arc::clone(&port), metrics.clone()),
        );

        Self {
            config,
            state: ServerState::Created,
            port,
            running: Arc::new(AtomicBool::new(false)),
            router,
            metrics,
            queue: Arc::new(ConnectionQueue::new()),
            listener: None,
            local_addr: None,
            workers: None,
            acceptor: None,
        }
    }

    /// Crea el socket de escucha y lanza los workers
    ///
    /// Llamarlo de nuevo sobre un servidor ya inicializado no hace nada.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            ServerState::Initialized | ServerState::Running => return Ok(()),
            ServerState::Stopped => return Err(ServerError::AlreadyStopped),
            ServerState::Created => {}
        }

        self.config.validate().map_err(ServerError::InvalidConfig)?;

        let listener = Self::bind_listener(&self.config)?;
        let local_addr = listener.local_addr()?;
        self.port.store(local_addr.port(), Ordering::SeqCst);

        let handler = ConnectionHandler::new(
            Arc::clone(&self.router),
            self.metrics.clone(),
            self.config.buffer_size,
            self.config.read_timeout(),
        );
        let workers = WorkerPool::spawn(self.config.workers, Arc::clone(&self.queue), move |stream| {
            handler.handle(stream)
        })
        .map_err(ServerError::Spawn)?;

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        self.workers = Some(workers);
        self.state = ServerState::Initialized;

        info!(
            address = %local_addr,
            workers = self.config.workers,
            "servidor inicializado"
        );
        Ok(())
    }

    /// socket → SO_REUSEADDR → bind → listen
    fn bind_listener(config: &Config) -> Result<TcpListener> {
        let port = config.port;

        let addr = (config.host.as_str(), port)
            .to_socket_addrs()
            .and_then(|mut addrs| {
                addrs.next().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::AddrNotAvailable, "host did not resolve")
                })
            })
            .map_err(|source| ServerError::Bind { port, source })?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(|source| ServerError::Socket { port, source })?;

        socket
            .set_reuse_address(true)
            .map_err(|source| ServerError::SocketOption { port, source })?;

        socket
            .bind(&addr.into())
            .map_err(|source| ServerError::Bind { port, source })?;

        socket
            .listen(config.backlog)
            .map_err(|source| ServerError::Listen { port, source })?;

        Ok(socket.into())
    }

    /// Empieza a aceptar conexiones en un thread dedicado
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            ServerState::Running => return Ok(()),
            ServerState::Created => return Err(ServerError::NotInitialized),
            ServerState::Stopped => return Err(ServerError::AlreadyStopped),
            ServerState::Initialized => {}
        }

        let listener = self
            .listener
            .as_ref()
            .ok_or(ServerError::NotInitialized)?
            .try_clone()?;

        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let queue = Arc::clone(&self.queue);
        let metrics = self.metrics.clone();

        let acceptor = thread::Builder::new()
            .name("acceptor".to_string())
            .spawn(move || accept_loop(&listener, &running, &queue, &metrics));

        match acceptor {
            Ok(handle) => self.acceptor = Some(handle),
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(ServerError::Spawn(e));
            }
        }

        self.state = ServerState::Running;

        info!(port = self.port(), "servidor REST escuchando");
        for endpoint in self.router.endpoints() {
            debug!("  {}", endpoint);
        }
        Ok(())
    }

    /// Detiene el servidor y libera el puerto
    ///
    /// Idempotente. Al retornar no queda ningún thread del servidor vivo.
    pub fn stop(&mut self) {
        if matches!(self.state, ServerState::Created | ServerState::Stopped) {
            return;
        }

        info!("deteniendo servidor");
        self.running.store(false, Ordering::SeqCst);

        if let Some(listener) = self.listener.take() {
            if let Err(e) = SockRef::from(&listener).shutdown(Shutdown::Both) {
                debug!("shutdown del listener: {}", e);
            }

            if let Some(acceptor) = self.acceptor.take() {
                // Por si el shutdown no desbloqueó el accept en esta plataforma
                if let Some(addr) = self.local_addr {
                    wake_acceptor(addr);
                }
                if acceptor.join().is_err() {
                    error!("el acceptor terminó con panic");
                }
            }
        }

        if let Some(mut workers) = self.workers.take() {
            let pending = workers.shutdown();
            if !pending.is_empty() {
                warn!(pending = pending.len(), "conexiones cerradas sin atender");
                for _ in &pending {
                    self.metrics.record_dropped();
                }
            }
        }

        self.state = ServerState::Stopped;
        info!("servidor detenido");
    }

    /// Bloquea mientras el servidor corre, hasta recibir una señal de apagado
    ///
    /// Retorna `true` si llegó la señal y `false` si el servidor dejó de
    /// correr por otro motivo. No detiene el servidor: eso queda para
    /// `stop()`.
    pub fn wait_for_shutdown(&self, shutdown: &Receiver<()>) -> bool {
        while self.is_running() {
            match shutdown.recv_timeout(SHUTDOWN_POLL) {
                Ok(()) => return true,
                Err(RecvTimeoutError::Timeout) => {}
                // Nadie puede mandar la señal; solo queda esperar
                Err(RecvTimeoutError::Disconnected) => thread::sleep(SHUTDOWN_POLL),
            }
        }
        false
    }

    /// Cambia el puerto configurado
    ///
    /// Solo tiene efecto antes de `initialize()`; retorna si se aplicó.
    pub fn set_port(&mut self, port: u16) -> bool {
        if self.state != ServerState::Created {
            warn!(port, state = ?self.state, "set_port ignorado: el socket ya fue creado");
            return false;
        }
        self.config.port = port;
        self.port.store(port, Ordering::SeqCst);
        true
    }

    /// Registra una ruta adicional (o reemplaza una integrada)
    pub fn add_route<F>(&self, method: &str, pattern: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.router.register(method, pattern, handler);
    }

    /// Puerto efectivo
    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    /// Dirección local del socket de escucha, si existe
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running && self.running.load(Ordering::SeqCst)
    }

    /// Inicializado, corriendo y con el socket abierto
    pub fn health(&self) -> bool {
        self.is_running() && self.listener.is_some()
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Loop del thread acceptor
///
/// Corre mientras `running` esté en true. Los errores de accept después
/// del stop son esperables y no se loguean como fallas.
fn accept_loop(
    listener: &TcpListener,
    running: &AtomicBool,
    queue: &ConnectionQueue<TcpStream>,
    metrics: &MetricsCollector,
) {
    debug!("acceptor iniciado");

    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                debug!(%peer, "conexión aceptada");

                if queue.push(stream).is_err() {
                    metrics.record_dropped();
                    break;
                }
            }
            Err(e) => {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                warn!("error en accept: {}", e);
                thread::sleep(ACCEPT_ERROR_BACKOFF);
            }
        }
    }

    debug!("acceptor terminado");
}

/// Abre y cierra una conexión contra el listener para sacar al acceptor
/// del `accept` bloqueante
fn wake_acceptor(addr: SocketAddr) {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };

    // Si el listener ya está cerrado la conexión es rechazada; está bien
    let _ = TcpStream::connect_timeout(&SocketAddr::new(ip, addr.port()), WAKE_TIMEOUT);
}
