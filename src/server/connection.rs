//! # Atención de una Conexión
//! src/server/connection.rs
//!
//! Un worker procesa cada conexión de punta a punta:
//!
//! ```text
//! read (una sola vez) → parse → route → serialize → write → close
//! ```
//!
//! El `TcpStream` se mueve dentro de `handle` y se cierra al salir de la
//! función, en cualquier camino (éxito, lectura vacía, timeout, error de
//! escritura o panic).
//!
//! Limitación conocida: se hace un único `read` de a lo sumo `buffer_size`
//! bytes y no se respeta `Content-Length`. Un body que llega en varios
//! segmentos TCP o que no entra en el buffer queda truncado.

use crate::http::{Request, Response};
use crate::metrics::MetricsCollector;
use crate::router::Router;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lo que necesita un worker para atender conexiones
#[derive(Clone)]
pub struct ConnectionHandler {
    router: Arc<Router>,
    metrics: MetricsCollector,
    buffer_size: usize,
    read_timeout: Duration,
}

impl ConnectionHandler {
    pub fn new(
        router: Arc<Router>,
        metrics: MetricsCollector,
        buffer_size: usize,
        read_timeout: Duration,
    ) -> Self {
        Self {
            router,
            metrics,
            buffer_size,
            read_timeout,
        }
    }

    /// Atiende una conexión y la cierra
    pub fn handle(&self, stream: TcpStream) {
        let _busy = BusyGuard::new(&self.metrics);
        if let Err(e) = self.serve(stream) {
            warn!("error atendiendo conexión: {}", e);
        }
    }

    fn serve(&self, mut stream: TcpStream) -> io::Result<()> {
        let start = Instant::now();
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        if let Err(e) = stream.set_read_timeout(Some(self.read_timeout)) {
            warn!(%peer, "no se pudo configurar el timeout de lectura: {}", e);
        }

        let mut buffer = vec![0u8; self.buffer_size];
        let bytes_read = match stream.read(&mut buffer) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                debug!(%peer, "timeout de lectura, conexión abandonada");
                self.metrics.record_dropped();
                return Ok(());
            }
            Err(e) => {
                self.metrics.record_dropped();
                return Err(e);
            }
        };

        let Some(request) = Request::parse(&buffer[..bytes_read]) else {
            debug!(%peer, "conexión cerrada sin datos");
            self.metrics.record_dropped();
            return Ok(());
        };

        debug!(%peer, bytes = bytes_read, "{} {}", request.method(), request.path());

        let response = self.router.route(&request);
        self.respond(&mut stream, &response, start)?;

        info!(
            %peer,
            status = response.status(),
            latency_ms = start.elapsed().as_secs_f64() * 1000.0,
            "{} {}",
            request.method(),
            request.path()
        );
        Ok(())
    }

    /// Escribe la response y la registra en las métricas
    ///
    /// Si la escritura falla la conexión cuenta como abandonada, no como
    /// request respondido.
    fn respond<W: Write>(
        &self,
        writer: &mut W,
        response: &Response,
        start: Instant,
    ) -> io::Result<()> {
        let result = writer
            .write_all(&response.to_bytes())
            .and_then(|_| writer.flush());

        match result {
            Ok(()) => {
                self.metrics.record_request(response.status(), start.elapsed());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_dropped();
                Err(e)
            }
        }
    }
}

/// Marca al worker como ocupado mientras vive
///
/// El `Drop` libera el contador aunque la atención termine en panic.
struct BusyGuard<'a> {
    metrics: &'a MetricsCollector,
}

impl<'a> BusyGuard<'a> {
    fn new(metrics: &'a MetricsCollector) -> Self {
        metrics.worker_busy();
        Self { metrics }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.metrics.worker_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Shutdown, TcpListener};
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    /// Writer cuyo peer ya cerró la conexión
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn handler_with_echo() -> ConnectionHandler {
        let router = Arc::new(Router::new());
        router.register("POST", "/echo", |req: &Request| Response::json(req.body()));
        router.register("GET", "/hello", |_req: &Request| Response::json(r#"{"hello": true}"#));

        ConnectionHandler::new(router, MetricsCollector::new(), 4096, Duration::from_millis(500))
    }

    /// Acepta una conexión, la atiende y retorna lo que recibió el cliente
    fn roundtrip(handler: ConnectionHandler, raw: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler.handle(stream);
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();

        String::from_utf8_lossy(&buf).to_string()
    }

    #[test]
    fn test_handle_connection_ok() {
        let text = roundtrip(handler_with_echo(), b"GET /hello HTTP/1.1\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with(r#"{"hello": true}"#));
    }

    #[test]
    fn test_handle_connection_echo_body() {
        let text = roundtrip(
            handler_with_echo(),
            b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
        );

        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_handle_connection_garbage_still_responds() {
        let text = roundtrip(handler_with_echo(), b"\x00\x01\x02\x03garbage");

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn test_peer_closed_immediately() {
        let handler = handler_with_echo();
        let metrics = handler.metrics.clone();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler.handle(stream);
        });

        // Conecta y cierra sin mandar nada: read retorna 0
        drop(TcpStream::connect(addr).unwrap());
        server.join().unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dropped_connections, 1);
        assert_eq!(snapshot.total_requests, 0);
    }

    #[test]
    fn test_read_timeout_closes_without_response() {
        let router = Arc::new(Router::new());
        let handler = ConnectionHandler::new(router, MetricsCollector::new(), 1024, Duration::from_millis(100));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler.handle(stream);
        });

        // El cliente no escribe nada y espera
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();

        assert!(buf.is_empty());
    }

    #[test]
    fn test_failed_write_counts_as_dropped() {
        let handler = handler_with_echo();
        let response = Response::json(r#"{"ok": true}"#);

        let result = handler.respond(&mut BrokenPipe, &response, Instant::now());
        assert!(result.is_err());

        let snapshot = handler.metrics.snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.dropped_connections, 1);
    }

    #[test]
    fn test_successful_write_counts_as_request() {
        let handler = handler_with_echo();
        let response = Response::json(r#"{"ok": true}"#);
        let mut out = Vec::new();

        handler.respond(&mut out, &response, Instant::now()).unwrap();

        assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
        let snapshot = handler.metrics.snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.dropped_connections, 0);
    }

    #[test]
    fn test_busy_guard_released_on_panic() {
        let metrics = MetricsCollector::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _busy = BusyGuard::new(&metrics);
            assert_eq!(metrics.snapshot().busy_workers, 1);
            panic!("falla atendiendo la conexión");
        }));

        assert!(result.is_err());
        assert_eq!(metrics.snapshot().busy_workers, 0);
    }
}
