// tests/integration_test.rs
// Tests de integración: levantan un Server real en 127.0.0.1 con puerto
// efímero y le hablan por TCP.

use rest_api_server::client::send_request;
use rest_api_server::config::Config;
use rest_api_server::http::{Request, Response};
use rest_api_server::server::{Server, ServerState};
use rest_api_server::services::{BasicService, ServiceDirectory, ServiceManager};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        workers: 4,
        read_timeout_ms: 2000,
        ..Config::default()
    }
}

fn demo_manager() -> Arc<ServiceManager> {
    let manager = Arc::new(ServiceManager::new());
    manager.add_service("cache1", Arc::new(BasicService::new("CacheService")));
    manager.add_service("logger", Arc::new(BasicService::new("LoggingService")));
    assert!(manager.start_all());
    manager
}

fn start_server(manager: Option<Arc<ServiceManager>>) -> Server {
    let services = manager.map(|m| m as Arc<dyn ServiceDirectory>);
    let mut server = Server::new(test_config(), services);

    server.add_route("POST", "/echo", |req: &Request| Response::json(req.body()));
    server.add_route("GET", "/users/{id}/posts/{post}", |req: &Request| {
        let body = serde_json::json!({
            "id": req.path_param("id"),
            "post": req.path_param("post"),
            "q": req.query_param("q"),
        });
        Response::json(&body.to_string())
    });
    server.add_route("GET", "/panic", |_req: &Request| -> Response {
        panic!("handler roto");
    });

    server.initialize().unwrap();
    server.start().unwrap();
    server
}

fn addr(server: &Server) -> (&'static str, u16) {
    ("127.0.0.1", server.port())
}

#[test]
fn test_service_info() {
    let server = start_server(Some(demo_manager()));

    let response = send_request(addr(&server), "GET", "/api/services/cache1", "").unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Type"), Some("application/json"));

    let body = response.json().unwrap();
    assert_eq!(body["name"], "cache1");
    assert_eq!(body["type"], "CacheService");
    assert_eq!(body["running"], true);
}

#[test]
fn test_list_services() {
    let server = start_server(Some(demo_manager()));

    let response = send_request(addr(&server), "GET", "/api/services", "").unwrap();
    assert_eq!(response.status, 200);

    let body = response.json().unwrap();
    let names: Vec<&str> = body["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["cache1", "logger"]);
}

#[test]
fn test_health_of_unknown_service_is_404() {
    let server = start_server(Some(demo_manager()));

    let response = send_request(addr(&server), "GET", "/api/health/ghost", "").unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.json().unwrap()["error"], "Service not found");
}

#[test]
fn test_stop_then_start_service() {
    let server = start_server(Some(demo_manager()));

    let response = send_request(addr(&server), "POST", "/api/services/logger/stop", "").unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap(), serde_json::json!({ "stopped": true }));

    let response = send_request(addr(&server), "GET", "/api/services/logger", "").unwrap();
    assert_eq!(response.json().unwrap()["running"], false);

    let response = send_request(addr(&server), "GET", "/api/health/logger", "").unwrap();
    assert_eq!(response.status, 503);

    let response = send_request(addr(&server), "POST", "/api/services/logger/start", "").unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap()["started"], true);

    let response = send_request(addr(&server), "GET", "/api/services/logger", "").unwrap();
    assert_eq!(response.json().unwrap()["running"], true);
}

#[test]
fn test_status_reports_bound_port() {
    let server = start_server(None);

    let response = send_request(addr(&server), "GET", "/api/status", "").unwrap();
    assert_eq!(response.status, 200);

    let body = response.json().unwrap();
    assert_eq!(body["port"], server.port());
    assert_eq!(body["status"], "running");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "GET /api/status"));
}

#[test]
fn test_method_not_allowed_and_not_found() {
    let server = start_server(Some(demo_manager()));

    let response = send_request(addr(&server), "POST", "/api/services", "").unwrap();
    assert_eq!(response.status, 405);
    assert_eq!(
        response.json().unwrap()["error"],
        "Method not allowed for this endpoint"
    );

    let response = send_request(addr(&server), "GET", "/api/nonexistent/endpoint", "").unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.json().unwrap()["error"], "Endpoint not found");
}

#[test]
fn test_without_service_manager_is_503() {
    let server = start_server(None);

    let response = send_request(addr(&server), "GET", "/api/services", "").unwrap();
    assert_eq!(response.status, 503);
    assert_eq!(
        response.json().unwrap()["error"],
        "Service manager not available"
    );
}

#[test]
fn test_path_and_query_params() {
    let server = start_server(None);

    let response = send_request(addr(&server), "GET", "/users/7/posts/42?q=hola+mundo", "").unwrap();
    assert_eq!(response.status, 200);

    let body = response.json().unwrap();
    assert_eq!(body["id"], "7");
    assert_eq!(body["post"], "42");
    assert_eq!(body["q"], "hola mundo");
}

#[test]
fn test_echo_body() {
    let server = start_server(None);

    let response = send_request(addr(&server), "POST", "/echo", r#"{"test":"hola"}"#).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"test":"hola"}"#);
    assert_eq!(response.header("Content-Length"), Some("15"));
    assert_eq!(response.header("Connection"), Some("close"));
}

#[test]
fn test_handler_panic_is_500_and_server_survives() {
    let server = start_server(None);

    let response = send_request(addr(&server), "GET", "/panic", "").unwrap();
    assert_eq!(response.status, 500);

    let response = send_request(addr(&server), "GET", "/api/status", "").unwrap();
    assert_eq!(response.status, 200);
}

#[test]
fn test_empty_connection_does_not_break_server() {
    let server = start_server(None);

    drop(TcpStream::connect(addr(&server)).unwrap());

    let response = send_request(addr(&server), "GET", "/api/status", "").unwrap();
    assert_eq!(response.status, 200);
}

#[test]
fn test_concurrent_requests() {
    let server = start_server(Some(demo_manager()));
    let port = server.port();

    let clients: Vec<_> = (0..32)
        .map(|_| {
            thread::spawn(move || {
                send_request(("127.0.0.1", port), "GET", "/api/services/cache1", "")
                    .map(|r| r.status)
            })
        })
        .collect();

    for client in clients {
        assert_eq!(client.join().unwrap().unwrap(), 200);
    }

    // Las métricas se registran después de escribir la response
    for _ in 0..100 {
        if server.metrics().snapshot().total_requests == 32 {
            break;
        }
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(server.metrics().snapshot().total_requests, 32);
}

#[test]
fn test_stop_releases_port_for_fresh_instance() {
    let mut server = start_server(Some(demo_manager()));
    let port = server.port();

    let response = send_request(("127.0.0.1", port), "GET", "/api/status", "").unwrap();
    assert_eq!(response.status, 200);

    server.stop();
    assert_eq!(server.state(), ServerState::Stopped);
    assert!(!server.health());

    let config = Config {
        port,
        ..test_config()
    };
    let mut fresh = Server::new(config, None);
    fresh.initialize().unwrap();
    fresh.start().unwrap();

    let response = send_request(("127.0.0.1", port), "GET", "/api/status", "").unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.json().unwrap()["port"], port);
}

/// Limitación conocida: el servidor hace un solo read por conexión, así que
/// un body que llega en un segmento posterior se pierde.
#[test]
fn test_body_split_across_segments_is_truncated() {
    let server = start_server(None);

    let mut stream = TcpStream::connect(addr(&server)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    stream
        .write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello")
        .unwrap();
    stream.flush().unwrap();

    // El resto del body nunca se manda antes de leer la response
    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();

    let (_, body) = raw.split_once("\r\n\r\n").unwrap();
    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_ne!(body, "helloworld");
    assert!("hello".starts_with(body));
}

/// Corre `f` en otro thread y falla si no termina antes de `limit`
fn within<F>(limit: Duration, f: F)
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        f();
        let _ = tx.send(());
    });

    match rx.recv_timeout(limit) {
        Ok(()) => worker.join().unwrap(),
        Err(mpsc::RecvTimeoutError::Disconnected) => worker.join().unwrap(),
        Err(mpsc::RecvTimeoutError::Timeout) => panic!("no terminó en {:?}: posible deadlock", limit),
    }
}

#[test]
fn test_handler_can_register_routes() {
    let server = start_server(None);
    let port = server.port();

    let router = Arc::downgrade(server.router());
    server.add_route("POST", "/routes", move |_req: &Request| match router.upgrade() {
        Some(router) => {
            router.register("GET", "/dynamic", |_req: &Request| {
                Response::json(r#"{"dynamic":true}"#)
            });
            Response::json(r#"{"registered":true}"#)
        }
        None => Response::json(r#"{"registered":false}"#),
    });

    within(Duration::from_secs(10), move || {
        let response = send_request(("127.0.0.1", port), "POST", "/routes", "").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json().unwrap()["registered"], true);

        let response = send_request(("127.0.0.1", port), "GET", "/dynamic", "").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json().unwrap()["dynamic"], true);
    });
}

#[test]
fn test_register_routes_while_serving() {
    let server = start_server(Some(demo_manager()));
    let port = server.port();
    let router = Arc::clone(server.router());

    within(Duration::from_secs(20), move || {
        let registrar = thread::spawn(move || {
            for i in 0..100 {
                let path = format!("/bulk/{}", i);
                router.register("GET", &path, move |_req: &Request| {
                    Response::json(&format!(r#"{{"route":{}}}"#, i))
                });
            }
        });

        let clients: Vec<_> = (0..8)
            .map(|_| {
                thread::spawn(move || {
                    for _ in 0..10 {
                        let response =
                            send_request(("127.0.0.1", port), "GET", "/api/services/cache1", "")
                                .unwrap();
                        assert_eq!(response.status, 200);
                    }
                })
            })
            .collect();

        registrar.join().unwrap();
        for client in clients {
            client.join().unwrap();
        }

        let response = send_request(("127.0.0.1", port), "GET", "/bulk/99", "").unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.json().unwrap()["route"], 99);
    });
}
