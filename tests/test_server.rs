//! End-to-end tests over real TCP sockets.

use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use tinyhttp::config::Config;
use tinyhttp::http::response::{Response, ResponseBuilder, StatusCode};
use tinyhttp::server::{Server, listener};

/// Binds an ephemeral port and runs `server` on a background thread.
fn start(server: Server) -> SocketAddr {
    let listener = listener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)), 16).unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || server.serve(listener));
    addr
}

/// Sends `raw` and returns everything the server wrote before closing.
fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    response
}

fn send_str(addr: SocketAddr, raw: &str) -> String {
    String::from_utf8(send(addr, raw.as_bytes())).unwrap()
}

fn sensor_server() -> Server {
    let mut server = Server::new();
    server.add_handler("/data", |req| {
        let from = req.query_param("from").unwrap_or("0");
        let to = req.query_param("to").unwrap_or("0");
        Some(
            ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "application/json")
                .body(format!(r#"{{"from":{from},"to":{to}}}"#))
                .build(),
        )
    });
    server.add_handler("/upload", |req| {
        Some(Response::ok(format!("received {} bytes", req.body.len())))
    });
    server.add_handler("/fail", |_req| None);
    server
}

#[test]
fn test_routed_request_gets_handler_response() {
    let addr = start(sensor_server());

    let response = send_str(addr, "GET /data?from=100&to=200 HTTP/1.1\r\nHost: localhost\r\n\r\n");

    assert_eq!(
        response,
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"from\":100,\"to\":200}"
    );
}

#[test]
fn test_post_body_reaches_handler() {
    let addr = start(sensor_server());

    let response = send_str(addr, "POST /upload HTTP/1.1\r\nHost: localhost\r\n\r\n12345");

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("received 5 bytes"));
}

#[test]
fn test_unknown_path_gets_404() {
    let addr = start(sensor_server());

    let response = send_str(addr, "GET /nowhere HTTP/1.1\r\n\r\n");

    assert_eq!(response, "HTTP/1.1 404 Not Found\r\n\r\nNot Found");
}

#[test]
fn test_failed_handler_gets_500() {
    let addr = start(sensor_server());

    let response = send_str(addr, "GET /fail HTTP/1.1\r\n\r\n");

    assert_eq!(
        response,
        "HTTP/1.1 500 Internal Server Error\r\n\r\nInternal Server Error"
    );
}

#[test]
fn test_malformed_requests_get_zero_bytes() {
    let addr = start(sensor_server());

    for raw in [
        "PUT /data HTTP/1.1\r\n\r\n",
        "GET /data HTTP/1.0\r\n\r\n",
        "GET\r\n\r\n",
    ] {
        let response = send(addr, raw.as_bytes());
        assert!(response.is_empty(), "got a response for {raw:?}");
    }
}

#[test]
fn test_empty_and_non_utf8_header_values_are_served() {
    let addr = start(sensor_server());

    let response = send(addr, b"GET /data HTTP/1.1\r\nHost: x\r\nX-Trace: \r\n\r\n");
    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));

    let response = send(addr, b"GET /data HTTP/1.1\r\nX-Name: caf\xe9\r\n\r\n");
    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));

    let response = send(addr, b"GET /\xff HTTP/1.1\r\n\r\n");
    assert_eq!(response, b"HTTP/1.1 404 Not Found\r\n\r\nNot Found");
}

#[test]
fn test_server_survives_bad_connections() {
    let addr = start(sensor_server());

    // A client that connects and leaves without sending anything.
    drop(TcpStream::connect(addr).unwrap());
    assert!(send(addr, b"BREW /pot HTTP/1.1\r\n\r\n").is_empty());

    let response = send_str(addr, "GET /data HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[test]
fn test_concurrent_connections_get_their_own_responses() {
    const N: usize = 16;

    let mut server = Server::new();
    for i in 0..N {
        server.add_handler(format!("/route/{i}"), move |req| {
            // Hold the connection a moment so requests overlap.
            thread::sleep(Duration::from_millis(20));
            Some(Response::ok(format!("route {i} body {}", req.body_str().unwrap_or(""))))
        });
    }
    let addr = start(server);

    let clients: Vec<_> = (0..N)
        .map(|i| {
            thread::spawn(move || {
                let raw = format!("POST /route/{i} HTTP/1.1\r\n\r\npayload-{i}");
                (i, send_str(addr, &raw))
            })
        })
        .collect();

    for client in clients {
        let (i, response) = client.join().unwrap();
        assert_eq!(
            response,
            format!("HTTP/1.1 200 OK\r\n\r\nroute {i} body payload-{i}")
        );
    }
}

#[test]
fn test_server_with_config_uses_head_limit() {
    let mut cfg = Config::default();
    cfg.limits.max_response_head_size = 64;

    let mut server = Server::with_config(cfg);
    server.add_handler("/big", |_req| {
        Some(
            ResponseBuilder::new(StatusCode::Ok)
                .header("X-Padding", "p".repeat(128))
                .body("never sent")
                .build(),
        )
    });
    let addr = start(server);

    let response = send_str(addr, "GET /big HTTP/1.1\r\n\r\n");
    assert_eq!(
        response,
        "HTTP/1.1 500 Internal Server Error\r\n\r\nInternal Server Error"
    );
}

#[test]
fn test_run_rejects_bad_address() {
    let err = Server::new().run("not-an-ip", 0).unwrap_err();
    assert!(err.to_string().contains("invalid bind address"));
}

#[test]
fn test_run_fails_when_port_is_taken() {
    // SO_REUSEADDR does not allow two listeners on one port.
    let taken = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = taken.local_addr().unwrap().port();

    assert!(Server::new().run("127.0.0.1", port).is_err());
}
