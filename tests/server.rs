use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use indoc::indoc;
use plain_http::{Method, Request, Response, Router, Server, ServerConfig, StatusCode};

const BAD_REQUEST: &str = "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

fn config(request_limit: usize) -> ServerConfig {
    ServerConfig {
        port: 0,
        workers: 4,
        request_limit,
        ..Default::default()
    }
}

fn start(config: ServerConfig, router: Router) -> (SocketAddr, Arc<Router>) {
    let server = Server::bind(&config, router).unwrap();
    let addr = server.local_addr().unwrap();
    let router = server.router();
    thread::spawn(move || server.listen());
    (addr, router)
}

fn send(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn text(body: String) -> impl Fn(&Request, &mut dyn Write) -> io::Result<()> + Send + Sync + 'static {
    move |_: &Request, out: &mut dyn Write| {
        let mut response = Response::new(StatusCode::OK);
        response.set_content_type("text/plain");
        response.set_body(body.clone().into_bytes());
        response.write_to(out)
    }
}

fn echo(request: &Request, out: &mut dyn Write) -> io::Result<()> {
    let mut lines = vec![format!("{} {}", request.method, request.path)];
    let mut query: Vec<_> = request.query_params.iter().collect();
    query.sort();
    for (key, value) in query {
        lines.push(format!("query {key}={value}"));
    }
    for (name, values) in request.body_parts.iter() {
        lines.push(format!("part {name}={}", values.join("|")));
    }

    let mut response = Response::new(StatusCode::OK);
    response.set_content_type("text/plain");
    response.set_body(lines.join("\n").into_bytes());
    response.write_to(out)
}

#[test]
fn registered_get_with_query() {
    let router = Router::new();
    router.add_handler(Method::Get, "/echo", echo);
    let (addr, _) = start(config(4096), router);

    let response = send(addr, b"GET /echo?k=a&k=b&x=1 HTTP/1.1\r\nHost: test\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert!(response.ends_with("GET /echo\nquery k=b\nquery x=1"));
}

#[test]
fn multipart_post_round_trip() {
    let router = Router::new();
    router.add_handler(Method::Post, "/upload", echo);
    let (addr, _) = start(config(4096), router);

    let body = indoc! {r#"
        --zz
        Content-Disposition: form-data; name="x"

        hello
        --zz
        Content-Disposition: form-data; name="f"; filename="t.txt"
        Content-Type: text/plain

        contents
        --zz--
    "#}
    .replace('\n', "\r\n");
    let raw = format!(
        "POST /upload HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=zz\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );

    let response = send(addr, raw.as_bytes());
    assert!(response.contains("part x=hello"));
    assert!(response.contains("part f=FILE: t.txt text/plain => contents"));
}

#[test]
fn unsupported_method_is_bad_request() {
    let (addr, _) = start(config(4096), Router::new());
    assert_eq!(send(addr, b"PATCH /x HTTP/1.1\r\n\r\n"), BAD_REQUEST);
}

#[test]
fn malformed_request_lines_are_bad_requests() {
    let (addr, _) = start(config(4096), Router::new());
    for raw in [
        &b"GET /only-two\r\n\r\n"[..],
        b"GET relative HTTP/1.1\r\n\r\n",
        b"GET / HTTP/1.1\r\nHost: never-terminated\r\n",
    ] {
        assert_eq!(send(addr, raw), BAD_REQUEST);
    }
}

#[test]
fn request_line_longer_than_limit_is_bad_request() {
    let (addr, _) = start(config(64), Router::new());
    assert_eq!(send(addr, &[b'a'; 64]), BAD_REQUEST);
}

#[test]
fn unregistered_path_is_not_found() {
    let router = Router::new()
        .with_static_paths(["/index.html"])
        .with_default_handler(text("static".into()));
    let (addr, _) = start(config(4096), router);

    assert_eq!(send(addr, b"GET /nowhere HTTP/1.1\r\n\r\n"), NOT_FOUND);
    assert!(send(addr, b"GET /index.html HTTP/1.1\r\n\r\n").ends_with("static"));
}

#[test]
fn handler_registered_while_serving() {
    let (addr, router) = start(config(4096), Router::new());
    assert_eq!(send(addr, b"GET /late HTTP/1.1\r\n\r\n"), NOT_FOUND);

    router.add_handler(Method::Get, "/late", text("late".into()));
    assert!(send(addr, b"GET /late HTTP/1.1\r\n\r\n").ends_with("late"));
}

#[test]
fn failing_handler_does_not_stop_the_server() {
    let router = Router::new();
    router.add_handler(
        Method::Get,
        "/fail",
        |_: &Request, _: &mut dyn Write| -> io::Result<()> { Err(io::Error::other("boom")) },
    );
    router.add_handler(Method::Get, "/ok", text("ok".into()));
    let (addr, _) = start(config(4096), router);

    assert_eq!(send(addr, b"GET /fail HTTP/1.1\r\n\r\n"), "");
    assert!(send(addr, b"GET /ok HTTP/1.1\r\n\r\n").ends_with("ok"));
}

#[test]
fn concurrent_connections_complete_independently() {
    // Both handlers block until the other one is running, so this only
    // finishes if two workers serve the connections at the same time.
    let barrier = Arc::new(Barrier::new(2));
    let router = Router::new();
    for path in ["/left", "/right"] {
        let barrier = Arc::clone(&barrier);
        router.add_handler(Method::Get, path, move |request: &Request, out: &mut dyn Write| {
            barrier.wait();
            let mut response = Response::new(StatusCode::OK);
            response.set_body(request.path.clone().into_bytes());
            response.write_to(out)
        });
    }
    let (addr, _) = start(config(4096), router);

    let clients: Vec<_> = ["/left", "/right"]
        .into_iter()
        .map(|path| {
            thread::spawn(move || {
                let raw = format!("GET {path} HTTP/1.1\r\n\r\n");
                (path, send(addr, raw.as_bytes()))
            })
        })
        .collect();

    for client in clients {
        let (path, response) = client.join().unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.ends_with(path));
    }
}

#[test]
fn bind_rejects_invalid_config() {
    let config = ServerConfig {
        workers: 0,
        ..config(4096)
    };
    assert!(Server::bind(&config, Router::new()).is_err());
}
