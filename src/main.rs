use tinyhttp::config::Config;
use tinyhttp::http::request::Request;
use tinyhttp::http::response::{Response, ResponseBuilder, StatusCode};
use tinyhttp::server::Server;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let address = cfg.server.address.to_string();
    let port = cfg.server.port;

    let mut server = Server::with_config(cfg);
    server.add_handler("/", |_req| Some(Response::ok("Hello from tinyhttp\n")));
    server.add_handler("/health", |_req| {
        Some(
            ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "text/plain")
                .body("ok")
                .content_length()
                .build(),
        )
    });
    server.add_handler("/echo", echo);

    server.run(&address, port)?;
    Ok(())
}

/// Echoes query parameters and the request body back as plain text.
fn echo(req: &Request) -> Option<Response> {
    let mut out = format!("{} {}\n", req.method, req.path);
    for (name, value) in req.query.iter() {
        out.push_str(&format!("{name}={value}\n"));
    }
    out.push('\n');

    let mut body = out.into_bytes();
    body.extend_from_slice(&req.body);

    Some(
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain")
            .body(body)
            .content_length()
            .build(),
    )
}
