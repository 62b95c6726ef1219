//! Demo site served by the binary: static files from a public directory plus a
//! handful of pages with `{placeholder}` substitution.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::http::{Method, Request, Response, StatusCode};
use crate::router::{self, Handler, Router};

/// Serves files below `root`, keyed by request path.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        StaticFiles { root: root.into() }
    }

    /// Maps a request path into `root`, refusing anything but plain components.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for component in Path::new(url_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }
}

impl Handler for StaticFiles {
    fn handle(&self, request: &Request, out: &mut dyn Write) -> io::Result<()> {
        let Some(file_path) = self.map_path(&request.path) else {
            return router::not_found(out);
        };

        match fs::read(&file_path) {
            Ok(contents) => {
                let mut response = Response::new(StatusCode::OK);
                response.set_content_type(content_type(&file_path));
                response.set_body(contents);
                response.write_to(out)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %file_path.display(), "static file missing");
                router::not_found(out)
            }
            Err(e) => Err(e),
        }
    }
}

/// Content type chosen by file extension.
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("svg") => "image/svg+xml",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Reads `root/name`, replaces every `{key}` and answers 200.
fn render(root: &Path, name: &str, values: &[(&str, String)], out: &mut dyn Write) -> io::Result<()> {
    let file_path = root.join(name);
    let mut page = fs::read_to_string(&file_path)?;
    for (key, value) in values {
        page = page.replace(&format!("{{{key}}}"), value);
    }

    let mut response = Response::new(StatusCode::OK);
    response.set_content_type(content_type(&file_path));
    response.set_body(page.into_bytes());
    response.write_to(out)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_query(request: &Request) -> String {
    let mut params: Vec<_> = request.query_params.iter().collect();
    params.sort();
    let params: Vec<_> = params
        .into_iter()
        .map(|(k, v)| format!("{}={}", escape_html(k), escape_html(v)))
        .collect();
    format!("{{{}}}", params.join(", "))
}

fn render_body_parts(request: &Request) -> String {
    request
        .body_parts
        .iter()
        .map(|(name, values)| {
            let values: Vec<_> = values.iter().map(|v| escape_html(v)).collect();
            format!("{} -> [{}]<br>", escape_html(name), values.join(", "))
        })
        .collect()
}

/// Registers the demo pages and returns a router whose default handler serves
/// `public_dir` for the given allow-list.
pub fn router(public_dir: &Path, static_paths: &[String], host: &str, port: u16) -> Router {
    let router = Router::new()
        .with_static_paths(static_paths.iter().cloned())
        .with_default_handler(StaticFiles::new(public_dir));

    let root = public_dir.to_path_buf();
    router.add_handler(Method::Get, "/classic.html", move |_: &Request, out: &mut dyn Write| {
        let time = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        render(&root, "classic.html", &[("time", time)], out)
    });

    for page in ["form.html", "multipart.html"] {
        let root = public_dir.to_path_buf();
        let host = host.to_string();
        router.add_handler(
            Method::Get,
            &format!("/{page}"),
            move |_: &Request, out: &mut dyn Write| {
                render(
                    &root,
                    page,
                    &[("host", host.clone()), ("port", port.to_string())],
                    out,
                )
            },
        );
    }

    let root = public_dir.to_path_buf();
    router.add_handler(Method::Get, "/messages", move |request: &Request, out: &mut dyn Write| {
        render(&root, "response.html", &[("params", render_query(request))], out)
    });

    let root = public_dir.to_path_buf();
    router.add_handler(Method::Post, "/get-value", move |request: &Request, out: &mut dyn Write| {
        render(&root, "response.html", &[("params", render_body_parts(request))], out)
    });

    router
}
