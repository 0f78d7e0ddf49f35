//! Demo application: a small library catalogue served by miniweb.
//!
//! Besides the catalogue pages it exposes one route per handler shape so the
//! effect of blocking the event loop can be observed with two concurrent
//! requests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;
use serde::Serialize;
use serde_json::json;

use miniweb::{
    AppConfig, BoxError, Handler, HttpResponse, HttpServer, MemoryRepository, Repository, ServerConfig, StatusCode,
    Templates,
};

const DEMO_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
struct Author {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct Book {
    id: i64,
    title: String,
    pages: i64,
    author_id: i64,
}

/// Application state shared by the handlers.
struct Library {
    authors: MemoryRepository<Author>,
    books: MemoryRepository<Book>,
    templates: Templates,
}

impl Library {
    /// Five authors with three books each.
    fn seeded(templates: Templates) -> Self {
        let library = Self {
            authors: MemoryRepository::new(),
            books: MemoryRepository::new(),
            templates,
        };

        for idx in 1..=5 {
            let author = library.authors.insert(|id| Author {
                id,
                name: format!("Author #{idx}"),
            });
            for k in 1..=3 {
                library.books.insert(|id| Book {
                    id,
                    title: format!("Book {k}-of-{idx}"),
                    pages: 90 + (idx * 37 + k * 53) % 310,
                    author_id: author.id,
                });
            }
        }

        library
    }

    fn author_name(&self, author_id: i64) -> String {
        self.authors
            .get(author_id)
            .map_or_else(|| "unknown".to_string(), |a| a.name)
    }

    fn index(&self) -> Result<String, BoxError> {
        if self.templates.is_enabled() {
            return Ok(self.templates.render("index.html", json!({}))?);
        }
        Ok("Hello, world!<br><a href=\"/items\">List of books</a>".to_string())
    }

    fn items(&self) -> Result<String, BoxError> {
        let books = self.books.all();

        if self.templates.is_enabled() {
            let items: Vec<_> = books
                .iter()
                .map(|b| json!({
                    "title": b.title,
                    "pages": b.pages,
                    "author": self.author_name(b.author_id),
                    "author_id": b.author_id,
                }))
                .collect();
            return Ok(self.templates.render("items.html", json!({ "items": items }))?);
        }

        if books.is_empty() {
            return Ok("No books.".to_string());
        }
        Ok(books
            .iter()
            .enumerate()
            .map(|(i, b)| format!("{:>2}. {} - {} pages (author: {})", i + 1, b.title, b.pages, self.author_name(b.author_id)))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn author_detail(&self, author_id: i64) -> Result<HttpResponse, BoxError> {
        let author = match self.authors.get(author_id) {
            Some(author) => author,
            None => return Ok(HttpResponse::text(StatusCode::NOT_FOUND, "Author not found")),
        };
        let books: Vec<Book> = self
            .books
            .all()
            .into_iter()
            .filter(|b| b.author_id == author.id)
            .collect();

        if self.templates.is_enabled() {
            let page = self
                .templates
                .render("author.html", json!({ "author": author, "books": books }))?;
            return Ok(HttpResponse::html(StatusCode::OK, page));
        }

        let titles = if books.is_empty() {
            "no books".to_string()
        } else {
            books.iter().map(|b| b.title.as_str()).collect::<Vec<_>>().join(", ")
        };
        Ok(HttpResponse::html(StatusCode::OK, format!("{}: {titles}", author.name)))
    }
}

fn build_server(library: Arc<Library>) -> Result<HttpServer, miniweb::ServerError> {
    let mut server = HttpServer::new(ServerConfig::default());

    let lib = library.clone();
    server.register("GET", "/", Handler::sync(move |_req, _params| lib.index()))?;

    let lib = library.clone();
    server.register("GET", "/items", Handler::suspending(move |_req, _params| {
        let lib = lib.clone();
        async move { lib.items() }
    }))?;

    let lib = library;
    server.register("GET", "/authors/<int:author_id>", Handler::sync(move |_req, params| {
        let author_id = params.get_int("author_id").unwrap_or_default();
        lib.author_detail(author_id)
    }))?;

    // Holds the whole event loop for the duration
    server.register("GET", "/sync-blocking", Handler::sync(|_req, _params| {
        let start = Instant::now();
        thread::sleep(DEMO_DELAY);
        Ok(format!("\nSYNC BLOCKING: {:.2}s", start.elapsed().as_secs_f64()))
    }))?;

    server.register("GET", "/async-nonblocking", Handler::suspending(|_req, _params| async {
        let start = Instant::now();
        tokio::time::sleep(DEMO_DELAY).await;
        Ok::<_, BoxError>(format!("\nASYNC NON-BLOCKING: {:.2}s", start.elapsed().as_secs_f64()))
    }))?;

    server.register("GET", "/sync-threaded", Handler::offloaded(|_req, _params| {
        let start = Instant::now();
        thread::sleep(DEMO_DELAY);
        Ok(format!("\nSYNC THREADED: {:.2}s", start.elapsed().as_secs_f64()))
    }))?;

    server.set_not_found_handler(Handler::sync(|req, _params| {
        Ok(HttpResponse::html(
            StatusCode::NOT_FOUND,
            format!("<h1>Not Found</h1><p>Nothing at {}</p>", req.route_path()),
        ))
    }));

    Ok(server)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::parse();

    let default_filter = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if config.debug {
        info!("Debug mode enabled");
    }
    info!("Data store: in-memory (database path {} unused)", config.db_path.display());

    let templates = if config.templates_enabled {
        Templates::from_dir("templates")
    } else {
        Templates::disabled()
    };

    let server = build_server(Arc::new(Library::seeded(templates)))?;
    server.run(&config.host, config.port)?;

    Ok(())
}
