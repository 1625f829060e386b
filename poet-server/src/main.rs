mod config;

use std::io;
use std::sync::{Arc, RwLock};

use actix_web::{get, middleware, put, web, App, HttpResponse, HttpServer, Responder};
use log::{error, info, warn};
use serde::Deserialize;

use config::ServerConfig;
use poet_core::io::{get_filename, list_files};
use poet_core::model::poet::{GraphPoet, TieBreak};

/// Query parameters for the `/v1/poem` endpoint
#[derive(Deserialize)]
struct PoemParams {
	input: Option<String>,
	tie_break: Option<String>, // lexical (default) or random
}

#[derive(Deserialize)]
struct CorpusQuery {
	name: Option<String>,
}

#[derive(Deserialize)]
struct GraphQuery {
	format: Option<String>, // json (default) or text
}

/// The engine currently in service, with the name of its corpus.
#[derive(Clone)]
struct LoadedCorpus {
	name: String,
	poet: Arc<GraphPoet>,
}

/// State shared by all workers.
///
/// The lock only guards the swap of the loaded engine: handlers clone the
/// `Arc` and release the lock before generating anything.
struct SharedData {
	config: ServerConfig,
	loaded: RwLock<Option<LoadedCorpus>>,
}

impl SharedData {
	fn new(config: ServerConfig) -> Self {
		Self { config, loaded: RwLock::new(None) }
	}

	fn current(&self) -> Result<Option<LoadedCorpus>, HttpResponse> {
		match self.loaded.read() {
			Ok(loaded) => Ok(loaded.clone()),
			Err(_) => {
				error!("engine lock poisoned while reading");
				Err(HttpResponse::InternalServerError().body("Engine lock failed"))
			}
		}
	}

	fn replace(&self, corpus: LoadedCorpus) -> Result<(), HttpResponse> {
		match self.loaded.write() {
			Ok(mut loaded) => {
				*loaded = Some(corpus);
				Ok(())
			}
			Err(_) => {
				error!("engine lock poisoned while replacing");
				Err(HttpResponse::InternalServerError().body("Engine lock failed"))
			}
		}
	}
}

impl PoemParams {
	/// Determines the tie-break strategy for bridge selection.
	fn tie_break(&self) -> Result<TieBreak, String> {
		match &self.tie_break {
			None => Ok(TieBreak::default()),
			Some(s) => s.parse(),
		}
	}
}

/// HTTP GET endpoint `/v1/poem`
///
/// Returns the input augmented with bridge words from the loaded corpus.
#[get("/v1/poem")]
async fn get_poem(data: web::Data<SharedData>, query: web::Query<PoemParams>) -> impl Responder {
	let tie_break = match query.tie_break() {
		Ok(t) => t,
		Err(e) => {
			warn!("poem rejected: {}", e);
			return HttpResponse::BadRequest().body(e);
		}
	};

	let loaded = match data.current() {
		Ok(Some(loaded)) => loaded,
		Ok(None) => {
			warn!("poem requested with no corpus loaded");
			return HttpResponse::Conflict().body("No corpus loaded");
		}
		Err(response) => return response,
	};

	let input = query.input.as_deref().unwrap_or_default();
	HttpResponse::Ok().body(loaded.poet.poem_with(input, tie_break))
}

#[get("/v1/corpora")]
async fn get_corpora(data: web::Data<SharedData>) -> impl Responder {
	match list_files(&data.config.data_dir, "txt") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|f| get_filename(f).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(e) => {
			error!("failed to list corpora in {}: {}", data.config.data_dir.display(), e);
			HttpResponse::InternalServerError().body("Failed to list corpora")
		}
	}
}

#[get("/v1/loaded_corpus")]
async fn get_loaded_corpus(data: web::Data<SharedData>) -> impl Responder {
	match data.current() {
		Ok(loaded) => HttpResponse::Ok().body(loaded.map(|l| l.name).unwrap_or_default()),
		Err(response) => response,
	}
}

/// HTTP PUT endpoint `/v1/load_corpus`
///
/// Builds a new engine from `<data dir>/<name>.txt` and puts it in service.
/// On failure the previous engine keeps serving.
#[put("/v1/load_corpus")]
async fn put_load_corpus(data: web::Data<SharedData>, query: web::Query<CorpusQuery>) -> impl Responder {
	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => {
			warn!("load_corpus rejected: missing or empty corpus name");
			return HttpResponse::BadRequest().body("Missing or empty corpus name");
		}
	};
	if name.contains(['/', '\\']) || name.contains("..") {
		warn!("load_corpus rejected: '{}' contains a path", name);
		return HttpResponse::BadRequest().body("Corpus name must not contain a path");
	}

	let path = data.config.corpus_path(&name);
	let poet = match web::block(move || GraphPoet::from_path(path)).await {
		Ok(Ok(poet)) => poet,
		Ok(Err(e)) => {
			warn!("failed to load corpus '{}': {}", name, e);
			return HttpResponse::InternalServerError().body(format!("Failed to load corpus: {e}"));
		}
		Err(e) => {
			error!("corpus loading task failed: {}", e);
			return HttpResponse::InternalServerError().body("Corpus loading task failed");
		}
	};

	info!(
		"loaded corpus '{}': {} vertices, {} edges",
		name,
		poet.graph().vertex_count(),
		poet.graph().edge_count()
	);
	match data.replace(LoadedCorpus { name, poet: Arc::new(poet) }) {
		Ok(()) => HttpResponse::Ok().body("Corpus loaded successfully"),
		Err(response) => response,
	}
}

/// HTTP GET endpoint `/v1/graph`
///
/// Diagnostic dump of the loaded affinity graph, as JSON or plain text.
#[get("/v1/graph")]
async fn get_graph(data: web::Data<SharedData>, query: web::Query<GraphQuery>) -> impl Responder {
	let loaded = match data.current() {
		Ok(Some(loaded)) => loaded,
		Ok(None) => {
			warn!("graph requested with no corpus loaded");
			return HttpResponse::Conflict().body("No corpus loaded");
		}
		Err(response) => return response,
	};

	match query.format.as_deref() {
		None | Some("json") => HttpResponse::Ok().json(loaded.poet.graph()),
		Some("text") => HttpResponse::Ok().body(loaded.poet.to_string()),
		Some(other) => {
			warn!("graph rejected: unknown format '{}'", other);
			HttpResponse::BadRequest().body(format!("Unknown format '{other}'"))
		}
	}
}

fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_poem)
		.service(get_corpora)
		.service(get_loaded_corpus)
		.service(put_load_corpus)
		.service(get_graph);
}

/// Main entry point for the server.
///
/// Reads the configuration from the environment, optionally loads a corpus,
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	let shared_data = SharedData::new(config.clone());

	if let Some(name) = &config.corpus {
		let poet = GraphPoet::from_path(config.corpus_path(name)).map_err(io::Error::other)?;
		info!("startup corpus '{}': {} vertices", name, poet.graph().vertex_count());
		shared_data.replace(LoadedCorpus { name: name.clone(), poet: Arc::new(poet) })
			.map_err(|_| io::Error::other("Engine lock failed"))?;
	}

	info!("listening on {}:{} (data: {})", config.host, config.port, config.data_dir.display());
	let shared_data = web::Data::new(shared_data);
	HttpServer::new(move || {
		App::new()
			.app_data(shared_data.clone())
			.wrap(middleware::Logger::default())
			.configure(configure)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}
