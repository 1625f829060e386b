use std::env;
use std::path::PathBuf;

use poet_core::io::normalize_folder;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATA_DIR: &str = "./data";

/// Server settings, read from the environment.
///
/// | Variable        | Default     |
/// |-----------------|-------------|
/// | `POET_HOST`     | `127.0.0.1` |
/// | `POET_PORT`     | `5000`      |
/// | `POET_DATA_DIR` | `./data`    |
/// | `POET_CORPUS`   | none        |
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Folder holding the `<name>.txt` corpora.
	pub data_dir: PathBuf,
	/// Corpus loaded at startup, if any.
	pub corpus: Option<String>,
}

impl ServerConfig {
	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, String> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Builds the configuration from any key lookup.
	///
	/// # Errors
	/// Returns an error if `POET_PORT` is not a valid port number.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
	where
		F: Fn(&str) -> Option<String>,
	{
		let host = lookup("POET_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
		let port = match lookup("POET_PORT") {
			Some(p) => p.trim().parse::<u16>().map_err(|_| format!("POET_PORT must be a port number, got '{}'", p))?,
			None => DEFAULT_PORT,
		};
		let data_dir = normalize_folder(&lookup("POET_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_owned()));
		let corpus = lookup("POET_CORPUS").map(|c| c.trim().to_owned()).filter(|c| !c.is_empty());

		Ok(Self { host, port, data_dir, corpus })
	}

	/// Path of the corpus file for `name`.
	pub fn corpus_path(&self, name: &str) -> PathBuf {
		self.data_dir.join(format!("{}.txt", name))
	}
}
