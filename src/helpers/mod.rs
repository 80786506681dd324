use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::env;
use std::sync::LazyLock;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::record::{Record, COMPANY_FIELD, TOPIC_FIELD};

#[derive(Debug, Error)]
pub enum HelperError {
	#[error("IO error: {0}")]
	Io(#[from] io::Error),
	#[error("Serde error: {0}")]
	Serde(#[from] serde_json::Error),
}

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._\-]").expect("unsafe char pattern"));

/// Resolve the per-user configuration directory, honouring `XDG_CONFIG_HOME`
/// before falling back to `$HOME/.config`.
pub fn config_get_dir(name: Option<&str>) -> Result<PathBuf, io::Error> {
	config_dir_from_lookup(name, |key| env::var(key).ok())
}

pub fn config_dir_from_lookup<F>(name: Option<&str>, lookup: F) -> Result<PathBuf, io::Error> where F: Fn(&str) -> Option<String> {
	let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
	let mut pb = if let Some(config_home) = non_empty("XDG_CONFIG_HOME") {
		PathBuf::from(config_home)
	} else if let Some(home) = non_empty("HOME") {
		let mut config_home = PathBuf::from(home);
		config_home.push(".config");
		config_home
	} else {
		return Err(io::Error::new(io::ErrorKind::Other, "XDG_CONFIG_HOME or HOME not found"));
	};
	if let Some(app_name) = name {
		pb.push(app_name);
	}
	Ok(pb)
}

/// Load `<config_dir>/<config_name>.json`. A missing file is `Ok(None)`,
/// anything else that goes wrong is an error.
pub fn config_load<T: DeserializeOwned>(config_dir: &Path, config_name: &str) -> Result<Option<T>, HelperError> {
	let config_file = config_dir.join(config_name.to_string() + ".json");
	if !config_file.exists() {
		return Ok(None);
	}
	Ok(Some(read_from_json(&config_file)?))
}

pub fn read_text(file_path: impl AsRef<Path>) -> Result<String, io::Error> {
	let mut file = File::open(file_path.as_ref())?;
	let mut content = String::new();
	file.read_to_string(&mut content)?;
	Ok(content)
}

/// Write `content` to `file_path`, creating parent directories first.
pub fn write_text(file_path: impl AsRef<Path>, content: &str) -> Result<(), io::Error> {
	let path = file_path.as_ref();
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let mut file = OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.open(path)?;
	file.write_all(content.as_bytes())?;
	Ok(())
}

pub fn read_from_json<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T, HelperError> {
	let content = read_text(file_path)?;
	let parsed_json: T = serde_json::from_str(&content)?;
	Ok(parsed_json)
}

/// Make a record field safe to use as a single path component.
pub fn sanitize_name(name: &str) -> String {
	let name = name.trim().replace('/', "-");
	let name = WHITESPACE_RUN.replace_all(&name, "-");
	UNSAFE_CHARS.replace_all(&name, "").into_owned()
}

// A component that sanitizes to nothing, or to dots only, would leave the
// two-level layout under the base directory.
fn path_component(record: &Record, key: &str, default: &str) -> String {
	let name = match record.get(key) {
		Some(Value::String(s)) => sanitize_name(s),
		_ => return default.to_string(),
	};
	if name.chars().all(|c| c == '.') {
		default.to_string()
	} else {
		name
	}
}

/// `<base>/<company>/<topic>.md`
pub fn derive_output_path(base_dir: &Path, record: &Record) -> PathBuf {
	let company = path_component(record, COMPANY_FIELD, "Company");
	let topic = path_component(record, TOPIC_FIELD, "ML-Topic");
	let mut path = base_dir.join(company);
	path.push(topic + ".md");
	path
}
