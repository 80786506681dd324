use std::path::{Path, PathBuf};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use log::{debug, info};

use crate::helpers::{self, HelperError};
use crate::openaiapi::{self, ApiError, CompletionError, CompletionInvoker, CompletionParams, HttpTransport, Transport};
use crate::prompt;
use crate::record::{self, RecordFilter, ResolveError};

pub const APP_NAME: &str = "deepresearch";
pub const DEFAULTS_NAME: &str = "defaults";
pub const DEFAULT_OUTPUT_BASE: &str = "content/ml-system-designs";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_BASE_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";

#[derive(Debug, Error)]
pub enum AppError {
	#[error("OPENAI_API_KEY is not set in environment.")]
	MissingCredential,
	#[error("{0}")]
	Resolve(#[from] ResolveError),
	#[error("{0}")]
	Completion(#[from] CompletionError),
	#[error("{0}")]
	Api(#[from] ApiError),
	#[error("Cannot read prompt file {}: {source}", path.display())]
	Template { path: PathBuf, source: std::io::Error },
	#[error("Cannot write {}: {source}", path.display())]
	Output { path: PathBuf, source: std::io::Error },
	#[error("Config error: {0}")]
	Config(#[from] HelperError),
}

impl AppError {
	pub fn exit_code(&self) -> i32 {
		match self {
			AppError::MissingCredential => 2,
			_ => 1,
		}
	}
}

/// Optional per-user defaults, read from `defaults.json` in the config dir.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Defaults {
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub temperature: Option<f64>,
	#[serde(default)]
	pub output_base: Option<PathBuf>,
	#[serde(default)]
	pub api_base: Option<String>,
}

impl Defaults {
	pub fn load(config_dir: Option<&Path>) -> Result<Self, AppError> {
		let dir = match config_dir {
			Some(dir) => dir.to_path_buf(),
			None => match helpers::config_get_dir(Some(APP_NAME)) {
				Ok(dir) => dir,
				Err(e) => {
					debug!("no config dir: {}", e);
					return Ok(Defaults::default());
				},
			},
		};
		let defaults = helpers::config_load::<Defaults>(&dir, DEFAULTS_NAME)?.unwrap_or_default();
		debug!("defaults from {}: {:?}", dir.display(), defaults);
		Ok(defaults)
	}
}

/// Credentials and endpoint taken from the environment.
#[derive(Debug, Clone)]
pub struct ApiSettings {
	pub api_key: String,
	pub api_base: Option<String>,
	pub model: Option<String>,
}

impl ApiSettings {
	pub fn from_env() -> Result<Self, AppError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError> where F: Fn(&str) -> Option<String> {
		let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
		let api_key = non_empty(API_KEY_VAR).ok_or(AppError::MissingCredential)?;
		Ok(ApiSettings {
			api_key,
			api_base: non_empty(API_BASE_VAR),
			model: non_empty(MODEL_VAR),
		})
	}
}

/// Everything one invocation needs, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
	pub prompt_file: PathBuf,
	pub input_json: Option<String>,
	pub input_json_file: Option<PathBuf>,
	pub filter: RecordFilter,
	pub output_base: Option<PathBuf>,
	pub model: Option<String>,
	pub temperature: Option<f64>,
	pub enable_deep_research: bool,
	pub include_mermaid: bool,
	pub write_req_resp: bool,
}

impl RunOptions {
	pub fn output_base(&self, defaults: &Defaults) -> PathBuf {
		self.output_base.clone()
			.or_else(|| defaults.output_base.clone())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_BASE))
	}

	pub fn completion_params(&self, settings: &ApiSettings, defaults: &Defaults) -> CompletionParams {
		let model_override = self.model.as_deref().filter(|m| !m.trim().is_empty())
			.or(settings.model.as_deref())
			.or(defaults.model.as_deref());
		CompletionParams {
			model: openaiapi::resolve_model(model_override, self.enable_deep_research),
			temperature: self.temperature.or(defaults.temperature).unwrap_or(DEFAULT_TEMPERATURE),
			deep_research: self.enable_deep_research,
		}
	}
}

pub fn api_base(settings: &ApiSettings, defaults: &Defaults) -> String {
	settings.api_base.clone()
		.or_else(|| defaults.api_base.clone())
		.unwrap_or_else(|| openaiapi::DEFAULT_API_BASE.to_string())
}

/// Resolve, compose, complete and write. Returns the path written.
pub async fn run<T: Transport>(options: &RunOptions, params: &CompletionParams, output_base: &Path, invoker: &CompletionInvoker<T>) -> Result<PathBuf, AppError> {
	let template = helpers::read_text(&options.prompt_file)
		.map_err(|source| AppError::Template { path: options.prompt_file.clone(), source })?;
	let record = record::resolve_record(
		options.input_json.as_deref(),
		options.input_json_file.as_deref(),
		&options.filter,
	)?;
	info!("resolved record with {} fields", record.len());

	let conversation = prompt::compose(&template, &record, options.include_mermaid);
	let markdown = invoker.complete(&conversation, params).await?;

	let output_path = helpers::derive_output_path(output_base, &record);
	helpers::write_text(&output_path, &markdown)
		.map_err(|source| AppError::Output { path: output_path.clone(), source })?;
	info!("wrote {} bytes to {}", markdown.len(), output_path.display());
	Ok(output_path)
}

/// Load defaults and run against the HTTP transport.
pub async fn run_with_settings(options: &RunOptions, settings: ApiSettings, config_dir: Option<&Path>) -> Result<PathBuf, AppError> {
	let defaults = Defaults::load(config_dir)?;
	let params = options.completion_params(&settings, &defaults);
	let mut transport = HttpTransport::new(&api_base(&settings, &defaults), settings.api_key)?;
	transport.write_req_resp = options.write_req_resp;
	let invoker = CompletionInvoker::new(transport);
	run(options, &params, &options.output_base(&defaults), &invoker).await
}
