use std::fs;
use std::path::PathBuf;
use serde_json::Value;
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use log::{debug, info, warn};

use crate::prompt::{Conversation, Message};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_DEEP_RESEARCH_MODEL: &str = "o4-mini";

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),
	#[error("HTTP status {status}: {body}")]
	Status { status: u16, body: String },
	#[error("Serde error: {0}")]
	Serde(#[from] serde_json::Error),
	#[error("URL error: {0}")]
	Url(#[from] url::ParseError),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Malformed response: {0}")]
	MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum CompletionError {
	#[error("OpenAI API call failed: {0}")]
	Unavailable(String),
}

/// Pick the model: a non-empty override wins, otherwise the default for the mode.
pub fn resolve_model(model_override: Option<&str>, deep_research: bool) -> String {
	match model_override {
		Some(name) if !name.trim().is_empty() => name.trim().to_string(),
		_ if deep_research => DEFAULT_DEEP_RESEARCH_MODEL.to_string(),
		_ => DEFAULT_MODEL.to_string(),
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
	pub model: String,
	pub temperature: f64,
	pub deep_research: bool,
}

/// Best-effort deep research toggle. Servers that do not know the field
/// ignore it.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct DeepResearchHint {
	pub enable: bool,
}

impl CompletionParams {
	fn hint(&self) -> Option<DeepResearchHint> {
		self.deep_research.then_some(DeepResearchHint { enable: true })
	}
}

#[derive(Serialize)]
struct ChatRequest<'a> {
	model: &'a str,
	messages: &'a [Message],
	temperature: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	deep_research: Option<DeepResearchHint>,
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
	model: &'a str,
	input: String,
	temperature: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	deep_research: Option<DeepResearchHint>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
	choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
	message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
	#[serde(default)]
	content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponsesResponse {
	#[serde(default)]
	output: Option<Vec<OutputItem>>,
}

#[derive(Deserialize, Debug)]
struct OutputItem {
	#[serde(rename = "type")]
	item_type: String,
	// only message items are guaranteed to carry a content list
	#[serde(default)]
	content: Option<Vec<OutputContent>>,
}

#[derive(Deserialize, Debug)]
struct OutputContent {
	#[serde(rename = "type")]
	content_type: String,
	#[serde(default)]
	text: Option<String>,
}

/// The request/response shapes the service exposes for the same completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionTarget {
	ChatCompletions,
	Responses,
}

impl CompletionTarget {
	pub fn path(&self) -> &'static str {
		match self {
			CompletionTarget::ChatCompletions => "chat/completions",
			CompletionTarget::Responses => "responses",
		}
	}

	pub fn build_body(&self, conversation: &Conversation, params: &CompletionParams) -> Result<Value, ApiError> {
		let body = match self {
			CompletionTarget::ChatCompletions => serde_json::to_value(ChatRequest {
				model: &params.model,
				messages: conversation.messages(),
				temperature: params.temperature,
				deep_research: params.hint(),
			})?,
			CompletionTarget::Responses => serde_json::to_value(ResponsesRequest {
				model: &params.model,
				input: conversation.combined_input(),
				temperature: params.temperature,
				deep_research: params.hint(),
			})?,
		};
		Ok(body)
	}

	pub fn extract_text(&self, response: Value) -> Result<String, ApiError> {
		match self {
			CompletionTarget::ChatCompletions => {
				let parsed: ChatResponse = serde_json::from_value(response)?;
				let choice = parsed.choices.into_iter().next()
					.ok_or_else(|| ApiError::MalformedResponse("No choices in the return object".to_string()))?;
				Ok(choice.message.content.unwrap_or_default())
			},
			CompletionTarget::Responses => {
				let parsed: ResponsesResponse = serde_json::from_value(response)?;
				let text = parsed.output.unwrap_or_default()
					.into_iter()
					.filter(|item| item.item_type == "message")
					.flat_map(|item| item.content.unwrap_or_default())
					.filter(|part| part.content_type == "output_text")
					.filter_map(|part| part.text)
					.collect::<String>();
				Ok(text)
			},
		}
	}
}

/// Something that can POST a JSON body to a path under the API base and
/// hand back the decoded JSON reply.
#[allow(async_fn_in_trait)]
pub trait Transport {
	async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}

pub struct HttpTransport {
	client: reqwest::Client,
	api_base: Url,
	api_key: String,
	pub write_req_resp: bool,
	pub dump_dir: PathBuf,
}

impl HttpTransport {
	pub fn new(api_base: &str, api_key: String) -> Result<Self, ApiError> {
		// keep a trailing slash so join() appends rather than replaces
		let base = format!("{}/", api_base.trim_end_matches('/'));
		Ok(HttpTransport {
			client: reqwest::Client::new(),
			api_base: Url::parse(&base)?,
			api_key,
			write_req_resp: false,
			dump_dir: PathBuf::from("."),
		})
	}

	pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
		Ok(self.api_base.join(path)?)
	}
}

impl Transport for HttpTransport {
	async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
		let url = self.endpoint(path)?;
		if self.write_req_resp {
			fs::write(self.dump_dir.join("last_request.json"), serde_json::to_string_pretty(body)?)?;
		}
		debug!("POST {}", url);
		let resp = self.client
			.post(url)
			.bearer_auth(&self.api_key)
			.json(body)
			.send()
			.await?;
		let status = resp.status();
		let text = resp.text().await?;
		if self.write_req_resp {
			fs::write(self.dump_dir.join("last_response.json"), &text)?;
		}
		if !status.is_success() {
			return Err(ApiError::Status { status: status.as_u16(), body: text });
		}
		Ok(serde_json::from_str(&text)?)
	}
}

pub struct CompletionInvoker<T: Transport> {
	transport: T,
}

impl<T: Transport> CompletionInvoker<T> {
	pub fn new(transport: T) -> Self {
		CompletionInvoker { transport }
	}

	#[cfg(test)]
	pub fn transport(&self) -> &T {
		&self.transport
	}

	async fn attempt(&self, target: CompletionTarget, conversation: &Conversation, params: &CompletionParams) -> Result<String, ApiError> {
		let body = target.build_body(conversation, params)?;
		let response = self.transport.post_json(target.path(), &body).await?;
		target.extract_text(response)
	}

	/// Try the chat completions shape, then the responses shape once. There
	/// is no further retry.
	pub async fn complete(&self, conversation: &Conversation, params: &CompletionParams) -> Result<String, CompletionError> {
		info!("requesting completion with model {} (deep research: {})", params.model, params.deep_research);
		match self.attempt(CompletionTarget::ChatCompletions, conversation, params).await {
			Ok(text) => Ok(text),
			Err(primary) => {
				warn!("chat completions failed ({}), falling back to responses", primary);
				self.attempt(CompletionTarget::Responses, conversation, params).await
					.map_err(|e| CompletionError::Unavailable(e.to_string()))
			},
		}
	}
}
