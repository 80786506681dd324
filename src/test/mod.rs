use std::cell::RefCell;
use std::fs;
use std::path::Path;
use serde::Serialize;
use serde_json::{json, Value};

use crate::openaiapi::{ApiError, Transport};
use crate::record::Record;

mod helpers_tests;

fn load_fixture(name: &str) -> Value {
	let content = fs::read_to_string(format!("testdata/{}", name)).unwrap();
	serde_json::from_str(&content).unwrap()
}

fn save_json<T: Serialize>(dir: &Path, name: &str, object: &T) {
	fs::create_dir_all(dir).unwrap();
	let serialised = serde_json::to_string_pretty(object).unwrap();
	fs::write(dir.join(name.to_string() + ".json"), serialised + "\n").unwrap();
}

fn meta_record() -> Record {
	match json!({
		"company_name": "Meta",
		"ml_topic": "Design a News Feed ML Ranking System",
		"interview_frequency": "Very High",
	}) {
		Value::Object(map) => map,
		_ => unreachable!(),
	}
}

/// Records every call and answers from a fixed script. A `None` reply makes
/// that endpoint fail.
struct ScriptedTransport {
	calls: RefCell<Vec<(String, Value)>>,
	chat: Option<Value>,
	responses: Option<Value>,
}

impl ScriptedTransport {
	fn new(chat: Option<Value>, responses: Option<Value>) -> Self {
		ScriptedTransport { calls: RefCell::new(Vec::new()), chat, responses }
	}

	fn paths(&self) -> Vec<String> {
		self.calls.borrow().iter().map(|(path, _)| path.clone()).collect()
	}

	fn body(&self, index: usize) -> Value {
		self.calls.borrow()[index].1.clone()
	}
}

impl Transport for ScriptedTransport {
	async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
		self.calls.borrow_mut().push((path.to_string(), body.clone()));
		let reply = match path {
			"chat/completions" => self.chat.clone(),
			"responses" => self.responses.clone(),
			_ => None,
		};
		reply.ok_or_else(|| ApiError::Status { status: 500, body: format!("scripted failure for {}", path) })
	}
}
