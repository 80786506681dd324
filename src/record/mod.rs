use std::io;
use std::path::Path;
use serde_json::{Map, Value};
use thiserror::Error;
use log::{debug, info};

use crate::helpers;

/// One input item: an ordered JSON object describing a single generation request.
pub type Record = Map<String, Value>;

pub const COMPANY_FIELD: &str = "company_name";
pub const TOPIC_FIELD: &str = "ml_topic";

#[derive(Debug, Error)]
pub enum ResolveError {
	#[error("Malformed input JSON: {0}")]
	MalformedInput(#[from] serde_json::Error),
	#[error("Unsupported JSON input format. Provide an object or array of objects.")]
	UnsupportedInputShape,
	#[error("No matching record found in input JSON file with provided filters.")]
	NoMatch,
	#[error("Provide --input-json or --input-json-file.")]
	MissingInput,
	#[error("Cannot read input file: {0}")]
	Io(#[from] io::Error),
}

/// Optional equality filters applied when the input file holds an array.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
	pub company_name: Option<String>,
	pub ml_topic: Option<String>,
}

impl RecordFilter {
	pub fn new(company_name: Option<String>, ml_topic: Option<String>) -> Self {
		RecordFilter { company_name, ml_topic }
	}

	pub fn matches(&self, record: &Record) -> bool {
		field_matches(record, COMPANY_FIELD, self.company_name.as_deref())
			&& field_matches(record, TOPIC_FIELD, self.ml_topic.as_deref())
	}
}

// An empty filter value counts as "not supplied".
fn field_matches(record: &Record, key: &str, wanted: Option<&str>) -> bool {
	match wanted {
		None | Some("") => true,
		Some(wanted) => matches!(record.get(key), Some(Value::String(s)) if s == wanted),
	}
}

pub fn resolve_record(inline: Option<&str>, file: Option<&Path>, filter: &RecordFilter) -> Result<Record, ResolveError> {
	match (inline, file) {
		(Some(json), _) if !json.is_empty() => {
			debug!("parsing inline record ({} bytes)", json.len());
			match serde_json::from_str::<Value>(json)? {
				Value::Object(record) => Ok(record),
				_ => Err(ResolveError::UnsupportedInputShape),
			}
		},
		(_, Some(path)) => {
			info!("loading records from {}", path.display());
			let content = helpers::read_text(path)?;
			let data: Value = serde_json::from_str(&content)?;
			select_record(data, filter)
		},
		_ => Err(ResolveError::MissingInput),
	}
}

/// Pick a record out of an already parsed value. Objects pass through
/// untouched; arrays are filtered and the first match wins.
pub fn select_record(data: Value, filter: &RecordFilter) -> Result<Record, ResolveError> {
	match data {
		Value::Object(record) => Ok(record),
		Value::Array(items) => {
			let mut records = Vec::with_capacity(items.len());
			for item in items {
				match item {
					Value::Object(record) => records.push(record),
					_ => return Err(ResolveError::UnsupportedInputShape),
				}
			}
			debug!("selecting from {} records", records.len());
			records.into_iter()
				.find(|record| filter.matches(record))
				.ok_or(ResolveError::NoMatch)
		},
		_ => Err(ResolveError::UnsupportedInputShape),
	}
}
