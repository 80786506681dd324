use serde_derive::Serialize;

use crate::record::Record;

const ROLE_STATEMENT: &str = "You are an expert ML system design interviewer and architect.";
const DEPTH_DIRECTIVE: &str = "Produce a comprehensive, interview-focused document with advanced technical depth (E7 level).";
const STRUCTURE_DIRECTIVE: &str = "Follow the structure described in the provided prompt template.";
const DIAGRAM_DIRECTIVE: &str = "Include a clear 'System Design Diagram' section using Mermaid (flowchart) when appropriate.";
const GENERATE_INSTRUCTION: &str = "Generate the output markdown now.";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
	pub role: Role,
	pub content: String,
}

impl Message {
	pub fn system(content: String) -> Self {
		Message { role: Role::System, content }
	}
	pub fn user(content: String) -> Self {
		Message { role: Role::User, content }
	}
}

/// The fixed system + user exchange sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
	messages: [Message; 2],
}

impl Conversation {
	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn system(&self) -> &str {
		&self.messages[0].content
	}

	pub fn user(&self) -> &str {
		&self.messages[1].content
	}

	/// Both turns flattened into one input, for request shapes that do not
	/// take a role-tagged list.
	pub fn combined_input(&self) -> String {
		format!("{}\n\n{}", self.system(), self.user())
	}
}

pub fn compose(template: &str, record: &Record, include_diagram: bool) -> Conversation {
	let mut system_parts = vec![ROLE_STATEMENT, DEPTH_DIRECTIVE, STRUCTURE_DIRECTIVE];
	if include_diagram {
		system_parts.push(DIAGRAM_DIRECTIVE);
	}

	let user_prompt = format!(
		"PROMPT TEMPLATE:\n\n{}\n\nINPUT RECORD (JSON):\n```json\n{}\n```\n\n{}",
		template,
		render_record(record),
		GENERATE_INSTRUCTION,
	);

	Conversation {
		messages: [
			Message::system(system_parts.join("\n")),
			Message::user(user_prompt),
		],
	}
}

fn render_record(record: &Record) -> String {
	// serializing a map of JSON values cannot fail
	serde_json::to_string_pretty(record).unwrap_or_default()
}
