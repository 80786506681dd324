use clap::Parser;
use std::path::PathBuf;
use std::process;
use log::info;

mod app;
mod helpers;
mod openaiapi;
mod prompt;
mod record;

#[cfg(test)]
mod test;

use app::{ApiSettings, RunOptions};
use record::RecordFilter;

#[derive(Parser)]
#[command(about = "Run the deep research ML system design prompt against an OpenAI-compatible API and save the result")]
struct Cli {
	#[clap(long)]
	/// Path to the prompt markdown file
	prompt_file: PathBuf,
	#[clap(long)]
	/// Inline JSON string with the input record
	input_json: Option<String>,
	#[clap(long)]
	/// Path to a JSON file containing the input record(s)
	input_json_file: Option<PathBuf>,
	#[clap(long)]
	/// Filter when the JSON file has multiple records
	company_name: Option<String>,
	#[clap(long)]
	/// Filter when the JSON file has multiple records
	ml_topic: Option<String>,
	#[clap(long)]
	/// Base output directory for generated markdown (default: content/ml-system-designs)
	output_base: Option<PathBuf>,
	#[clap(long)]
	/// Override model (default: o4-mini with deep research, else gpt-4o-mini)
	model: Option<String>,
	#[clap(long)]
	/// Sampling temperature (default: 0.2)
	temperature: Option<f64>,
	#[clap(long)]
	/// Try to enable deep research mode if available
	enable_deep_research: bool,
	#[clap(long)]
	/// Ask the model to include a Mermaid diagram section
	include_mermaid: bool,
	#[clap(long)]
	/// Directory holding defaults.json (default: $XDG_CONFIG_HOME/deepresearch)
	config_dir: Option<PathBuf>,
	#[clap(long, default_value = "false")]
	/// Dump each request and response to last_request.json / last_response.json
	write_req_resp: bool,
}

impl Cli {
	fn run_options(self) -> (RunOptions, Option<PathBuf>) {
		let options = RunOptions {
			prompt_file: self.prompt_file,
			input_json: self.input_json,
			input_json_file: self.input_json_file,
			filter: RecordFilter::new(self.company_name, self.ml_topic),
			output_base: self.output_base,
			model: self.model,
			temperature: self.temperature,
			enable_deep_research: self.enable_deep_research,
			include_mermaid: self.include_mermaid,
			write_req_resp: self.write_req_resp,
		};
		(options, self.config_dir)
	}
}

#[tokio::main]
async fn main() {
	let _ = env_logger::builder()
		.format_timestamp_millis()
		.parse_default_env()
		.try_init();

	let args = Cli::parse();

	let settings = match ApiSettings::from_env() {
		Ok(settings) => settings,
		Err(e) => {
			eprintln!("{}", e);
			process::exit(e.exit_code());
		},
	};

	let (options, config_dir) = args.run_options();
	info!("prompt file: {}", options.prompt_file.display());

	match app::run_with_settings(&options, settings, config_dir.as_deref()).await {
		Ok(path) => println!("Saved markdown to: {}", path.display()),
		Err(e) => {
			eprintln!("Error: {}", e);
			process::exit(e.exit_code());
		},
	}
}
