use std::path::{Path, PathBuf};

use super::*;
use crate::helpers::{self, derive_output_path, sanitize_name};

#[test]
fn output_path_for_meta_news_feed() {
	let path = derive_output_path(Path::new("content/ml-system-designs"), &meta_record());
	assert_eq!(path, PathBuf::from("content/ml-system-designs/Meta/Design-a-News-Feed-ML-Ranking-System.md"));
}

#[test]
fn output_path_defaults_when_fields_missing() {
	let mut record = meta_record();
	record.remove("company_name");
	record.insert("ml_topic".to_string(), json!(42));
	let path = derive_output_path(Path::new("out"), &record);
	assert_eq!(path, PathBuf::from("out/Company/ML-Topic.md"));
}

#[test]
fn sanitize_rules() {
	assert_eq!(sanitize_name("  Design a  News\tFeed  "), "Design-a-News-Feed");
	assert_eq!(sanitize_name("A/B Testing"), "A-B-Testing");
	assert_eq!(sanitize_name("What's (really) next?"), "Whats-really-next");
	assert_eq!(sanitize_name("v1.2_final-draft"), "v1.2_final-draft");
	assert_eq!(sanitize_name("Café"), "Caf");
	assert_eq!(sanitize_name(""), "");
}

#[test]
fn write_text_creates_parents_and_overwrites() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("Meta").join("Topic.md");
	helpers::write_text(&path, "first version that is longer").unwrap();
	helpers::write_text(&path, "second").unwrap();
	assert_eq!(fs::read_to_string(&path).unwrap(), "second");
}

#[test]
fn read_text_missing_file() {
	assert!(helpers::read_text("testdata/missing.md").is_err());
}

#[test]
fn config_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let config_dir = dir.path().join("deepresearch");
	let saved = json!({"model": "gpt-4.1"});
	save_json(&config_dir, "sample", &saved);
	let loaded: Option<Value> = helpers::config_load(&config_dir, "sample").unwrap();
	assert_eq!(loaded, Some(saved));
}

#[test]
fn config_load_missing_file_is_none() {
	let dir = tempfile::tempdir().unwrap();
	let loaded: Option<Value> = helpers::config_load(dir.path(), "absent").unwrap();
	assert!(loaded.is_none());
}

#[test]
fn dot_only_names_stay_under_base() {
	let mut record = meta_record();
	record.insert("company_name".to_string(), json!(".."));
	let path = derive_output_path(Path::new("out"), &record);
	assert_eq!(path, PathBuf::from("out/Company/Design-a-News-Feed-ML-Ranking-System.md"));

	record.insert("company_name".to_string(), json!("Meta"));
	record.insert("ml_topic".to_string(), json!(" ?! "));
	let path = derive_output_path(Path::new("out"), &record);
	assert_eq!(path, PathBuf::from("out/Meta/ML-Topic.md"));
}

#[test]
fn dots_inside_a_name_are_kept() {
	let mut record = meta_record();
	record.insert("company_name".to_string(), json!("Booking.com"));
	let path = derive_output_path(Path::new("out"), &record);
	assert_eq!(path, PathBuf::from("out/Booking.com/Design-a-News-Feed-ML-Ranking-System.md"));
}

#[test]
fn config_dir_prefers_xdg() {
	let dir = helpers::config_dir_from_lookup(Some("deepresearch"), |key| match key {
		"XDG_CONFIG_HOME" => Some("/tmp/xdg".to_string()),
		"HOME" => Some("/home/someone".to_string()),
		_ => None,
	}).unwrap();
	assert_eq!(dir, PathBuf::from("/tmp/xdg/deepresearch"));
}

#[test]
fn config_dir_falls_back_to_home() {
	let dir = helpers::config_dir_from_lookup(Some("deepresearch"), |key| match key {
		"XDG_CONFIG_HOME" => Some(String::new()),
		"HOME" => Some("/home/someone".to_string()),
		_ => None,
	}).unwrap();
	assert_eq!(dir, PathBuf::from("/home/someone/.config/deepresearch"));

	let dir = helpers::config_dir_from_lookup(None, |key| (key == "HOME").then(|| "/root".to_string())).unwrap();
	assert_eq!(dir, PathBuf::from("/root/.config"));
}

#[test]
fn config_dir_without_home() {
	assert!(helpers::config_dir_from_lookup(Some("deepresearch"), |_| None).is_err());
}
