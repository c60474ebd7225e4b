// Build script - reads config.yaml at compile time and generates defaults
// This allows changing sync defaults during development without editing source code

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Tell Cargo to rerun if config.yaml changes
    println!("cargo:rerun-if-changed=src/config.yaml");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("compiled_config.rs");

    // Try to read config.yaml from src/, fall back to hardcoded defaults if not found
    let config = if Path::new("src/config.yaml").exists() {
        let content = fs::read_to_string("src/config.yaml")
            .expect("Failed to read src/config.yaml");
        parse_config(&content)
    } else {
        CompiledConfig::default()
    };
    validate(&config);

    let generated = format!(
        r#"// Auto-generated from config.yaml at compile time
// Do not edit - modify config.yaml and rebuild instead

pub const SYNC_MODE: &str = "{sync_mode}";
pub const DATE_FORMAT: &str = "{date_format}";
pub const LOG_LEVEL: &[&str] = &[{log_level}];

pub const GLOBAL_EXCLUDES: &[&str] = &[
{excludes}
];
"#,
        sync_mode = escape(&config.sync_mode),
        date_format = escape(&config.date_format),
        log_level = config.log_level
            .iter()
            .map(|l| format!("\"{}\"", escape(l)))
            .collect::<Vec<_>>()
            .join(", "),
        excludes = config.global_excludes
            .iter()
            .map(|e| format!("    \"{}\",", escape(e)))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    fs::write(&dest_path, generated).expect("Failed to write compiled config");
}

struct CompiledConfig {
    sync_mode: String,
    date_format: String,
    log_level: Vec<String>,
    global_excludes: Vec<String>,
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            sync_mode: "copy".to_string(),
            date_format: "yyyyMMddHHmmss".to_string(),
            log_level: vec!["error".to_string(), "finished".to_string()],
            global_excludes: Vec::new(),
        }
    }
}

fn parse_config(content: &str) -> CompiledConfig {
    let mut config = CompiledConfig::default();

    // Simple YAML parsing (avoiding external dependencies in build script)
    let mut in_defaults = false;
    let mut in_excludes = false;

    for line in content.lines() {
        let trimmed = line.trim();

        // Track which section we're in
        if trimmed.starts_with("defaults:") {
            in_defaults = true;
            in_excludes = false;
            continue;
        } else if trimmed.starts_with("global_excludes:") {
            in_defaults = false;
            in_excludes = true;
            config.global_excludes.clear(); // Start fresh when we see the section
            continue;
        }

        // Parse list items for global_excludes
        if in_excludes && trimmed.starts_with("- ") {
            let value = unquote(trimmed[2..].trim());
            config.global_excludes.push(value.to_string());
            continue;
        }

        // Stop parsing excludes when we hit a non-list line
        if in_excludes && !trimmed.is_empty() && !trimmed.starts_with('#') {
            in_excludes = false;
        }

        if in_defaults {
            if let Some((key, value)) = parse_kv(trimmed) {
                match key {
                    "mode" => config.sync_mode = unquote(value).to_string(),
                    "date_format" => config.date_format = unquote(value).to_string(),
                    "log_level" => {
                        config.log_level = unquote(value)
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect();
                    }
                    _ => {}
                }
            }
        }
    }

    config
}

// Keep in step with SyncMode::from_str and LogCategory::from_name
const MODES: &[&str] = &[
    "copy",
    "copy_and_delete",
    "mirror",
    "copy_with_versioning",
    "versioning",
];
const CATEGORIES: &[&str] = &[
    "error",
    "directory",
    "directory_visited",
    "file",
    "file_visited",
    "finished",
    "file_deleted",
    "directory_deleted",
];

/// A typo in config.yaml fails the build instead of falling back to a default
fn validate(config: &CompiledConfig) {
    let mode = config.sync_mode.trim().to_lowercase().replace('-', "_");
    if !MODES.contains(&mode.as_str()) {
        panic!(
            "src/config.yaml: unknown default mode '{}' (expected one of: {})",
            config.sync_mode,
            MODES.join(", ")
        );
    }

    for level in &config.log_level {
        if !CATEGORIES.contains(&level.trim().to_lowercase().as_str()) {
            panic!(
                "src/config.yaml: unknown log_level category '{}' (expected one of: {})",
                level,
                CATEGORIES.join(", ")
            );
        }
    }

    if config.date_format.trim().is_empty() {
        panic!("src/config.yaml: date_format must not be empty");
    }
}

fn parse_kv(line: &str) -> Option<(&str, &str)> {
    // Skip comments and empty lines
    if line.starts_with('#') || line.is_empty() {
        return None;
    }

    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim();
    let mut value = line[colon_pos + 1..].trim();

    // Remove inline comments
    if let Some(comment_pos) = value.find(" #") {
        value = value[..comment_pos].trim();
    }

    // Skip if value is empty (section header)
    if value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}

/// Escape a value for embedding in a generated Rust string literal
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
