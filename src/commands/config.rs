//! Config subcommands handler

use anyhow::Result;
use std::fs;
use std::io::{self, BufRead, Write};

use flashback::config::{migrate_config, MigrateResult};
use flashback::theme::{ansi, current_theme};
use flashback::Config;

/// Show the effective configuration as TOML.
///
/// Values are shown after range validation, so an out-of-range
/// `max_duration` in the file appears clamped here.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = Config::load()?;
    let toml_str = toml::to_string_pretty(&config)?;
    let theme = current_theme();
    println!("{}", theme.secondary_text(&format!("# {}", Config::config_path()?.display())));
    println!("{}", theme.primary_text(&toml_str));
    Ok(())
}

/// Open configuration file in the default editor.
///
/// Uses $EDITOR environment variable (defaults to 'vi').
#[cfg(not(tarpaulin_include))]
pub fn handle_edit() -> Result<()> {
    let config_path = Config::config_path()?;
    let theme = current_theme();

    // Ensure config exists
    if !config_path.exists() {
        let config = Config::default();
        config.save()?;
    }

    // Get editor from environment
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!(
        "{}",
        theme.primary_text(&format!(
            "Opening {} with {}",
            config_path.display(),
            editor
        ))
    );

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to open editor: {}", e))?;

    Ok(())
}

/// Migrate config file by adding missing fields.
///
/// Reads the existing config file (or empty if it doesn't exist), adds any
/// missing `[buffer]`, `[navigation]` and `[replay]` fields from the
/// defaults, shows a preview, and asks before writing unless `yes` is set.
#[cfg(not(tarpaulin_include))]
pub fn handle_migrate(yes: bool) -> Result<()> {
    let theme = current_theme();
    let config_path = Config::config_path()?;
    let file_exists = config_path.exists();
    let content = if file_exists {
        fs::read_to_string(&config_path)?
    } else {
        String::new()
    };

    let result = migrate_config(&content)?;
    if !result.has_changes() {
        println!("{}", theme.primary_text("Config is already up to date."));
        return Ok(());
    }

    let (summary, question) = if file_exists {
        let summary = match result.sections_added.len() {
            0 => format!("Found {} missing field(s):", result.added_fields.len()),
            n => format!(
                "Found {} missing field(s) in {} new section(s):",
                result.added_fields.len(),
                n
            ),
        };
        (summary, format!("Apply these changes to {}?", config_path.display()))
    } else {
        (
            "Config file does not exist. Will create with default settings.".to_string(),
            format!("Create {}?", config_path.display()),
        )
    };

    println!("{}", theme.primary_text(&summary));
    println!();
    print_diff_preview(&result, !file_exists);
    println!();

    if !yes && !prompt_confirmation(&question)? {
        println!("{}", theme.primary_text("No changes made."));
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, &result.content)?;
    let done = if file_exists {
        "Config updated successfully."
    } else {
        "Config file created successfully."
    };
    println!("{}", theme.success_text(done));
    Ok(())
}

/// Print a diff-style preview of the config changes.
fn print_diff_preview(result: &MigrateResult, is_new_file: bool) {
    let lines = preview_lines(
        &result.content,
        &result.added_fields,
        &result.sections_added,
        is_new_file,
    );
    for line in lines {
        match line {
            PreviewLine::Added(text) => println!("{}+ {}{}", ansi::GREEN, text, ansi::RESET),
            PreviewLine::Context(text) => println!("  {}", text),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PreviewLine<'a> {
    Added(&'a str),
    Context(&'a str),
}

/// Pick the lines of `new_content` worth showing.
///
/// Added fields are shown under their section header. The header itself
/// counts as added when the whole section is new. Untouched fields are
/// left out.
fn preview_lines<'a>(
    new_content: &'a str,
    added_fields: &[String],
    sections_added: &[String],
    is_new_file: bool,
) -> Vec<PreviewLine<'a>> {
    let mut lines = Vec::new();
    let mut section = "";
    let mut pending_header: Option<&'a str> = None;
    let mut section_is_new = false;

    for line in new_content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(name) = trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            section = name;
            pending_header = Some(line);
            section_is_new = is_new_file || sections_added.iter().any(|s| s == name);
            continue;
        }

        let is_added = is_new_file
            || trimmed
                .split_once('=')
                .map(|(key, _)| format!("{}.{}", section, key.trim()))
                .is_some_and(|field| added_fields.contains(&field));
        if !is_added {
            continue;
        }
        if let Some(header) = pending_header.take() {
            lines.push(if section_is_new {
                PreviewLine::Added(header)
            } else {
                PreviewLine::Context(header)
            });
        }
        lines.push(PreviewLine::Added(line));
    }
    lines
}

/// Prompt user for yes/no confirmation.
///
/// Returns true if user confirms (y/yes), false otherwise.
/// If stdin is not a TTY (non-interactive), returns false.
fn prompt_confirmation(message: &str) -> Result<bool> {
    let theme = current_theme();

    // Check if stdin is a TTY - if not, skip prompt and return false
    if !atty::is(atty::Stream::Stdin) {
        println!(
            "{}",
            theme.secondary_text("Non-interactive mode: use --yes to apply changes automatically")
        );
        return Ok(false);
    }

    print!("{} [y/N] ", theme.primary_text(message));
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
