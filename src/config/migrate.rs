//! Config migration: add fields introduced since the file was written.
//!
//! Existing values, ordering and comments are preserved by editing the
//! document with `toml_edit` instead of re-serializing it.

use anyhow::{bail, Context, Result};
use toml_edit::DocumentMut;

use super::Config;

/// Outcome of a migration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateResult {
    /// The migrated document
    pub content: String,
    /// Added fields as `section.key`
    pub added_fields: Vec<String>,
    /// Sections that were missing entirely
    pub sections_added: Vec<String>,
}

impl MigrateResult {
    pub fn has_changes(&self) -> bool {
        !self.added_fields.is_empty()
    }
}

/// Add every field of the default config that `content` lacks.
pub fn migrate_config(content: &str) -> Result<MigrateResult> {
    let mut doc: DocumentMut = content.parse().context("Existing config is not valid TOML")?;
    let defaults_text = toml::to_string_pretty(&Config::default())?;
    let defaults: DocumentMut = defaults_text.parse()?;

    let mut added_fields = Vec::new();
    let mut sections_added = Vec::new();

    for (section, default_item) in defaults.iter() {
        let Some(default_table) = default_item.as_table() else {
            continue;
        };

        match doc.get_mut(section) {
            None => {
                for (key, _) in default_table.iter() {
                    added_fields.push(format!("{}.{}", section, key));
                }
                doc.insert(section, default_item.clone());
                sections_added.push(section.to_string());
            }
            Some(existing) => {
                let Some(table) = existing.as_table_mut() else {
                    bail!("'{}' must be a table", section);
                };
                for (key, value) in default_table.iter() {
                    if !table.contains_key(key) {
                        table.insert(key, value.clone());
                        added_fields.push(format!("{}.{}", section, key));
                    }
                }
            }
        }
    }

    Ok(MigrateResult {
        content: doc.to_string(),
        added_fields,
        sections_added,
    })
}
