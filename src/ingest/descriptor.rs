//! Flattens a directory of GeMaps descriptor files into one wide table keyed by file id.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::arff::{parse_arff, ArffValue};
use super::{scan_dir, ScanOrder};

const DESCRIPTOR_EXTENSION: &str = ".arff";

lazy_static! {
    // A digit run plus one trailing character outside {m, 4, a}; the trailing
    // character is dropped afterwards.
    static ref FILE_ID: Regex = Regex::new(r"\d+[^m4a]").unwrap();
}

/// Numeric file id embedded in a descriptor file name.
pub fn extract_file_id(file_name: &str) -> Option<String> {
    let matched = FILE_ID.find(file_name)?.as_str();
    let mut id = matched.to_string();
    id.pop();
    Some(id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorRow {
    pub file_id: String,
    /// One value per table column
    pub values: Vec<ArffValue>,
}

/// Wide descriptor table; the column schema comes from the first accepted file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorTable {
    pub columns: Vec<String>,
    pub rows: Vec<DescriptorRow>,
}

impl DescriptorTable {
    pub fn load_dir(dir: &Path, order: ScanOrder) -> Result<Self> {
        let entries = scan_dir(dir, order)?;
        info!(dir = %dir.display(), entries = entries.len(), "scanning descriptor directory");
        let mut table = Self::default();
        for (name, path) in entries {
            if !name.ends_with(DESCRIPTOR_EXTENSION) || !path.is_file() {
                debug!(file = %name, "skipping non-descriptor entry");
                continue;
            }
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read descriptor file {:?}", path))?;
            table.push_file(&name, &text);
        }
        info!(rows = table.rows.len(), columns = table.columns.len(), "descriptor table loaded");
        Ok(table)
    }

    /// Parse one descriptor file and append its first data row. Returns whether
    /// the file was accepted.
    pub fn push_file(&mut self, name: &str, text: &str) -> bool {
        let Some(file_id) = extract_file_id(name) else {
            warn!(file = name, "skipping descriptor without a file id");
            return false;
        };
        let document = match parse_arff(text) {
            Ok(document) => document,
            Err(err) => {
                warn!(file = name, error = %err, "skipping unparseable descriptor");
                return false;
            }
        };
        let Some(values) = document.data.into_iter().next() else {
            warn!(file = name, "skipping descriptor without data rows");
            return false;
        };

        let names: Vec<String> = document
            .attributes
            .into_iter()
            .map(|attribute| attribute.name)
            .collect();
        if self.columns.is_empty() && self.rows.is_empty() {
            self.columns = names;
        } else if names != self.columns {
            warn!(file = name, "skipping descriptor with a different attribute list");
            return false;
        }
        self.rows.push(DescriptorRow { file_id, values });
        true
    }

    pub fn get(&self, file_id: &str) -> Option<&DescriptorRow> {
        self.rows.iter().find(|row| row.file_id == file_id)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Numeric view of one column; non-numeric and missing cells are `None`.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.values[index].as_f64()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "@relation r\n@attribute name string\n@attribute jitter numeric\n@data\n'unknown',0.02\n'unknown',0.5\n";

    #[test]
    fn extracts_digits_before_media_suffix() {
        assert_eq!(
            extract_file_id("5390718.m4a_gemaps.arff").as_deref(),
            Some("5390718")
        );
        assert_eq!(extract_file_id("voice_42_features.arff").as_deref(), Some("42"));
        assert_eq!(extract_file_id("no-digits.arff"), None);
    }

    #[test]
    fn digits_followed_by_media_letters_backtrack() {
        // "123" is followed by 'm', so the run gives its last digit back.
        assert_eq!(extract_file_id("123m.arff").as_deref(), Some("12"));
    }

    #[test]
    fn keeps_first_data_row_per_file() {
        let mut table = DescriptorTable::default();
        assert!(table.push_file("100.m4a.arff", DOC));
        assert_eq!(table.columns, vec!["name", "jitter"]);
        assert_eq!(table.column("jitter"), Some(vec![Some(0.02)]));
        assert_eq!(table.column("name"), Some(vec![None]));
        assert!(table.get("100").is_some());
    }

    #[test]
    fn rejects_schema_drift() {
        let mut table = DescriptorTable::default();
        assert!(table.push_file("100.m4a.arff", DOC));
        let drifted = "@attribute shimmer numeric\n@data\n0.1\n";
        assert!(!table.push_file("101.m4a.arff", drifted));
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn skips_documents_without_rows() {
        let mut table = DescriptorTable::default();
        assert!(!table.push_file("100.m4a.arff", "@attribute x numeric\n@data\n"));
        assert!(table.columns.is_empty());
    }
}
