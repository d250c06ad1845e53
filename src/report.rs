//! Operator-facing report output: markdown title listings and CSV dumps.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Basic newspaper metadata, one row of the titles report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewspaperTitle {
    pub id: String,
    pub title: String,
    pub start_year: i32,
    pub end_year: i32,
}

/// Metadata page for one newspaper on the project host.
#[must_use]
pub fn metadata_url(host: &str, id: &str) -> String {
    format!("https://{host}/app/newspapers/{id}/metadata")
}

/// Render the newspaper list as markdown bullet lines with metadata links,
/// the format pasted into release checklists.
#[must_use]
pub fn titles_markdown(host: &str, titles: &[NewspaperTitle]) -> String {
    let mut out = String::new();
    for t in titles {
        let _ = writeln!(
            out,
            "- [{} ({}-{})]({})",
            t.title,
            t.start_year,
            t.end_year,
            metadata_url(host, &t.id)
        );
    }
    out
}

/// Write serializable rows as a headered CSV file; returns the row count.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(rows.len())
}

/// Read a headered CSV file into typed rows.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row fails to parse.
pub fn read_csv<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, row) in reader.deserialize().enumerate() {
        let row: T = row.with_context(|| format!("parse row {} of {}", idx + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_titles() -> Vec<NewspaperTitle> {
        vec![
            NewspaperTitle {
                id: "GDL".to_string(),
                title: "Gazette de Lausanne".to_string(),
                start_year: 1798,
                end_year: 1998,
            },
            NewspaperTitle {
                id: "JDG".to_string(),
                title: "Journal de Genève".to_string(),
                start_year: 1826,
                end_year: 1998,
            },
        ]
    }

    #[test]
    fn markdown_uses_fixed_url_template() {
        let md = titles_markdown("impresso-project.ch", &sample_titles());
        assert!(md.contains(
            "- [Gazette de Lausanne (1798-1998)]\
             (https://impresso-project.ch/app/newspapers/GDL/metadata)"
        ));
        assert_eq!(md.lines().count(), 2);
    }

    #[test]
    fn csv_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("titles.csv");
        let titles = sample_titles();

        assert_eq!(write_csv(&path, &titles).unwrap(), 2);
        let back: Vec<NewspaperTitle> = read_csv(&path).unwrap();
        assert_eq!(back, titles);
    }
}
