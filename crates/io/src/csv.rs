// CSV export of leads

use std::fmt;
use std::path::Path;

use leadgen_core::Lead;

/// File name used when no path is given.
pub const CSV_FILE_NAME: &str = "leads.csv";

pub const HEADERS: [&str; 9] = [
    "Name",
    "Category",
    "Address",
    "Phone",
    "Website",
    "Rating",
    "Reviews Count",
    "Opening Hours",
    "Status",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// The lead list is empty.
    NothingToExport,
    Io(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NothingToExport => write!(f, "nothing to export: the lead list is empty"),
            ExportError::Io(e) => write!(f, "export failed: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

/// Render leads as CSV text.
///
/// Text columns are always quoted (inner quotes doubled, missing values as
/// `""`); rating, review count and status are written bare. Rows are joined
/// with `\n` and there is no trailing newline.
pub fn to_csv(leads: &[Lead]) -> Result<String, ExportError> {
    if leads.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    // Quoting differs per column, so fields arrive already quoted
    let mut writer = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Never)
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(HEADERS)
        .map_err(|e| ExportError::Io(e.to_string()))?;

    for lead in leads {
        let record = [
            quoted(Some(&lead.name)),
            quoted(lead.category.as_deref()),
            quoted(Some(&lead.address)),
            quoted(lead.phone.as_deref()),
            quoted(lead.website.as_deref()),
            lead.rating.map(|r| r.to_string()).unwrap_or_default(),
            lead.reviews_count.map(|n| n.to_string()).unwrap_or_default(),
            quoted(lead.opening_hours.as_deref()),
            lead.status.as_str().to_string(),
        ];
        writer
            .write_record(&record)
            .map_err(|e| ExportError::Io(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| ExportError::Io(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Write leads to `path` as UTF-8 CSV.
pub fn export(leads: &[Lead], path: &Path) -> Result<(), ExportError> {
    let text = to_csv(leads)?;
    std::fs::write(path, text).map_err(|e| ExportError::Io(format!("{}: {}", path.display(), e)))?;
    log::info!("exported {} leads to {}", leads.len(), path.display());
    Ok(())
}

fn quoted(value: Option<&str>) -> String {
    format!("\"{}\"", value.unwrap_or("").replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadgen_core::{decorate, LeadStatus, RawLead};
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> Vec<Lead> {
        let mut leads = decorate(vec![
            RawLead {
                name: "The \"Blue\" Door".into(),
                category: Some("Cafe".into()),
                address: "1 Main St, Springfield".into(),
                phone: Some("+1 555 0100".into()),
                website: Some("bluedoor.example".into()),
                rating: Some(4.5),
                reviews_count: Some(120),
                opening_hours: Some("Mon-Fri 8-18".into()),
                ..Default::default()
            },
            RawLead {
                name: "Bare".into(),
                address: "2 Side St".into(),
                ..Default::default()
            },
        ]);
        leads[1].status = LeadStatus::NotInterested;
        leads
    }

    #[test]
    fn test_empty_is_nothing_to_export() {
        assert_eq!(to_csv(&[]), Err(ExportError::NothingToExport));
    }

    #[test]
    fn test_header_and_rows() {
        let text = to_csv(&sample()).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Name,Category,Address,Phone,Website,Rating,Reviews Count,Opening Hours,Status"
        );
        assert_eq!(
            lines[1],
            r#""The ""Blue"" Door","Cafe","1 Main St, Springfield","+1 555 0100","bluedoor.example",4.5,120,"Mon-Fri 8-18",New"#
        );
        assert_eq!(lines[2], r#""Bare","","2 Side St","","",,,"",Not Interested"#);
    }

    #[test]
    fn test_output_reads_back_with_csv_reader() {
        let text = to_csv(&sample()).unwrap();
        let mut reader = ::csv::Reader::from_reader(text.as_bytes());
        let rows: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "The \"Blue\" Door");
        assert_eq!(&rows[0][2], "1 Main St, Springfield");
        assert_eq!(&rows[1][5], "");
        assert_eq!(&rows[1][8], "Not Interested");
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        export(&sample(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Name,Category"));
        assert!(!content.ends_with('\n'));
    }

    #[test]
    fn test_export_empty_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        assert_eq!(export(&[], &path), Err(ExportError::NothingToExport));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_bad_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join(CSV_FILE_NAME);
        assert!(matches!(export(&sample(), &path), Err(ExportError::Io(_))));
    }
}
