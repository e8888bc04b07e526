use chrono::{DateTime, Local, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::admin;
use crate::db::{FailureSummary, RecordKind, RecordStore, SuccessSummary};
use crate::error::{AppError, Result};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 6] = [
    "ID",
    "User Name",
    "Analysis Text",
    "Created At",
    "User IP",
    "Error (If any)",
];
const NOT_AVAILABLE: &str = "N/A";

/// One spreadsheet row, built from either list projection.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub id: i64,
    pub user_name: String,
    pub analysis_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_ip: String,
    pub error_message: Option<String>,
}

impl From<SuccessSummary> for ExportRow {
    fn from(row: SuccessSummary) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            analysis_text: Some(row.analysis_text),
            created_at: row.created_at,
            user_ip: row.user_ip,
            error_message: None,
        }
    }
}

impl From<FailureSummary> for ExportRow {
    fn from(row: FailureSummary) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            analysis_text: None,
            created_at: row.created_at,
            user_ip: row.user_ip,
            error_message: Some(row.error_message),
        }
    }
}

/// Image-free rows of one table, newest first. An empty table is a 404.
pub async fn rows(store: &dyn RecordStore, kind: RecordKind) -> Result<Vec<ExportRow>> {
    let rows: Vec<ExportRow> = match kind {
        RecordKind::Success => admin::list_success(store)
            .await?
            .into_iter()
            .map(ExportRow::from)
            .collect(),
        RecordKind::Failure => admin::list_failure(store)
            .await?
            .into_iter()
            .map(ExportRow::from)
            .collect(),
    };
    if rows.is_empty() {
        return Err(AppError::NotFound("No data to export".to_string()));
    }
    Ok(rows)
}

fn text_or_na(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => NOT_AVAILABLE,
    }
}

/// Single `Data` sheet: a bold header row, then one row per record.
pub fn workbook(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Data").map_err(xlsx_error)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx_error)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        let created_at = row
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        sheet.write_number(r, 0, row.id as f64).map_err(xlsx_error)?;
        sheet.write_string(r, 1, &row.user_name).map_err(xlsx_error)?;
        sheet
            .write_string(r, 2, text_or_na(&row.analysis_text))
            .map_err(xlsx_error)?;
        sheet.write_string(r, 3, &created_at).map_err(xlsx_error)?;
        sheet.write_string(r, 4, &row.user_ip).map_err(xlsx_error)?;
        sheet
            .write_string(r, 5, text_or_na(&row.error_message))
            .map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

pub fn file_name(kind: RecordKind) -> String {
    let prefix = match kind {
        RecordKind::Success => "Signature_Success",
        RecordKind::Failure => "Signature_Failure",
    };
    format!("{}_{}.xlsx", prefix, Utc::now().timestamp_millis())
}

fn xlsx_error(err: XlsxError) -> AppError {
    AppError::Internal(format!("xlsx error: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::NewRecord;
    use std::io::Read;

    fn record(name: &str) -> NewRecord {
        NewRecord {
            user_ip: "10.0.0.1".to_string(),
            user_agent: None,
            user_name: name.to_string(),
            original_image: "data:image/png;base64,c2ln".to_string(),
            doctor_image: "data:image/jpeg;base64,ZG9j".to_string(),
        }
    }

    fn shared_strings(bytes: Vec<u8>) -> String {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("xl/sharedStrings.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[tokio::test]
    async fn failure_export_lists_columns_in_order() {
        let store = MemoryStore::new();
        store.insert_failure(&record("Dr. A"), "rate limited").await.unwrap();

        let rows = rows(&store, RecordKind::Failure).await.unwrap();
        let xml = shared_strings(workbook(&rows).unwrap());

        let positions: Vec<usize> = HEADERS
            .iter()
            .map(|h| xml.find(&format!(">{}<", h)).unwrap_or_else(|| panic!("missing {}", h)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(xml.contains(">Dr. A<"));
        assert!(xml.contains(">rate limited<"));
        assert!(xml.contains(">10.0.0.1<"));
        // failure rows have no analysis text
        assert!(xml.contains(">N/A<"));
        assert!(!xml.contains("base64"));
    }

    #[tokio::test]
    async fn success_export_carries_analysis_text() {
        let store = MemoryStore::new();
        store.insert_success(&record("Dr. B"), "Confident strokes").await.unwrap();

        let rows = rows(&store, RecordKind::Success).await.unwrap();
        assert_eq!(rows[0].error_message, None);
        let xml = shared_strings(workbook(&rows).unwrap());
        assert!(xml.contains(">Confident strokes<"));
        assert!(xml.contains(">Dr. B<"));
    }

    #[tokio::test]
    async fn empty_table_has_nothing_to_export() {
        let store = MemoryStore::new();
        let result = rows(&store, RecordKind::Success).await;
        assert!(matches!(result, Err(AppError::NotFound(m)) if m == "No data to export"));
    }

    #[test]
    fn file_names_follow_table() {
        assert!(file_name(RecordKind::Success).starts_with("Signature_Success_"));
        assert!(file_name(RecordKind::Failure).ends_with(".xlsx"));
    }
}
