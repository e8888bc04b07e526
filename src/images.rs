use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use std::io::Write;
use std::sync::OnceLock;
use zip::write::SimpleFileOptions;

use crate::db::{ImageKind, RecordDetail, RecordKind};
use crate::error::{AppError, Result};

static DATA_URL: OnceLock<Regex> = OnceLock::new();

fn data_url_regex() -> &'static Regex {
    DATA_URL.get_or_init(|| {
        Regex::new(r"(?s)^data:([A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+)(?:;[^,;]+=[^,;]+)*;base64,(.*)$")
            .expect("data URL pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            _ => mime_guess::get_mime_extensions_str(&self.mime)
                .and_then(|exts| exts.first().copied())
                .unwrap_or("bin"),
        }
    }
}

/// Decodes a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(value: &str) -> Option<DecodedImage> {
    let caps = data_url_regex().captures(value.trim())?;
    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = general_purpose::STANDARD.decode(payload).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(DecodedImage {
        mime: caps[1].to_ascii_lowercase(),
        bytes,
    })
}

/// `DoctorPhoto_<user>_<id>.<ext>` or `Signature_<user>_<id>.<ext>`.
pub fn download_name(record: &RecordDetail, image: ImageKind, decoded: &DecodedImage) -> String {
    let prefix = match image {
        ImageKind::Doctor => "DoctorPhoto",
        ImageKind::Signature => "Signature",
    };
    format!(
        "{}_{}_{}.{}",
        prefix,
        sanitize(&record.user_name),
        record.id,
        decoded.extension()
    )
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        "record".to_string()
    } else {
        cleaned
    }
}

pub fn bundle_name(kind: RecordKind, record: &RecordDetail) -> String {
    format!("{}_{}_{}.zip", sanitize(&record.user_name), kind, record.id)
}

/// Zip with both images (when decodable) and the outcome text.
pub fn build_bundle(kind: RecordKind, record: &RecordDetail) -> Result<Vec<u8>> {
    let mut zip_data = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_data));
        let options = SimpleFileOptions::default().unix_permissions(0o644);

        for image in [ImageKind::Doctor, ImageKind::Signature] {
            if let Some(decoded) = decode_data_url(record.image(image)) {
                let name = format!("{}.{}", image.as_str(), decoded.extension());
                zip.start_file(name, options).map_err(zip_error)?;
                zip.write_all(&decoded.bytes)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
            }
        }

        let text_name = match kind {
            RecordKind::Success => "analysis.txt",
            RecordKind::Failure => "error.txt",
        };
        zip.start_file(text_name, options).map_err(zip_error)?;
        zip.write_all(record.outcome_text.as_bytes())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        zip.finish().map_err(zip_error)?;
    }
    Ok(zip_data)
}

fn zip_error(err: zip::result::ZipError) -> AppError {
    AppError::Internal(format!("zip error: {}", err))
}
