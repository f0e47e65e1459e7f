use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::input::sheet::SheetGrid;
use crate::model::profile::ProfileFile;

pub mod sheet;
pub mod spreadsheetml;
pub mod table;
pub mod xlsx;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("xml error at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("xlsx archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(path.display().to_string()));
    }
    let file = BufReader::new(File::open(path)?);
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Reads a whole input file as text. Instrument exports are not always
/// UTF-8 (Latin-1 degree signs are common), so invalid sequences are replaced
/// rather than rejected.
pub fn read_text(path: &Path) -> Result<String, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Design workbooks: `.xlsx`/`.xlsm` are Office Open XML, anything else is
/// read as Excel 2003 XML.
pub fn load_design_sheet(path: &Path) -> Result<SheetGrid, InputError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("xlsx" | "xlsm") => xlsx::load_xlsx(path),
        _ => spreadsheetml::load_spreadsheetml(path),
    }
}

pub fn load_profile_file(path: &Path) -> Result<ProfileFile, InputError> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .map_err(|e| InputError::Parse(format!("profile {}: {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
