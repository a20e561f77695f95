use std::io::Write;
use std::path::{Path, PathBuf};

use crate::CliError;

/// Open the output destination (file or stdout). Returns the writer and a
/// label for log messages.
pub fn open(out: Option<&Path>) -> Result<(Box<dyn Write>, String), CliError> {
    match out {
        Some(path) => {
            let f = std::fs::File::create(path)
                .map_err(|e| CliError::io(format!("cannot create {}: {}", path.display(), e)))?;
            Ok((Box::new(std::io::BufWriter::new(f)), path.display().to_string()))
        }
        None => Ok((
            Box::new(std::io::BufWriter::new(std::io::stdout().lock())),
            "stdout".to_string(),
        )),
    }
}

/// Write a string to the output destination.
pub fn write_text(out: Option<&PathBuf>, text: &str) -> Result<String, CliError> {
    let (mut writer, label) = open(out.map(PathBuf::as_path))?;
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| CliError::io(format!("write error ({label}): {e}")))?;
    Ok(label)
}
