use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::path::Path;

/// Data file written by every stage.
pub const PART_FILE: &str = "part-r-00000";
/// Empty marker written once the data file is complete.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

pub fn join_path(dir: &str, file: &str) -> String {
    Path::new(dir).join(file).to_string_lossy().into_owned()
}

/// Reads a text input and splits it into lines (`\n` or `\r\n`).
pub async fn read_lines<S: Storage>(storage: &S, path: &str) -> Result<Vec<String>> {
    let bytes = storage.read_file(path).await?;
    let text = String::from_utf8(bytes).map_err(|_| EtlError::EncodingError {
        path: path.to_string(),
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Refuses to reuse a completed output directory unless `overwrite` is set;
/// otherwise clears any stale success marker.
pub async fn prepare_output_dir<S: Storage>(storage: &S, dir: &str, overwrite: bool) -> Result<()> {
    let marker = join_path(dir, SUCCESS_MARKER);
    if storage.exists(&marker).await? {
        if !overwrite {
            return Err(EtlError::OutputExistsError {
                path: dir.to_string(),
            });
        }
        tracing::debug!("Clearing previous success marker in {}", dir);
        storage.remove_file(&marker).await?;
    }
    Ok(())
}

/// Writes `rows` as tab-separated text, then the success marker.
/// Returns the path of the data file.
pub async fn write_stage_output<S: Storage>(
    storage: &S,
    dir: &str,
    rows: &[Vec<String>],
) -> Result<String> {
    let marker = join_path(dir, SUCCESS_MARKER);
    storage.remove_file(&marker).await?;

    let data_path = join_path(dir, PART_FILE);
    let data = encode_tsv(rows)?;
    tracing::debug!("Writing {} rows ({} bytes) to {}", rows.len(), data.len(), data_path);
    storage.write_file(&data_path, &data).await?;

    storage.write_file(&marker, &[]).await?;
    Ok(data_path)
}

pub fn encode_tsv(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
