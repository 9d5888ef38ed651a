use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::error::{CoreError, CoreErrorCode};

use super::{Dataset, parse_dataset};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_GZIP: &str = "application/gzip";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Raw dataset bytes plus the content type they were served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl DatasetPayload {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    fn declares_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(CONTENT_TYPE_JSON))
    }
}

pub trait DatasetProvider {
    fn fetch(&self) -> Result<DatasetPayload, CoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDatasetProvider {
    path: PathBuf,
}

impl FileDatasetProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetProvider for FileDatasetProvider {
    fn fetch(&self) -> Result<DatasetPayload, CoreError> {
        let bytes = fs::read(&self.path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read dataset {}: {e}", self.path.display()),
            )
        })?;
        let is_json = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let content_type = if is_json {
            CONTENT_TYPE_JSON
        } else {
            CONTENT_TYPE_GZIP
        };
        Ok(DatasetPayload::new(bytes, Some(content_type.to_string())))
    }
}

/// Parses a JSON payload directly, or gunzips anything not declared as JSON.
///
/// A payload declared as JSON that fails to parse gets one gunzip attempt
/// before the load is reported as failed.
pub fn decode_payload(payload: &DatasetPayload) -> Result<Value, CoreError> {
    if payload.declares_json() {
        return match serde_json::from_slice(&payload.bytes) {
            Ok(value) => Ok(value),
            Err(json_err) => gunzip_json(&payload.bytes).map_err(|gz_err| {
                CoreError::new(
                    CoreErrorCode::Parse,
                    format!("dataset is not valid JSON ({json_err}); gzip retry failed: {gz_err}"),
                )
            }),
        };
    }

    if !payload.bytes.starts_with(&GZIP_MAGIC)
        && let Ok(value) = serde_json::from_slice(&payload.bytes)
    {
        return Ok(value);
    }
    gunzip_json(&payload.bytes)
}

fn gunzip_json(bytes: &[u8]) -> Result<Value, CoreError> {
    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|e| CoreError::new(CoreErrorCode::Decode, format!("failed to gunzip dataset: {e}")))?;
    serde_json::from_str(&text).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("decompressed dataset is not valid JSON: {e}"),
        )
    })
}

pub fn load_dataset(provider: &dyn DatasetProvider) -> Result<Dataset, CoreError> {
    let payload = provider.fetch()?;
    let raw = decode_payload(&payload)?;
    Ok(parse_dataset(raw))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::{CONTENT_TYPE_JSON, DatasetPayload, decode_payload};
    use crate::error::CoreErrorCode;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).expect("gzip encode should write");
        encoder.finish().expect("gzip encode should finish")
    }

    #[test]
    fn json_content_type_is_parsed_directly() {
        let payload = DatasetPayload::new(
            br#"{"items":{}}"#.to_vec(),
            Some("application/json; charset=utf-8".to_string()),
        );
        let value = decode_payload(&payload).expect("json payload should decode");
        assert!(value.get("items").is_some());
    }

    #[test]
    fn other_content_types_are_gunzipped() {
        let payload = DatasetPayload::new(
            gzip(br#"{"skill":{}}"#),
            Some("application/octet-stream".to_string()),
        );
        let value = decode_payload(&payload).expect("gzip payload should decode");
        assert!(value.get("skill").is_some());
    }

    #[test]
    fn mislabelled_gzip_is_retried() {
        let payload = DatasetPayload::new(gzip(b"[]"), Some(CONTENT_TYPE_JSON.to_string()));
        let value = decode_payload(&payload).expect("retry should recover");
        assert!(value.is_array());
    }

    #[test]
    fn garbage_is_a_load_failure() {
        let payload = DatasetPayload::new(b"\x1f\x8bnope".to_vec(), None);
        let err = decode_payload(&payload).expect_err("garbage should fail");
        assert_eq!(err.code, CoreErrorCode::Decode);
    }
}
