//! # Safetensors Header Extraction
//!
//! A `.safetensors` file starts with an 8-byte little-endian length `N`,
//! followed by `N` bytes of UTF-8 JSON, followed by the packed tensor data.
//! Model metadata lives under the header's `__metadata__` key.
//!
//! Only the header is read for validation. The tensor data region is
//! touched only when its hash is requested or the header is rewritten,
//! and then it is streamed.
//!
//! [`write_header`] produces a new file whose `__metadata__` is replaced,
//! with a fresh length prefix and the tensor data copied byte for byte.
//! Tensor entries of the header are carried over unchanged.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use modelspec_core::HashDigest;
use modelspec_schema::MetadataMap;

/// Size of the little-endian length prefix.
pub const LENGTH_PREFIX_LEN: u64 = 8;

/// Largest header accepted (100 MiB).
pub const MAX_HEADER_LEN: u64 = 100 * 1024 * 1024;

/// Header key holding free-form string metadata.
pub const METADATA_KEY: &str = "__metadata__";

/// Errors raised when a header cannot be read.
#[derive(Error, Debug)]
pub enum HeaderError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes than the length prefix or the declared header need.
    #[error("truncated file: need {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    /// Declared header length above [`MAX_HEADER_LEN`].
    #[error("header length {len} exceeds limit of {max} bytes")]
    TooLarge { len: u64, max: u64 },

    /// Header bytes are not UTF-8.
    #[error("header is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Header is not valid JSON.
    #[error("header is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Header parsed, but is not a JSON object.
    #[error("header is not a JSON object")]
    NotAnObject,

    /// `__metadata__` is present but not a JSON object.
    #[error("__metadata__ is not a JSON object")]
    MetadataNotAnObject,

    /// A rewrite was asked to overwrite its own input.
    #[error("input and output are the same file: {}", path.display())]
    SameFile { path: PathBuf },
}

/// The parts of a safetensors header the tools care about.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// `__metadata__` entries; empty for legacy files without it.
    pub metadata: MetadataMap,
    /// Whether `__metadata__` was present at all.
    pub has_metadata: bool,
    /// Number of tensor entries (every top-level key but `__metadata__`).
    pub tensor_count: usize,
    /// Byte offset where tensor data begins.
    pub data_offset: u64,
}

/// Read and parse the header of the file at `path`.
pub fn read_header(path: &Path) -> Result<Header, HeaderError> {
    let mut file = File::open(path)?;
    let (object, data_offset) = read_object(&mut file)?;
    into_header(object, data_offset)
}

/// Copy `input` to `output`, replacing the header's `__metadata__` with
/// `metadata`. Returns the header as written.
///
/// # Errors
///
/// Fails with [`HeaderError::SameFile`] if both paths name the same file,
/// and with the read errors of [`read_header`] if `input` is malformed.
pub fn write_header(
    input: &Path,
    output: &Path,
    metadata: &MetadataMap,
) -> Result<Header, HeaderError> {
    if is_same_file(input, output) {
        return Err(HeaderError::SameFile {
            path: output.to_path_buf(),
        });
    }

    let mut source = File::open(input)?;
    let (mut object, _) = read_object(&mut source)?;
    object.remove(METADATA_KEY);
    let tensor_count = object.len();
    object.insert(
        METADATA_KEY.to_string(),
        Value::Object(metadata.to_json_object()),
    );

    let json = serde_json::to_vec(&object)?;
    let header_len = json.len() as u64;
    if header_len > MAX_HEADER_LEN {
        return Err(HeaderError::TooLarge {
            len: header_len,
            max: MAX_HEADER_LEN,
        });
    }

    // `source` is positioned at the start of the tensor data.
    let mut sink = BufWriter::new(File::create(output)?);
    sink.write_all(&header_len.to_le_bytes())?;
    sink.write_all(&json)?;
    let copied = std::io::copy(&mut source, &mut sink)?;
    sink.flush()?;
    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        header_len,
        copied,
        "rewrote header"
    );

    Ok(Header {
        metadata: metadata.clone(),
        has_metadata: true,
        tensor_count,
        data_offset: LENGTH_PREFIX_LEN + header_len,
    })
}

/// Parse a header from an in-memory copy of a file (or its first bytes).
pub fn parse_header_bytes(bytes: &[u8]) -> Result<Header, HeaderError> {
    let available = bytes.len() as u64;
    let prefix: [u8; 8] = bytes
        .get(..LENGTH_PREFIX_LEN as usize)
        .and_then(|b| b.try_into().ok())
        .ok_or(HeaderError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            actual: available,
        })?;
    let header_len = u64::from_le_bytes(prefix);
    check_header_len(header_len, available)?;

    let start = LENGTH_PREFIX_LEN as usize;
    let end = start + header_len as usize;
    let object = parse_object(&bytes[start..end])?;
    into_header(object, LENGTH_PREFIX_LEN + header_len)
}

/// SHA-256 over every byte from `data_offset` to the end of the file, in
/// `0x<hex>` form.
pub fn hash_tensor_data(path: &Path, data_offset: u64) -> Result<HashDigest, HeaderError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(data_offset))?;
    let mut hasher = Sha256::new();
    let bytes = std::io::copy(&mut file, &mut hasher)?;
    tracing::debug!(path = %path.display(), bytes, "hashed tensor data");
    Ok(HashDigest::from_digest_bytes(&hasher.finalize()))
}

/// Read the length prefix and header object, leaving `file` positioned at
/// the start of the tensor data.
fn read_object(file: &mut File) -> Result<(Map<String, Value>, u64), HeaderError> {
    let file_len = file.metadata()?.len();
    if file_len < LENGTH_PREFIX_LEN {
        return Err(HeaderError::Truncated {
            expected: LENGTH_PREFIX_LEN,
            actual: file_len,
        });
    }
    let mut prefix = [0u8; 8];
    file.read_exact(&mut prefix)?;
    let header_len = u64::from_le_bytes(prefix);
    check_header_len(header_len, file_len)?;

    let mut buf = vec![0u8; header_len as usize];
    file.read_exact(&mut buf)?;
    Ok((parse_object(&buf)?, LENGTH_PREFIX_LEN + header_len))
}

fn check_header_len(header_len: u64, available: u64) -> Result<(), HeaderError> {
    if header_len > MAX_HEADER_LEN {
        return Err(HeaderError::TooLarge {
            len: header_len,
            max: MAX_HEADER_LEN,
        });
    }
    let expected = LENGTH_PREFIX_LEN + header_len;
    if expected > available {
        return Err(HeaderError::Truncated {
            expected,
            actual: available,
        });
    }
    Ok(())
}

fn parse_object(json: &[u8]) -> Result<Map<String, Value>, HeaderError> {
    let text = std::str::from_utf8(json)?;
    match serde_json::from_str::<Value>(text)? {
        Value::Object(object) => Ok(object),
        _ => Err(HeaderError::NotAnObject),
    }
}

fn into_header(mut object: Map<String, Value>, data_offset: u64) -> Result<Header, HeaderError> {
    let metadata = match object.remove(METADATA_KEY) {
        None => None,
        Some(value) => {
            Some(MetadataMap::from_json_value(value).ok_or(HeaderError::MetadataNotAnObject)?)
        }
    };

    Ok(Header {
        has_metadata: metadata.is_some(),
        metadata: metadata.unwrap_or_default(),
        tensor_count: object.len(),
        data_offset,
    })
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
