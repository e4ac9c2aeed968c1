//! GLB container decoding.
//!
//! A GLB file is a 12 byte header followed by a JSON chunk and a binary
//! chunk, all little-endian:
//!
//! ```text
//! magic "glTF" | version 2 | total length
//! chunk0 length | "JSON" | UTF-8 scene description
//! chunk1 length | "BIN\0" | raw accessor / image bytes
//! ```
//!
//! [`GlbContainer::decode`] validates that layout in a single pass and hands
//! out the typed [`schema::Document`] plus a [`RawBuffer`] over the binary
//! chunk. The raw buffer shares the input allocation instead of copying it.

pub mod schema;

use std::{ops::Range, sync::Arc};

use crate::error::{LoadError, Result};
use schema::Document;

pub const GLB_MAGIC: u32 = 0x46546C67;
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F534A;
pub const CHUNK_BIN: u32 = 0x004E4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Immutable byte region backing the binary chunk.
///
/// Cloning is cheap: all clones share the decoded file's allocation.
#[derive(Clone, Debug)]
pub struct RawBuffer {
    bytes: Arc<[u8]>,
    range: Range<usize>,
}

impl RawBuffer {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let range = 0..bytes.len();
        Self { bytes, range }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Byte range of this buffer inside the original file.
    pub fn file_range(&self) -> Range<usize> {
        self.range.clone()
    }
}

/// A decoded GLB file: the typed scene description and the binary chunk.
#[derive(Debug)]
pub struct GlbContainer {
    pub document: Document,
    /// The raw JSON text, kept for diagnostics and re-serialisation.
    pub json: String,
    pub bin: RawBuffer,
}

impl GlbContainer {
    pub fn decode(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data: Arc<[u8]> = data.into();
        if data.len() < HEADER_LEN + CHUNK_HEADER_LEN {
            return Err(LoadError::Format(format!(
                "file is {} bytes, too small for a GLB header",
                data.len()
            )));
        }

        let magic = read_u32(&data, 0);
        if magic != GLB_MAGIC {
            return Err(LoadError::Format(format!(
                "bad magic {magic:#010x}, expected {GLB_MAGIC:#010x}"
            )));
        }
        let version = read_u32(&data, 4);
        if version != GLB_VERSION {
            return Err(LoadError::Format(format!(
                "unsupported GLB version {version}"
            )));
        }
        let total = read_u32(&data, 8) as usize;
        if total > data.len() {
            return Err(LoadError::Format(format!(
                "header declares {total} bytes but only {} are present",
                data.len()
            )));
        }

        let (json_type, json_range) = read_chunk(&data, HEADER_LEN, total)?;
        if json_type != CHUNK_JSON {
            return Err(LoadError::Format(format!(
                "first chunk must be the JSON chunk, found type {json_type:#010x}"
            )));
        }
        let json = std::str::from_utf8(&data[json_range.clone()])
            .map_err(|e| LoadError::Format(format!("JSON chunk is not UTF-8: {e}")))?
            .to_owned();
        let document = Document::from_slice(json.as_bytes())?;

        let bin = if json_range.end + CHUNK_HEADER_LEN <= total {
            let (bin_type, bin_range) = read_chunk(&data, json_range.end, total)?;
            if bin_type != CHUNK_BIN {
                return Err(LoadError::Format(format!(
                    "second chunk must be the BIN chunk, found type {bin_type:#010x}"
                )));
            }
            RawBuffer {
                bytes: data.clone(),
                range: bin_range,
            }
        } else {
            RawBuffer::empty()
        };

        Ok(Self {
            document,
            json,
            bin,
        })
    }
}

/// Reads the chunk header at `offset` and returns its type and data range.
fn read_chunk(data: &[u8], offset: usize, total: usize) -> Result<(u32, Range<usize>)> {
    if offset + CHUNK_HEADER_LEN > total {
        return Err(LoadError::Format(format!(
            "chunk header at byte {offset} runs past the end of the file"
        )));
    }
    let len = read_u32(data, offset) as usize;
    let kind = read_u32(data, offset + 4);
    let start = offset + CHUNK_HEADER_LEN;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= total)
        .ok_or_else(|| {
            LoadError::Format(format!(
                "chunk at byte {offset} declares {len} bytes, past the end of the file"
            ))
        })?;
    Ok((kind, start..end))
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Packs a JSON description and a binary blob into a GLB container.
///
/// Chunks are padded to 4 bytes: JSON with spaces, binary data with zeros.
pub fn write_glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let json_len = json.len().next_multiple_of(4);
    let bin_len = bin.len().next_multiple_of(4);
    let mut total = HEADER_LEN + CHUNK_HEADER_LEN + json_len;
    if !bin.is_empty() {
        total += CHUNK_HEADER_LEN + bin_len;
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(HEADER_LEN + CHUNK_HEADER_LEN + json_len, b' ');

    if !bin.is_empty() {
        out.extend_from_slice(&(bin_len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(total, 0);
    }
    out
}
