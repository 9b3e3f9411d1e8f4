//! `SafeTensors` container for integer tensors.
//!
//! Implements the `SafeTensors` format:
//! ```text
//! [8-byte header: u64 metadata length (little-endian)]
//! [JSON metadata: tensor names, dtypes, shapes, data_offsets, __metadata__]
//! [Raw tensor data: little-endian values]
//! ```
//!
//! Only the dtypes error maps need are encoded here (`U32`, `U64`), so the
//! files open in any `SafeTensors` reader.

use crate::dtype::DType;
use crate::error::{InjectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Metadata for a single tensor in `SafeTensors` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorMetadata {
    /// Data type of the tensor (e.g., "U32").
    pub dtype: String,
    /// Shape of the tensor (e.g., `[n]`).
    pub shape: Vec<usize>,
    /// Data offsets `[start, end]` in the raw data section.
    pub data_offsets: [usize; 2],
}

/// Tensor metadata keyed by name.
/// Uses `BTreeMap` for deterministic JSON serialization (sorted keys).
pub type SafeTensorsMetadata = BTreeMap<String, TensorMetadata>;

/// User metadata from the `__metadata__` header section.
pub type UserMetadata = BTreeMap<String, String>;

/// A tensor ready to be written: dtype, shape and little-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTensor {
    /// Element dtype
    pub dtype: DType,
    /// Tensor shape
    pub shape: Vec<usize>,
    /// Little-endian element bytes
    pub bytes: Vec<u8>,
}

impl RawTensor {
    /// 1-D `U32` tensor.
    #[must_use]
    pub fn from_u32(values: &[u32]) -> Self {
        Self {
            dtype: DType::U32,
            shape: vec![values.len()],
            bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    /// 1-D `U64` tensor.
    #[must_use]
    pub fn from_u64(values: &[u64]) -> Self {
        Self {
            dtype: DType::U64,
            shape: vec![values.len()],
            bytes: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

/// Serialize tensors and user metadata into `SafeTensors` bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_safetensors_bytes(
    tensors: &BTreeMap<String, RawTensor>,
    user_metadata: &UserMetadata,
) -> Result<Vec<u8>> {
    let mut header = serde_json::Map::new();

    if !user_metadata.is_empty() {
        let meta_obj: serde_json::Map<String, serde_json::Value> = user_metadata
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        header.insert(
            "__metadata__".to_string(),
            serde_json::Value::Object(meta_obj),
        );
    }

    let mut raw_data = Vec::new();
    let mut current_offset = 0;

    for (name, tensor) in tensors {
        let start_offset = current_offset;
        let end_offset = current_offset + tensor.bytes.len();

        let tensor_meta = TensorMetadata {
            dtype: tensor.dtype.as_str().to_string(),
            shape: tensor.shape.clone(),
            data_offsets: [start_offset, end_offset],
        };
        header.insert(name.clone(), serde_json::to_value(tensor_meta)?);

        raw_data.extend_from_slice(&tensor.bytes);
        current_offset = end_offset;
    }

    let metadata_json = serde_json::to_string(&header)?;
    let metadata_bytes = metadata_json.as_bytes();
    let metadata_len = metadata_bytes.len() as u64;

    let mut output = Vec::with_capacity(8 + metadata_bytes.len() + raw_data.len());
    output.extend_from_slice(&metadata_len.to_le_bytes());
    output.extend_from_slice(metadata_bytes);
    output.extend_from_slice(&raw_data);
    Ok(output)
}

/// Saves tensors to a `SafeTensors` file.
///
/// # Errors
///
/// Returns an error if JSON serialization or the file write fails.
pub fn save_safetensors<P: AsRef<Path>>(
    path: P,
    tensors: &BTreeMap<String, RawTensor>,
    user_metadata: &UserMetadata,
) -> Result<()> {
    let output = to_safetensors_bytes(tensors, user_metadata)?;
    fs::write(path, output)?;
    Ok(())
}

/// A parsed `SafeTensors` file held in memory.
#[derive(Debug, Clone)]
pub struct SafeTensors {
    metadata: SafeTensorsMetadata,
    user_metadata: UserMetadata,
    raw_data: Vec<u8>,
}

impl SafeTensors {
    /// Parse `SafeTensors` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Format`] if the header is truncated or the
    /// metadata is not valid JSON.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let metadata_len = validate_and_read_header(bytes)?;
        let (metadata, user_metadata) = parse_metadata(bytes, metadata_len)?;
        let raw_data = bytes[8 + metadata_len..].to_vec();
        Ok(Self {
            metadata,
            user_metadata,
            raw_data,
        })
    }

    /// Read and parse a `SafeTensors` file.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Io`] if the file cannot be read, or a format
    /// error as for [`SafeTensors::from_bytes`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Tensor metadata by name.
    #[must_use]
    pub fn get_metadata(&self, name: &str) -> Option<&TensorMetadata> {
        self.metadata.get(name)
    }

    /// All tensor names, sorted.
    #[must_use]
    pub fn tensor_names(&self) -> Vec<&str> {
        self.metadata.keys().map(String::as_str).collect()
    }

    /// User metadata from the `__metadata__` section.
    #[must_use]
    pub fn user_metadata(&self) -> &UserMetadata {
        &self.user_metadata
    }

    /// Extract a `U32` tensor.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Format`] if the tensor is missing, has another
    /// dtype or its offsets are invalid.
    pub fn get_u32(&self, name: &str) -> Result<Vec<u32>> {
        let bytes = self.tensor_bytes(name, DType::U32)?;
        extract_u32(bytes)
    }

    /// Extract a `U64` tensor.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::Format`] if the tensor is missing, has another
    /// dtype or its offsets are invalid.
    pub fn get_u64(&self, name: &str) -> Result<Vec<u64>> {
        let bytes = self.tensor_bytes(name, DType::U64)?;
        extract_u64(bytes)
    }

    fn tensor_bytes(&self, name: &str, dtype: DType) -> Result<&[u8]> {
        let meta = self
            .metadata
            .get(name)
            .ok_or_else(|| InjectError::format(format!("Tensor '{name}' not found")))?;

        if meta.dtype != dtype.as_str() {
            return Err(InjectError::format(format!(
                "Tensor '{name}' has dtype {}, expected {dtype}",
                meta.dtype
            )));
        }

        let [start, end] = meta.data_offsets;
        if start > end || end > self.raw_data.len() {
            return Err(InjectError::format(format!(
                "Tensor '{name}' data out of bounds: [{start}, {end}) with {} data bytes",
                self.raw_data.len()
            )));
        }

        let expected_bytes = meta
            .shape
            .iter()
            .try_fold(dtype.bytes_per_element(), |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                InjectError::format(format!(
                    "Tensor '{name}' shape {:?} overflows the addressable size",
                    meta.shape
                ))
            })?;
        if expected_bytes != end - start {
            return Err(InjectError::format(format!(
                "Tensor '{name}' shape {:?} does not match {} data bytes",
                meta.shape,
                end - start
            )));
        }

        Ok(&self.raw_data[start..end])
    }
}

#[path = "safetensors_reader.rs"]
mod reader;
use reader::{extract_u32, extract_u64, parse_metadata, validate_and_read_header};

#[cfg(test)]
#[path = "safetensors_tests.rs"]
mod tests;
