//! Error map files.
//!
//! Dense maps are stored as one `U32` tensor named `error_map`. Sparse maps
//! are stored as a `U64` `indices` tensor plus a `U32` `values` tensor. The
//! `__metadata__` section records the encoding, logical length and bit width.

use super::safetensors::{save_safetensors, RawTensor, SafeTensors, UserMetadata};
use crate::error::{InjectError, Result};
use crate::errormap::{ErrorMap, SparseErrorMap};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Value of the `format` metadata key.
pub const FORMAT_TAG: &str = "bitflip-errormap";

/// Largest logical map length accepted from a file.
///
/// Sparse files state their dense length in metadata, so it is bounded
/// before anything is allocated.
pub const MAX_MAP_LEN: usize = u32::MAX as usize;

const DENSE_TENSOR: &str = "error_map";
const INDICES_TENSOR: &str = "indices";
const VALUES_TENSOR: &str = "values";

/// On-disk encoding of an error map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEncoding {
    /// Every word stored
    Dense,
    /// Coordinate encoding of non-zero words
    SparseCoo,
}

impl MapEncoding {
    /// Metadata string for this encoding.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::SparseCoo => "sparse_coo",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "dense" => Ok(Self::Dense),
            "sparse_coo" => Ok(Self::SparseCoo),
            other => Err(InjectError::format(format!("unknown encoding '{other}'"))),
        }
    }

    fn from_flag(sparse: bool) -> Self {
        if sparse {
            Self::SparseCoo
        } else {
            Self::Dense
        }
    }
}

fn base_metadata(encoding: MapEncoding, len: usize, bit_width: u32) -> UserMetadata {
    let mut meta = UserMetadata::new();
    meta.insert("format".to_string(), FORMAT_TAG.to_string());
    meta.insert("encoding".to_string(), encoding.as_str().to_string());
    meta.insert("len".to_string(), len.to_string());
    meta.insert("bit_width".to_string(), bit_width.to_string());
    meta
}

/// Save an error map, optionally in the sparse encoding.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn save_error_map<P: AsRef<Path>>(path: P, map: &ErrorMap, sparse: bool) -> Result<()> {
    if sparse {
        return save_sparse_error_map(path, &map.to_sparse());
    }

    let mut tensors = BTreeMap::new();
    tensors.insert(DENSE_TENSOR.to_string(), RawTensor::from_u32(map.words()));
    let meta = base_metadata(MapEncoding::Dense, map.len(), map.bit_width());

    save_safetensors(path.as_ref(), &tensors, &meta)?;
    debug!(
        path = %path.as_ref().display(),
        len = map.len(),
        "saved dense error map"
    );
    Ok(())
}

/// Save a sparse error map.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn save_sparse_error_map<P: AsRef<Path>>(path: P, map: &SparseErrorMap) -> Result<()> {
    let mut tensors = BTreeMap::new();
    tensors.insert(
        INDICES_TENSOR.to_string(),
        RawTensor::from_u64(map.indices()),
    );
    tensors.insert(VALUES_TENSOR.to_string(), RawTensor::from_u32(map.values()));
    let meta = base_metadata(MapEncoding::SparseCoo, map.len(), map.bit_width());

    save_safetensors(path.as_ref(), &tensors, &meta)?;
    debug!(
        path = %path.as_ref().display(),
        len = map.len(),
        nnz = map.nnz(),
        "saved sparse error map"
    );
    Ok(())
}

/// Load an error map written by [`save_error_map`].
///
/// `sparse` must match the encoding the file was written with; sparse files
/// are expanded to a dense map. The map is returned on the CPU.
///
/// # Errors
///
/// Returns [`InjectError::Format`] if the file is malformed or its encoding
/// differs from `sparse`, and [`InjectError::Io`] if it cannot be read.
pub fn load_error_map<P: AsRef<Path>>(path: P, sparse: bool) -> Result<ErrorMap> {
    let file = SafeTensors::load(path.as_ref())?;
    let header = MapHeader::read(&file)?;

    let expected = MapEncoding::from_flag(sparse);
    if header.encoding != expected {
        return Err(InjectError::format(format!(
            "file holds a {} error map but {} was requested",
            header.encoding.as_str(),
            expected.as_str()
        )));
    }

    let map = match header.encoding {
        MapEncoding::Dense => {
            let words = file.get_u32(DENSE_TENSOR)?;
            if words.len() != header.len {
                return Err(InjectError::format(format!(
                    "error map has {} words, metadata says {}",
                    words.len(),
                    header.len
                )));
            }
            ErrorMap::from_words(words, header.bit_width)?
        }
        MapEncoding::SparseCoo => read_sparse(&file, &header)?.to_dense()?,
    };

    debug!(
        path = %path.as_ref().display(),
        encoding = header.encoding.as_str(),
        len = map.len(),
        "loaded error map"
    );
    Ok(map)
}

/// Load a sparse error map without expanding it.
///
/// # Errors
///
/// Returns [`InjectError::Format`] if the file is malformed or dense.
pub fn load_sparse_error_map<P: AsRef<Path>>(path: P) -> Result<SparseErrorMap> {
    let file = SafeTensors::load(path)?;
    let header = MapHeader::read(&file)?;
    if header.encoding != MapEncoding::SparseCoo {
        return Err(InjectError::format("file holds a dense error map"));
    }
    read_sparse(&file, &header)
}

fn read_sparse(file: &SafeTensors, header: &MapHeader) -> Result<SparseErrorMap> {
    let indices = file.get_u64(INDICES_TENSOR)?;
    let values = file.get_u32(VALUES_TENSOR)?;
    SparseErrorMap::new(header.len, header.bit_width, indices, values)
}

struct MapHeader {
    encoding: MapEncoding,
    len: usize,
    bit_width: u32,
}

impl MapHeader {
    fn read(file: &SafeTensors) -> Result<Self> {
        let meta = file.user_metadata();
        let field = |key: &str| metadata_field(meta, key);

        if field("format")? != FORMAT_TAG {
            return Err(InjectError::format("not an error map file"));
        }
        let encoding = MapEncoding::parse(field("encoding")?)?;
        let len = field("len")?
            .parse::<usize>()
            .map_err(|e| InjectError::format(format!("invalid len: {e}")))?;
        if len > MAX_MAP_LEN {
            return Err(InjectError::format(format!(
                "len {len} exceeds maximum error map length {MAX_MAP_LEN}"
            )));
        }
        let bit_width = field("bit_width")?
            .parse::<u32>()
            .map_err(|e| InjectError::format(format!("invalid bit_width: {e}")))?;

        Ok(Self {
            encoding,
            len,
            bit_width,
        })
    }
}

fn metadata_field<'a>(meta: &'a UserMetadata, key: &str) -> Result<&'a str> {
    meta.get(key)
        .map(String::as_str)
        .ok_or_else(|| InjectError::format(format!("missing metadata key '{key}'")))
}
