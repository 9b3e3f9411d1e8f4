use super::{SafeTensorsMetadata, TensorMetadata, UserMetadata};
use crate::error::{InjectError, Result};

pub(super) fn validate_and_read_header(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < 8 {
        return Err(InjectError::format(format!(
            "file is {} bytes, need at least 8 bytes for header",
            bytes.len()
        )));
    }

    let mut header_bytes = [0u8; 8];
    header_bytes.copy_from_slice(&bytes[0..8]);
    let metadata_len = usize::try_from(u64::from_le_bytes(header_bytes))
        .map_err(|_| InjectError::format("metadata length does not fit in memory"))?;

    if metadata_len == 0 {
        return Err(InjectError::format("metadata length is 0"));
    }

    if metadata_len > bytes.len() - 8 {
        return Err(InjectError::format(format!(
            "metadata length {metadata_len} exceeds file size"
        )));
    }

    Ok(metadata_len)
}

pub(super) fn parse_metadata(
    bytes: &[u8],
    metadata_len: usize,
) -> Result<(SafeTensorsMetadata, UserMetadata)> {
    let metadata_json = &bytes[8..8 + metadata_len];
    let metadata_str = std::str::from_utf8(metadata_json)
        .map_err(|e| InjectError::format(format!("metadata is not valid UTF-8: {e}")))?;

    let raw_metadata: serde_json::Value = serde_json::from_str(metadata_str)
        .map_err(|e| InjectError::format(format!("metadata is not valid JSON: {e}")))?;

    let serde_json::Value::Object(map) = raw_metadata else {
        return Err(InjectError::format("metadata is not a JSON object"));
    };

    let mut metadata = SafeTensorsMetadata::new();
    let mut user_metadata = UserMetadata::new();

    for (key, value) in map {
        if key == "__metadata__" {
            extract_user_metadata(value, &mut user_metadata);
            continue;
        }
        if key.starts_with("__") {
            continue;
        }
        let tensor_meta = serde_json::from_value::<TensorMetadata>(value)
            .map_err(|e| InjectError::format(format!("tensor '{key}': {e}")))?;
        metadata.insert(key, tensor_meta);
    }

    Ok((metadata, user_metadata))
}

/// Copies string key-value pairs from a `__metadata__` JSON object.
fn extract_user_metadata(value: serde_json::Value, user_metadata: &mut UserMetadata) {
    let serde_json::Value::Object(meta_map) = value else {
        return;
    };
    for (mk, mv) in meta_map {
        if let serde_json::Value::String(s) = mv {
            user_metadata.insert(mk, s);
        }
    }
}

pub(super) fn extract_u32(tensor_bytes: &[u8]) -> Result<Vec<u32>> {
    if tensor_bytes.len() % 4 != 0 {
        return Err(InjectError::format(format!(
            "U32 tensor size {} is not a multiple of 4 bytes",
            tensor_bytes.len()
        )));
    }

    Ok(tensor_bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

pub(super) fn extract_u64(tensor_bytes: &[u8]) -> Result<Vec<u64>> {
    if tensor_bytes.len() % 8 != 0 {
        return Err(InjectError::format(format!(
            "U64 tensor size {} is not a multiple of 8 bytes",
            tensor_bytes.len()
        )));
    }

    Ok(tensor_bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            u64::from_le_bytes(bytes)
        })
        .collect())
}
