//! Error map serialization.
//!
//! Error maps are written in the `SafeTensors` layout:
//! ```text
//! [8-byte header: u64 metadata length (little-endian)]
//! [JSON metadata: tensor names, dtypes, shapes, data_offsets, __metadata__]
//! [Raw tensor data: little-endian values]
//! ```
//!
//! Example:
//! ```rust
//! use bitflip::device::Device;
//! use bitflip::errormap::ErrorMap;
//! use bitflip::serialization::{load_error_map, save_error_map};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let map = ErrorMap::generate(1024, 32, 0.01, Device::Cpu, &mut rng).unwrap();
//!
//! let path = std::env::temp_dir().join("bitflip_doc_map.safetensors");
//! save_error_map(&path, &map, true).unwrap();
//! assert_eq!(load_error_map(&path, true).unwrap(), map);
//! # std::fs::remove_file(&path).ok();
//! ```

pub mod errormap;
pub mod safetensors;

pub use errormap::{
    load_error_map, load_sparse_error_map, save_error_map, save_sparse_error_map, MapEncoding,
    MAX_MAP_LEN,
};
pub use safetensors::{RawTensor, SafeTensors, SafeTensorsMetadata, UserMetadata};
