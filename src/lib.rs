//! # dmx-gltf
//!
//! Decoder for binary DMX model/animation files and converter to glTF 2.0.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math helpers
//! - [`codec`] - Binary DMX format: header, string table, element arena
//! - [`dme`] - Typed domain tree (models, joints, meshes, animation clips)
//! - [`gltf`] - glTF scene assembly and GLB output
//!
//! ## Example
//!
//! ```ignore
//! use dmx_gltf::gltf::{convert, ExportOptions};
//!
//! let element = dmx_gltf::load("hero.dmx")?;
//! let doc = convert(&element, &ExportOptions::default().with_title("hero"))?;
//! doc.save("hero.glb")?;
//! ```

pub mod util;
pub mod codec;
pub mod dme;
pub mod gltf;

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use memmap2::Mmap;

pub use codec::{Decoder, DmxDocument};
pub use dme::DmElement;
pub use util::{Error, Result};

/// Decode a DMX stream.
pub fn decode<R: BufRead>(reader: R) -> Result<DmxDocument> {
    Decoder::new(reader).decode()
}

/// Decode DMX from memory.
pub fn decode_bytes(bytes: &[u8]) -> Result<DmxDocument> {
    decode(Cursor::new(bytes))
}

/// Decode a DMX file, memory mapped when the `mmap` feature is enabled.
pub fn open(path: impl AsRef<Path>) -> Result<DmxDocument> {
    open_opts(path, cfg!(feature = "mmap"))
}

/// Decode a DMX file with optional memory mapping.
pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<DmxDocument> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;

    if use_mmap && file.metadata()?.len() > 0 {
        // Safety: the map is read-only and dropped before returning.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        return decode_bytes(&mmap);
    }

    decode(BufReader::new(file))
}

/// Decode a file and materialize its domain tree.
pub fn load(path: impl AsRef<Path>) -> Result<DmElement> {
    DmElement::from_document(&open(path)?)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codec::{AttributeValue, DmxDocument, ElementArena, ElementId, Header};
    pub use crate::dme::*;
    pub use crate::gltf::{convert, ExportOptions, GltfDocument};
    pub use crate::util::{Error, Result};
}
