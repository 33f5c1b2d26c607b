//! Output document and its on-disk forms.

use std::fs;
use std::path::Path;

use gltf_json as json;
use tracing::debug;

use crate::util::{Error, Result};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const GLB_CHUNK_HEADER_LEN: usize = 8;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// A converted scene: glTF JSON plus its single binary buffer.
#[derive(Clone, Debug)]
pub struct GltfDocument {
    pub root: json::Root,
    pub buffer: Vec<u8>,
}

impl GltfDocument {
    /// Compact JSON with the buffer left unreferenced.
    pub fn to_json(&self) -> Result<String> {
        Ok(json::serialize::to_string(&self.root)?)
    }

    /// Pretty JSON referencing the buffer by `uri`.
    pub fn to_json_with_uri(&self, uri: &str) -> Result<String> {
        let mut root = self.root.clone();
        if let Some(buffer) = root.buffers.first_mut() {
            buffer.uri = Some(uri.to_string());
        }
        Ok(json::serialize::to_string_pretty(&root)?)
    }

    /// Binary glTF container with JSON and BIN chunks.
    pub fn to_glb(&self) -> Result<Vec<u8>> {
        let json_string = self.to_json()?;
        let json_bytes = json_string.as_bytes();

        let json_padding = (4 - json_bytes.len() % 4) % 4;
        let json_chunk_length = json_bytes.len() + json_padding;
        let buffer_padding = (4 - self.buffer.len() % 4) % 4;
        let buffer_chunk_length = self.buffer.len() + buffer_padding;

        let mut total_length = GLB_HEADER_LEN + GLB_CHUNK_HEADER_LEN + json_chunk_length;
        if !self.buffer.is_empty() {
            total_length += GLB_CHUNK_HEADER_LEN + buffer_chunk_length;
        }
        let total = u32::try_from(total_length)
            .map_err(|_| Error::other(format!("glb too large: {} bytes", total_length)))?;

        let mut glb = Vec::with_capacity(total_length);
        glb.extend_from_slice(GLB_MAGIC);
        glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
        glb.extend_from_slice(&total.to_le_bytes());

        glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        glb.extend_from_slice(json_bytes);
        glb.extend(std::iter::repeat(0x20u8).take(json_padding));

        if !self.buffer.is_empty() {
            glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
            glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            glb.extend_from_slice(&self.buffer);
            glb.extend(std::iter::repeat(0u8).take(buffer_padding));
        }

        Ok(glb)
    }

    /// Write to `path`: `.gltf` writes JSON plus a sidecar `.bin`,
    /// anything else a binary container.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let is_gltf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gltf"));

        if !is_gltf {
            let glb = self.to_glb()?;
            debug!("writing {} ({} bytes)", path.display(), glb.len());
            fs::write(path, glb)?;
            return Ok(());
        }

        let bin_path = path.with_extension("bin");
        let uri = bin_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::invalid(format!("bad output path {}", path.display())))?;

        let text = if self.buffer.is_empty() {
            json::serialize::to_string_pretty(&self.root)?
        } else {
            fs::write(&bin_path, &self.buffer)?;
            self.to_json_with_uri(uri)?
        };
        debug!("writing {} ({} bytes)", path.display(), text.len());
        fs::write(path, text)?;
        Ok(())
    }
}
