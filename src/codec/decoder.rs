//! Two-pass element graph decoder.
//!
//! Pass one allocates every element from its header triple, pass two fills
//! in attributes. Element references read in pass two index the fully
//! allocated arena, so forward and self references always resolve.

use std::io::BufRead;
use std::sync::Arc;

use tracing::{debug, trace};

use super::element::{Attribute, ElementArena, ElementId, RawElement};
use super::header::Header;
use super::reader::BinaryReader;
use crate::util::{Error, Result};

/// Deduplicated identifier strings referenced by 16-bit index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringTable {
    strings: Vec<Arc<str>>,
}

impl StringTable {
    pub fn new(strings: Vec<Arc<str>>) -> Self {
        Self { strings }
    }

    /// Resolve a wire index.
    pub fn get(&self, index: i16) -> Result<&Arc<str>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .ok_or(Error::InvalidStringIndex {
                index: index as i32,
                count: self.strings.len(),
            })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|s| &**s)
    }
}

/// Fully decoded DMX file: header, string table and element arena.
#[derive(Clone, Debug, PartialEq)]
pub struct DmxDocument {
    pub header: Header,
    pub strings: StringTable,
    pub elements: ElementArena,
}

impl DmxDocument {
    /// The document root (first element).
    pub fn root(&self) -> &RawElement {
        self.elements.get(ElementId::ROOT)
    }
}

/// Decoder for one DMX stream.
pub struct Decoder<R> {
    reader: BinaryReader<R>,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader: BinaryReader::new(reader) }
    }

    /// Decode the whole stream. Any failure aborts the decode.
    pub fn decode(mut self) -> Result<DmxDocument> {
        let header = self.read_header()?;
        header.ensure_supported()?;
        debug!(
            "DMX header: encoding {} {}, format {} {}",
            header.encoding.as_str(),
            header.encoding_version,
            header.format_name,
            header.format_version
        );

        // The binary preamble is a C string: newline, then its NUL terminator.
        let terminator = self.reader.read_u8()?;
        if terminator != 0 {
            trace!("header terminator is 0x{:02x}, expected NUL", terminator);
        }

        let strings = self.read_string_table()?;
        let mut elements = self.read_element_headers(&strings)?;
        self.read_element_attributes(&strings, &mut elements)?;

        debug!(
            "decoded {} elements, {} strings, {} bytes",
            elements.len(),
            strings.len(),
            self.reader.position()
        );
        Ok(DmxDocument { header, strings, elements })
    }

    fn read_header(&mut self) -> Result<Header> {
        let line = self.reader.read_line()?;
        Header::parse(&line)
    }

    fn read_string_table(&mut self) -> Result<StringTable> {
        let count = self.reader.read_i16()?;
        let count = usize::try_from(count)
            .map_err(|_| Error::invalid(format!("negative string count {count}")))?;
        let mut strings: Vec<Arc<str>> = Vec::with_capacity(count);
        for _ in 0..count {
            strings.push(Arc::from(self.reader.read_cstring()?));
        }
        Ok(StringTable::new(strings))
    }

    /// Pass one: allocate every element from its `(type, name, id)` header.
    fn read_element_headers(&mut self, strings: &StringTable) -> Result<ElementArena> {
        let count = self.reader.read_len()?;
        if count == 0 {
            return Err(Error::invalid("DMX file contains no elements"));
        }

        let mut arena = ElementArena::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            let type_name = strings.get(self.reader.read_i16()?)?.clone();
            let name = self.reader.read_cstring()?;
            let id = self.reader.read_uuid()?;
            trace!("element {} {:?} ({})", type_name, name, id);
            arena.push(RawElement::new(id, type_name, name));
        }
        Ok(arena)
    }

    /// Pass two: decode attribute blocks in element order.
    fn read_element_attributes(&mut self, strings: &StringTable, arena: &mut ElementArena) -> Result<()> {
        let count = arena.len();
        for index in 0..count {
            let id = ElementId::new(index as u32);
            let num_attributes = self.reader.read_len()?;
            let mut attributes = Vec::with_capacity(num_attributes.min(256));
            for _ in 0..num_attributes {
                let name = strings.get(self.reader.read_i16()?)?.clone();
                let tag = self.reader.read_u8()?;
                let value = self.reader.read_value(tag, count)?;
                attributes.push(Attribute { name, value });
            }
            arena.get_mut(id).attributes = attributes;
        }
        Ok(())
    }
}
