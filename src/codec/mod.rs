//! Low-level binary DMX decoding.
//!
//! ## File Structure
//!
//! ```text
//! +-------------------------------+
//! | "<!-- dmx encoding binary ... |  ASCII line + '\n' + NUL
//! +-------------------------------+
//! | i16 string count              |
//! | NUL terminated strings        |  string table
//! +-------------------------------+
//! | i32 element count             |
//! | per element:                  |
//! |   i16 type (string index)     |
//! |   NUL terminated name         |
//! |   16 byte id                  |
//! +-------------------------------+
//! | per element:                  |
//! |   i32 attribute count         |
//! |   per attribute:              |
//! |     i16 name (string index)   |
//! |     u8 type tag               |
//! |     payload                   |
//! +-------------------------------+
//! ```

mod format;
mod header;
mod value;
mod element;
mod reader;
mod decoder;

pub use format::*;
pub use header::*;
pub use value::*;
pub use element::*;
pub use reader::*;
pub use decoder::*;
