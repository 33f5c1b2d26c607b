//! DMX preamble line parsing.
//!
//! Every DMX file starts with a single ASCII line:
//!
//! ```text
//! <!-- dmx encoding binary 2 format model 18 -->
//! ```

use std::fmt;

use super::format::*;
use crate::util::{Error, Result};

/// Payload encoding declared by the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Binary,
    Text,
    Other(String),
}

impl Encoding {
    fn parse(name: &str) -> Self {
        match name {
            ENCODING_BINARY => Self::Binary,
            ENCODING_TEXT => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }

    /// Name as written in the header.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Binary => ENCODING_BINARY,
            Self::Text => ENCODING_TEXT,
            Self::Other(name) => name,
        }
    }
}

/// Parsed DMX preamble.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub encoding: Encoding,
    pub encoding_version: i32,
    pub format_name: String,
    pub format_version: i32,
}

impl Header {
    /// Parse the preamble line (without its line terminator).
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let invalid = || Error::InvalidHeader(line.to_string());

        let tokens: Vec<&str> = line.split(' ').collect();
        if tokens.len() != HEADER_TOKENS
            || tokens[0] != HEADER_OPEN
            || tokens[1] != "dmx"
            || tokens[2] != "encoding"
            || tokens[5] != "format"
            || tokens[8] != HEADER_CLOSE
        {
            return Err(invalid());
        }

        let encoding_version = tokens[4].parse::<i32>().map_err(|_| invalid())?;
        let format_version = tokens[7].parse::<i32>().map_err(|_| invalid())?;

        Ok(Self {
            encoding: Encoding::parse(tokens[3]),
            encoding_version,
            format_name: tokens[6].to_string(),
            format_version,
        })
    }

    /// Fail unless the payload is binary encoded.
    pub fn ensure_supported(&self) -> Result<()> {
        match &self.encoding {
            Encoding::Binary => Ok(()),
            Encoding::Text => Err(Error::UnsupportedEncoding(ENCODING_TEXT.to_string())),
            Encoding::Other(name) => Err(Error::UnknownEncoding(name.clone())),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dmx encoding {} {} format {} {} {}",
            HEADER_OPEN,
            self.encoding.as_str(),
            self.encoding_version,
            self.format_name,
            self.format_version,
            HEADER_CLOSE
        )
    }
}
