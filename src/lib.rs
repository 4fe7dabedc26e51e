// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A library for re-tagging FLAC files as a single streaming pass
//!
//! A FLAC file is a `fLaC` tag, a chain of metadata blocks
//! and then the encoded audio frames.
//! This crate replaces a file's VORBIS_COMMENT and PICTURE
//! blocks with freshly built ones while copying everything
//! else, including the audio frames, through untouched.
//!
//! ```text
//! ┌──────────┬────────┬┄┄┄┄┄┄┄┄┬┄┄┄┬────────┬┄┄┄┄┄┄┄┄┬┄┄┄╮
//! │ FLAC Tag │ Block₀ │ Block₁ ┆ … ┆ Frame₀ │ Frame₁ ┆ … ┆ FLAC File
//! └──────────┴────────┴┄┄┄┄┄┄┄┄┴┄┄┄┴────────┴┄┄┄┄┄┄┄┄┴┄┄┄╯
//!             ╰── metadata chain ──╯╰───── audio tail ─────╯
//! ```
//!
//! The work is split into four stages:
//!
//! | Stage | Module |
//! |------:|--------|
//! | parsing the block chain | [`decode`] |
//! | deciding the new chain | [`rewrite`] |
//! | writing the new file | [`encode`] |
//! | driving all three over files | [`retag`] |

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod metadata;
pub mod retag;
pub mod rewrite;

pub use retag::{Options, retag, retag_file};
pub use rewrite::{Cover, Tag, rewrite};

use metadata::BlockType;

/// A re-tagging error
#[derive(Debug)]
pub enum Error {
    /// An I/O error on the input or output stream
    Io(std::io::Error),
    /// A comment or description string is not valid UTF-8
    Utf8(std::string::FromUtf8Error),
    /// The stream does not start with the `fLaC` tag
    InvalidSignature,
    /// A block header or payload runs past the end of the stream
    TruncatedStream,
    /// A block to be written cannot be represented in a FLAC file
    UnsupportedBlockEncoding(Unsupported),
    /// A block's payload does not match its declared type
    InvalidMetadataBlock,
    /// A PICTURE block uses a reserved picture type
    InvalidPictureType,
    /// A block was decoded as the wrong type
    WrongBlockType {
        /// The block type we wanted
        expected: BlockType,
        /// The block type we got
        found: BlockType,
    },
    /// The final block in a chain is not the only one flagged as last
    InvalidLastBlockFlag,
    /// The metadata chain ended without a block flagged as last
    IncompleteBlockChain,
}

/// Reasons a synthesized block cannot be encoded
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Unsupported {
    /// The block's payload exceeds 2²⁴ - 1 bytes
    ExcessiveBlockSize,
    /// A string's length exceeds 2³² - 1 bytes
    ExcessiveStringLength,
    /// A VORBIS_COMMENT has more than 2³² - 1 fields
    ExcessiveFieldCount,
    /// A picture's data exceeds 2³² - 1 bytes
    ExcessivePictureSize,
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::Utf8(error)
    }
}

impl From<Unsupported> for Error {
    fn from(reason: Unsupported) -> Self {
        Self::UnsupportedBlockEncoding(reason)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::Utf8(e) => e.fmt(f),
            Self::InvalidSignature => "missing FLAC tag".fmt(f),
            Self::TruncatedStream => "stream ends inside a metadata block".fmt(f),
            Self::UnsupportedBlockEncoding(reason) => {
                write!(f, "unsupported block encoding : {reason}")
            }
            Self::InvalidMetadataBlock => "invalid metadata block".fmt(f),
            Self::InvalidPictureType => "reserved PICTURE type".fmt(f),
            Self::WrongBlockType { expected, found } => {
                write!(f, "expected {expected} block, found {found}")
            }
            Self::InvalidLastBlockFlag => "last block flag not on final block only".fmt(f),
            Self::IncompleteBlockChain => "metadata chain has no last block".fmt(f),
        }
    }
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::ExcessiveBlockSize => "block too large".fmt(f),
            Self::ExcessiveStringLength => "string too long".fmt(f),
            Self::ExcessiveFieldCount => "too many VORBIS_COMMENT fields".fmt(f),
            Self::ExcessivePictureSize => "picture data too large".fmt(f),
        }
    }
}
