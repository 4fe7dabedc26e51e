// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For handling a FLAC file's metadata blocks
//!
//! Many items are capitalized simply because they were capitalized
//! in the original FLAC format documentation.
//!
//! # Metadata Blocks
//!
//! FLAC defines seven metadata block types,
//! but re-tagging only needs to understand two of them.
//! Everything else is carried as an opaque payload.
//!
//! | Block Type | Handling |
//! |-----------:|---------|
//! | STREAMINFO | passed through |
//! | PADDING | passed through |
//! | APPLICATION | passed through |
//! | SEEKTABLE | passed through |
//! | [VORBIS_COMMENT](`VorbisComment`) | replaced |
//! | CUESHEET | passed through |
//! | [PICTURE](`Picture`) | replaced |
//! | reserved | passed through |

use crate::{Error, Unsupported};
use bitstream_io::{
    BigEndian, BitRead, BitReader, BitWrite, BitWriter, FromBitStream, LittleEndian, ToBitStream,
};

mod picture;

pub(crate) use picture::JpegMetrics;
pub use picture::{InvalidPicture, Picture, PictureType};

/// The tag every FLAC stream starts with
pub const FLAC_TAG: &[u8; 4] = b"fLaC";

/// A FLAC metadata block header
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 1    | `last` | final metadata block in file |
/// | 7    | `block_type` | type of block |
/// | 24   | `size` | block size, in bytes |
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use flac_retag::metadata::{BlockHeader, BlockType};
///
/// let data: &[u8] = &[0b1_0000100, 0x00, 0x00, 0x28];
/// let mut r = BitReader::endian(data, BigEndian);
/// assert_eq!(
///     r.parse::<BlockHeader>().unwrap(),
///     BlockHeader {
///         last: true,                             // 0b1
///         block_type: BlockType::VorbisComment,   // 0b0000100
///         size: 0x00_00_28u16.into(),             // 0x00, 0x00, 0x28
///     },
/// );
/// ```
#[derive(Debug, Eq, PartialEq)]
pub struct BlockHeader {
    /// Whether we are the final block
    pub last: bool,
    /// Our block type
    pub block_type: BlockType,
    /// Our block size, in bytes
    pub size: BlockSize,
}

impl BlockHeader {
    /// Size of an encoded header, in bytes
    pub const BYTES: usize = (1 + 7 + 24) / 8;
}

impl FromBitStream for BlockHeader {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        Ok(Self {
            last: r.read::<1, _>()?,
            block_type: r.parse()?,
            size: r.parse()?,
        })
    }
}

impl ToBitStream for BlockHeader {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write::<1, _>(self.last)?;
        w.build(&self.block_type)?;
        w.build(&self.size)
    }
}

/// A FLAC metadata block type
///
/// Reserved type codes are kept as-is so that
/// blocks we don't understand survive a rewrite.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum BlockType {
    /// The STREAMINFO block
    Streaminfo,
    /// The PADDING block
    Padding,
    /// The APPLICATION block
    Application,
    /// The SEEKTABLE block
    SeekTable,
    /// The VORBIS_COMMENT block
    VorbisComment,
    /// The CUESHEET block
    Cuesheet,
    /// The PICTURE block
    Picture,
    /// A reserved block type, from 7 to 127
    ///
    /// Other codes are only meaningful once passed through
    /// [`BlockType::normalize`], which [`Block::new`] and
    /// [`crate::rewrite()`] both do.
    Unknown(u8),
}

impl BlockType {
    /// Returns the type this block is written to disk as
    ///
    /// Only the low 7 bits of an `Unknown` code are written,
    /// and codes 0 to 6 name known block types.
    ///
    /// ```
    /// use flac_retag::metadata::BlockType;
    ///
    /// assert_eq!(BlockType::Unknown(4).normalize(), BlockType::VorbisComment);
    /// assert_eq!(BlockType::Unknown(0x86).normalize(), BlockType::Picture);
    /// assert_eq!(BlockType::Unknown(99).normalize(), BlockType::Unknown(99));
    /// ```
    pub fn normalize(self) -> Self {
        u8::from(self).into()
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Streaminfo => "STREAMINFO".fmt(f),
            Self::Padding => "PADDING".fmt(f),
            Self::Application => "APPLICATION".fmt(f),
            Self::SeekTable => "SEEKTABLE".fmt(f),
            Self::VorbisComment => "VORBIS_COMMENT".fmt(f),
            Self::Cuesheet => "CUESHEET".fmt(f),
            Self::Picture => "PICTURE".fmt(f),
            Self::Unknown(code) => write!(f, "RESERVED({code})"),
        }
    }
}

impl From<u8> for BlockType {
    /// Only the low 7 bits of the code are significant
    fn from(code: u8) -> Self {
        match code & 0x7F {
            0 => Self::Streaminfo,
            1 => Self::Padding,
            2 => Self::Application,
            3 => Self::SeekTable,
            4 => Self::VorbisComment,
            5 => Self::Cuesheet,
            6 => Self::Picture,
            code => Self::Unknown(code),
        }
    }
}

impl From<BlockType> for u8 {
    fn from(block_type: BlockType) -> u8 {
        match block_type {
            BlockType::Streaminfo => 0,
            BlockType::Padding => 1,
            BlockType::Application => 2,
            BlockType::SeekTable => 3,
            BlockType::VorbisComment => 4,
            BlockType::Cuesheet => 5,
            BlockType::Picture => 6,
            BlockType::Unknown(code) => code & 0x7F,
        }
    }
}

impl FromBitStream for BlockType {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        r.read::<7, u8>().map(Self::from)
    }
}

impl ToBitStream for BlockType {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write::<7, u8>((*self).into())
    }
}

/// A 24-bit block size value, with safeguards against overflow
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct BlockSize(u32);

impl BlockSize {
    /// The largest value a block header can hold
    pub const MAX: u32 = (1 << 24) - 1;

    /// Our current value as a u32
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BlockSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromBitStream for BlockSize {
    type Error = std::io::Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        r.read::<24, _>().map(Self)
    }
}

impl ToBitStream for BlockSize {
    type Error = std::io::Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        w.write::<24, _>(self.0)
    }
}

impl From<u16> for BlockSize {
    fn from(u: u16) -> Self {
        Self(u.into())
    }
}

impl TryFrom<usize> for BlockSize {
    type Error = BlockSizeOverflow;

    fn try_from(u: usize) -> Result<Self, Self::Error> {
        u32::try_from(u)
            .map_err(|_| BlockSizeOverflow)
            .and_then(|s| (s <= Self::MAX).then_some(Self(s)).ok_or(BlockSizeOverflow))
    }
}

impl From<BlockSize> for usize {
    #[inline]
    fn from(size: BlockSize) -> usize {
        // 24 bits always fit
        size.0 as usize
    }
}

/// An error that occurs when trying to build an overly large `BlockSize`
#[derive(Copy, Clone, Debug)]
pub struct BlockSizeOverflow;

impl std::error::Error for BlockSizeOverflow {}

impl std::fmt::Display for BlockSizeOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        "value too large for BlockSize".fmt(f)
    }
}

impl From<BlockSizeOverflow> for Error {
    fn from(_: BlockSizeOverflow) -> Self {
        Error::UnsupportedBlockEncoding(Unsupported::ExcessiveBlockSize)
    }
}

/// A single FLAC metadata block
///
/// The payload is kept as raw bytes so any block type,
/// including reserved ones, can be written back unchanged.
/// The two block types we build ourselves can be converted
/// to and from their typed form with [`Block::encode`]
/// and [`Block::decode`].
///
/// ```text
/// ├──────────────┬─────────────────────────────┤
/// │ Block Header │     Metadata Block Data     │           Metadata Block
/// └──────────────┴─────────────────────────────┘
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Block {
    /// Whether we are the final block before the audio frames
    pub last: bool,
    /// Our block type
    pub block_type: BlockType,
    /// The block's contents, not including its header
    pub payload: Vec<u8>,
}

impl Block {
    /// Builds a block which is not flagged as last
    ///
    /// The block type is normalized to the one it will be
    /// written to disk as.
    pub fn new(block_type: BlockType, payload: Vec<u8>) -> Self {
        Self {
            last: false,
            block_type: block_type.normalize(),
            payload,
        }
    }

    /// Builds a fresh header from our current contents
    ///
    /// The size is always taken from the payload itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is too large
    /// for a 24-bit size field.
    pub fn header(&self) -> Result<BlockHeader, Error> {
        Ok(BlockHeader {
            last: self.last,
            block_type: self.block_type,
            size: self.payload.len().try_into()?,
        })
    }

    /// Encodes a typed metadata block into a raw one
    ///
    /// # Example
    /// ```
    /// use flac_retag::metadata::{Block, BlockType, VorbisComment};
    ///
    /// let comment = VorbisComment {
    ///     vendor_string: String::new(),
    ///     fields: vec!["TITLE=Echoes".to_owned()],
    /// };
    ///
    /// let block = Block::encode(&comment).unwrap();
    /// assert_eq!(block.block_type, BlockType::VorbisComment);
    /// assert!(!block.last);
    /// assert_eq!(block.payload.len(), 4 + 4 + 4 + 12);
    /// assert_eq!(block.decode::<VorbisComment>().unwrap(), comment);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBlockEncoding`] if some field
    /// or the block as a whole is too large to encode.
    pub fn encode<B: MetadataBlock>(block: &B) -> Result<Self, Error> {
        let mut payload = Vec::new();
        BitWriter::endian(&mut payload, BigEndian).build(block)?;
        BlockSize::try_from(payload.len())?;
        Ok(Self::new(B::TYPE, payload))
    }

    /// Decodes our payload as the given typed metadata block
    ///
    /// # Errors
    ///
    /// Returns an error if we are some other type of block,
    /// or if the payload is not a well-formed block of that type.
    pub fn decode<B: MetadataBlock>(&self) -> Result<B, Error> {
        if self.block_type != B::TYPE {
            return Err(Error::WrongBlockType {
                expected: B::TYPE,
                found: self.block_type,
            });
        }

        let mut r = BitReader::endian(self.payload.as_slice(), BigEndian);
        let block = r.parse::<B>().map_err(|err| match err {
            // running out of payload means the block is malformed,
            // not that the stream is broken
            Error::Io(_) => Error::InvalidMetadataBlock,
            err => err,
        })?;

        match r.into_reader() {
            [] => Ok(block),
            _ => Err(Error::InvalidMetadataBlock),
        }
    }
}

/// A type of FLAC metadata block we know how to build
pub trait MetadataBlock:
    FromBitStream<Error = Error> + ToBitStream<Error = Error> + Sized
{
    /// The metadata block's type
    const TYPE: BlockType;
}

/// A VORBIS_COMMENT metadata block
///
/// This block contains metadata such as track name,
/// artist name, album name, etc.  Its contents are
/// UTF-8 encoded, `=`-delimited text fields
/// with a field name followed by value,
/// such as:
///
/// ```text
/// TITLE=Track Title
/// ```
///
/// Field names are case-insensitive and
/// may occur multiple times within the same comment.
/// Field order is preserved exactly as given.
///
/// # Byte Order
///
/// Unlike the rest of a FLAC file, the Vorbis comment's
/// length fields are stored in little-endian byte order.
///
/// | Bits | Field | Meaning |
/// |-----:|------:|---------|
/// | 32   | vendor string len | length of vendor string, in bytes
/// | `vendor string len`×8 | `vendor_string` | vendor string, in UTF-8
/// | 32   | field count | number of vendor string fields
/// | 32   | field₀ len | length of field₀, in bytes
/// | `field₀ len`×8 | `fields₀` | first field value, in UTF-8
/// | | | ⋮
///
/// # Example
/// ```
/// use bitstream_io::{BitReader, BitRead, BigEndian};
/// use flac_retag::metadata::VorbisComment;
/// use flac_retag::metadata::fields::{TITLE, DATE, ARTIST};
///
/// let data: &[u8] = &[
///     0x00, 0x00, 0x00, 0x00,  // empty vendor string
///     0x02, 0x00, 0x00, 0x00,  // 2 fields
///     0x0c, 0x00, 0x00, 0x00,  // 12 byte field 1
///     0x54, 0x49, 0x54, 0x4c, 0x45, 0x3d, 0x45, 0x63,
///     0x68, 0x6f, 0x65, 0x73,
///     0x09, 0x00, 0x00, 0x00,  // 9 byte field 2
///     0x44, 0x41, 0x54, 0x45, 0x3d, 0x32, 0x30, 0x32,
///     0x33,
/// ];
///
/// let mut r = BitReader::endian(data, BigEndian);
/// let comment = r.parse::<VorbisComment>().unwrap();
///
/// assert_eq!(
///     &comment,
///     &VorbisComment {
///         vendor_string: String::new(),
///         fields: vec![
///              "TITLE=Echoes".to_string(),
///              "DATE=2023".to_string(),
///         ],
///     },
/// );
///
/// assert_eq!(comment.get(TITLE), Some("Echoes"));
/// assert_eq!(comment.get(DATE), Some("2023"));
/// assert_eq!(comment.get(ARTIST), None);
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct VorbisComment {
    /// The vendor string
    pub vendor_string: String,
    /// The individual metadata comment strings
    pub fields: Vec<String>,
}

impl VorbisComment {
    /// Given a field name, returns first matching value, if any
    ///
    /// Fields are matched case-insensitively
    pub fn get(&self, field: &str) -> Option<&str> {
        self.all(field).next()
    }

    /// Given a field name, iterates over any matching values
    ///
    /// Fields are matched case-insensitively
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character.
    pub fn all(&self, field: &str) -> impl Iterator<Item = &str> {
        assert!(!field.contains('='), "field must not contain '='");

        self.fields.iter().filter_map(|f| {
            f.split_once('=')
                .and_then(|(key, value)| key.eq_ignore_ascii_case(field).then_some(value))
        })
    }

    /// Adds new instance of field with the given value
    ///
    /// The value is stored verbatim, without any escaping
    /// or splitting.
    ///
    /// # Panics
    ///
    /// Panics if field contains the `=` character.
    ///
    /// # Example
    ///
    /// ```
    /// use flac_retag::metadata::{VorbisComment, fields::ARTIST};
    ///
    /// let mut comment = VorbisComment::default();
    /// comment.insert(ARTIST, "A, B");
    /// comment.insert(ARTIST, "C");
    ///
    /// assert_eq!(
    ///     comment.all(ARTIST).collect::<Vec<_>>(),
    ///     vec!["A, B", "C"],
    /// );
    /// ```
    pub fn insert<S>(&mut self, field: &str, value: S)
    where
        S: std::fmt::Display,
    {
        assert!(!field.contains('='), "field must not contain '='");

        self.fields.push(format!("{field}={value}"));
    }
}

impl MetadataBlock for VorbisComment {
    const TYPE: BlockType = BlockType::VorbisComment;
}

impl TryFrom<&Block> for VorbisComment {
    type Error = Error;

    fn try_from(block: &Block) -> Result<Self, Error> {
        block.decode()
    }
}

impl FromBitStream for VorbisComment {
    type Error = Error;

    fn from_reader<R: BitRead + ?Sized>(r: &mut R) -> Result<Self, Self::Error> {
        fn read_string<R: BitRead + ?Sized>(r: &mut R) -> Result<String, Error> {
            let size = usize::try_from(r.read_as_to::<LittleEndian, u32>()?)
                .map_err(|_| Error::InvalidMetadataBlock)?;
            Ok(String::from_utf8(r.read_to_vec(size)?)?)
        }

        Ok(Self {
            vendor_string: read_string(r)?,
            fields: (0..(r.read_as_to::<LittleEndian, u32>()?))
                .map(|_| read_string(r))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl ToBitStream for VorbisComment {
    type Error = Error;

    fn to_writer<W: BitWrite + ?Sized>(&self, w: &mut W) -> Result<(), Self::Error> {
        fn write_string<W: BitWrite + ?Sized>(w: &mut W, s: &str) -> Result<(), Error> {
            w.write_as_from::<LittleEndian, u32>(
                s.len()
                    .try_into()
                    .map_err(|_| Unsupported::ExcessiveStringLength)?,
            )?;
            w.write_bytes(s.as_bytes())?;
            Ok(())
        }

        write_string(w, &self.vendor_string)?;
        w.write_as_from::<LittleEndian, u32>(
            self.fields
                .len()
                .try_into()
                .map_err(|_| Unsupported::ExcessiveFieldCount)?,
        )?;
        self.fields.iter().try_for_each(|s| write_string(w, s))
    }
}

/// Vorbis comment metadata tag fields
///
/// Only the fields we write are listed here.
pub mod fields {
    /// Name of current work
    pub const TITLE: &str = "TITLE";

    /// Name of the artist generally responsible for the current work
    pub const ARTIST: &str = "ARTIST";

    /// Name of the collection the current work belongs to
    pub const ALBUM: &str = "ALBUM";

    /// Genre of the current work
    pub const GENRE: &str = "GENRE";

    /// Release date of work
    pub const DATE: &str = "DATE";
}
