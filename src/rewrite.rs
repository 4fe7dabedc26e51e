// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For deciding which metadata blocks a re-tagged file contains
//!
//! This works purely on block values and performs no I/O,
//! so a new chain can be checked before anything is written.

use crate::Error;
use crate::metadata::{
    Block, BlockType, InvalidPicture, JpegMetrics, Picture, PictureType, VorbisComment, fields,
};

/// Descriptive metadata to embed in a file
///
/// All values are written verbatim.
/// Multi-valued fields, such as several artists,
/// are expected to be joined into one string already.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Tag {
    /// Track title
    pub title: String,
    /// Track artist(s)
    pub artist: String,
    /// Track genre
    pub genre: String,
    /// Album name
    pub album: String,
    /// Release date, typically just the year
    pub date: String,
    /// Front cover art, if any
    pub cover: Option<Cover>,
}

impl Tag {
    /// Builds our VORBIS_COMMENT
    ///
    /// The vendor string is empty and the fields are always
    /// `ARTIST`, `TITLE`, `ALBUM`, `GENRE` and `DATE`,
    /// in that order, even when their values are empty.
    ///
    /// # Example
    ///
    /// ```
    /// use flac_retag::Tag;
    ///
    /// let tag = Tag {
    ///     title: "Echoes".to_owned(),
    ///     artist: "A, B".to_owned(),
    ///     genre: "Techno".to_owned(),
    ///     album: "Drift".to_owned(),
    ///     date: "2023".to_owned(),
    ///     cover: None,
    /// };
    ///
    /// assert_eq!(
    ///     tag.comment().fields,
    ///     vec!["ARTIST=A, B", "TITLE=Echoes", "ALBUM=Drift", "GENRE=Techno", "DATE=2023"],
    /// );
    /// ```
    pub fn comment(&self) -> VorbisComment {
        let mut comment = VorbisComment::default();
        comment.insert(fields::ARTIST, &self.artist);
        comment.insert(fields::TITLE, &self.title);
        comment.insert(fields::ALBUM, &self.album);
        comment.insert(fields::GENRE, &self.genre);
        comment.insert(fields::DATE, &self.date);
        comment
    }
}

/// JPEG cover art, along with its dimensions
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cover {
    /// Raw JPEG data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Cover {
    /// The square dimension catalog artwork is delivered at
    pub const NOMINAL_SIZE: u32 = 1400;

    /// Color depth recorded for all covers, in bits-per-pixel
    pub const COLOR_DEPTH: u32 = 24;

    /// Wraps JPEG data delivered at the nominal catalog size
    ///
    /// The data is not checked, so it must already be a JPEG.
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_size(data, Self::NOMINAL_SIZE)
    }

    /// Wraps JPEG data delivered as a square of the given size
    ///
    /// The data is not checked, so it must already be a JPEG.
    pub fn with_size(data: Vec<u8>, size: u32) -> Self {
        Self {
            data,
            width: size,
            height: size,
        }
    }

    /// Wraps JPEG data, taking its dimensions from the image itself
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a JPEG
    /// or has no readable frame header.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self, InvalidPicture> {
        let JpegMetrics { width, height } = JpegMetrics::try_new(&data)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Reads cover art from image data
    ///
    /// With the `transcode` feature, any supported image format
    /// is converted to JPEG as by [`Cover::transcode`].
    /// Otherwise only JPEG data is accepted, as by [`Cover::from_jpeg`].
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be used as a JPEG cover.
    pub fn from_image(data: Vec<u8>) -> Result<Self, InvalidPicture> {
        #[cfg(feature = "transcode")]
        {
            Self::transcode(data)
        }
        #[cfg(not(feature = "transcode"))]
        {
            Self::from_jpeg(data)
        }
    }

    /// Declares the cover as a square of the given size,
    /// in place of the dimensions read from the image
    ///
    /// # Example
    ///
    /// ```
    /// use flac_retag::Cover;
    ///
    /// let cover = Cover::with_size(vec![0xff, 0xd8, 0xff, 0xd9], 640).declare_size(1400);
    /// assert_eq!((cover.width, cover.height), (1400, 1400));
    /// ```
    pub fn declare_size(self, size: u32) -> Self {
        Self {
            width: size,
            height: size,
            ..self
        }
    }

    /// Converts an image of any supported format into a JPEG cover
    ///
    /// Data that is already a JPEG is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded
    /// or re-encoded.
    #[cfg(feature = "transcode")]
    pub fn transcode(data: Vec<u8>) -> Result<Self, InvalidPicture> {
        use image::GenericImageView;

        if let Ok(cover) = Self::from_jpeg(data.clone()) {
            return Ok(cover);
        }

        let image = image::load_from_memory(&data)?;
        let (width, height) = image.dimensions();
        let mut jpeg = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut jpeg, image::ImageFormat::Jpeg)?;

        log::debug!("converted {width}x{height} cover art to JPEG");

        Ok(Self {
            data: jpeg.into_inner(),
            width,
            height,
        })
    }

    /// Builds our PICTURE
    pub fn picture(&self) -> Picture {
        Picture {
            picture_type: PictureType::FrontCover,
            media_type: "image/jpeg".to_owned(),
            description: String::new(),
            width: self.width,
            height: self.height,
            color_depth: Self::COLOR_DEPTH,
            colors_used: 0,
            data: self.data.clone(),
        }
    }
}

/// Builds the metadata block chain for a re-tagged file
///
/// Any existing VORBIS_COMMENT and PICTURE blocks are dropped,
/// including reserved codes that would be written as either,
/// all other blocks are kept in their original order,
/// then a new VORBIS_COMMENT is appended, followed by a new
/// PICTURE if the tag has cover art.
/// Only the final block in the result is flagged as last.
///
/// # Example
///
/// ```
/// use flac_retag::{Tag, rewrite};
/// use flac_retag::metadata::{Block, BlockType};
///
/// let streaminfo = Block::new(BlockType::Streaminfo, vec![0; 34]);
/// let mut comment = Block::new(BlockType::VorbisComment, vec![0; 8]);
/// comment.last = true;
///
/// let blocks = rewrite(vec![streaminfo, comment], &Tag::default()).unwrap();
///
/// assert_eq!(
///     blocks.iter().map(|b| (b.block_type, b.last)).collect::<Vec<_>>(),
///     vec![(BlockType::Streaminfo, false), (BlockType::VorbisComment, true)],
/// );
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedBlockEncoding`] if the new blocks
/// are too large to encode.
pub fn rewrite(blocks: impl IntoIterator<Item = Block>, tag: &Tag) -> Result<Vec<Block>, Error> {
    let mut rewritten = blocks
        .into_iter()
        .map(|block| Block {
            last: false,
            block_type: block.block_type.normalize(),
            ..block
        })
        .filter(|block| {
            !matches!(
                block.block_type,
                BlockType::VorbisComment | BlockType::Picture
            )
        })
        .collect::<Vec<_>>();

    match rewritten.first() {
        Some(Block {
            block_type: BlockType::Streaminfo,
            ..
        }) => { /* the usual case */ }
        Some(block) => log::warn!("first metadata block is {}, not STREAMINFO", block.block_type),
        None => log::warn!("metadata chain has no STREAMINFO block"),
    }

    rewritten.push(Block::encode(&tag.comment())?);

    if let Some(cover) = &tag.cover {
        rewritten.push(Block::encode(&cover.picture())?);
    }

    if let Some(last) = rewritten.last_mut() {
        last.last = true;
    }

    Ok(rewritten)
}
