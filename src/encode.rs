// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For writing a FLAC file from a metadata block chain and audio frames

use crate::Error;
use crate::metadata::{Block, FLAC_TAG};
use bitstream_io::{BigEndian, BitWrite, BitWriter};
use std::io::{Read, Write};

/// Writes FLAC tag and metadata blocks to the given writer
///
/// Each block's header is rebuilt from the block itself,
/// so its size always matches its payload.
///
/// Because this may perform many small writes,
/// buffering writes may greatly improve performance
/// when writing to a raw `File`.
///
/// # Errors
///
/// Returns [`Error::InvalidLastBlockFlag`] if the chain is empty
/// or any block other than the final one is flagged as last,
/// or if the final one isn't.
/// Returns [`Error::UnsupportedBlockEncoding`] if any block
/// is too large.
/// Nothing is written in either case.
/// Passes along any I/O errors from the underlying stream.
pub fn write_blocks<W: Write>(mut w: W, blocks: &[Block]) -> Result<(), Error> {
    match blocks.split_last() {
        Some((last, rest)) if last.last && !rest.iter().any(|b| b.last) => { /* valid chain */ }
        _ => return Err(Error::InvalidLastBlockFlag),
    }

    let headers = blocks
        .iter()
        .map(Block::header)
        .collect::<Result<Vec<_>, _>>()?;

    // "fLaC" tag must come before anything else
    w.write_all(FLAC_TAG)?;

    let mut w = BitWriter::endian(w, BigEndian);

    headers
        .iter()
        .zip(blocks)
        .try_for_each(|(header, block)| {
            w.build(header)?;
            w.write_bytes(&block.payload)
        })
        .map_err(Error::Io)
}

/// Writes a complete FLAC file to the given writer
///
/// The metadata blocks are written as with [`write_blocks`],
/// then the audio frames are copied from `frames`
/// byte-for-byte, through a fixed-size buffer,
/// until it is exhausted.
///
/// Returns the number of audio frame bytes copied.
///
/// # Example
///
/// ```
/// use flac_retag::encode::write_container;
/// use flac_retag::metadata::{Block, BlockType};
///
/// let mut streaminfo = Block::new(BlockType::Streaminfo, vec![0; 34]);
/// streaminfo.last = true;
///
/// let frames: &[u8] = &[0xff, 0xf8, 0x69, 0x08];
/// let mut flac = vec![];
///
/// assert_eq!(write_container(&mut flac, &[streaminfo], frames).unwrap(), 4);
/// assert_eq!(&flac[0..4], b"fLaC");
/// assert_eq!(&flac[4..8], &[0b1_0000000, 0x00, 0x00, 34]);
/// assert_eq!(&flac[8 + 34..], frames);
/// ```
///
/// # Errors
///
/// Returns any error from [`write_blocks`]
/// or any I/O error copying the frames.
pub fn write_container<W: Write, R: Read>(
    mut w: W,
    blocks: &[Block],
    mut frames: R,
) -> Result<u64, Error> {
    write_blocks(&mut w, blocks)?;
    let copied = std::io::copy(&mut frames, &mut w)?;
    w.flush()?;
    Ok(copied)
}
