// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For reading a FLAC file's metadata block chain
//!
//! Only the metadata blocks are parsed.
//! Once the block flagged as last has been read,
//! the underlying reader is handed back untouched,
//! positioned at the first byte of the audio frames.

use crate::Error;
use crate::metadata::{Block, BlockHeader, FLAC_TAG};
use bitstream_io::{BigEndian, BitRead, BitReader};
use std::io::{ErrorKind, Read};

/// A block header exactly as it appeared on disk
pub type RawHeader = [u8; BlockHeader::BYTES];

/// An iterator over FLAC metadata blocks
///
/// Yields each block along with its raw header bytes,
/// in on-disk order, stopping after the block flagged as last.
/// Any error ends iteration.
pub struct BlockReader<R: Read> {
    reader: R,
    failed: bool,
    tag_read: bool,
    finished: bool,
}

impl<R: Read> BlockReader<R> {
    /// Creates an iterator over something that implements `Read`.
    /// Because this may perform many small reads,
    /// performance is greatly improved by buffering reads
    /// when reading from a raw `File`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            failed: false,
            tag_read: false,
            finished: false,
        }
    }

    /// Whether the block flagged as last has been read
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Returns the reader positioned at the start of the audio frames
    ///
    /// Any blocks not yet read are read and discarded first.
    ///
    /// # Errors
    ///
    /// Returns any error reading the remaining blocks,
    /// or [`Error::IncompleteBlockChain`] if iteration
    /// already stopped on an error.
    pub fn into_tail(mut self) -> Result<R, Error> {
        while let Some(block) = self.next() {
            block?;
        }

        match self.finished {
            true => Ok(self.reader),
            false => Err(Error::IncompleteBlockChain),
        }
    }

    fn read_tag(&mut self) -> Result<(), Error> {
        let mut tag = [0; 4];
        match self.reader.read_exact(&mut tag) {
            Ok(()) if &tag == FLAC_TAG => Ok(()),
            // a stream too short to hold the tag isn't FLAC either
            Ok(()) => Err(Error::InvalidSignature),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(Error::InvalidSignature),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn read_block(&mut self) -> Result<(Block, RawHeader), Error> {
        let mut raw: RawHeader = [0; BlockHeader::BYTES];
        self.reader.read_exact(&mut raw).map_err(truncated)?;

        let header: BlockHeader = BitReader::endian(raw.as_slice(), BigEndian).parse()?;

        let mut payload = Vec::new();
        Read::by_ref(&mut self.reader)
            .take(header.size.get().into())
            .read_to_end(&mut payload)?;

        if payload.len() != usize::from(header.size) {
            return Err(Error::TruncatedStream);
        }

        log::trace!(
            "read {} block of {} bytes{}",
            header.block_type,
            header.size,
            if header.last { " (last)" } else { "" },
        );

        self.finished = header.last;

        Ok((
            Block {
                last: header.last,
                block_type: header.block_type,
                payload,
            },
            raw,
        ))
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<(Block, RawHeader), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.finished {
            // once we hit an error or the final block, stop any further reads
            None
        } else if !self.tag_read {
            // "fLaC" tag must come before anything else
            match self.read_tag() {
                Ok(()) => {
                    self.tag_read = true;
                    self.next()
                }
                Err(err) => {
                    self.failed = true;
                    Some(Err(err))
                }
            }
        } else {
            match self.read_block() {
                block @ Ok(_) => Some(block),
                err @ Err(_) => {
                    self.failed = true;
                    Some(err)
                }
            }
        }
    }
}

fn truncated(err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::UnexpectedEof => Error::TruncatedStream,
        _ => Error::Io(err),
    }
}

/// Returns iterator of blocks from the given reader
///
/// The reader should be positioned at the start of the FLAC
/// file.
///
/// # Example
///
/// ```
/// use flac_retag::decode::read_blocks;
/// use flac_retag::metadata::BlockType;
///
/// let flac: &[u8] = &[
///     b'f', b'L', b'a', b'C',
///     0b0_0000001, 0x00, 0x00, 0x02,  // PADDING, 2 bytes
///     0x00, 0x00,
///     0b1_0000010, 0x00, 0x00, 0x04,  // APPLICATION, 4 bytes, last
///     0x74, 0x65, 0x73, 0x74,
///     0xff, 0xf8,                     // start of the audio frames
/// ];
///
/// let blocks = read_blocks(flac)
///     .map(|r| r.map(|(block, _)| (block.block_type, block.last)))
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
///
/// assert_eq!(
///     blocks,
///     vec![(BlockType::Padding, false), (BlockType::Application, true)],
/// );
/// ```
pub fn read_blocks<R: Read>(r: R) -> BlockReader<R> {
    BlockReader::new(r)
}

/// Reads an entire metadata block chain from the given reader
///
/// Returns the blocks along with the reader,
/// which is left positioned at the start of the audio frames.
///
/// # Errors
///
/// Returns [`Error::InvalidSignature`] if the stream
/// doesn't start with a FLAC tag, [`Error::TruncatedStream`]
/// if the stream ends before the last block is complete,
/// or any I/O error from the reader.
pub fn read_chain<R: Read>(r: R) -> Result<(Vec<Block>, R), Error> {
    let mut reader = BlockReader::new(r);

    let blocks = reader
        .by_ref()
        .map(|r| r.map(|(block, _)| block))
        .collect::<Result<Vec<_>, _>>()?;

    reader.into_tail().map(|tail| (blocks, tail))
}
