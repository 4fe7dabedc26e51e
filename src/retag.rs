// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! For re-tagging whole FLAC streams and files

use crate::Error;
use crate::decode::read_chain;
use crate::encode::write_container;
use crate::rewrite::{Tag, rewrite};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Re-tagging options
#[derive(Clone, Debug, Default)]
pub struct Options {
    remove_source: bool,
}

impl Options {
    /// Whether to delete the source file once its
    /// re-tagged copy has been written successfully
    ///
    /// The source is never deleted if anything fails,
    /// or if the source and destination are the same file.
    pub fn remove_source(self, remove_source: bool) -> Self {
        Self { remove_source }
    }
}

/// Re-tags a FLAC stream in a single pass
///
/// Reads the metadata blocks from `input`, replaces its
/// comment and picture blocks with ones built from `tag`,
/// and writes the new file to `output`, followed by the
/// input's audio frames, unchanged.
/// Only the metadata blocks are held in memory.
///
/// Returns the number of audio frame bytes copied.
///
/// # Example
///
/// ```
/// use flac_retag::{Tag, retag};
/// use flac_retag::decode::read_chain;
/// use flac_retag::metadata::{BlockType, VorbisComment, fields::TITLE};
///
/// let flac: &[u8] = &[
///     b'f', b'L', b'a', b'C',
///     0b1_0000001, 0x00, 0x00, 0x02,  // PADDING, 2 bytes, last
///     0x00, 0x00,
///     0xff, 0xf8, 0x69, 0x08,         // audio frames
/// ];
///
/// let tag = Tag {
///     title: "Echoes".to_owned(),
///     ..Tag::default()
/// };
///
/// let mut output = vec![];
/// assert_eq!(retag(flac, &mut output, &tag).unwrap(), 4);
///
/// let (blocks, frames) = read_chain(output.as_slice()).unwrap();
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[0].block_type, BlockType::Padding);
/// assert!(!blocks[0].last);
/// assert!(blocks[1].last);
/// assert_eq!(
///     blocks[1].decode::<VorbisComment>().unwrap().get(TITLE),
///     Some("Echoes"),
/// );
/// assert_eq!(frames, &[0xff, 0xf8, 0x69, 0x08]);
/// ```
///
/// # Errors
///
/// Returns any error parsing the input's metadata blocks,
/// building the new blocks or writing the output.
/// Output may have been partially written.
pub fn retag<R: Read, W: Write>(input: R, output: W, tag: &Tag) -> Result<u64, Error> {
    let (blocks, frames) = read_chain(input)?;
    let blocks = rewrite(blocks, tag)?;
    write_container(output, &blocks, frames)
}

/// Re-tags a FLAC file, writing the result to a new path
///
/// The result is written to a temporary file in the destination's
/// directory, which is renamed to `destination` only once
/// everything has been written.
/// If anything fails, the temporary file is removed,
/// the destination is left as it was, and the source is kept.
///
/// The new file takes on the source file's permissions.
/// The destination's directory must already exist.
/// The source and destination may be the same path.
///
/// # Errors
///
/// Returns any error from [`retag`], any error creating
/// or renaming the output file, or any error removing
/// the source file if requested.
pub fn retag_file<P, Q>(source: P, destination: Q, tag: &Tag, options: &Options) -> Result<(), Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source = source.as_ref();
    let destination = destination.as_ref();

    log::debug!("re-tagging {} to {}", source.display(), destination.display());

    let directory = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut output = tempfile::NamedTempFile::new_in(directory)?;

    let frames = {
        let input = BufReader::new(File::open(source)?);
        let mut writer = BufWriter::new(output.as_file_mut());
        let frames = retag(input, &mut writer, tag)?;
        writer.into_inner().map_err(|err| Error::Io(err.into_error()))?;
        frames
    };

    // temporary files are owner-only, so take on the source's mode
    output
        .as_file()
        .set_permissions(std::fs::metadata(source)?.permissions())?;
    output.as_file().sync_all()?;

    let same_file = same_file(source, destination);

    output
        .persist(destination)
        .map_err(|err| Error::Io(err.error))?;

    log::info!(
        "wrote {} ({frames} bytes of audio)",
        destination.display()
    );

    if options.remove_source && !same_file {
        std::fs::remove_file(source).inspect_err(|err| {
            log::warn!("unable to remove {} : {err}", source.display())
        })?;
        log::debug!("removed {}", source.display());
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        // a destination that doesn't exist yet can't be the source
        _ => false,
    }
}
