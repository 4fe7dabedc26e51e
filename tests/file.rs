// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use flac_retag::decode::read_chain;
use flac_retag::metadata::{BlockType, VorbisComment, fields};
use flac_retag::{Cover, Error, Options, Tag, retag_file};
use std::path::Path;

fn sample(frames: &[u8]) -> Vec<u8> {
    let mut flac = b"fLaC".to_vec();
    flac.extend([0b0_0000000, 0x00, 0x00, 34]);
    flac.extend(std::iter::repeat_with(|| fastrand::u8(..)).take(34));
    flac.extend([0b1_0000100, 0x00, 0x00, 8]);
    flac.extend([0; 8]);
    flac.extend(frames);
    flac
}

fn frames() -> Vec<u8> {
    std::iter::repeat_with(|| fastrand::u8(..))
        .take(fastrand::usize(1..50_000))
        .collect()
}

fn tag() -> Tag {
    Tag {
        title: "Echoes".to_owned(),
        artist: "A, B".to_owned(),
        genre: "Techno".to_owned(),
        album: "Drift".to_owned(),
        date: "2023".to_owned(),
        cover: Some(Cover::new(vec![0xff, 0xd8, 0xff, 0xd9])),
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut entries = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    entries.sort();
    entries
}

#[test]
fn test_retag_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("track.flac");
    let destination = dir.path().join("Echoes.flac");

    let frames = frames();
    std::fs::write(&source, sample(&frames)).unwrap();

    retag_file(&source, &destination, &tag(), &Options::default()).unwrap();

    // source kept by default, no temporary files left behind
    assert_eq!(entries(dir.path()), vec!["Echoes.flac", "track.flac"]);

    let output = std::fs::read(&destination).unwrap();
    let (blocks, tail) = read_chain(output.as_slice()).unwrap();

    assert_eq!(
        blocks.iter().map(|b| b.block_type).collect::<Vec<_>>(),
        vec![
            BlockType::Streaminfo,
            BlockType::VorbisComment,
            BlockType::Picture
        ],
    );
    assert_eq!(
        blocks[1].decode::<VorbisComment>().unwrap().get(fields::TITLE),
        Some("Echoes")
    );
    assert_eq!(tail, frames.as_slice());
}

#[test]
fn test_remove_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("track.flac");
    let destination = dir.path().join("Echoes.flac");

    std::fs::write(&source, sample(&frames())).unwrap();

    retag_file(
        &source,
        &destination,
        &tag(),
        &Options::default().remove_source(true),
    )
    .unwrap();

    assert_eq!(entries(dir.path()), vec!["Echoes.flac"]);
}

#[test]
fn test_retag_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.flac");

    let frames = frames();
    std::fs::write(&path, sample(&frames)).unwrap();

    // the only copy is never removed
    retag_file(&path, &path, &tag(), &Options::default().remove_source(true)).unwrap();

    assert_eq!(entries(dir.path()), vec!["track.flac"]);

    let output = std::fs::read(&path).unwrap();
    let (blocks, tail) = read_chain(output.as_slice()).unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(tail, frames.as_slice());
}

#[cfg(unix)]
#[test]
fn test_permissions_kept() {
    use std::os::unix::fs::PermissionsExt;

    fn mode(path: &Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("track.flac");
    let destination = dir.path().join("Echoes.flac");

    for source_mode in [0o644, 0o640, 0o600] {
        std::fs::write(&source, sample(&frames())).unwrap();
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(source_mode)).unwrap();

        retag_file(&source, &destination, &tag(), &Options::default()).unwrap();
        assert_eq!(mode(&destination), source_mode);

        retag_file(&source, &source, &tag(), &Options::default()).unwrap();
        assert_eq!(mode(&source), source_mode);
    }
}

#[test]
fn test_truncated_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("track.flac");
    let destination = dir.path().join("Echoes.flac");

    let mut flac = sample(&[]);
    flac.truncate(flac.len() - 3);
    std::fs::write(&source, &flac).unwrap();

    assert!(matches!(
        retag_file(
            &source,
            &destination,
            &tag(),
            &Options::default().remove_source(true)
        ),
        Err(Error::TruncatedStream)
    ));

    // nothing finalized, nothing removed
    assert_eq!(entries(dir.path()), vec!["track.flac"]);
    assert_eq!(std::fs::read(&source).unwrap(), flac);
}

#[test]
fn test_failure_keeps_destination() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("track.wav");
    let destination = dir.path().join("Echoes.flac");

    std::fs::write(&source, b"RIFF\x24\x00\x00\x00WAVE").unwrap();
    std::fs::write(&destination, b"existing").unwrap();

    assert!(matches!(
        retag_file(&source, &destination, &tag(), &Options::default()),
        Err(Error::InvalidSignature)
    ));

    assert_eq!(entries(dir.path()), vec!["Echoes.flac", "track.wav"]);
    assert_eq!(std::fs::read(&destination).unwrap(), b"existing");
}

#[test]
fn test_missing_source() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        retag_file(
            dir.path().join("missing.flac"),
            dir.path().join("Echoes.flac"),
            &tag(),
            &Options::default()
        ),
        Err(Error::Io(_))
    ));

    assert!(entries(dir.path()).is_empty());
}
