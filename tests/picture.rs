// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use flac_retag::metadata::{Block, BlockType, InvalidPicture, Picture, PictureType};
use flac_retag::{Cover, Error};

fn jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    // APP0 "JFIF"
    jpeg.extend([0xFF, 0xE0, 0x00, 0x10]);
    jpeg.extend(b"JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00");
    // restart marker, which has no length
    jpeg.extend([0xFF, 0xD0]);
    // SOF0, 8-bit, 3 components
    jpeg.extend([0xFF, 0xC0, 0x00, 0x11, 0x08]);
    jpeg.extend(height.to_be_bytes());
    jpeg.extend(width.to_be_bytes());
    jpeg.extend([0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    jpeg.extend([0xFF, 0xD9]);
    jpeg
}

#[test]
fn test_jpeg_dimensions() {
    let cover = Cover::from_jpeg(jpeg(1400, 1400)).unwrap();
    assert_eq!((cover.width, cover.height), (1400, 1400));

    let cover = Cover::from_jpeg(jpeg(640, 480)).unwrap();
    assert_eq!((cover.width, cover.height), (640, 480));
    assert_eq!(cover.data, jpeg(640, 480));

    let picture = cover.picture();
    assert_eq!(picture.width, 640);
    assert_eq!(picture.height, 480);
    assert_eq!(picture.color_depth, Cover::COLOR_DEPTH);
}

#[test]
fn test_not_jpeg() {
    assert!(matches!(
        Cover::from_jpeg(b"\x89PNG\r\n\x1a\n".to_vec()),
        Err(InvalidPicture::Unsupported)
    ));

    assert!(matches!(
        Cover::from_jpeg(vec![]),
        Err(InvalidPicture::Unsupported)
    ));

    // scan data begins before any frame header
    assert!(matches!(
        Cover::from_jpeg(vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02]),
        Err(InvalidPicture::Jpeg(_))
    ));

    // frame header runs off the end of the data
    let mut truncated = jpeg(1400, 1400);
    truncated.truncate(28);
    assert!(matches!(
        Cover::from_jpeg(truncated),
        Err(InvalidPicture::Io(_))
    ));
}

#[test]
fn test_nominal_size() {
    let cover = Cover::new(vec![1, 2, 3]);
    assert_eq!((cover.width, cover.height), (1400, 1400));

    let cover = Cover::with_size(vec![1, 2, 3], 500);
    assert_eq!((cover.width, cover.height), (500, 500));
}

#[test]
fn test_declared_size() {
    let cover = Cover::from_image(jpeg(640, 480)).unwrap().declare_size(1400);
    assert_eq!((cover.width, cover.height), (1400, 1400));
    assert_eq!(cover.data, jpeg(640, 480));

    // a non-JPEG is never labeled as one, whatever size is declared
    let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();

    match Cover::from_image(png).map(|cover| cover.declare_size(1400)) {
        #[cfg(not(feature = "transcode"))]
        Err(InvalidPicture::Unsupported) => { /* rejected */ }
        #[cfg(feature = "transcode")]
        Err(InvalidPicture::Image(_)) => { /* truncated PNG can't be converted */ }
        Ok(cover) => assert!(cover.data.starts_with(&[0xFF, 0xD8, 0xFF])),
        Err(err) => panic!("unexpected error : {err}"),
    }
}

#[test]
fn test_picture_block() {
    let picture = Picture {
        picture_type: PictureType::FrontCover,
        media_type: "image/jpeg".to_owned(),
        description: "front".to_owned(),
        width: 1400,
        height: 1400,
        color_depth: 24,
        colors_used: 0,
        data: jpeg(1400, 1400),
    };

    let block = Block::encode(&picture).unwrap();
    assert_eq!(block.block_type, BlockType::Picture);
    assert_eq!(
        block.payload.len(),
        4 + 4 + 10 + 4 + 5 + 4 * 4 + 4 + picture.data.len()
    );
    assert_eq!(block.decode::<Picture>().unwrap(), picture);
    assert_eq!(Picture::try_from(&block).unwrap(), picture);
}

#[test]
fn test_invalid_picture_block() {
    let mut block = Block::encode(&Cover::new(vec![0; 16]).picture()).unwrap();

    // reserved picture type
    block.payload[3] = 21;
    assert!(matches!(
        block.decode::<Picture>(),
        Err(Error::InvalidPictureType)
    ));
    block.payload[3] = 3;

    // trailing garbage
    block.payload.push(0);
    assert!(matches!(
        block.decode::<Picture>(),
        Err(Error::InvalidMetadataBlock)
    ));
    block.payload.pop();

    // data cut short
    block.payload.truncate(block.payload.len() - 4);
    assert!(matches!(
        block.decode::<Picture>(),
        Err(Error::InvalidMetadataBlock)
    ));

    // not a picture at all
    assert!(matches!(
        Block::new(BlockType::Padding, vec![]).decode::<Picture>(),
        Err(Error::WrongBlockType {
            expected: BlockType::Picture,
            found: BlockType::Padding,
        })
    ));
}

#[cfg(feature = "transcode")]
#[test]
fn test_transcode() {
    use image::{ImageFormat, Rgb, RgbImage};

    let mut png = std::io::Cursor::new(vec![]);
    RgbImage::from_pixel(64, 48, Rgb([0x20, 0x40, 0x80]))
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();

    let png = png.into_inner();

    let cover = Cover::transcode(png.clone()).unwrap();
    assert_eq!((cover.width, cover.height), (64, 48));
    assert!(cover.data.starts_with(&[0xFF, 0xD8, 0xFF]));

    // a declared size never skips the conversion
    let sized = Cover::from_image(png).unwrap().declare_size(1400);
    assert_eq!((sized.width, sized.height), (1400, 1400));
    assert_eq!(sized.data, cover.data);

    // the converted data reads back as a JPEG of the same size
    let again = Cover::from_jpeg(cover.data.clone()).unwrap();
    assert_eq!((again.width, again.height), (64, 48));

    // JPEG input passes through untouched
    let jpeg = jpeg(1400, 1400);
    assert_eq!(Cover::transcode(jpeg.clone()).unwrap().data, jpeg);

    assert!(matches!(
        Cover::transcode(b"not an image".to_vec()),
        Err(InvalidPicture::Image(_))
    ));
}
