#![cfg(feature = "host")]
#![allow(missing_docs)]
//! Host-level tests for PNG previews of dot frames.

use std::error::Error;
use std::fs::File;
use std::path::Path;

use max3000_kit::max3000::frame::{Canvas, DotColor, DotFrame, Rotation};
use max3000_kit::to_png::{
    BOARD_COLOR, DARK_COLOR, LIT_COLOR, render_rgb, write_frame_png, write_frames_apng,
};

type Frame = DotFrame<28, 16>;

fn checkerboard() -> Frame {
    let mut frame = Frame::new();
    let mut canvas = Canvas::new(&mut frame, Rotation::Deg0);
    for y_index in 0..16 {
        for x_index in 0..28 {
            if (x_index + y_index) % 2 == 0 {
                canvas.draw_pixel(x_index, y_index, DotColor::Light);
            }
        }
    }
    frame
}

fn rgb_at(bytes: &[u8], width: u32, x_pixel: u32, y_pixel: u32) -> [u8; 3] {
    let index = ((y_pixel * width + x_pixel) * 3) as usize;
    [bytes[index], bytes[index + 1], bytes[index + 2]]
}

fn decode(path: &Path) -> Result<(png::OutputInfo, Vec<u8>, u32), Box<dyn Error>> {
    let decoder = png::Decoder::new(File::open(path)?);
    let mut reader = decoder.read_info()?;
    let frame_count = reader
        .info()
        .animation_control
        .map_or(1, |control| control.num_frames);
    let mut bytes = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut bytes)?;
    bytes.truncate(info.buffer_size());
    Ok((info, bytes, frame_count))
}

#[test]
fn dots_render_as_colored_discs() {
    let frame = checkerboard();
    let cell_size = 10;
    let (width, height, bytes) = render_rgb(&frame, cell_size);
    assert_eq!((width, height), (28 * 10 + 10, 16 * 10 + 10));

    let border = cell_size / 2;
    let center = (cell_size - 1) / 2;
    // Dot (0, 0) is lit, dot (1, 0) is dark.
    assert_eq!(rgb_at(&bytes, width, border + center, border + center), LIT_COLOR);
    assert_eq!(
        rgb_at(&bytes, width, border + cell_size + center, border + center),
        DARK_COLOR
    );
    // Corners of a cell fall outside the disc.
    assert_eq!(rgb_at(&bytes, width, border, border), BOARD_COLOR);
    assert_eq!(rgb_at(&bytes, width, 0, 0), BOARD_COLOR);
}

#[test]
fn png_fits_the_requested_size() -> Result<(), Box<dyn Error>> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("nested").join("checkerboard.png");
    write_frame_png(&checkerboard(), &path, 300)?;

    let (info, bytes, frame_count) = decode(&path)?;
    assert_eq!(frame_count, 1);
    assert!(info.width <= 300 && info.height <= 300);
    assert!(info.width > 200, "cell size should be as large as fits");
    assert_eq!(info.color_type, png::ColorType::Rgb);
    assert_eq!(bytes.len(), (info.width * info.height * 3) as usize);
    Ok(())
}

#[test]
fn apng_holds_every_frame() -> Result<(), Box<dyn Error>> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("wipe.png");
    let frames = [Frame::new(), checkerboard(), Frame::filled(true)];
    write_frames_apng(&frames, &path, 150, 250)?;

    let (_, _, frame_count) = decode(&path)?;
    assert_eq!(frame_count, 3);
    Ok(())
}

#[test]
fn apng_rejects_bad_arguments() {
    let directory = tempfile::tempdir().expect("temporary directory");
    let path = directory.path().join("bad.png");
    assert!(write_frames_apng::<28, 16>(&[], &path, 150, 250).is_err());
    assert!(write_frames_apng(&[Frame::new()], &path, 150, 0).is_err());
    assert!(write_frame_png(&Frame::new(), &path, 0).is_err());
}
