#![cfg(feature = "host")]
//! Host-side previews of a [`DotFrame`] as PNG and animated PNG files.
//!
//! Every dot is drawn as a disc on a black board: yellow when its lit face shows, dark gray
//! otherwise. The frame is rendered in physical panel coordinates, the way the dots hang.

use crate::max3000::frame::DotFrame;
use png::{BitDepth, ColorType, Encoder};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// RGB of a dot showing its lit face.
pub const LIT_COLOR: [u8; 3] = [255, 214, 0];
/// RGB of a dot showing its dark face.
pub const DARK_COLOR: [u8; 3] = [48, 48, 48];
/// RGB of the board between dots.
pub const BOARD_COLOR: [u8; 3] = [0, 0, 0];

/// Render a `DotFrame` into a PNG file no larger than `target_max_dimension` on either side.
pub fn write_frame_png<const W: usize, const H: usize>(
    frame: &DotFrame<W, H>,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let cell_size = select_cell_size(W, H, target_max_dimension)?;
    let (width, height, pixels) = render_rgb(frame, cell_size);
    create_parent_dir(output_path)?;

    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;
    info!("to_png: wrote {}x{} PNG", width, height);
    Ok(())
}

/// Render several `DotFrame`s into a looping APNG file, one frame every `frame_delay_ms`.
pub fn write_frames_apng<const W: usize, const H: usize>(
    frames: &[DotFrame<W, H>],
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    frame_delay_ms: u32,
) -> Result<(), Box<dyn Error>> {
    if frames.is_empty() {
        return Err("frames must not be empty".into());
    }
    if frame_delay_ms == 0 {
        return Err("frame_delay_ms must be positive".into());
    }
    let output_path = output_path.as_ref();
    let cell_size = select_cell_size(W, H, target_max_dimension)?;
    let frame_count = u32::try_from(frames.len())?;
    let delay_num = u16::try_from(frame_delay_ms)?;
    let delay_den = 1000u16;
    create_parent_dir(output_path)?;

    let (width, height, _) = render_rgb(&frames[0], cell_size);
    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_animated(frame_count, 0)?;
    let mut writer = encoder.write_header()?;
    for frame in frames {
        let (_, _, pixels) = render_rgb(frame, cell_size);
        writer.set_frame_delay(delay_num, delay_den)?;
        writer.write_image_data(&pixels)?;
    }
    writer.finish()?;
    info!("to_png: wrote {} frame APNG", frame_count);
    Ok(())
}

/// Render `frame` as 8-bit RGB with `cell_size` pixels per dot.
///
/// Returns `(width, height, bytes)`. A border of half a cell surrounds the dots.
#[must_use]
pub fn render_rgb<const W: usize, const H: usize>(
    frame: &DotFrame<W, H>,
    cell_size: u32,
) -> (u32, u32, Vec<u8>) {
    assert!(cell_size > 0, "cell_size must be positive");
    let dot_margin = (cell_size / 8).max(1).min(cell_size.saturating_sub(1) / 2);
    let radius = cell_size.saturating_sub(dot_margin * 2) / 2;
    let border = cell_size / 2;
    let width = (W as u32) * cell_size + border * 2;
    let height = (H as u32) * cell_size + border * 2;
    let mut bytes = BOARD_COLOR.repeat((width * height) as usize);

    let center = (cell_size - 1) as i32 / 2;
    let radius_sq = (radius as i32) * (radius as i32);
    for (y_index, row) in frame.iter().enumerate() {
        for (x_index, &lit) in row.iter().enumerate() {
            let color = if lit { LIT_COLOR } else { DARK_COLOR };
            let cell_origin_x = border + (x_index as u32) * cell_size;
            let cell_origin_y = border + (y_index as u32) * cell_size;
            for local_y in 0..cell_size {
                let delta_y = local_y as i32 - center;
                for local_x in 0..cell_size {
                    let delta_x = local_x as i32 - center;
                    if delta_x * delta_x + delta_y * delta_y > radius_sq {
                        continue;
                    }
                    let pixel_index =
                        (((cell_origin_y + local_y) * width + cell_origin_x + local_x) * 3) as usize;
                    bytes[pixel_index..pixel_index + 3].copy_from_slice(&color);
                }
            }
        }
    }

    (width, height, bytes)
}

/// Largest cell size whose rendering fits in `target_max_dimension`.
fn select_cell_size(
    dots_wide: usize,
    dots_high: usize,
    target_max_dimension: u32,
) -> Result<u32, Box<dyn Error>> {
    if target_max_dimension == 0 {
        return Err("target_max_dimension must be positive".into());
    }
    let dots_wide = u32::try_from(dots_wide)?;
    let dots_high = u32::try_from(dots_high)?;
    let mut cell_size = target_max_dimension;
    while cell_size > 1 {
        let border = cell_size / 2;
        let output_width = dots_wide * cell_size + border * 2;
        let output_height = dots_high * cell_size + border * 2;
        if output_width.max(output_height) <= target_max_dimension {
            break;
        }
        cell_size -= 1;
    }
    Ok(cell_size)
}

fn create_parent_dir(output_path: &Path) -> std::io::Result<()> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
