//! Binary PNM export of rendered frames

use crate::ising::{FrameBuffer, PixelFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write a frame as binary PPM (P6) or, for grayscale frames, PGM (P5).
///
/// RGBA frames drop the alpha channel.
pub fn write_frame_pnm<W: Write>(writer: &mut W, frame: &FrameBuffer) -> io::Result<()> {
    let magic = match frame.format() {
        PixelFormat::Gray8 => "P5",
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => "P6",
    };
    write!(writer, "{}\n{} {}\n255\n", magic, frame.width(), frame.height())?;

    match frame.format() {
        PixelFormat::Gray8 | PixelFormat::Rgb8 => writer.write_all(frame.as_bytes())?,
        PixelFormat::Rgba8 => {
            for pixel in frame.as_bytes().chunks_exact(4) {
                writer.write_all(&pixel[..3])?;
            }
        }
    }
    Ok(())
}

pub fn write_frame_pnm_file<P: AsRef<Path>>(path: P, frame: &FrameBuffer) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_frame_pnm(&mut writer, frame)?;
    writer.flush()
}
