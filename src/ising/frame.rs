use super::lattice::{Lattice, Spin};
use serde::{Deserialize, Serialize};

/// Byte layout of one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgba8,
    Rgb8,
    Gray8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Fixed color pair for the two spin states, as RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub up: [u8; 3],
    pub down: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            up: [120, 185, 181],
            down: [50, 10, 107],
        }
    }
}

impl Palette {
    pub fn color(&self, spin: Spin) -> [u8; 3] {
        match spin {
            Spin::Up => self.up,
            Spin::Down => self.down,
        }
    }

    fn pixel(&self, spin: Spin, format: PixelFormat) -> [u8; 4] {
        let [r, g, b] = self.color(spin);
        match format {
            PixelFormat::Rgba8 => [r, g, b, 255],
            PixelFormat::Rgb8 => [r, g, b, 0],
            // ITU-R BT.601 luma
            PixelFormat::Gray8 => {
                let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
                [luma as u8, 0, 0, 0]
            }
        }
    }
}

/// One rendered frame, row-major, `width * height * channels` bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of the pixel at (x, y)
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let channels = self.channels();
        let start = (y * self.width + x) * channels;
        &self.data[start..start + channels]
    }
}

/// Maps lattice state to pixels; reads the lattice, never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameProducer {
    palette: Palette,
    format: PixelFormat,
}

impl FrameProducer {
    pub fn new(palette: Palette, format: PixelFormat) -> Self {
        Self { palette, format }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn render(&self, lattice: &Lattice) -> FrameBuffer {
        let mut frame = FrameBuffer {
            width: 0,
            height: 0,
            format: self.format,
            data: Vec::new(),
        };
        self.render_into(lattice, &mut frame);
        frame
    }

    /// Re-render into an existing buffer, reusing its allocation.
    pub fn render_into(&self, lattice: &Lattice, frame: &mut FrameBuffer) {
        let channels = self.format.channels();
        let up = self.palette.pixel(Spin::Up, self.format);
        let down = self.palette.pixel(Spin::Down, self.format);

        frame.width = lattice.width();
        frame.height = lattice.height();
        frame.format = self.format;
        frame.data.clear();
        frame.data.reserve(lattice.len() * channels);
        for spin in lattice.spins() {
            let pixel = match spin {
                Spin::Up => &up,
                Spin::Down => &down,
            };
            frame.data.extend_from_slice(&pixel[..channels]);
        }
    }
}
