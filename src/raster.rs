//! Offscreen RGBA raster and image export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::theme::Rgba;

/// Error type for image export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no image to export")]
    EmptyImage,
    #[error("failed to write image {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Row-major RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Raster {
    /// A raster with every pixel transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba::new(0, 0, 0, 0))
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.offset(x, y).map(|i| self.pixels[i])
    }

    /// Overwrite a pixel. Out-of-bounds writes are dropped.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Set a pixel given signed coordinates, clipping to the raster.
    pub fn plot(&mut self, x: i64, y: i64, color: Rgba) {
        if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
            self.put_pixel(x, y, color);
        }
    }

    /// Composite `color` over the existing pixel using its alpha.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let Some(i) = self.offset(x, y) else {
            return;
        };
        let dst = self.pixels[i];
        let a = u32::from(color.alpha);
        let mix = |s: u8, d: u8| ((u32::from(s) * a + u32::from(d) * (255 - a) + 127) / 255) as u8;
        self.pixels[i] = Rgba::new(
            mix(color.red, dst.red),
            mix(color.green, dst.green),
            mix(color.blue, dst.blue),
            dst.alpha.max(color.alpha),
        );
    }

    /// Encode as binary PPM (P6). Alpha is dropped.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            bytes.extend_from_slice(&[p.red, p.green, p.blue]);
        }
        out.write_all(&bytes)?;
        out.flush()
    }

    pub fn to_ppm(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_ppm(&mut buf);
        buf
    }
}

/// Destination for the "copy image" action.
pub trait ImageSink {
    fn copy_image(&mut self, raster: &Raster) -> Result<(), ExportError>;
}

/// Writes copied images to a PPM file, replacing it each time.
#[derive(Debug, Clone)]
pub struct PpmFileSink {
    path: PathBuf,
}

impl PpmFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSink for PpmFileSink {
    fn copy_image(&mut self, raster: &Raster) -> Result<(), ExportError> {
        if raster.is_empty() {
            return Err(ExportError::EmptyImage);
        }
        let wrap = |source| ExportError::Write {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(wrap)?;
        raster.write_ppm(BufWriter::new(file)).map_err(wrap)?;
        info!(
            path = %self.path.display(),
            width = raster.width(),
            height = raster.height(),
            "Image written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_outside_bounds_are_ignored() {
        let mut raster = Raster::new(2, 2);
        let red = Rgba::new(255, 0, 0, 255);
        raster.put_pixel(5, 0, red);
        raster.plot(-1, 1, red);
        assert!(raster.pixels().iter().all(|p| p.alpha == 0));

        raster.plot(1, 1, red);
        assert_eq!(raster.pixel(1, 1), Some(red));
        assert_eq!(raster.pixel(2, 1), None);
    }

    #[test]
    fn ppm_header_and_payload() {
        let raster = Raster::filled(2, 1, Rgba::new(1, 2, 3, 255));
        let ppm = raster.to_ppm();
        assert!(ppm.starts_with(b"P6\n2 1\n255\n"));
        assert_eq!(&ppm[ppm.len() - 6..], &[1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn blend_mixes_by_alpha() {
        let mut raster = Raster::filled(1, 1, Rgba::new(0, 0, 0, 255));
        raster.blend_pixel(0, 0, Rgba::new(255, 255, 255, 255));
        assert_eq!(raster.pixel(0, 0), Some(Rgba::new(255, 255, 255, 255)));

        let mut raster = Raster::filled(1, 1, Rgba::new(0, 0, 0, 255));
        raster.blend_pixel(0, 0, Rgba::new(255, 0, 0, 0));
        assert_eq!(raster.pixel(0, 0), Some(Rgba::new(0, 0, 0, 255)));
    }

    #[test]
    fn sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ppm");
        let mut sink = PpmFileSink::new(&path);
        let raster = Raster::filled(3, 2, Rgba::new(9, 9, 9, 255));
        sink.copy_image(&raster).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), raster.to_ppm());
    }

    #[test]
    fn sink_rejects_empty_raster() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PpmFileSink::new(dir.path().join("out.ppm"));
        assert!(matches!(
            sink.copy_image(&Raster::new(0, 0)),
            Err(ExportError::EmptyImage)
        ));
    }
}
