//! In-memory course surface
//!
//! A row-major RGB raster sampled at `(floor(x), floor(y))`, the way a
//! rendered canvas would be read back. Useful as a course for headless runs
//! and tests.

use crate::sim::sensors::{Rgb, Surface};

#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl RasterSurface {
    pub fn new(width: usize, height: usize, background: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x).copied()
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Paint every pixel the rectangle overlaps, clipped to the surface
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        let (x0, x1) = self.clip(x, x + width, self.width);
        let (y0, y1) = self.clip(y, y + height, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels[py * self.width + px] = color;
            }
        }
    }

    /// Paint every pixel whose center lies within `radius` of `(cx, cy)`
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb) {
        let (x0, x1) = self.clip(cx - radius, cx + radius, self.width);
        let (y0, y1) = self.clip(cy - radius, cy + radius, self.height);
        let r2 = radius * radius;
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.pixels[py * self.width + px] = color;
                }
            }
        }
    }

    /// Pixel range covering `[from, to)`, clipped to `0..limit`
    fn clip(&self, from: f64, to: f64, limit: usize) -> (usize, usize) {
        let lo = from.floor().max(0.0);
        let hi = to.ceil().min(limit as f64);
        if lo.is_nan() || hi.is_nan() || hi <= lo {
            return (0, 0);
        }
        (lo as usize, hi as usize)
    }
}

impl Surface for RasterSurface {
    fn sample(&self, x: f64, y: f64) -> Option<Rgb> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        self.get(x.floor() as usize, y.floor() as usize)
    }
}
