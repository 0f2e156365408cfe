//! Raster opacity sources for contour tracing.

use crate::Error;

/// Something that can be sampled for per-pixel opacity.
pub trait OpacitySampler {
    /// The width, in pixels.
    fn width(&self) -> u32;

    /// The height, in pixels.
    fn height(&self) -> u32;

    /// The opacity of the pixel at `(x, y)`, with 255 meaning fully opaque.
    ///
    /// Only called with `x < width()` and `y < height()`.
    fn opacity(&self, x: u32, y: u32) -> u8;

    /// Does this raster carry an alpha channel at all?
    ///
    /// Rasters without one are treated as fully opaque rectangles.
    fn has_alpha(&self) -> bool {
        true
    }
}

/// An owned 8-bit alpha mask, stored row by row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    /// Wraps a row-major buffer of `width * height` opacity values.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::MaskSize {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(AlphaMask {
            width,
            height,
            data,
        })
    }

    /// Builds a mask by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        AlphaMask {
            width,
            height,
            data,
        }
    }

    /// Parses an ASCII-art mask: `#` is opaque, anything else transparent.
    ///
    /// All rows must have the same length.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, Error> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        AlphaMask::new(width, height, data)
    }

    /// The raw opacity values.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl OpacitySampler for AlphaMask {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn opacity(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

impl<S: OpacitySampler + ?Sized> OpacitySampler for &S {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn opacity(&self, x: u32, y: u32) -> u8 {
        (**self).opacity(x, y)
    }

    fn has_alpha(&self) -> bool {
        (**self).has_alpha()
    }
}

#[cfg(feature = "image")]
mod image_impls {
    use super::OpacitySampler;

    macro_rules! impl_sampler {
        ($ty:ty, $has_alpha:expr, |$px:ident| $opacity:expr) => {
            impl OpacitySampler for $ty {
                fn width(&self) -> u32 {
                    self.dimensions().0
                }

                fn height(&self) -> u32 {
                    self.dimensions().1
                }

                fn opacity(&self, x: u32, y: u32) -> u8 {
                    let $px = self.get_pixel(x, y);
                    $opacity
                }

                fn has_alpha(&self) -> bool {
                    $has_alpha
                }
            }
        };
    }

    impl_sampler!(image::GrayImage, false, |_px| 255);
    impl_sampler!(image::RgbImage, false, |_px| 255);
    impl_sampler!(image::GrayAlphaImage, true, |px| px.0[1]);
    impl_sampler!(image::RgbaImage, true, |px| px.0[3]);
}
