//! Closed enumeration of pixel formats and their static layout table.
//!
//! Single-plane formats encode their layout in the discriminant: bits 0..3 select a
//! bytes-per-pixel class, bits 4..9 carry [`PixelFormatFlags`]. Packed and planar YUV formats and
//! the two-plane RGB+A formats use sequential tags in the high byte instead. The discriminants are
//! ABI: they are shared with shader and upload paths, and must never be renumbered.

use std::{fmt, str::FromStr};

use smallvec::SmallVec;

use crate::foundation::error::{TexcompError, TexcompResult};

const A_BIT: u32 = 1 << 4;
const BGR_BIT: u32 = 1 << 5;
const AFIRST_BIT: u32 = 1 << 6;
const PREMULT_BIT: u32 = 1 << 7;
const DEPTH_BIT: u32 = 1 << 8;
const STENCIL_BIT: u32 = 1 << 9;

/// Maximum number of memory planes any format uses.
pub const MAX_PLANES: usize = 4;

bitflags::bitflags! {
    /// Layout flags carried by single-plane format discriminants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PixelFormatFlags: u32 {
        const ALPHA = A_BIT;
        const BGR = BGR_BIT;
        const ALPHA_FIRST = AFIRST_BIT;
        const PREMULT = PREMULT_BIT;
        const DEPTH = DEPTH_BIT;
        const STENCIL = STENCIL_BIT;
    }
}

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PixelFormat {
    Any = 0,
    A8 = 1 | A_BIT,

    Rgb565 = 4,
    Rgba4444 = 5 | A_BIT,
    Rgba5551 = 6 | A_BIT,
    Yuv = 7,
    G8 = 8,
    Rg88 = 9,

    Rgb888 = 2,
    Bgr888 = 2 | BGR_BIT,

    Rgba8888 = 3 | A_BIT,
    Bgra8888 = 3 | A_BIT | BGR_BIT,
    Argb8888 = 3 | A_BIT | AFIRST_BIT,
    Abgr8888 = 3 | A_BIT | BGR_BIT | AFIRST_BIT,

    Rgba1010102 = 13 | A_BIT,
    Bgra1010102 = 13 | A_BIT | BGR_BIT,
    Argb2101010 = 13 | A_BIT | AFIRST_BIT,
    Abgr2101010 = 13 | A_BIT | BGR_BIT | AFIRST_BIT,

    Rgba8888Pre = 3 | A_BIT | PREMULT_BIT,
    Bgra8888Pre = 3 | A_BIT | PREMULT_BIT | BGR_BIT,
    Argb8888Pre = 3 | A_BIT | PREMULT_BIT | AFIRST_BIT,
    Abgr8888Pre = 3 | A_BIT | PREMULT_BIT | BGR_BIT | AFIRST_BIT,
    Rgba4444Pre = 5 | A_BIT | PREMULT_BIT,
    Rgba5551Pre = 6 | A_BIT | PREMULT_BIT,

    Rgba1010102Pre = 13 | A_BIT | PREMULT_BIT,
    Bgra1010102Pre = 13 | A_BIT | PREMULT_BIT | BGR_BIT,
    Argb2101010Pre = 13 | A_BIT | PREMULT_BIT | AFIRST_BIT,
    Abgr2101010Pre = 13 | A_BIT | PREMULT_BIT | BGR_BIT | AFIRST_BIT,

    Depth16 = 9 | DEPTH_BIT,
    Depth32 = 3 | DEPTH_BIT,
    Depth24Stencil8 = 3 | DEPTH_BIT | STENCIL_BIT,

    Yuyv = 1 << 24,
    Yvyu = 2 << 24,
    Uyvy = 3 << 24,
    Vyuy = 4 << 24,
    Ayuv = 5 << 24,
    Xrgb88888A8 = 6 << 24,
    Xbgr88888A8 = 7 << 24,
    Rgbx88888A8 = 8 << 24,
    Bgrx88888A8 = 9 << 24,
    Rgb888A8 = 10 << 24,
    Bgr888A8 = 11 << 24,
    Rgb565A8 = 12 << 24,
    Bgr565A8 = 13 << 24,
    Nv12 = 14 << 24,
    Nv21 = 15 << 24,
    Nv16 = 16 << 24,
    Nv61 = 17 << 24,
    Nv24 = 18 << 24,
    Nv42 = 19 << 24,
    Yuv410 = 20 << 24,
    Yvu410 = 21 << 24,
    Yuv411 = 22 << 24,
    Yvu411 = 23 << 24,
    Yuv420 = 24 << 24,
    Yvu420 = 25 << 24,
    Yuv422 = 26 << 24,
    Yvu422 = 27 << 24,
    Yuv444 = 28 << 24,
    Yvu444 = 29 << 24,

    R16 = 30 << 24,
    Rg1616 = 31 << 24,
    P010 = 32 << 24,
    P012 = 33 << 24,
    P016 = 34 << 24,
    S010 = 35 << 24,
    S210 = 36 << 24,
    S410 = 37 << 24,
    S012 = 38 << 24,
    S212 = 39 << 24,
    S412 = 40 << 24,
    S016 = 41 << 24,
    S216 = 42 << 24,
    S416 = 43 << 24,
}

/// Whether the components of a format sit on byte/word boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    Aligned,
    NotAligned,
    /// Multi-plane, packed YUV and the placeholder formats.
    Unknown,
}

/// Decoded low nibble of a single-plane discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BppClass {
    Undefined,
    Bytes { bpp: u8, aligned: bool },
    Yuv,
    Depth,
}

impl BppClass {
    /// Fixed lookup of the low nibble. Not arithmetic: classes 10, 11, 14 and 15 are holes.
    pub const fn from_nibble(nibble: u32) -> Self {
        match nibble & 0xf {
            1 | 8 => Self::Bytes {
                bpp: 1,
                aligned: true,
            },
            2 => Self::Bytes {
                bpp: 3,
                aligned: true,
            },
            3 => Self::Bytes {
                bpp: 4,
                aligned: true,
            },
            4..=6 => Self::Bytes {
                bpp: 2,
                aligned: false,
            },
            7 => Self::Yuv,
            9 => Self::Bytes {
                bpp: 2,
                aligned: true,
            },
            10 => Self::Depth,
            12 => Self::Bytes {
                bpp: 3,
                aligned: false,
            },
            13 => Self::Bytes {
                bpp: 4,
                aligned: false,
            },
            _ => Self::Undefined,
        }
    }
}

/// Static layout of one pixel format. Arrays are padded with zeros (and [`PixelFormat::Any`])
/// beyond `n_planes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormatInfo {
    pub format: PixelFormat,
    pub name: &'static str,
    pub n_planes: u8,
    pub bpp: [u8; MAX_PLANES],
    pub hsub: [u8; MAX_PLANES],
    pub vsub: [u8; MAX_PLANES],
    pub subformats: [PixelFormat; MAX_PLANES],
    pub aligned: Alignment,
}

const fn packed(
    format: PixelFormat,
    name: &'static str,
    bpp: u8,
    aligned: Alignment,
) -> PixelFormatInfo {
    PixelFormatInfo {
        format,
        name,
        n_planes: 1,
        bpp: [bpp, 0, 0, 0],
        hsub: [1, 0, 0, 0],
        vsub: [1, 0, 0, 0],
        subformats: [format, PixelFormat::Any, PixelFormat::Any, PixelFormat::Any],
        aligned,
    }
}

const fn packed_yuv(
    format: PixelFormat,
    name: &'static str,
    hsub: u8,
    subformat: PixelFormat,
) -> PixelFormatInfo {
    PixelFormatInfo {
        format,
        name,
        n_planes: 1,
        bpp: [4, 0, 0, 0],
        hsub: [hsub, 0, 0, 0],
        vsub: [1, 0, 0, 0],
        subformats: [subformat, PixelFormat::Any, PixelFormat::Any, PixelFormat::Any],
        aligned: Alignment::Unknown,
    }
}

const fn two_plane(
    format: PixelFormat,
    name: &'static str,
    bpp: [u8; 2],
    sub: [u8; 2],
    subformats: [PixelFormat; 2],
) -> PixelFormatInfo {
    PixelFormatInfo {
        format,
        name,
        n_planes: 2,
        bpp: [bpp[0], bpp[1], 0, 0],
        hsub: [1, sub[0], 0, 0],
        vsub: [1, sub[1], 0, 0],
        subformats: [
            subformats[0],
            subformats[1],
            PixelFormat::Any,
            PixelFormat::Any,
        ],
        aligned: Alignment::Unknown,
    }
}

const fn three_plane(
    format: PixelFormat,
    name: &'static str,
    bpp: u8,
    sub: [u8; 2],
    subformat: PixelFormat,
) -> PixelFormatInfo {
    PixelFormatInfo {
        format,
        name,
        n_planes: 3,
        bpp: [bpp, bpp, bpp, 0],
        hsub: [1, sub[0], sub[0], 0],
        vsub: [1, sub[1], sub[1], 0],
        subformats: [subformat, subformat, subformat, PixelFormat::Any],
        aligned: Alignment::Unknown,
    }
}

use Alignment::{Aligned, NotAligned, Unknown};
use PixelFormat as F;

impl PixelFormat {
    pub const ALL: [PixelFormat; 74] = [
        F::Any,
        F::A8,
        F::Rgb565,
        F::Rgba4444,
        F::Rgba5551,
        F::Yuv,
        F::G8,
        F::Rg88,
        F::Rgb888,
        F::Bgr888,
        F::Rgba8888,
        F::Bgra8888,
        F::Argb8888,
        F::Abgr8888,
        F::Rgba1010102,
        F::Bgra1010102,
        F::Argb2101010,
        F::Abgr2101010,
        F::Rgba8888Pre,
        F::Bgra8888Pre,
        F::Argb8888Pre,
        F::Abgr8888Pre,
        F::Rgba4444Pre,
        F::Rgba5551Pre,
        F::Rgba1010102Pre,
        F::Bgra1010102Pre,
        F::Argb2101010Pre,
        F::Abgr2101010Pre,
        F::Depth16,
        F::Depth32,
        F::Depth24Stencil8,
        F::Yuyv,
        F::Yvyu,
        F::Uyvy,
        F::Vyuy,
        F::Ayuv,
        F::Xrgb88888A8,
        F::Xbgr88888A8,
        F::Rgbx88888A8,
        F::Bgrx88888A8,
        F::Rgb888A8,
        F::Bgr888A8,
        F::Rgb565A8,
        F::Bgr565A8,
        F::Nv12,
        F::Nv21,
        F::Nv16,
        F::Nv61,
        F::Nv24,
        F::Nv42,
        F::Yuv410,
        F::Yvu410,
        F::Yuv411,
        F::Yvu411,
        F::Yuv420,
        F::Yvu420,
        F::Yuv422,
        F::Yvu422,
        F::Yuv444,
        F::Yvu444,
        F::R16,
        F::Rg1616,
        F::P010,
        F::P012,
        F::P016,
        F::S010,
        F::S210,
        F::S410,
        F::S012,
        F::S212,
        F::S412,
        F::S016,
        F::S216,
        F::S416,
    ];

    pub const fn info(self) -> PixelFormatInfo {
        match self {
            F::Any => packed(self, "ANY", 0, Unknown),
            F::A8 => packed(self, "A_8", 1, Aligned),
            F::Rgb565 => packed(self, "RGB_565", 2, NotAligned),
            F::Rgba4444 => packed(self, "RGBA_4444", 2, NotAligned),
            F::Rgba5551 => packed(self, "RGBA_5551", 2, NotAligned),
            F::Yuv => packed(self, "YUV", 0, Unknown),
            F::G8 => packed(self, "G_8", 1, Aligned),
            F::Rg88 => packed(self, "RG_88", 2, Aligned),
            F::Rgb888 => packed(self, "RGB_888", 3, Aligned),
            F::Bgr888 => packed(self, "BGR_888", 3, Aligned),
            F::Rgba8888 => packed(self, "RGBA_8888", 4, Aligned),
            F::Bgra8888 => packed(self, "BGRA_8888", 4, Aligned),
            F::Argb8888 => packed(self, "ARGB_8888", 4, Aligned),
            F::Abgr8888 => packed(self, "ABGR_8888", 4, Aligned),
            F::Rgba1010102 => packed(self, "RGBA_1010102", 4, NotAligned),
            F::Bgra1010102 => packed(self, "BGRA_1010102", 4, NotAligned),
            F::Argb2101010 => packed(self, "ARGB_2101010", 4, NotAligned),
            F::Abgr2101010 => packed(self, "ABGR_2101010", 4, NotAligned),
            F::Rgba8888Pre => packed(self, "RGBA_8888_PRE", 4, Aligned),
            F::Bgra8888Pre => packed(self, "BGRA_8888_PRE", 4, Aligned),
            F::Argb8888Pre => packed(self, "ARGB_8888_PRE", 4, Aligned),
            F::Abgr8888Pre => packed(self, "ABGR_8888_PRE", 4, Aligned),
            F::Rgba4444Pre => packed(self, "RGBA_4444_PRE", 2, NotAligned),
            F::Rgba5551Pre => packed(self, "RGBA_5551_PRE", 2, NotAligned),
            F::Rgba1010102Pre => packed(self, "RGBA_1010102_PRE", 4, NotAligned),
            F::Bgra1010102Pre => packed(self, "BGRA_1010102_PRE", 4, NotAligned),
            F::Argb2101010Pre => packed(self, "ARGB_2101010_PRE", 4, NotAligned),
            F::Abgr2101010Pre => packed(self, "ABGR_2101010_PRE", 4, NotAligned),
            F::Depth16 => packed(self, "DEPTH_16", 2, Aligned),
            F::Depth32 => packed(self, "DEPTH_32", 4, Aligned),
            F::Depth24Stencil8 => packed(self, "DEPTH_24_STENCIL_8", 4, Aligned),

            F::Yuyv => packed_yuv(self, "YUYV", 2, F::Rgba8888),
            F::Yvyu => packed_yuv(self, "YVYU", 2, F::Rgba8888),
            F::Uyvy => packed_yuv(self, "UYVY", 2, F::Rgba8888),
            F::Vyuy => packed_yuv(self, "VYUY", 2, F::Rgba8888),
            F::Ayuv => packed_yuv(self, "AYUV", 1, F::Bgra8888),

            F::Xrgb88888A8 => two_plane(self, "XRGB88888_A8", [4, 1], [1, 1], [F::Bgra8888, F::A8]),
            F::Xbgr88888A8 => two_plane(self, "XBGR88888_A8", [4, 1], [1, 1], [F::Rgba8888, F::A8]),
            F::Rgbx88888A8 => two_plane(self, "RGBX88888_A8", [4, 1], [1, 1], [F::Abgr8888, F::A8]),
            F::Bgrx88888A8 => two_plane(self, "BGRX88888_A8", [4, 1], [1, 1], [F::Argb8888, F::A8]),
            F::Rgb888A8 => two_plane(self, "RGB888_A8", [3, 1], [1, 1], [F::Bgr888, F::A8]),
            F::Bgr888A8 => two_plane(self, "BGR888_A8", [3, 1], [1, 1], [F::Rgb888, F::A8]),
            F::Rgb565A8 => two_plane(self, "RGB565_A8", [2, 1], [1, 1], [F::Rgb565, F::A8]),
            F::Bgr565A8 => two_plane(self, "BGR565_A8", [2, 1], [1, 1], [F::Rgb565, F::A8]),

            F::Nv12 => two_plane(self, "NV12", [1, 2], [2, 2], [F::G8, F::Rg88]),
            F::Nv21 => two_plane(self, "NV21", [1, 2], [2, 2], [F::G8, F::Rg88]),
            F::Nv16 => two_plane(self, "NV16", [1, 2], [2, 1], [F::G8, F::Rg88]),
            F::Nv61 => two_plane(self, "NV61", [1, 2], [2, 1], [F::G8, F::Rg88]),
            F::Nv24 => two_plane(self, "NV24", [1, 2], [1, 1], [F::G8, F::Rg88]),
            F::Nv42 => two_plane(self, "NV42", [1, 2], [1, 1], [F::G8, F::Rg88]),

            F::Yuv410 => three_plane(self, "YUV410", 1, [4, 4], F::G8),
            F::Yvu410 => three_plane(self, "YVU410", 1, [4, 4], F::G8),
            F::Yuv411 => three_plane(self, "YUV411", 1, [4, 1], F::G8),
            F::Yvu411 => three_plane(self, "YVU411", 1, [4, 1], F::G8),
            F::Yuv420 => three_plane(self, "YUV420", 1, [2, 2], F::G8),
            F::Yvu420 => three_plane(self, "YVU420", 1, [2, 2], F::G8),
            F::Yuv422 => three_plane(self, "YUV422", 1, [2, 1], F::G8),
            F::Yvu422 => three_plane(self, "YVU422", 1, [2, 1], F::G8),
            F::Yuv444 => three_plane(self, "YUV444", 1, [1, 1], F::G8),
            F::Yvu444 => three_plane(self, "YVU444", 1, [1, 1], F::G8),

            F::R16 => packed(self, "R_16", 2, Aligned),
            F::Rg1616 => packed(self, "RG_1616", 4, Aligned),
            F::P010 => two_plane(self, "P010", [2, 4], [2, 2], [F::R16, F::Rg1616]),
            F::P012 => two_plane(self, "P012", [2, 4], [2, 2], [F::R16, F::Rg1616]),
            F::P016 => two_plane(self, "P016", [2, 4], [2, 2], [F::R16, F::Rg1616]),
            F::S010 => three_plane(self, "S010", 2, [2, 2], F::R16),
            F::S210 => three_plane(self, "S210", 2, [2, 1], F::R16),
            F::S410 => three_plane(self, "S410", 2, [1, 1], F::R16),
            F::S012 => three_plane(self, "S012", 2, [2, 2], F::R16),
            F::S212 => three_plane(self, "S212", 2, [2, 1], F::R16),
            F::S412 => three_plane(self, "S412", 2, [1, 1], F::R16),
            F::S016 => three_plane(self, "S016", 2, [2, 2], F::R16),
            F::S216 => three_plane(self, "S216", 2, [2, 1], F::R16),
            F::S416 => three_plane(self, "S416", 2, [1, 1], F::R16),
        }
    }

    pub fn from_u32(v: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| *f as u32 == v)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Flag bits. Empty for formats identified by a high-byte tag.
    pub fn flags(self) -> PixelFormatFlags {
        if self.is_tagged() {
            return PixelFormatFlags::empty();
        }
        PixelFormatFlags::from_bits_truncate(self as u32)
    }

    /// Bytes-per-pixel class of the low nibble. `Undefined` for high-byte tagged formats.
    pub fn bpp_class(self) -> BppClass {
        if self.is_tagged() {
            return BppClass::Undefined;
        }
        if self.flags().contains(PixelFormatFlags::DEPTH) {
            return BppClass::Depth;
        }
        BppClass::from_nibble(self as u32)
    }

    fn is_tagged(self) -> bool {
        (self as u32) >> 24 != 0
    }

    pub fn n_planes(self) -> usize {
        usize::from(self.info().n_planes)
    }

    /// Bytes per pixel of `plane`; for horizontally subsampled packed formats this is the size
    /// of one texel covering `hsub` pixels.
    ///
    /// # Panics
    /// Panics if `plane >= n_planes()`.
    pub fn bytes_per_pixel(self, plane: usize) -> usize {
        let info = self.info();
        assert!(
            plane < usize::from(info.n_planes),
            "plane {plane} out of range for {} ({} planes)",
            info.name,
            info.n_planes
        );
        usize::from(info.bpp[plane])
    }

    /// Single-plane convenience form of [`PixelFormat::bytes_per_pixel`].
    pub fn bytes_per_pixel_plane0(self) -> usize {
        self.bytes_per_pixel(0)
    }

    /// Horizontal and vertical subsampling divisors, one entry per plane.
    pub fn subsampling_factors(self) -> (SmallVec<[u8; MAX_PLANES]>, SmallVec<[u8; MAX_PLANES]>) {
        let info = self.info();
        let n = usize::from(info.n_planes);
        (
            SmallVec::from_slice(&info.hsub[..n]),
            SmallVec::from_slice(&info.vsub[..n]),
        )
    }

    /// Per-plane formats used to upload each memory plane as its own texture.
    pub fn subformats(self) -> SmallVec<[PixelFormat; MAX_PLANES]> {
        let info = self.info();
        SmallVec::from_slice(&info.subformats[..usize::from(info.n_planes)])
    }

    pub fn alignment(self) -> Alignment {
        self.info().aligned
    }

    /// True when reading a pixel as a machine word depends on host byte order. Derived from
    /// component alignment; formats of unknown alignment report `false`.
    pub fn is_endian_dependent(self) -> bool {
        matches!(self.alignment(), Alignment::Aligned)
    }

    pub fn has_alpha(self) -> bool {
        if self.flags().contains(PixelFormatFlags::ALPHA) {
            return true;
        }
        matches!(
            self,
            F::Ayuv
                | F::Xrgb88888A8
                | F::Xbgr88888A8
                | F::Rgbx88888A8
                | F::Bgrx88888A8
                | F::Rgb888A8
                | F::Bgr888A8
                | F::Rgb565A8
                | F::Bgr565A8
        )
    }

    pub fn is_premultiplied(self) -> bool {
        self.flags().contains(PixelFormatFlags::PREMULT)
    }

    /// Formats with color and alpha components; `A_8` has nothing to premultiply.
    pub fn can_have_premult(self) -> bool {
        self.flags().contains(PixelFormatFlags::ALPHA) && self != F::A8
    }

    pub fn to_premultiplied(self) -> Self {
        if !self.can_have_premult() {
            return self;
        }
        Self::from_u32(self as u32 | PREMULT_BIT).unwrap_or(self)
    }

    pub fn to_straight(self) -> Self {
        if !self.is_premultiplied() {
            return self;
        }
        Self::from_u32(self as u32 & !PREMULT_BIT).unwrap_or(self)
    }

    /// Formats whose samples are luma/chroma rather than RGB.
    pub fn is_yuv(self) -> bool {
        matches!(
            self,
            F::Yuv
                | F::Yuyv
                | F::Yvyu
                | F::Uyvy
                | F::Vyuy
                | F::Ayuv
                | F::Nv12
                | F::Nv21
                | F::Nv16
                | F::Nv61
                | F::Nv24
                | F::Nv42
                | F::Yuv410
                | F::Yvu410
                | F::Yuv411
                | F::Yvu411
                | F::Yuv420
                | F::Yvu420
                | F::Yuv422
                | F::Yvu422
                | F::Yuv444
                | F::Yvu444
                | F::P010
                | F::P012
                | F::P016
                | F::S010
                | F::S210
                | F::S410
                | F::S012
                | F::S212
                | F::S412
                | F::S016
                | F::S216
                | F::S416
        )
    }

    /// Byte layout of a tightly packed `width` x `height` image in this format.
    pub fn plane_layout(self, width: u32, height: u32) -> PlaneLayout {
        let info = self.info();
        let mut planes = Vec::with_capacity(usize::from(info.n_planes));
        let mut offset = 0usize;
        for i in 0..usize::from(info.n_planes) {
            let w = width / u32::from(info.hsub[i]);
            let h = height / u32::from(info.vsub[i]);
            let stride = w as usize * usize::from(info.bpp[i]);
            let byte_len = stride * h as usize;
            planes.push(PlaneExtent {
                width: w,
                height: h,
                stride,
                offset,
                byte_len,
            });
            offset += byte_len;
        }
        PlaneLayout {
            planes,
            total_bytes: offset,
        }
    }
}

/// Extent of one memory plane inside a packed image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PlaneExtent {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub offset: usize,
    pub byte_len: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PlaneLayout {
    pub planes: Vec<PlaneExtent>,
    pub total_bytes: usize,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = TexcompError;

    fn from_str(s: &str) -> TexcompResult<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TexcompError::validation(format!("unknown pixel format '{s}'")))
    }
}

impl serde::Serialize for PixelFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for PixelFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/pixel_format.rs"]
mod tests;
