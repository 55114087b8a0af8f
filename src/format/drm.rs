use crate::{
    foundation::error::{TexcompError, TexcompResult},
    format::{multi_texture_format::MultiTextureFormat, pixel_format::PixelFormat},
};

pub const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24
}

/// How a client buffer format is uploaded and sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrmFormatInfo {
    pub drm_format: u32,
    pub name: &'static str,
    /// Same layout with the alpha channel ignored, when one exists.
    pub opaque_substitute: Option<u32>,
    /// Texture format for `Simple` buffers, the tagged buffer format otherwise.
    pub pixel_format: PixelFormat,
    pub multi_texture_format: MultiTextureFormat,
    /// The alpha channel, if any, must be ignored.
    pub opaque: bool,
}

macro_rules! simple {
    ($code:literal, $name:literal, $pf:ident, $sub:expr, $opaque:expr) => {
        DrmFormatInfo {
            drm_format: fourcc($code),
            name: $name,
            opaque_substitute: $sub,
            pixel_format: PixelFormat::$pf,
            multi_texture_format: MultiTextureFormat::Simple,
            opaque: $opaque,
        }
    };
}

macro_rules! multi {
    ($code:literal, $name:literal, $pf:ident) => {
        DrmFormatInfo {
            drm_format: fourcc($code),
            name: $name,
            opaque_substitute: None,
            pixel_format: PixelFormat::$pf,
            multi_texture_format: MultiTextureFormat::$pf,
            opaque: false,
        }
    };
}

static FORMATS: &[DrmFormatInfo] = &[
    simple!(b"RG16", "RGB565", Rgb565, None, true),
    simple!(b"RG24", "RGB888", Bgr888, None, true),
    simple!(b"BG24", "BGR888", Rgb888, None, true),
    simple!(b"AR24", "ARGB8888", Bgra8888Pre, Some(fourcc(b"XR24")), false),
    simple!(b"XR24", "XRGB8888", Bgra8888Pre, None, true),
    simple!(b"AB24", "ABGR8888", Rgba8888Pre, Some(fourcc(b"XB24")), false),
    simple!(b"XB24", "XBGR8888", Rgba8888Pre, None, true),
    simple!(b"RA24", "RGBA8888", Abgr8888Pre, Some(fourcc(b"RX24")), false),
    simple!(b"RX24", "RGBX8888", Abgr8888Pre, None, true),
    simple!(b"BA24", "BGRA8888", Argb8888Pre, Some(fourcc(b"BX24")), false),
    simple!(b"BX24", "BGRX8888", Argb8888Pre, None, true),
    simple!(b"AR30", "ARGB2101010", Argb2101010Pre, Some(fourcc(b"XR30")), false),
    simple!(b"XR30", "XRGB2101010", Argb2101010Pre, None, true),
    simple!(b"AB30", "ABGR2101010", Abgr2101010Pre, Some(fourcc(b"XB30")), false),
    simple!(b"XB30", "XBGR2101010", Abgr2101010Pre, None, true),
    simple!(b"RA30", "RGBA1010102", Rgba1010102Pre, Some(fourcc(b"RX30")), false),
    simple!(b"RX30", "RGBX1010102", Rgba1010102Pre, None, true),
    simple!(b"BA30", "BGRA1010102", Bgra1010102Pre, Some(fourcc(b"BX30")), false),
    simple!(b"BX30", "BGRX1010102", Bgra1010102Pre, None, true),
    multi!(b"YUYV", "YUYV", Yuyv),
    multi!(b"YVYU", "YVYU", Yvyu),
    multi!(b"UYVY", "UYVY", Uyvy),
    multi!(b"VYUY", "VYUY", Vyuy),
    multi!(b"AYUV", "AYUV", Ayuv),
    DrmFormatInfo {
        drm_format: fourcc(b"XRA8"),
        name: "XRGB8888_A8",
        opaque_substitute: None,
        pixel_format: PixelFormat::Xrgb88888A8,
        multi_texture_format: MultiTextureFormat::Xrgb8888A8,
        opaque: false,
    },
    DrmFormatInfo {
        drm_format: fourcc(b"XBA8"),
        name: "XBGR8888_A8",
        opaque_substitute: None,
        pixel_format: PixelFormat::Xbgr88888A8,
        multi_texture_format: MultiTextureFormat::Xbgr8888A8,
        opaque: false,
    },
    DrmFormatInfo {
        drm_format: fourcc(b"RXA8"),
        name: "RGBX8888_A8",
        opaque_substitute: None,
        pixel_format: PixelFormat::Rgbx88888A8,
        multi_texture_format: MultiTextureFormat::Rgbx8888A8,
        opaque: false,
    },
    DrmFormatInfo {
        drm_format: fourcc(b"BXA8"),
        name: "BGRX8888_A8",
        opaque_substitute: None,
        pixel_format: PixelFormat::Bgrx88888A8,
        multi_texture_format: MultiTextureFormat::Bgrx8888A8,
        opaque: false,
    },
    multi!(b"R8A8", "RGB888_A8", Rgb888A8),
    multi!(b"B8A8", "BGR888_A8", Bgr888A8),
    multi!(b"R5A8", "RGB565_A8", Rgb565A8),
    multi!(b"B5A8", "BGR565_A8", Bgr565A8),
    multi!(b"NV12", "NV12", Nv12),
    multi!(b"NV21", "NV21", Nv21),
    multi!(b"NV16", "NV16", Nv16),
    multi!(b"NV61", "NV61", Nv61),
    multi!(b"NV24", "NV24", Nv24),
    multi!(b"NV42", "NV42", Nv42),
    multi!(b"P010", "P010", P010),
    multi!(b"P012", "P012", P012),
    multi!(b"P016", "P016", P016),
    multi!(b"YUV9", "YUV410", Yuv410),
    multi!(b"YVU9", "YVU410", Yvu410),
    multi!(b"YU11", "YUV411", Yuv411),
    multi!(b"YV11", "YVU411", Yvu411),
    multi!(b"YU12", "YUV420", Yuv420),
    multi!(b"YV12", "YVU420", Yvu420),
    multi!(b"YU16", "YUV422", Yuv422),
    multi!(b"YV16", "YVU422", Yvu422),
    multi!(b"YU24", "YUV444", Yuv444),
    multi!(b"YV24", "YVU444", Yvu444),
    multi!(b"S010", "S010", S010),
    multi!(b"S210", "S210", S210),
    multi!(b"S410", "S410", S410),
    multi!(b"S012", "S012", S012),
    multi!(b"S212", "S212", S212),
    multi!(b"S412", "S412", S412),
    multi!(b"S016", "S016", S016),
    multi!(b"S216", "S216", S216),
    multi!(b"S416", "S416", S416),
];

/// Legacy shm codes that predate fourcc numbering.
const WL_SHM_ARGB8888: u32 = 0;
const WL_SHM_XRGB8888: u32 = 1;

impl DrmFormatInfo {
    pub fn all() -> &'static [DrmFormatInfo] {
        FORMATS
    }

    pub fn lookup(drm_format: u32) -> Option<&'static DrmFormatInfo> {
        FORMATS.iter().find(|f| f.drm_format == drm_format)
    }

    pub fn lookup_name(name: &str) -> Option<&'static DrmFormatInfo> {
        FORMATS.iter().find(|f| f.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Resolves a wl_shm format code.
    pub fn from_shm_format(code: u32) -> TexcompResult<&'static DrmFormatInfo> {
        let drm = match code {
            WL_SHM_ARGB8888 => fourcc(b"AR24"),
            WL_SHM_XRGB8888 => fourcc(b"XR24"),
            other => other,
        };
        Self::lookup(drm).ok_or_else(|| {
            TexcompError::unsupported(format!("shm format {code:#010x} is not supported"))
        })
    }

    /// Upload format of texture `plane`.
    pub fn texture_format(&self, plane: usize) -> PixelFormat {
        self.multi_texture_format
            .plane_format(plane, self.pixel_format)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/drm.rs"]
mod tests;
