//! How multi-plane buffers are split into textures and recombined into RGBA in a shader.
//!
//! A [`MultiTextureFormat`] names the texture planes a buffer is uploaded as. Its
//! [`MultiTextureFormatInfo`] gives the per-texture upload format, the memory plane each texture
//! samples and its subsampling, plus the shader function that assembles a YUVA (or RGBA) vector
//! from the planes. [`snippet`] chains that function with a YUV-to-RGB coefficient stage and an
//! alpha stage into the final conversion snippet.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    color::snippet::{OpSnippet, Snippet, SnippetHook},
    foundation::error::{TexcompError, TexcompResult},
    format::pixel_format::PixelFormat,
};

/// Maximum number of textures a multi-texture format is made of.
pub const MAX_TEXTURE_PLANES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MultiTextureFormat {
    /// One texture in the buffer's own pixel format.
    Simple,
    Yuyv,
    Yvyu,
    Uyvy,
    Vyuy,
    Ayuv,
    Xrgb8888A8,
    Xbgr8888A8,
    Rgbx8888A8,
    Bgrx8888A8,
    Rgb888A8,
    Bgr888A8,
    Rgb565A8,
    Bgr565A8,
    Nv12,
    Nv21,
    Nv16,
    Nv61,
    Nv24,
    Nv42,
    P010,
    P012,
    P016,
    Yuv410,
    Yvu410,
    Yuv411,
    Yvu411,
    Yuv420,
    Yvu420,
    Yuv422,
    Yvu422,
    Yuv444,
    Yvu444,
    S010,
    S210,
    S410,
    S012,
    S212,
    S412,
    S016,
    S216,
    S416,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiTextureFormatInfo {
    pub format: MultiTextureFormat,
    pub name: &'static str,
    pub n_planes: u8,
    /// Upload format per texture; [`PixelFormat::Any`] means the buffer's own format.
    pub subformats: [PixelFormat; MAX_TEXTURE_PLANES],
    /// Memory plane each texture is created from.
    pub plane_indices: [u8; MAX_TEXTURE_PLANES],
    pub hsub: [u8; MAX_TEXTURE_PLANES],
    pub vsub: [u8; MAX_TEXTURE_PLANES],
    /// Shader function assembling a YUVA/RGBA vector from the sampled planes.
    pub sampler: Option<&'static OpSnippet>,
    pub is_yuv: bool,
    /// Alpha stored in a separate, non-premultiplied plane.
    pub straight_alpha_plane: bool,
}

static YUYV_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "yuyv_to_yuva",
    "vec4
yuyv_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.yz = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).ga;
  return yuva;
}
",
);

static YVYU_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "yvyu_to_yuva",
    "vec4
yvyu_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.yz = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).ag;
  return yuva;
}
",
);

static UYVY_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "uyvy_to_yuva",
    "vec4
uyvy_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).y;
  yuva.yz = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).br;
  return yuva;
}
",
);

static VYUY_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "vyuy_to_yuva",
    "vec4
vyuy_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).y;
  yuva.yz = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).rb;
  return yuva;
}
",
);

static AYUV_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "ayuv_to_yuva",
    "vec4
ayuv_to_yuva (vec4 color)
{
  return texture2D (cogl_sampler0, cogl_tex_coord0_in.st);
}
",
);

static RGB_A8_TO_RGBA: OpSnippet = OpSnippet::from_static(
    "rgb_a8_to_rgba",
    "vec4
rgb_a8_to_rgba (vec4 color)
{
  vec3 rgb = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).rgb;
  float a = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).a;
  return vec4 (rgb, a);
}
",
);

static BGR_A8_TO_RGBA: OpSnippet = OpSnippet::from_static(
    "bgr_a8_to_rgba",
    "vec4
bgr_a8_to_rgba (vec4 color)
{
  vec3 bgr = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).rgb;
  float a = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).a;
  return vec4 (bgr.bgr, a);
}
",
);

static NV12_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "nv12_to_yuva",
    "vec4
nv12_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.yz = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).rg;
  return yuva;
}
",
);

static NV21_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "nv21_to_yuva",
    "vec4
nv21_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.yz = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).gr;
  return yuva;
}
",
);

static YUV_3_PLANES_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "yuv_3_planes_to_yuva",
    "vec4
yuv_3_planes_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.y = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).x;
  yuva.z = texture2D (cogl_sampler2, cogl_tex_coord2_in.st).x;
  return yuva;
}
",
);

// S01x planes hold LSB-aligned samples in 16-bit texels; rescale to the full range.
static S01X_10_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "s01x_10_to_yuva",
    "vec4
s01x_10_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.y = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).x;
  yuva.z = texture2D (cogl_sampler2, cogl_tex_coord2_in.st).x;
  yuva.xyz *= 64.0615835777126;
  return yuva;
}
",
);

static S01X_12_TO_YUVA: OpSnippet = OpSnippet::from_static(
    "s01x_12_to_yuva",
    "vec4
s01x_12_to_yuva (vec4 color)
{
  vec4 yuva = vec4 (0.0, 0.0, 0.0, 1.0);
  yuva.x = texture2D (cogl_sampler0, cogl_tex_coord0_in.st).x;
  yuva.y = texture2D (cogl_sampler1, cogl_tex_coord1_in.st).x;
  yuva.z = texture2D (cogl_sampler2, cogl_tex_coord2_in.st).x;
  yuva.xyz *= 16.0036630036630;
  return yuva;
}
",
);

static PREMULTIPLY: OpSnippet = OpSnippet::from_static(
    "premultiply",
    "vec4
premultiply (vec4 color)
{
  return vec4 (color.rgb * color.a, color.a);
}
",
);

use MultiTextureFormat as M;
use PixelFormat as P;

const fn simple() -> MultiTextureFormatInfo {
    MultiTextureFormatInfo {
        format: M::Simple,
        name: "Simple",
        n_planes: 1,
        subformats: [P::Any, P::Any, P::Any],
        plane_indices: [0, 0, 0],
        hsub: [1, 0, 0],
        vsub: [1, 0, 0],
        sampler: None,
        is_yuv: false,
        straight_alpha_plane: false,
    }
}

fn packed_yuv(
    format: MultiTextureFormat,
    name: &'static str,
    sampler: &'static OpSnippet,
) -> MultiTextureFormatInfo {
    MultiTextureFormatInfo {
        format,
        name,
        n_planes: 2,
        subformats: [P::Rg88, P::Bgra8888Pre, P::Any],
        plane_indices: [0, 0, 0],
        hsub: [1, 2, 0],
        vsub: [1, 1, 0],
        sampler: Some(sampler),
        is_yuv: true,
        straight_alpha_plane: false,
    }
}

fn rgb_a8(
    format: MultiTextureFormat,
    name: &'static str,
    color_format: PixelFormat,
    sampler: &'static OpSnippet,
) -> MultiTextureFormatInfo {
    MultiTextureFormatInfo {
        format,
        name,
        n_planes: 2,
        subformats: [color_format, P::A8, P::Any],
        plane_indices: [0, 1, 0],
        hsub: [1, 1, 0],
        vsub: [1, 1, 0],
        sampler: Some(sampler),
        is_yuv: false,
        straight_alpha_plane: true,
    }
}

fn semi_planar(
    format: MultiTextureFormat,
    name: &'static str,
    subformats: [PixelFormat; 2],
    sub: [u8; 2],
    sampler: &'static OpSnippet,
) -> MultiTextureFormatInfo {
    MultiTextureFormatInfo {
        format,
        name,
        n_planes: 2,
        subformats: [subformats[0], subformats[1], P::Any],
        plane_indices: [0, 1, 0],
        hsub: [1, sub[0], 0],
        vsub: [1, sub[1], 0],
        sampler: Some(sampler),
        is_yuv: true,
        straight_alpha_plane: false,
    }
}

fn planar(
    format: MultiTextureFormat,
    name: &'static str,
    subformat: PixelFormat,
    sub: [u8; 2],
    swap_chroma: bool,
    sampler: &'static OpSnippet,
) -> MultiTextureFormatInfo {
    MultiTextureFormatInfo {
        format,
        name,
        n_planes: 3,
        subformats: [subformat, subformat, subformat],
        plane_indices: if swap_chroma { [0, 2, 1] } else { [0, 1, 2] },
        hsub: [1, sub[0], sub[0]],
        vsub: [1, sub[1], sub[1]],
        sampler: Some(sampler),
        is_yuv: true,
        straight_alpha_plane: false,
    }
}

impl MultiTextureFormat {
    pub const ALL: [MultiTextureFormat; 42] = [
        M::Simple,
        M::Yuyv,
        M::Yvyu,
        M::Uyvy,
        M::Vyuy,
        M::Ayuv,
        M::Xrgb8888A8,
        M::Xbgr8888A8,
        M::Rgbx8888A8,
        M::Bgrx8888A8,
        M::Rgb888A8,
        M::Bgr888A8,
        M::Rgb565A8,
        M::Bgr565A8,
        M::Nv12,
        M::Nv21,
        M::Nv16,
        M::Nv61,
        M::Nv24,
        M::Nv42,
        M::P010,
        M::P012,
        M::P016,
        M::Yuv410,
        M::Yvu410,
        M::Yuv411,
        M::Yvu411,
        M::Yuv420,
        M::Yvu420,
        M::Yuv422,
        M::Yvu422,
        M::Yuv444,
        M::Yvu444,
        M::S010,
        M::S210,
        M::S410,
        M::S012,
        M::S212,
        M::S412,
        M::S016,
        M::S216,
        M::S416,
    ];

    pub fn info(self) -> MultiTextureFormatInfo {
        match self {
            M::Simple => simple(),
            M::Yuyv => packed_yuv(self, "YUYV", &YUYV_TO_YUVA),
            M::Yvyu => packed_yuv(self, "YVYU", &YVYU_TO_YUVA),
            M::Uyvy => packed_yuv(self, "UYVY", &UYVY_TO_YUVA),
            M::Vyuy => packed_yuv(self, "VYUY", &VYUY_TO_YUVA),
            M::Ayuv => MultiTextureFormatInfo {
                format: self,
                name: "AYUV",
                n_planes: 1,
                subformats: [P::Bgra8888, P::Any, P::Any],
                plane_indices: [0, 0, 0],
                hsub: [1, 0, 0],
                vsub: [1, 0, 0],
                sampler: Some(&AYUV_TO_YUVA),
                is_yuv: true,
                straight_alpha_plane: true,
            },
            M::Xrgb8888A8 => rgb_a8(self, "XRGB8888_A8", P::Bgra8888, &RGB_A8_TO_RGBA),
            M::Xbgr8888A8 => rgb_a8(self, "XBGR8888_A8", P::Rgba8888, &RGB_A8_TO_RGBA),
            M::Rgbx8888A8 => rgb_a8(self, "RGBX8888_A8", P::Abgr8888, &RGB_A8_TO_RGBA),
            M::Bgrx8888A8 => rgb_a8(self, "BGRX8888_A8", P::Argb8888, &RGB_A8_TO_RGBA),
            M::Rgb888A8 => rgb_a8(self, "RGB888_A8", P::Bgr888, &RGB_A8_TO_RGBA),
            M::Bgr888A8 => rgb_a8(self, "BGR888_A8", P::Rgb888, &RGB_A8_TO_RGBA),
            M::Rgb565A8 => rgb_a8(self, "RGB565_A8", P::Rgb565, &RGB_A8_TO_RGBA),
            M::Bgr565A8 => rgb_a8(self, "BGR565_A8", P::Rgb565, &BGR_A8_TO_RGBA),
            M::Nv12 => semi_planar(self, "NV12", [P::G8, P::Rg88], [2, 2], &NV12_TO_YUVA),
            M::Nv21 => semi_planar(self, "NV21", [P::G8, P::Rg88], [2, 2], &NV21_TO_YUVA),
            M::Nv16 => semi_planar(self, "NV16", [P::G8, P::Rg88], [2, 1], &NV12_TO_YUVA),
            M::Nv61 => semi_planar(self, "NV61", [P::G8, P::Rg88], [2, 1], &NV21_TO_YUVA),
            M::Nv24 => semi_planar(self, "NV24", [P::G8, P::Rg88], [1, 1], &NV12_TO_YUVA),
            M::Nv42 => semi_planar(self, "NV42", [P::G8, P::Rg88], [1, 1], &NV21_TO_YUVA),
            M::P010 => semi_planar(self, "P010", [P::R16, P::Rg1616], [2, 2], &NV12_TO_YUVA),
            M::P012 => semi_planar(self, "P012", [P::R16, P::Rg1616], [2, 2], &NV12_TO_YUVA),
            M::P016 => semi_planar(self, "P016", [P::R16, P::Rg1616], [2, 2], &NV12_TO_YUVA),
            M::Yuv410 => planar(self, "YUV410", P::G8, [4, 4], false, &YUV_3_PLANES_TO_YUVA),
            M::Yvu410 => planar(self, "YVU410", P::G8, [4, 4], true, &YUV_3_PLANES_TO_YUVA),
            M::Yuv411 => planar(self, "YUV411", P::G8, [4, 1], false, &YUV_3_PLANES_TO_YUVA),
            M::Yvu411 => planar(self, "YVU411", P::G8, [4, 1], true, &YUV_3_PLANES_TO_YUVA),
            M::Yuv420 => planar(self, "YUV420", P::G8, [2, 2], false, &YUV_3_PLANES_TO_YUVA),
            M::Yvu420 => planar(self, "YVU420", P::G8, [2, 2], true, &YUV_3_PLANES_TO_YUVA),
            M::Yuv422 => planar(self, "YUV422", P::G8, [2, 1], false, &YUV_3_PLANES_TO_YUVA),
            M::Yvu422 => planar(self, "YVU422", P::G8, [2, 1], true, &YUV_3_PLANES_TO_YUVA),
            M::Yuv444 => planar(self, "YUV444", P::G8, [1, 1], false, &YUV_3_PLANES_TO_YUVA),
            M::Yvu444 => planar(self, "YVU444", P::G8, [1, 1], true, &YUV_3_PLANES_TO_YUVA),
            M::S010 => planar(self, "S010", P::R16, [2, 2], false, &S01X_10_TO_YUVA),
            M::S210 => planar(self, "S210", P::R16, [2, 1], false, &S01X_10_TO_YUVA),
            M::S410 => planar(self, "S410", P::R16, [1, 1], false, &S01X_10_TO_YUVA),
            M::S012 => planar(self, "S012", P::R16, [2, 2], false, &S01X_12_TO_YUVA),
            M::S212 => planar(self, "S212", P::R16, [2, 1], false, &S01X_12_TO_YUVA),
            M::S412 => planar(self, "S412", P::R16, [1, 1], false, &S01X_12_TO_YUVA),
            M::S016 => planar(self, "S016", P::R16, [2, 2], false, &YUV_3_PLANES_TO_YUVA),
            M::S216 => planar(self, "S216", P::R16, [2, 1], false, &YUV_3_PLANES_TO_YUVA),
            M::S416 => planar(self, "S416", P::R16, [1, 1], false, &YUV_3_PLANES_TO_YUVA),
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn n_planes(self) -> usize {
        usize::from(self.info().n_planes)
    }

    pub fn is_yuv(self) -> bool {
        self.info().is_yuv
    }

    /// The pixel format describing the buffer memory; `None` for [`MultiTextureFormat::Simple`].
    pub fn pixel_format(self) -> Option<PixelFormat> {
        let p = match self {
            M::Simple => return None,
            M::Yuyv => P::Yuyv,
            M::Yvyu => P::Yvyu,
            M::Uyvy => P::Uyvy,
            M::Vyuy => P::Vyuy,
            M::Ayuv => P::Ayuv,
            M::Xrgb8888A8 => P::Xrgb88888A8,
            M::Xbgr8888A8 => P::Xbgr88888A8,
            M::Rgbx8888A8 => P::Rgbx88888A8,
            M::Bgrx8888A8 => P::Bgrx88888A8,
            M::Rgb888A8 => P::Rgb888A8,
            M::Bgr888A8 => P::Bgr888A8,
            M::Rgb565A8 => P::Rgb565A8,
            M::Bgr565A8 => P::Bgr565A8,
            M::Nv12 => P::Nv12,
            M::Nv21 => P::Nv21,
            M::Nv16 => P::Nv16,
            M::Nv61 => P::Nv61,
            M::Nv24 => P::Nv24,
            M::Nv42 => P::Nv42,
            M::P010 => P::P010,
            M::P012 => P::P012,
            M::P016 => P::P016,
            M::Yuv410 => P::Yuv410,
            M::Yvu410 => P::Yvu410,
            M::Yuv411 => P::Yuv411,
            M::Yvu411 => P::Yvu411,
            M::Yuv420 => P::Yuv420,
            M::Yvu420 => P::Yvu420,
            M::Yuv422 => P::Yuv422,
            M::Yvu422 => P::Yvu422,
            M::Yuv444 => P::Yuv444,
            M::Yvu444 => P::Yvu444,
            M::S010 => P::S010,
            M::S210 => P::S210,
            M::S410 => P::S410,
            M::S012 => P::S012,
            M::S212 => P::S212,
            M::S412 => P::S412,
            M::S016 => P::S016,
            M::S216 => P::S216,
            M::S416 => P::S416,
        };
        Some(p)
    }

    /// Inverse of [`MultiTextureFormat::pixel_format`]; every other format is `Simple`.
    pub fn from_pixel_format(format: PixelFormat) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.pixel_format() == Some(format))
            .unwrap_or(M::Simple)
    }

    /// Upload format of texture `plane`, resolving [`PixelFormat::Any`] to `buffer_format`.
    pub fn plane_format(self, plane: usize, buffer_format: PixelFormat) -> PixelFormat {
        match self.info().subformats[plane] {
            P::Any => buffer_format,
            f => f,
        }
    }
}

impl fmt::Display for MultiTextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MultiTextureFormat {
    type Err = TexcompError;

    fn from_str(s: &str) -> TexcompResult<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TexcompError::validation(format!("unknown multi-texture format '{s}'")))
    }
}

impl Serialize for MultiTextureFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MultiTextureFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// YUV-to-RGB conversion applied after the planes were sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coefficients {
    /// Unspecified; YUV formats fall back to BT.601 limited range.
    #[default]
    None,
    /// Planes carry G, B and R directly.
    IdentityFull,
    IdentityLimited,
    Bt601Full,
    Bt601Limited,
    Bt709Full,
    Bt709Limited,
    Bt2020Full,
    Bt2020Limited,
}

/// Literal constants of one YUV-to-RGB matrix.
///
/// `r = y' + rv * v'`, `g = y' + gu * u' + gv * v'`, `b = y' + bu * u'`, where
/// `y' = (y - luma_offset) * luma_scale` and `u' = u - 0.5`, `v' = v - 0.5`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YuvToRgb {
    pub luma_offset: f32,
    pub luma_scale: f32,
    pub rv: f32,
    pub gu: f32,
    pub gv: f32,
    pub bu: f32,
}

const LIMITED_OFFSET: f32 = 0.062_745_1;
const LIMITED_SCALE: f32 = 1.164_383_6;

pub const BT601_FULL: YuvToRgb = YuvToRgb {
    luma_offset: 0.0,
    luma_scale: 1.0,
    rv: 1.402,
    gu: -0.344_136_3,
    gv: -0.714_136_3,
    bu: 1.772,
};

pub const BT601_LIMITED: YuvToRgb = YuvToRgb {
    luma_offset: LIMITED_OFFSET,
    luma_scale: LIMITED_SCALE,
    rv: 1.596_026_8,
    gu: -0.391_762_3,
    gv: -0.812_967_6,
    bu: 2.017_232_1,
};

pub const BT709_FULL: YuvToRgb = YuvToRgb {
    luma_offset: 0.0,
    luma_scale: 1.0,
    rv: 1.5748,
    gu: -0.187_324_3,
    gv: -0.468_124_3,
    bu: 1.8556,
};

pub const BT709_LIMITED: YuvToRgb = YuvToRgb {
    luma_offset: LIMITED_OFFSET,
    luma_scale: LIMITED_SCALE,
    rv: 1.792_741_1,
    gu: -0.213_248_6,
    gv: -0.532_909_3,
    bu: 2.112_401_8,
};

pub const BT2020_FULL: YuvToRgb = YuvToRgb {
    luma_offset: 0.0,
    luma_scale: 1.0,
    rv: 1.4746,
    gu: -0.164_553_1,
    gv: -0.571_353_1,
    bu: 1.8814,
};

pub const BT2020_LIMITED: YuvToRgb = YuvToRgb {
    luma_offset: LIMITED_OFFSET,
    luma_scale: LIMITED_SCALE,
    rv: 1.678_674_1,
    gu: -0.187_326_1,
    gv: -0.650_424_3,
    bu: 2.141_772_3,
};

impl YuvToRgb {
    pub fn apply(&self, yuv: [f32; 3]) -> [f32; 3] {
        let y = (yuv[0] - self.luma_offset) * self.luma_scale;
        let u = yuv[1] - 0.5;
        let v = yuv[2] - 0.5;
        [
            y + self.rv * v,
            y + self.gu * u + self.gv * v,
            y + self.bu * u,
        ]
    }

    fn glsl(&self, name: &str) -> String {
        format!(
            "vec4
{name} (vec4 yuva)
{{
  float y = {scale:.8} * (yuva.x - {offset:.8});
  float u = yuva.y - 0.5;
  float v = yuva.z - 0.5;
  return vec4 (y + {rv:.8} * v,
               y + {gu:.8} * u + {gv:.8} * v,
               y + {bu:.8} * u,
               yuva.w);
}}
",
            scale = self.luma_scale,
            offset = self.luma_offset,
            rv = self.rv,
            gu = self.gu,
            gv = self.gv,
            bu = self.bu,
        )
    }
}

impl Coefficients {
    /// Coefficients actually used for a YUV buffer.
    pub fn resolve(self) -> Self {
        match self {
            Self::None => Self::Bt601Limited,
            other => other,
        }
    }

    pub fn matrix(self) -> Option<YuvToRgb> {
        match self.resolve() {
            Self::Bt601Full => Some(BT601_FULL),
            Self::Bt601Limited => Some(BT601_LIMITED),
            Self::Bt709Full => Some(BT709_FULL),
            Self::Bt709Limited => Some(BT709_LIMITED),
            Self::Bt2020Full => Some(BT2020_FULL),
            Self::Bt2020Limited => Some(BT2020_LIMITED),
            Self::None | Self::IdentityFull | Self::IdentityLimited => None,
        }
    }

    /// CPU evaluation of the conversion stage, `yuv` in normalized units.
    pub fn apply(self, yuv: [f32; 3]) -> [f32; 3] {
        match (self.resolve(), self.matrix()) {
            (_, Some(m)) => m.apply(yuv),
            (Self::IdentityLimited, None) => {
                let expand = |c: f32| (c - LIMITED_OFFSET) * LIMITED_SCALE;
                [expand(yuv[2]), expand(yuv[0]), expand(yuv[1])]
            }
            _ => [yuv[2], yuv[0], yuv[1]],
        }
    }

    fn op_name(self) -> &'static str {
        match self.resolve() {
            Self::IdentityFull => "identity_full_to_rgb",
            Self::IdentityLimited => "identity_limited_to_rgb",
            Self::Bt601Full => "bt601_full_to_rgb",
            Self::Bt601Limited | Self::None => "bt601_limited_to_rgb",
            Self::Bt709Full => "bt709_full_to_rgb",
            Self::Bt709Limited => "bt709_limited_to_rgb",
            Self::Bt2020Full => "bt2020_full_to_rgb",
            Self::Bt2020Limited => "bt2020_limited_to_rgb",
        }
    }

    /// Shader stage turning a YUVA vector into RGBA.
    pub fn op(self) -> OpSnippet {
        let name = self.op_name();
        let source = match (self.resolve(), self.matrix()) {
            (_, Some(m)) => m.glsl(name),
            (Self::IdentityLimited, None) => format!(
                "vec4
{name} (vec4 yuva)
{{
  vec3 gbr = {LIMITED_SCALE:.8} * (yuva.xyz - {LIMITED_OFFSET:.8});
  return vec4 (gbr.z, gbr.x, gbr.y, yuva.w);
}}
"
            ),
            _ => format!(
                "vec4
{name} (vec4 yuva)
{{
  return vec4 (yuva.z, yuva.x, yuva.y, yuva.w);
}}
"
            ),
        };
        OpSnippet::owned(name, source)
    }
}

impl FromStr for Coefficients {
    type Err = TexcompError;

    fn from_str(s: &str) -> TexcompResult<Self> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
            .map_err(|_| TexcompError::validation(format!("unknown coefficients '{s}'")))
    }
}

/// How the buffer's color channels relate to its alpha channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlphaMode {
    /// Unspecified; the format's natural encoding applies.
    #[default]
    None,
    /// Color channels are already multiplied by alpha.
    PremultElectrical,
    /// Color channels are independent of alpha and need premultiplying.
    Straight,
}

impl AlphaMode {
    /// The mode in effect for `format`. Separate alpha planes are never premultiplied.
    pub fn resolve(self, format: MultiTextureFormat) -> Self {
        match self {
            Self::None if format.info().straight_alpha_plane => Self::Straight,
            Self::None => Self::PremultElectrical,
            other => other,
        }
    }
}

impl FromStr for AlphaMode {
    type Err = TexcompError;

    fn from_str(s: &str) -> TexcompResult<Self> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
            .map_err(|_| TexcompError::validation(format!("unknown alpha mode '{s}'")))
    }
}

/// Conversion snippet for `format`, attached to the last plane layer.
///
/// Stages run in a fixed order: plane sampling, then YUV-to-RGB coefficients (YUV formats only),
/// then premultiplication. Returns `None` when every stage is the identity.
pub fn snippet(
    format: MultiTextureFormat,
    coefficients: Coefficients,
    alpha_mode: AlphaMode,
) -> Option<Snippet> {
    let info = format.info();
    let coefficient_op = info.is_yuv.then(|| coefficients.op());

    let mut ops: Vec<&OpSnippet> = Vec::with_capacity(3);
    if let Some(sampler) = info.sampler {
        ops.push(sampler);
    }
    if let Some(op) = &coefficient_op {
        ops.push(op);
    }
    if alpha_mode.resolve(format) == AlphaMode::Straight {
        ops.push(&PREMULTIPLY);
    }

    if ops.is_empty() {
        return None;
    }
    Some(Snippet::from_ops(
        SnippetHook::LayerFragment,
        &ops,
        "cogl_layer",
        "cogl_layer",
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/format/multi_texture_format.rs"]
mod tests;
