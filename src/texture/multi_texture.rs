use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    foundation::error::{TexcompError, TexcompResult},
    format::{
        convert::required_len,
        drm::DrmFormatInfo,
        multi_texture_format::{MAX_TEXTURE_PLANES, MultiTextureFormat},
        pixel_format::MAX_PLANES,
    },
    gpu::backend::{GpuBackend, Texture},
};

#[derive(Debug)]
struct MultiTextureInner {
    format: MultiTextureFormat,
    planes: SmallVec<[Texture; MAX_TEXTURE_PLANES]>,
}

/// GPU textures that together form one logical image, combined as `format` describes.
///
/// Immutable and cheap to clone; clones share the same planes and compare equal by identity.
#[derive(Clone, Debug)]
pub struct MultiTexture(Arc<MultiTextureInner>);

impl MultiTexture {
    /// Bundles `planes` under `format`.
    ///
    /// # Panics
    ///
    /// If `planes` is empty or its length differs from the format's plane count.
    pub fn new(format: MultiTextureFormat, planes: Vec<Texture>) -> Self {
        assert!(!planes.is_empty(), "multi-texture needs at least one plane");
        assert_eq!(
            planes.len(),
            format.n_planes(),
            "{format} expects {} planes",
            format.n_planes()
        );
        Self(Arc::new(MultiTextureInner {
            format,
            planes: planes.into_iter().collect(),
        }))
    }

    pub fn new_simple(texture: Texture) -> Self {
        Self::new(MultiTextureFormat::Simple, vec![texture])
    }

    /// Uploads a shared-memory client buffer, one texture per sampled plane.
    ///
    /// Memory planes follow each other in `data`; plane 0 rows are `stride` bytes apart and later
    /// planes use the same number of logical elements per row scaled by their subsampling.
    #[tracing::instrument(skip(backend, data), fields(format = drm.name))]
    pub fn from_shm(
        backend: &mut dyn GpuBackend,
        drm: &DrmFormatInfo,
        width: u32,
        height: u32,
        stride: usize,
        data: &[u8],
    ) -> TexcompResult<Self> {
        let format = drm.multi_texture_format;
        if format == MultiTextureFormat::Simple {
            let texture =
                backend.texture_new_from_data(width, height, drm.pixel_format, stride, data)?;
            return Ok(Self::new_simple(texture));
        }

        let memory = drm.pixel_format.info();
        let n_memory_planes = usize::from(memory.n_planes);
        let mut strides = [0usize; MAX_PLANES];
        let mut offsets = [0usize; MAX_PLANES];
        strides[0] = stride;
        let bpp0 = usize::from(memory.bpp[0]);
        let logical_elements = if bpp0 == 0 { 0 } else { stride / bpp0 };
        for i in 1..n_memory_planes {
            strides[i] = logical_elements / usize::from(memory.hsub[i]) * usize::from(memory.bpp[i]);
            offsets[i] = offsets[i - 1]
                + strides[i - 1] * (height / u32::from(memory.vsub[i - 1])) as usize;
        }

        let info = format.info();
        let mut planes = Vec::with_capacity(format.n_planes());
        for i in 0..format.n_planes() {
            let memory_plane = usize::from(info.plane_indices[i]);
            let subformat = format.plane_format(i, drm.pixel_format);
            let plane_width = width / u32::from(info.hsub[i]);
            let plane_height = height / u32::from(info.vsub[i]);
            let row = plane_width as usize * subformat.bytes_per_pixel_plane0();
            let start = offsets[memory_plane];
            let needed = start + required_len(strides[memory_plane], row, plane_height);
            if data.len() < needed {
                return Err(TexcompError::validation(format!(
                    "{} buffer of {width}x{height} needs {needed} bytes, got {}",
                    drm.name,
                    data.len()
                )));
            }
            let texture = backend.texture_new_from_data(
                plane_width,
                plane_height,
                subformat,
                strides[memory_plane],
                &data[start..],
            )?;
            planes.push(texture);
        }
        Ok(Self::new(format, planes))
    }

    pub fn format(&self) -> MultiTextureFormat {
        self.0.format
    }

    pub fn n_planes(&self) -> usize {
        self.0.planes.len()
    }

    pub fn planes(&self) -> &[Texture] {
        &self.0.planes
    }

    /// # Panics
    ///
    /// If `index` is not below [`MultiTexture::n_planes`].
    pub fn plane(&self, index: usize) -> &Texture {
        &self.0.planes[index]
    }

    pub fn is_simple(&self) -> bool {
        self.0.format == MultiTextureFormat::Simple
    }

    /// Width of plane 0, which is never subsampled.
    pub fn width(&self) -> u32 {
        self.0.planes[0].width()
    }

    pub fn height(&self) -> u32 {
        self.0.planes[0].height()
    }

    pub fn ptr_eq(&self, other: &MultiTexture) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for MultiTexture {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for MultiTexture {}

#[cfg(test)]
#[path = "../../tests/unit/texture/multi_texture.rs"]
mod tests;
