use image::RgbaImage;

use crate::ecs::TextureId;
use crate::gpu::GpuContext;

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    pub(crate) _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw sRGB RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Matcap lookups stay inside the sphere image; clamp and filter smoothly.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
            width,
            height,
        }
    }

    pub fn from_image(gpu: &GpuContext, image: &RgbaImage, label: &str) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgba(gpu, image.as_raw(), width, height, label)
    }

    /// 1×1 opaque white, bound while the real image is still loading.
    pub fn placeholder(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "Placeholder Texture")
    }
}

#[derive(Debug)]
struct TextureSlot {
    label: String,
    image: Option<RgbaImage>,
    revision: u64,
}

/// CPU-side texture slots addressed by [`TextureId`].
///
/// A slot is reserved before its image exists, so materials can reference it
/// right away. Each time pixels arrive the slot's revision increases and the
/// renderer re-uploads it.
#[derive(Debug, Default)]
pub struct TextureStore {
    slots: Vec<TextureSlot>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, label: impl Into<String>) -> TextureId {
        self.slots.push(TextureSlot {
            label: label.into(),
            image: None,
            revision: 0,
        });
        TextureId(self.slots.len() - 1)
    }

    /// Stores decoded pixels for a reserved slot. Unknown ids are ignored.
    pub fn fulfill(&mut self, id: TextureId, image: RgbaImage) {
        match self.slots.get_mut(id.0) {
            Some(slot) => {
                slot.image = Some(image);
                slot.revision += 1;
            }
            None => log::warn!("image delivered for unknown texture slot {}", id.0),
        }
    }

    pub fn image(&self, id: TextureId) -> Option<&RgbaImage> {
        self.slots.get(id.0).and_then(|s| s.image.as_ref())
    }

    pub fn is_ready(&self, id: TextureId) -> bool {
        self.image(id).is_some()
    }

    pub fn revision(&self, id: TextureId) -> u64 {
        self.slots.get(id.0).map_or(0, |s| s.revision)
    }

    pub fn label(&self, id: TextureId) -> Option<&str> {
        self.slots.get(id.0).map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_slot_is_pending_until_fulfilled() {
        let mut store = TextureStore::new();
        let id = store.reserve("matcap");
        assert!(!store.is_ready(id));
        assert_eq!(store.revision(id), 0);

        store.fulfill(id, RgbaImage::new(4, 4));
        assert!(store.is_ready(id));
        assert_eq!(store.revision(id), 1);
        assert_eq!(store.image(id).map(|i| i.dimensions()), Some((4, 4)));
    }

    #[test]
    fn unknown_slot_is_ignored() {
        let mut store = TextureStore::new();
        store.fulfill(TextureId(3), RgbaImage::new(1, 1));
        assert!(store.is_empty());
    }
}
