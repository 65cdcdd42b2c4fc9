use crate::color::{Color, bytes_to_hex, hex_to_bytes};
use crate::ecs::{MaterialId, TextureId};

/// Matcap shading: the surface color is `color * matcap(view-space normal)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatcapMaterial {
    pub color: Color,
    pub matcap: TextureId,
}

impl MatcapMaterial {
    pub fn new(matcap: TextureId) -> Self {
        Self {
            color: Color::WHITE,
            matcap,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Owns every material instance. Entities refer to them by [`MaterialId`].
///
/// Sharing happens by handing several entities the same id; anything a person
/// can recolor gets its own instance so an edit never reaches other entities.
#[derive(Debug, Default)]
pub struct Materials {
    items: Vec<MatcapMaterial>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, material: MatcapMaterial) -> MaterialId {
        self.items.push(material);
        MaterialId(self.items.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> Option<&MatcapMaterial> {
        self.items.get(id.0)
    }

    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut MatcapMaterial> {
        self.items.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The color parameter behind the GUI swatch, bound to exactly one material.
///
/// Holds the sRGB value shown in the control; [`ColorBinding::set`] writes the
/// linear equivalent into the bound material immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorBinding {
    material: MaterialId,
    rgb: [u8; 3],
}

impl ColorBinding {
    /// Binds `material` and applies `hex` to it.
    pub fn new(material: MaterialId, hex: u32, materials: &mut Materials) -> Self {
        let binding = Self {
            material,
            rgb: hex_to_bytes(hex),
        };
        binding.apply(materials);
        binding
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    pub fn hex(&self) -> u32 {
        bytes_to_hex(self.rgb)
    }

    /// Stores a new value and pushes it into the bound material.
    pub fn set(&mut self, rgb: [u8; 3], materials: &mut Materials) {
        if self.rgb != rgb {
            log::debug!("label color -> #{:06x}", bytes_to_hex(rgb));
        }
        self.rgb = rgb;
        self.apply(materials);
    }

    fn apply(&self, materials: &mut Materials) {
        if let Some(material) = materials.get_mut(self.material) {
            material.color = Color::from_srgb_bytes(self.rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_recolors_only_its_material() {
        let mut materials = Materials::new();
        let matcap = TextureId(0);
        let label = materials.add(MatcapMaterial::new(matcap));
        let ornaments = materials.add(MatcapMaterial::new(matcap));

        let mut color = ColorBinding::new(label, 0xff0000, &mut materials);
        assert_eq!(materials.get(label).unwrap().color, Color::rgb(1.0, 0.0, 0.0));

        color.set([0, 0, 255], &mut materials);
        assert_eq!(materials.get(label).unwrap().color, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(materials.get(ornaments).unwrap().color, Color::WHITE);
        assert_eq!(color.hex(), 0x0000ff);
    }
}
