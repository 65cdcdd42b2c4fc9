/// Linear-space RGBA color.
///
/// Colors entered by people (config files, the color swatch) are sRGB hex
/// triples; [`Color::from_srgb_hex`] converts those into the linear values the
/// shader multiplies with. The surface format is sRGB, so the round trip ends
/// where it started on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    /// Builds a linear color from an sRGB triple such as the one edited by the GUI swatch.
    pub fn from_srgb_bytes([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    /// Builds a linear color from a `0xRRGGBB` sRGB value.
    pub fn from_srgb_hex(hex: u32) -> Self {
        Self::from_srgb_bytes(hex_to_bytes(hex))
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

pub fn hex_to_bytes(hex: u32) -> [u8; 3] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

pub fn bytes_to_hex([r, g, b]: [u8; 3]) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = f32::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_hex_is_pure_linear_red() {
        let red = Color::from_srgb_hex(0xff0000);
        assert_eq!(red, Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn hex_bytes_round_trip() {
        assert_eq!(hex_to_bytes(0x12ab7f), [0x12, 0xab, 0x7f]);
        assert_eq!(bytes_to_hex([0x12, 0xab, 0x7f]), 0x12ab7f);
    }

    #[test]
    fn mid_grey_is_darker_in_linear_space() {
        let grey = Color::from_srgb_bytes([128, 128, 128]);
        assert!((grey.r - 0.2158).abs() < 1e-3);
    }
}
