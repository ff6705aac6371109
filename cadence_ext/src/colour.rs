use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Self = Self([0xFF, 0xFF, 0xFF]);
    pub const BLACK: Self = Self([0x00, 0x00, 0x00]);

    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self([
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        ])
    }

    #[must_use]
    pub const fn to_hex(self) -> u32 {
        let [r, g, b] = self.0;
        ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
    }

    /// Perceived brightness in `0..=255`, weighted per ITU-R BT.601.
    #[must_use]
    pub const fn brightness(self) -> u8 {
        let [r, g, b] = self.0;
        ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
    }

    #[must_use]
    pub const fn is_dark(self) -> bool {
        self.brightness() < 128
    }

    /// Maps any 24-bit seed onto a dark colour by halving each channel, so
    /// white text stays readable on top of it.
    #[must_use]
    pub const fn dark_from_seed(seed: u32) -> Self {
        let [r, g, b] = Self::from_hex(seed).0;
        Self([r >> 1, g >> 1, b >> 1])
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

impl From<Rgb> for image::Rgba<u8> {
    fn from(value: Rgb) -> Self {
        let [r, g, b] = value.0;
        Self([r, g, b, 0xFF])
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::Rgb;

    #[rstest]
    #[case([0, 0, 0], 0x00_00_00)]
    #[case([255, 0, 0], 0xFF_00_00)]
    #[case([0, 255, 255], 0x00_FF_FF)]
    #[case([123, 45, 67], 0x7B_2D_43)]
    fn hex_conversions(#[case] rgb: [u8; 3], #[case] hex: u32) {
        assert_eq!(Rgb(rgb).to_hex(), hex);
        assert_eq!(Rgb::from_hex(hex), Rgb(rgb));
    }

    #[rstest]
    #[case(Rgb::BLACK, 0)]
    #[case(Rgb::WHITE, 255)]
    #[case(Rgb([255, 0, 0]), 76)]
    #[case(Rgb([0, 255, 0]), 149)]
    fn brightness(#[case] input: Rgb, #[case] expected: u8) {
        assert_eq!(input.brightness(), expected);
    }

    #[rstest]
    #[case(0x00_00_00)]
    #[case(0xFF_FF_FF)]
    #[case(0x7B_2D_43)]
    #[case(0xDE_AD_BE)]
    fn dark_from_seed_is_always_dark(#[case] seed: u32) {
        assert!(Rgb::dark_from_seed(seed).is_dark());
    }

    #[test]
    fn displays_as_css_hex() {
        assert_eq!(Rgb([0x0a, 0xbc, 0x01]).to_string(), "#0abc01");
    }
}
