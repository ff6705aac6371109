use std::f64::consts::{PI, TAU};

use image::{
    codecs::gif::GifEncoder,
    Delay, Frame, ImageResult, Rgba, RgbaImage,
};

use crate::colour::Rgb;

const BACKGROUND: Rgba<u8> = Rgba([0x2b, 0x2d, 0x31, 0xFF]);
const RIM: Rgba<u8> = Rgba([0x11, 0x11, 0x11, 0xFF]);
const POINTER: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const HIGHLIGHT: Rgba<u8> = Rgba([0xFF, 0xD7, 0x00, 0xFF]);

/// Pointer sits at twelve o'clock, which is `-π/2` with the y axis pointing down.
const POINTER_ANGLE: f64 = -PI / 2.0;
const FULL_TURNS: f64 = 4.0;

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub size: u32,
    pub frames: u32,
    /// Delay of the first frame; later frames slow down towards `slowest_delay_ms`.
    pub fastest_delay_ms: u32,
    pub slowest_delay_ms: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            size: 256,
            frames: 45,
            fastest_delay_ms: 20,
            slowest_delay_ms: 160,
        }
    }
}

/// Renders a spinning wheel made of one sector per colour in `sectors` that
/// decelerates and stops with sector `winner` under the pointer. The last
/// frame outlines the winning sector.
///
/// # Errors
///
/// Returns an error if GIF encoding fails.
///
/// # Panics
///
/// Panics if `sectors` is empty or `winner` is out of bounds.
pub fn render(sectors: &[Rgb], winner: usize, options: Options) -> ImageResult<Vec<u8>> {
    assert!(winner < sectors.len(), "winner must index into sectors");

    let frame_count = options.frames.max(2);
    let width = TAU / sectors.len() as f64;
    let target = POINTER_ANGLE - (winner as f64 + 0.5) * width + FULL_TURNS * TAU;

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, 10);

        let frames = (0..frame_count).map(|i| {
            let t = f64::from(i) / f64::from(frame_count - 1);
            let last = i + 1 == frame_count;
            let image = draw(sectors, target * ease_out(t), last.then_some(winner), options.size);
            let delay = lerp(options.fastest_delay_ms, options.slowest_delay_ms, t);
            Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay, 1))
        });
        encoder.encode_frames(frames)?;
    }
    Ok(bytes)
}

fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

fn lerp(from: u32, to: u32, t: f64) -> u32 {
    (f64::from(to) - f64::from(from)).mul_add(t, f64::from(from)).round() as u32
}

/// Index of the sector under `angle` (screen coordinates) for a wheel rotated by
/// `rotation`.
fn sector_at(angle: f64, rotation: f64, count: usize) -> usize {
    let local = (angle - rotation).rem_euclid(TAU);
    ((local / (TAU / count as f64)) as usize).min(count - 1)
}

fn draw(sectors: &[Rgb], rotation: f64, highlight: Option<usize>, size: u32) -> RgbaImage {
    let centre = f64::from(size) / 2.0;
    let radius = centre - 4.0;
    let rim = 3.0;
    let pointer_len = radius * 0.18;

    RgbaImage::from_fn(size, size, |x, y| {
        let dx = f64::from(x) + 0.5 - centre;
        let dy = f64::from(y) + 0.5 - centre;
        let distance = dx.hypot(dy);

        // pointer: a downward triangle overlapping the rim at the top
        let depth = f64::from(y) - (centre - radius - 2.0);
        if (0.0..pointer_len).contains(&depth) && dx.abs() <= (pointer_len - depth) * 0.45 {
            return POINTER;
        }

        if distance > radius {
            return BACKGROUND;
        }
        if distance > radius - rim {
            return RIM;
        }

        let index = sector_at(dy.atan2(dx), rotation, sectors.len());
        if highlight == Some(index) && distance > radius - rim * 3.0 {
            return HIGHLIGHT;
        }
        sectors[index].into()
    })
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::{render, sector_at, Options, FULL_TURNS, POINTER_ANGLE};
    use crate::colour::Rgb;
    use std::f64::consts::TAU;

    const SMALL: Options = Options {
        size: 32,
        frames: 4,
        fastest_delay_ms: 10,
        slowest_delay_ms: 40,
    };

    #[rstest]
    #[case(2, 0)]
    #[case(2, 1)]
    #[case(5, 3)]
    #[case(30, 29)]
    fn winner_ends_under_pointer(#[case] count: usize, #[case] winner: usize) {
        let width = TAU / count as f64;
        let rotation = POINTER_ANGLE - (winner as f64 + 0.5) * width + FULL_TURNS * TAU;
        assert_eq!(sector_at(POINTER_ANGLE, rotation, count), winner);
    }

    #[test]
    fn renders_a_gif() {
        let sectors = [Rgb([10, 20, 30]), Rgb([40, 50, 60]), Rgb([70, 80, 90])];
        let bytes = render(&sectors, 1, SMALL).unwrap_or_else(|e| panic!("{e:#?}"));
        assert!(bytes.starts_with(b"GIF89a"));
    }

    #[test]
    #[should_panic(expected = "winner must index into sectors")]
    fn rejects_out_of_bounds_winner() {
        let _ = render(&[Rgb::BLACK], 1, SMALL);
    }
}
