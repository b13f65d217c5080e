use crate::renderer::RenderError;
use image::Rgba;

/// Parse "#RRGGBB" or "#RRGGBBAA" into an RGBA pixel.
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, RenderError> {
    let hex = s.trim_start_matches('#');
    let invalid = || RenderError::InvalidColor(s.to_string());

    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(invalid)
    };

    match hex.len() {
        6 => Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])),
        8 => Ok(Rgba([
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        ])),
        _ => Err(invalid()),
    }
}
