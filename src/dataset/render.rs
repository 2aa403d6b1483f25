/// Shade characters from lightest to darkest.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

fn shade(value: f64) -> char {
    match value {
        v if v <= 0.2 => SHADES[0],
        v if v <= 0.4 => SHADES[1],
        v if v <= 0.6 => SHADES[2],
        v if v <= 0.8 => SHADES[3],
        _ => SHADES[4],
    }
}

/// Draws one image row (values in `[0, 1]`, row-major) as `height` lines of
/// block characters. Pixels beyond `width * height` are ignored and missing
/// pixels render blank.
pub fn render_image(pixels: &[f64], width: usize, height: usize) -> String {
    let mut out = String::with_capacity((width * 3 + 1) * height);
    for r in 0..height {
        for c in 0..width {
            let value = pixels.get(r * width + c).copied().unwrap_or(0.0);
            out.push(shade(value));
        }
        out.push('\n');
    }
    out
}
