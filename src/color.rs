//! Color-string parsing and blending.
//!
//! Pixel buffers store CSS-style color strings: `#rgb`, `#rrggbb` or
//! `rgba(r,g,b,a)`, with the empty string meaning fully transparent. All
//! parsers here are total: malformed input degrades to transparent black
//! rather than an error, so a bad color can never abort a stroke.

/// A parsed color with an alpha channel in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };
}

/// An opaque color, used by gradient interpolation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

fn clamp_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn hex_pair(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

/// Parse any supported color string. Unparseable input (including the empty
/// string) is transparent black.
pub fn parse_color(value: &str) -> Rgba {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Rgba::TRANSPARENT;
    }
    if let Some(hex) = trimmed.strip_prefix('#') {
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let Some(d) = c.to_digit(16) else {
                        return Rgba::TRANSPARENT;
                    };
                    out[i] = (d * 17) as u8; // 0xA -> 0xAA
                }
                return Rgba { r: out[0], g: out[1], b: out[2], a: 1.0 };
            }
            6 => {
                if let (Some(r), Some(g), Some(b)) =
                    (hex_pair(&hex[0..2]), hex_pair(&hex[2..4]), hex_pair(&hex[4..6]))
                {
                    return Rgba { r, g, b, a: 1.0 };
                }
                return Rgba::TRANSPARENT;
            }
            _ => return Rgba::TRANSPARENT,
        }
    }
    parse_rgb_call(trimmed).unwrap_or(Rgba::TRANSPARENT)
}

/// Parse `rgb(...)` / `rgba(...)` notation.
fn parse_rgb_call(value: &str) -> Option<Rgba> {
    let lower = value.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let r: f32 = parts[0].parse().ok()?;
    let g: f32 = parts[1].parse().ok()?;
    let b: f32 = parts[2].parse().ok()?;
    let mut a = 1.0f32;
    if parts.len() > 3
        && let Ok(alpha) = parts[3].parse::<f32>()
    {
        a = alpha;
    }
    Some(Rgba {
        r: clamp_byte(r),
        g: clamp_byte(g),
        b: clamp_byte(b),
        a: a.clamp(0.0, 1.0),
    })
}

/// Strict 6-digit hex parser (leading `#` optional). Gradient endpoints must
/// pass this to participate in a real blend.
pub fn parse_hex(value: &str) -> Option<Rgb> {
    let hex = value.trim().strip_prefix('#').unwrap_or_else(|| value.trim());
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(Rgb {
        r: hex_pair(&hex[0..2])?,
        g: hex_pair(&hex[2..4])?,
        b: hex_pair(&hex[4..6])?,
    })
}

/// Compose a `#rrggbb` string from float components (rounded and clamped).
pub fn compose_hex(r: f32, g: f32, b: f32) -> String {
    format!("#{:02x}{:02x}{:02x}", clamp_byte(r), clamp_byte(g), clamp_byte(b))
}

/// Blend two gradient endpoints at `ratio` (clamped to `[0, 1]`).
///
/// When either endpoint failed to parse as 6-digit hex the blend degrades to
/// a hard 50% switch between the literal fallback strings (a documented
/// fallback, not an attempt at a partial blend).
pub fn mix(
    start: Option<Rgb>,
    end: Option<Rgb>,
    ratio: f32,
    fallback_start: &str,
    fallback_end: &str,
) -> String {
    let t = ratio.clamp(0.0, 1.0);
    if let (Some(s), Some(e)) = (start, end) {
        let r = s.r as f32 + (e.r as f32 - s.r as f32) * t;
        let g = s.g as f32 + (e.g as f32 - s.g as f32) * t;
        let b = s.b as f32 + (e.b as f32 - s.b as f32) * t;
        return compose_hex(r, g, b);
    }
    let start_value = non_empty(fallback_start).or_else(|| non_empty(fallback_end));
    let end_value = non_empty(fallback_end).or_else(|| non_empty(fallback_start));
    let chosen = if t <= 0.5 { start_value } else { end_value };
    chosen.unwrap_or("#000000").to_string()
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Eraser blend: fade the existing pixel by `strength` percent.
///
/// Returns the replacement color string; `""` means fully erased. Alpha is
/// rounded to 3 decimals and anything at or below 0.001 collapses to
/// transparent. Strength 0 leaves the pixel untouched.
pub fn erase_blend(existing: &str, strength: u8) -> String {
    let pct = strength.min(100) as f32;
    if pct <= 0.0 {
        return existing.to_string();
    }
    if pct >= 100.0 || existing.is_empty() {
        return String::new();
    }
    let rgba = parse_color(existing);
    if rgba.a <= 0.0 {
        return String::new();
    }
    let next_alpha = rgba.a * (1.0 - pct / 100.0);
    if next_alpha <= 0.001 {
        return String::new();
    }
    let alpha = (next_alpha as f64 * 1000.0).round() / 1000.0;
    format!("rgba({},{},{},{})", rgba.r, rgba.g, rgba.b, alpha)
}
