//! Continuous red to green color ramp for numeric badges.

const MAX_HUE: f64 = 0.287;
const SATURATION: f64 = 0.916;
const VALUE: f64 = 0.80;

/// Maps a ratio in `[0, 1]` to a web color. `0` is the most alarming red,
/// `1` the healthiest green.
pub fn ramp(ratio: f64) -> String {
    let (r, g, b) = hsv_to_rgb(hue(ratio), SATURATION, VALUE);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Eased hue for `ratio`, as a fraction of the full color circle.
pub fn hue(ratio: f64) -> f64 {
    let ratio = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };

    ease_in_circ(ratio) * MAX_HUE
}

fn ease_in_circ(t: f64) -> f64 {
    1.0 - (1.0 - t * t).sqrt()
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    (channel(r), channel(g), channel(b))
}

fn channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
