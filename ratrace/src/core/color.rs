use crate::interfaces::render_interface::RgbColor;

/// hsl_to_rgb converts a color given as hue (degrees, any value), saturation and lightness
/// (both [0.0, 1.0], clamped) into 8 bit RGB channels.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> RgbColor {
    let h = ((h % 360.0) + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    };

    RgbColor {
        r: to_u8(r),
        g: to_u8(g),
        b: to_u8(b),
    }
}

/// rgb_to_hsl converts 8 bit RGB channels into (hue in degrees, saturation, lightness).
pub fn rgb_to_hsl(color: &RgbColor) -> (f64, f64, f64) {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s, l)
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_u8(channel: f64) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rgb(r: u8, g: u8, b: u8) -> RgbColor {
        RgbColor { r, g, b }
    }

    #[test]
    fn primary_colors() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), rgb(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), rgb(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), rgb(0, 0, 255));
        assert_eq!(hsl_to_rgb(-120.0, 1.0, 0.5), rgb(0, 0, 255));
    }

    #[test]
    fn greys_ignore_hue() {
        assert_eq!(hsl_to_rgb(0.0, 0.0, 0.0), rgb(0, 0, 0));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), rgb(255, 255, 255));
        assert_eq!(hsl_to_rgb(180.0, 0.0, 0.5), rgb(128, 128, 128));
    }

    #[test]
    fn lightness_above_one_is_clamped() {
        assert_eq!(hsl_to_rgb(40.0, 0.3, 2.0), rgb(255, 255, 255));
    }

    #[test]
    fn rgb_to_hsl_known_values() {
        let (h, s, l) = rgb_to_hsl(&rgb(255, 0, 0));
        assert_relative_eq!(h, 0.0);
        assert_relative_eq!(s, 1.0);
        assert_relative_eq!(l, 0.5);

        let (_, s, _) = rgb_to_hsl(&rgb(128, 128, 128));
        assert_relative_eq!(s, 0.0);
        assert_relative_eq!(rgb_to_hsl(&rgb(255, 255, 255)).2, 1.0);
    }

    #[test]
    fn conversion_round_trips_for_a_vest_color() {
        let color = hsl_to_rgb(210.0, 0.85, 0.5);
        let (h, s, l) = rgb_to_hsl(&color);
        assert_relative_eq!(h, 210.0, epsilon = 1.0);
        assert_relative_eq!(s, 0.85, epsilon = 0.01);
        assert_relative_eq!(l, 0.5, epsilon = 0.01);
    }
}
