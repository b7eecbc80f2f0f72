// Color palettes for categorical series and sequential heatmaps

use plotters::style::RGBColor;

const TAB10: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

const TAB20: [(u8, u8, u8); 20] = [
    (31, 119, 180),
    (174, 199, 232),
    (255, 127, 14),
    (255, 187, 120),
    (44, 160, 44),
    (152, 223, 138),
    (214, 39, 40),
    (255, 152, 150),
    (148, 103, 189),
    (197, 176, 213),
    (140, 86, 75),
    (196, 156, 148),
    (227, 119, 194),
    (247, 182, 210),
    (127, 127, 127),
    (199, 199, 199),
    (188, 189, 34),
    (219, 219, 141),
    (23, 190, 207),
    (158, 218, 229),
];

/// Categorical palette that cycles when there are more series than colors
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<RGBColor>,
}

impl ColorPalette {
    pub fn tab10() -> Self {
        Self::from_rgb(&TAB10)
    }

    pub fn tab20() -> Self {
        Self::from_rgb(&TAB20)
    }

    fn from_rgb(values: &[(u8, u8, u8)]) -> Self {
        Self {
            colors: values.iter().map(|&(r, g, b)| RGBColor(r, g, b)).collect(),
        }
    }

    pub fn color(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }
}

/// Piecewise-linear sequential color ramp
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<RGBColor>,
}

impl Gradient {
    /// Yellow → green → blue, as in ColorBrewer YlGnBu
    pub fn yl_gn_bu() -> Self {
        Self {
            stops: vec![
                RGBColor(255, 255, 217),
                RGBColor(237, 248, 177),
                RGBColor(199, 233, 180),
                RGBColor(127, 205, 187),
                RGBColor(65, 182, 196),
                RGBColor(29, 145, 192),
                RGBColor(34, 94, 168),
                RGBColor(37, 52, 148),
                RGBColor(8, 29, 88),
            ],
        }
    }

    /// Blue → white → red, for signed values such as correlations
    pub fn diverging() -> Self {
        Self {
            stops: vec![
                RGBColor(59, 76, 192),
                RGBColor(221, 221, 221),
                RGBColor(180, 4, 38),
            ],
        }
    }

    /// Color at position `t`, clamped to [0, 1]
    pub fn at(&self, t: f64) -> RGBColor {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let segments = (self.stops.len() - 1) as f64;
        let pos = t * segments;
        let idx = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - idx as f64;

        let a = self.stops[idx];
        let b = self.stops[idx + 1];
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }
}

/// Dark text on light cells, light text on dark cells
pub fn contrast_text(background: RGBColor) -> RGBColor {
    let luma = 0.299 * background.0 as f64 + 0.587 * background.1 as f64 + 0.114 * background.2 as f64;
    if luma > 140.0 {
        RGBColor(33, 33, 33)
    } else {
        RGBColor(255, 255, 255)
    }
}

/// Parse a named color or `#rrggbb`
pub fn parse_color(color: &str) -> Option<RGBColor> {
    let c = color.trim().to_ascii_lowercase();
    match c.as_str() {
        "red" => Some(RGBColor(214, 39, 40)),
        "green" => Some(RGBColor(44, 160, 44)),
        "blue" => Some(RGBColor(31, 119, 180)),
        "orange" => Some(RGBColor(255, 127, 14)),
        "black" => Some(RGBColor(0, 0, 0)),
        "white" => Some(RGBColor(255, 255, 255)),
        "gray" | "grey" => Some(RGBColor(127, 127, 127)),
        _ => {
            let hex = c.strip_prefix('#')?;
            if hex.len() != 6 {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        let p = ColorPalette::tab10();
        assert_eq!(p.color(9), RGBColor(23, 190, 207));
        assert_eq!(p.color(0), p.color(10));
        assert_ne!(p.color(0), p.color(1));
        assert_eq!(ColorPalette::tab20().color(1), RGBColor(174, 199, 232));
    }

    #[test]
    fn test_gradient_endpoints_and_clamp() {
        let g = Gradient::yl_gn_bu();
        assert_eq!(g.at(0.0), RGBColor(255, 255, 217));
        assert_eq!(g.at(1.0), RGBColor(8, 29, 88));
        assert_eq!(g.at(-3.0), g.at(0.0));
        assert_eq!(g.at(7.0), g.at(1.0));
        assert_eq!(g.at(f64::NAN), g.at(0.0));
    }

    #[test]
    fn test_gradient_midpoint() {
        let g = Gradient::diverging();
        assert_eq!(g.at(0.5), RGBColor(221, 221, 221));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("Red"), Some(RGBColor(214, 39, 40)));
        assert_eq!(parse_color("#0a0B0c"), Some(RGBColor(10, 11, 12)));
        assert_eq!(parse_color("#123"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn test_contrast_text() {
        assert_eq!(contrast_text(RGBColor(255, 255, 217)), RGBColor(33, 33, 33));
        assert_eq!(contrast_text(RGBColor(8, 29, 88)), RGBColor(255, 255, 255));
    }
}
