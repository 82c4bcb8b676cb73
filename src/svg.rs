use std::{fmt, str::FromStr};

const FONT_FAMILY: &str = "Verdana,Geneva,DejaVu Sans,sans-serif";
const LABEL_COLOR: &str = "#555";
const HORIZONTAL_PADDING: f64 = 5.0;
const FALLBACK_GLYPH_WIDTH: f64 = 7.0;

// Advance widths of printable ASCII (0x20..=0x7e) in Verdana at 11px.
const VERDANA_11_WIDTHS: [f64; 95] = [
    3.87, 4.33, 5.05, 9.0, 6.99, 11.84, 7.99, 2.95, 4.99, 4.99, 6.99, 9.0, 4.0, 4.99, 4.0, 4.99,
    6.99, 6.99, 6.99, 6.99, 6.99, 6.99, 6.99, 6.99, 6.99, 6.99, 4.99, 4.99, 9.0, 9.0, 9.0, 6.0,
    11.0, 7.52, 7.54, 7.68, 8.48, 6.96, 6.32, 8.53, 8.27, 4.61, 5.0, 7.62, 6.12, 9.27, 8.23, 8.66,
    6.63, 8.66, 7.65, 7.52, 6.78, 8.05, 7.52, 10.88, 7.54, 6.77, 7.54, 4.99, 4.99, 4.99, 9.0,
    6.99, 6.99, 6.61, 6.85, 5.73, 6.85, 6.55, 3.87, 6.85, 6.96, 3.02, 3.79, 6.51, 3.02, 10.7,
    6.96, 6.68, 6.85, 6.85, 4.69, 5.73, 4.33, 6.96, 6.51, 8.98, 6.51, 6.51, 5.83, 6.98, 4.99,
    6.98, 9.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plastic,
    Flat,
    FlatSquare,
}

pub const STYLE_NAMES: [&str; 3] = ["plastic", "flat", "flat-square"];

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plastic => "plastic",
            Self::Flat => "flat",
            Self::FlatSquare => "flat-square",
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plastic" => Ok(Self::Plastic),
            "flat" => Ok(Self::Flat),
            "flat-square" => Ok(Self::FlatSquare),
            other => Err(format!(
                "unsupported badge style '{other}' (expected one of: {})",
                STYLE_NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Badge<'a> {
    label: &'a str,
    value: &'a str,
    color: &'a str,
}

impl<'a> Badge<'a> {
    pub fn new(label: &'a str, value: &'a str, color: &'a str) -> Self {
        Self {
            label,
            value,
            color,
        }
    }

    pub fn render(&self, style: Style) -> String {
        let layout = Layout::new(self.label, self.value);
        let label = escape(self.label);
        let value = escape(self.value);
        let color = escape(self.color);

        match style {
            Style::Plastic => render_plastic(&layout, &label, &value, &color),
            Style::Flat => render_flat(&layout, &label, &value, &color),
            Style::FlatSquare => render_flat_square(&layout, &label, &value, &color),
        }
    }
}

struct Layout {
    label_width: f64,
    value_width: f64,
    label_text_width: f64,
    value_text_width: f64,
}

impl Layout {
    fn new(label: &str, value: &str) -> Self {
        let label_text_width = text_width(label);
        let value_text_width = text_width(value);

        Self {
            label_width: (label_text_width + HORIZONTAL_PADDING * 2.0).round(),
            value_width: (value_text_width + HORIZONTAL_PADDING * 2.0).round(),
            label_text_width,
            value_text_width,
        }
    }

    fn width(&self) -> f64 {
        self.label_width + self.value_width
    }

    fn label_x(&self) -> f64 {
        self.label_width / 2.0
    }

    fn value_x(&self) -> f64 {
        self.label_width + self.value_width / 2.0
    }
}

fn render_plastic(layout: &Layout, label: &str, value: &str, color: &str) -> String {
    let width = layout.width();
    let label_width = layout.label_width;
    let value_width = layout.value_width;

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"18\" role=\"img\" aria-label=\"{label}: {value}\">\
<title>{label}: {value}</title>\
<linearGradient id=\"s\" x2=\"0\" y2=\"100%\">\
<stop offset=\"0\" stop-color=\"#fff\" stop-opacity=\".7\"/>\
<stop offset=\".1\" stop-color=\"#aaa\" stop-opacity=\".1\"/>\
<stop offset=\".9\" stop-color=\"#000\" stop-opacity=\".3\"/>\
<stop offset=\"1\" stop-color=\"#000\" stop-opacity=\".5\"/>\
</linearGradient>\
<clipPath id=\"r\"><rect width=\"{width}\" height=\"18\" rx=\"4\" fill=\"#fff\"/></clipPath>\
<g clip-path=\"url(#r)\">\
<rect width=\"{label_width}\" height=\"18\" fill=\"{LABEL_COLOR}\"/>\
<rect x=\"{label_width}\" width=\"{value_width}\" height=\"18\" fill=\"{color}\"/>\
<rect width=\"{width}\" height=\"18\" fill=\"url(#s)\"/>\
</g>\
{}\
</svg>",
        render_text(layout, label, value, 14.0, 13.0),
    )
}

fn render_flat(layout: &Layout, label: &str, value: &str, color: &str) -> String {
    let width = layout.width();
    let label_width = layout.label_width;
    let value_width = layout.value_width;

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"20\" role=\"img\" aria-label=\"{label}: {value}\">\
<title>{label}: {value}</title>\
<linearGradient id=\"s\" x2=\"0\" y2=\"100%\">\
<stop offset=\"0\" stop-color=\"#bbb\" stop-opacity=\".1\"/>\
<stop offset=\"1\" stop-opacity=\".1\"/>\
</linearGradient>\
<clipPath id=\"r\"><rect width=\"{width}\" height=\"20\" rx=\"3\" fill=\"#fff\"/></clipPath>\
<g clip-path=\"url(#r)\">\
<rect width=\"{label_width}\" height=\"20\" fill=\"{LABEL_COLOR}\"/>\
<rect x=\"{label_width}\" width=\"{value_width}\" height=\"20\" fill=\"{color}\"/>\
<rect width=\"{width}\" height=\"20\" fill=\"url(#s)\"/>\
</g>\
{}\
</svg>",
        render_text(layout, label, value, 15.0, 14.0),
    )
}

fn render_flat_square(layout: &Layout, label: &str, value: &str, color: &str) -> String {
    let width = layout.width();
    let label_width = layout.label_width;
    let value_width = layout.value_width;
    let label_x = layout.label_x();
    let value_x = layout.value_x();

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"20\" role=\"img\" aria-label=\"{label}: {value}\">\
<title>{label}: {value}</title>\
<g shape-rendering=\"crispEdges\">\
<rect width=\"{label_width}\" height=\"20\" fill=\"{LABEL_COLOR}\"/>\
<rect x=\"{label_width}\" width=\"{value_width}\" height=\"20\" fill=\"{color}\"/>\
</g>\
<g fill=\"#fff\" text-anchor=\"middle\" font-family=\"{FONT_FAMILY}\" text-rendering=\"geometricPrecision\" font-size=\"11\">\
<text x=\"{label_x}\" y=\"14\" textLength=\"{:.1}\">{label}</text>\
<text x=\"{value_x}\" y=\"14\" textLength=\"{:.1}\">{value}</text>\
</g>\
</svg>",
        layout.label_text_width, layout.value_text_width,
    )
}

/// Label and value text with a drop shadow, shared by the rounded styles.
fn render_text(layout: &Layout, label: &str, value: &str, shadow_y: f64, text_y: f64) -> String {
    let label_x = layout.label_x();
    let value_x = layout.value_x();
    let label_length = layout.label_text_width;
    let value_length = layout.value_text_width;

    format!(
        "<g fill=\"#fff\" text-anchor=\"middle\" font-family=\"{FONT_FAMILY}\" text-rendering=\"geometricPrecision\" font-size=\"11\">\
<text aria-hidden=\"true\" x=\"{label_x}\" y=\"{shadow_y}\" fill=\"#010101\" fill-opacity=\".3\" textLength=\"{label_length:.1}\">{label}</text>\
<text x=\"{label_x}\" y=\"{text_y}\" textLength=\"{label_length:.1}\">{label}</text>\
<text aria-hidden=\"true\" x=\"{value_x}\" y=\"{shadow_y}\" fill=\"#010101\" fill-opacity=\".3\" textLength=\"{value_length:.1}\">{value}</text>\
<text x=\"{value_x}\" y=\"{text_y}\" textLength=\"{value_length:.1}\">{value}</text>\
</g>"
    )
}

fn text_width(text: &str) -> f64 {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => VERDANA_11_WIDTHS[ch as usize - 0x20],
            _ => FALLBACK_GLYPH_WIDTH,
        })
        .sum()
}

fn escape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            _ => output.push(ch),
        }
    }
    output
}
