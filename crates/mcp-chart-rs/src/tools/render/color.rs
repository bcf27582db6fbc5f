use plotters::style::RGBColor;
use serde_json::{Map, Value};

/// Chart.js default dataset colours.
const PALETTE: [RGBColor; 7] = [
    RGBColor(54, 162, 235),
    RGBColor(255, 99, 132),
    RGBColor(255, 159, 64),
    RGBColor(255, 205, 86),
    RGBColor(75, 192, 192),
    RGBColor(153, 102, 255),
    RGBColor(201, 203, 207),
];

pub(crate) const GRID: RGBColor = RGBColor(225, 225, 225);
pub(crate) const AXIS: RGBColor = RGBColor(120, 120, 120);
pub(crate) const TEXT: RGBColor = RGBColor(102, 102, 102);

pub(crate) fn palette(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Colour for element `index` of a dataset, read from `key`.
///
/// `key` may hold one colour for the whole dataset or an array with one colour
/// per element (the usual shape for pie slices).
pub(crate) fn dataset_color(
    dataset: &Map<String, Value>,
    key: &str,
    index: usize,
) -> Option<RGBColor> {
    match dataset.get(key)? {
        Value::String(s) => parse_color(s),
        Value::Array(colors) if !colors.is_empty() => colors
            .get(index % colors.len())
            .and_then(Value::as_str)
            .and_then(parse_color),
        _ => None,
    }
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()` and a few colour names.
/// Alpha is dropped.
pub(crate) fn parse_color(input: &str) -> Option<RGBColor> {
    let s = input.trim().to_ascii_lowercase();

    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(args) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Vec<u8> = args
            .split(',')
            .take(3)
            .map(|c| c.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0) as u8))
            .collect::<Option<_>>()?;
        return match channels[..] {
            [r, g, b] => Some(RGBColor(r, g, b)),
            _ => None,
        };
    }

    let named = match s.as_str() {
        "red" => RGBColor(255, 0, 0),
        "green" => RGBColor(0, 128, 0),
        "blue" => RGBColor(0, 0, 255),
        "orange" => RGBColor(255, 165, 0),
        "yellow" => RGBColor(255, 255, 0),
        "purple" => RGBColor(128, 0, 128),
        "gray" | "grey" => RGBColor(128, 128, 128),
        "black" => RGBColor(0, 0, 0),
        "white" => RGBColor(255, 255, 255),
        _ => return None,
    };
    Some(named)
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(RGBColor(digits.next()??, digits.next()??, digits.next()??))
        }
        6 | 8 => Some(RGBColor(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}
