//! PNG rasterisation of a validated chart request.
//!
//! Bar, line, scatter and bubble charts go through the plotters chart layer,
//! so category labels become x ticks and dataset labels become the legend.
//! Pie, doughnut, polar area and radar charts are drawn as polygons around a
//! fixed centre.
//!
//! Per-type data checks live here: the validator only guarantees the outer
//! shape, so a scatter dataset of bare numbers is first noticed while
//! building the series below.

use std::{f64::consts::PI, io::Cursor, ops::Range, sync::OnceLock};

use image::{ImageFormat, RgbImage};
use plotters::{
    chart::{ChartContext, SeriesLabelPosition},
    coord::{
        Shift,
        cartesian::Cartesian2d,
        ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter},
        types::RangedCoordf64,
    },
    prelude::{
        BitMapBackend, ChartBuilder, Circle, DrawingArea, EmptyElement, IntoDrawingArea,
        LineSeries, PathElement, PointSeries, Polygon, Rectangle, Text,
    },
    style::{
        Color, FontStyle, IntoFont, RGBColor, TextStyle, WHITE, register_font,
        text_anchor::{HPos, Pos, VPos},
    },
};
use serde_json::{Map, Value};

use super::{
    CANVAS_HEIGHT, CANVAS_WIDTH, RenderError,
    color::{AXIS, GRID, TEXT, dataset_color, palette},
};
use crate::tools::validate::{ChartKind, ChartRequest};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart<'a, X> = ChartContext<'a, BitMapBackend<'a>, Cartesian2d<X, ValueAxis>>;

const FONT_FAMILY: &str = "sans-serif";
static FONT: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/DejaVuSans.ttf"
));

const CENTER: (i32, i32) = (CANVAS_WIDTH as i32 / 2 - 60, CANVAS_HEIGHT as i32 / 2 + 10);
const RADIUS: f64 = 250.0;
const GRID_LINES: i32 = 5;
/// Pixel offsets beyond this are off the canvas whatever the sign.
const MAX_OFFSET: f64 = 10_000.0;
/// Axis bounds are clamped here so tick spacing stays finite.
const AXIS_LIMIT: f64 = 1e300;

pub(crate) fn render_png(request: &ChartRequest) -> Result<Vec<u8>, RenderError> {
    register_fonts()?;

    let mut buf = vec![0u8; (CANVAS_WIDTH * CANVAS_HEIGHT * 3) as usize];
    {
        let area = BitMapBackend::with_buffer(&mut buf, (CANVAS_WIDTH, CANVAS_HEIGHT))
            .into_drawing_area();
        area.fill(&WHITE).map_err(draw_err)?;

        match request.kind {
            ChartKind::Bar => draw_bars(&area, request)?,
            ChartKind::Line => draw_lines(&area, request)?,
            ChartKind::Scatter | ChartKind::Bubble => draw_points(&area, request)?,
            ChartKind::Pie => draw_rings(&area, request, 0.0)?,
            ChartKind::Doughnut => draw_rings(&area, request, 0.5)?,
            ChartKind::PolarArea => draw_polar(&area, request)?,
            ChartKind::Radar => draw_radar(&area, request)?,
        }

        area.present().map_err(draw_err)?;
    }
    encode(buf)
}

/// The bitmap backend has no system fonts, so text needs the bundled face.
fn register_fonts() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered =
        *REGISTERED.get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT).is_ok());
    if registered {
        Ok(())
    } else {
        Err(RenderError::Draw("bundled font could not be loaded".into()))
    }
}

fn encode(buf: Vec<u8>) -> Result<Vec<u8>, RenderError> {
    let img = RgbImage::from_raw(CANVAS_WIDTH, CANVAS_HEIGHT, buf)
        .ok_or_else(|| RenderError::Draw("pixel buffer has the wrong size".into()))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn text<'a>(size: u32) -> TextStyle<'a> {
    (FONT_FAMILY, size).into_font().color(&TEXT)
}

fn option<'a>(request: &'a ChartRequest, pointer: &str) -> Option<&'a Value> {
    request.options.as_ref()?.pointer(pointer)
}

/// Text of a `{display, text}` option block. `text` may be a list of lines.
fn text_option(request: &ChartRequest, block: &str) -> Option<String> {
    if option(request, &format!("{block}/display")) == Some(&Value::Bool(false)) {
        return None;
    }
    let text = match option(request, &format!("{block}/text"))? {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn title(request: &ChartRequest) -> Option<String> {
    text_option(request, "/plugins/title").or_else(|| text_option(request, "/title"))
}

fn legend_visible(request: &ChartRequest) -> bool {
    option(request, "/plugins/legend/display") != Some(&Value::Bool(false))
}

fn legend_position(request: &ChartRequest) -> SeriesLabelPosition {
    match option(request, "/plugins/legend/position").and_then(Value::as_str) {
        Some("bottom") => SeriesLabelPosition::LowerMiddle,
        Some("left") => SeriesLabelPosition::MiddleLeft,
        Some("right") => SeriesLabelPosition::MiddleRight,
        _ => SeriesLabelPosition::UpperMiddle,
    }
}

/// One dataset: its position, its raw object (for colours) and its data array.
struct Dataset<'a> {
    index: usize,
    raw: &'a Map<String, Value>,
    data: &'a [Value],
}

impl Dataset<'_> {
    fn label(&self) -> Option<&str> {
        self.raw.get("label").and_then(Value::as_str)
    }

    fn fill(&self, element: usize) -> RGBColor {
        dataset_color(self.raw, "backgroundColor", element).unwrap_or(palette(self.index))
    }

    fn border(&self, element: usize) -> RGBColor {
        dataset_color(self.raw, "borderColor", element).unwrap_or(palette(self.index))
    }

    /// Plain numeric values; `null` marks a gap.
    fn numbers(&self, kind: ChartKind) -> Result<Vec<Option<f64>>, RenderError> {
        self.data
            .iter()
            .enumerate()
            .map(|(j, value)| match value {
                Value::Null => Ok(None),
                Value::Number(n) => Ok(n.as_f64()),
                other => Err(RenderError::Data(format!(
                    "{kind} chart dataset {} value {j} must be a number, got {other}",
                    self.index
                ))),
            })
            .collect()
    }

    fn non_negative(&self, kind: ChartKind) -> Result<Vec<f64>, RenderError> {
        let values = self.numbers(kind)?;
        values
            .into_iter()
            .enumerate()
            .map(|(j, value)| match value {
                Some(v) if v < 0.0 => Err(RenderError::Data(format!(
                    "{kind} chart dataset {} value {j} must not be negative",
                    self.index
                ))),
                Some(v) => Ok(v),
                None => Ok(0.0),
            })
            .collect()
    }

    /// `{x, y}` points, plus `r` for bubbles.
    fn points(&self, kind: ChartKind) -> Result<Vec<(f64, f64, f64)>, RenderError> {
        let with_radius = kind == ChartKind::Bubble;
        self.data
            .iter()
            .enumerate()
            .map(|(j, value)| {
                let field = |name: &str| value.get(name).and_then(Value::as_f64);
                let point = match (field("x"), field("y"), field("r")) {
                    (Some(x), Some(y), Some(r)) if with_radius => Some((x, y, r)),
                    (Some(x), Some(y), _) if !with_radius => Some((x, y, 4.0)),
                    _ => None,
                };
                point.ok_or_else(|| {
                    let fields = if with_radius { "x, y and r" } else { "x and y" };
                    RenderError::Data(format!(
                        "{kind} chart dataset {} point {j} must be an object with numeric \
                         {fields}, got {value}",
                        self.index
                    ))
                })
            })
            .collect()
    }
}

fn datasets(request: &ChartRequest) -> Result<Vec<Dataset<'_>>, RenderError> {
    request
        .datasets()
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let raw = value.as_object().ok_or_else(|| {
                RenderError::Data(format!("dataset {index} must be an object"))
            })?;
            let data = raw
                .get("data")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    RenderError::Data(format!("dataset {index} must include a data array"))
                })?;
            Ok(Dataset { index, raw, data })
        })
        .collect()
}

fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn category_count(request: &ChartRequest, sets: &[Dataset<'_>]) -> usize {
    let longest = sets.iter().map(|d| d.data.len()).max().unwrap_or(0);
    request.labels().len().max(longest).max(1)
}

/// X axis with one slot per label. Ticks sit on integer positions.
struct CategoryAxis {
    labels: Vec<String>,
    /// Leave half a slot either side, as bars need.
    offset: bool,
}

impl CategoryAxis {
    fn new(request: &ChartRequest, sets: &[Dataset<'_>], offset: bool) -> Self {
        let mut labels = request.labels();
        labels.resize(category_count(request, sets), String::new());
        Self { labels, offset }
    }
}

impl Ranged for CategoryAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let range = self.range();
        let t = (value - range.start) / (range.end - range.start);
        limit.0 + (t * f64::from(limit.1 - limit.0)).round() as i32
    }

    fn key_points<H: KeyPointHint>(&self, hint: H) -> Vec<f64> {
        if hint.weight().allow_light_points() {
            return Vec::new();
        }
        let step = self.labels.len().div_ceil(hint.max_num_points().max(1)).max(1);
        (0..self.labels.len()).step_by(step).map(|j| j as f64).collect()
    }

    fn range(&self) -> Range<f64> {
        let last = self.labels.len() as f64 - 1.0;
        if self.offset || self.labels.len() == 1 {
            -0.5..last + 0.5
        } else {
            0.0..last
        }
    }
}

impl ValueFormatter<f64> for CategoryAxis {
    fn format_ext(&self, value: &f64) -> String {
        self.labels
            .get(value.round() as usize)
            .cloned()
            .unwrap_or_default()
    }
}

/// Linear value axis, padded 5% past the data.
struct ValueAxis(RangedCoordf64);

impl ValueAxis {
    /// `include_zero` pins the baseline at 0, which bars grow from.
    fn new(lo: f64, hi: f64, include_zero: bool) -> Self {
        let (lo, hi) = if include_zero {
            (lo.min(0.0), hi.max(0.0))
        } else {
            (lo, hi)
        };
        let (lo, hi) = (lo.max(-AXIS_LIMIT), hi.min(AXIS_LIMIT));
        let range = if (hi - lo).abs() < f64::EPSILON {
            lo - 1.0..hi + 1.0
        } else {
            let pad = (hi - lo) * 0.05;
            let low = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
            let high = if include_zero && hi == 0.0 { 0.0 } else { hi + pad };
            low..high
        };
        Self(range.into())
    }
}

impl Ranged for ValueAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    /// Values past the axis land on its edge.
    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let range = self.0.range();
        self.0.map(&value.clamp(range.start, range.end), limit)
    }

    fn key_points<H: KeyPointHint>(&self, hint: H) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn range(&self) -> Range<f64> {
        self.0.range()
    }
}

impl ValueFormatter<f64> for ValueAxis {
    fn format(value: &f64) -> String {
        if value.abs() >= 1e9 {
            format!("{value:.2e}")
        } else {
            // Adding 0.0 turns -0 into 0.
            format!("{}", (value * 1e6).round() / 1e6 + 0.0)
        }
    }
}

/// Chart context with the title, ticks, axis titles and grid drawn.
fn cartesian<'a, X>(
    area: &Area<'a>,
    request: &ChartRequest,
    x: X,
    y: ValueAxis,
) -> Result<Chart<'a, X>, RenderError>
where
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let mut builder = ChartBuilder::on(area);
    builder.margin(16).x_label_area_size(40).y_label_area_size(64);
    if let Some(title) = title(request) {
        builder.caption(title, text(20));
    }
    let mut chart = builder.build_cartesian_2d(x, y).map_err(draw_err)?;

    let category_x = matches!(request.kind, ChartKind::Bar | ChartKind::Line);
    let mut mesh = chart.configure_mesh();
    mesh.label_style(text(12))
        .axis_desc_style(text(14))
        .axis_style(AXIS)
        .bold_line_style(GRID)
        .max_light_lines(0);
    if category_x {
        mesh.disable_x_mesh();
    }
    if let Some(desc) = text_option(request, "/scales/x/title") {
        mesh.x_desc(desc);
    }
    if let Some(desc) = text_option(request, "/scales/y/title") {
        mesh.y_desc(desc);
    }
    mesh.draw().map_err(draw_err)?;
    Ok(chart)
}

fn draw_legend<X>(
    chart: &mut Chart<'_, X>,
    request: &ChartRequest,
    sets: &[Dataset<'_>],
) -> Result<(), RenderError>
where
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    if !legend_visible(request) || sets.iter().all(|set| set.label().is_none()) {
        return Ok(());
    }
    chart
        .configure_series_labels()
        .position(legend_position(request))
        .label_font(text(12))
        .background_style(WHITE.mix(0.8))
        .border_style(GRID)
        .draw()
        .map_err(draw_err)
}

fn draw_bars(area: &Area<'_>, request: &ChartRequest) -> Result<(), RenderError> {
    let sets = datasets(request)?;
    let series = sets
        .iter()
        .map(|d| d.numbers(ChartKind::Bar))
        .collect::<Result<Vec<_>, _>>()?;

    let (lo, hi) = extent(series.iter().flatten().flatten().copied()).unwrap_or((0.0, 1.0));
    let x = CategoryAxis::new(request, &sets, true);
    let mut chart = cartesian(area, request, x, ValueAxis::new(lo, hi, true))?;

    let width = 0.8 / sets.len() as f64;
    for (set, values) in sets.iter().zip(&series) {
        let bars: Vec<_> = values
            .iter()
            .enumerate()
            .filter_map(|(j, value)| {
                let left = j as f64 - 0.4 + width * set.index as f64;
                value.map(|v| (j, [(left, 0.0), (left + width, v)]))
            })
            .collect();

        let fill = set.fill(0);
        let anno = chart
            .draw_series(
                bars.iter()
                    .map(|&(j, corners)| Rectangle::new(corners, set.fill(j).filled())),
            )
            .map_err(draw_err)?;
        if let Some(label) = set.label() {
            anno.label(label).legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 14, y + 5)], fill.filled())
            });
        }
        chart
            .draw_series(
                bars.iter()
                    .map(|&(j, corners)| Rectangle::new(corners, set.border(j).stroke_width(1))),
            )
            .map_err(draw_err)?;
    }
    draw_legend(&mut chart, request, &sets)
}

/// Connected stretches of a line. `null` breaks the line unless gaps are spanned.
fn runs(values: &[Option<f64>], span_gaps: bool) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (j, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((j as f64, *v)),
            None if span_gaps => {}
            None => runs.push(std::mem::take(&mut current)),
        }
    }
    runs.push(current);
    runs.retain(|run| run.len() > 1);
    runs
}

fn draw_lines(area: &Area<'_>, request: &ChartRequest) -> Result<(), RenderError> {
    let sets = datasets(request)?;
    let series = sets
        .iter()
        .map(|d| d.numbers(ChartKind::Line))
        .collect::<Result<Vec<_>, _>>()?;

    let (lo, hi) = extent(series.iter().flatten().flatten().copied()).unwrap_or((0.0, 1.0));
    let x = CategoryAxis::new(request, &sets, false);
    let mut chart = cartesian(area, request, x, ValueAxis::new(lo, hi, false))?;

    for (set, values) in sets.iter().zip(&series) {
        let color = set.border(0);
        let span_gaps = set.raw.get("spanGaps").and_then(Value::as_bool).unwrap_or(false);
        for run in runs(values, span_gaps) {
            chart
                .draw_series(LineSeries::new(run, color.stroke_width(2)))
                .map_err(draw_err)?;
        }

        let points = values
            .iter()
            .enumerate()
            .filter_map(|(j, value)| value.map(|v| (j as f64, v)));
        let anno = chart
            .draw_series(PointSeries::<_, _, Circle<_, _>, _>::new(
                points,
                3,
                set.fill(0).filled(),
            ))
            .map_err(draw_err)?;
        if let Some(label) = set.label() {
            anno.label(label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
        }
    }
    draw_legend(&mut chart, request, &sets)
}

fn draw_points(area: &Area<'_>, request: &ChartRequest) -> Result<(), RenderError> {
    let sets = datasets(request)?;
    let series = sets
        .iter()
        .map(|d| d.points(request.kind))
        .collect::<Result<Vec<_>, _>>()?;

    let all = || series.iter().flatten();
    let (x_lo, x_hi) = extent(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_lo, y_hi) = extent(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let x = ValueAxis::new(x_lo, x_hi, false);
    let mut chart = cartesian(area, request, x, ValueAxis::new(y_lo, y_hi, false))?;

    for (set, points) in sets.iter().zip(&series) {
        let anno = chart
            .draw_series(points.iter().enumerate().map(|(j, &(x, y, r))| {
                let radius = r.clamp(1.0, 80.0).round() as u32;
                EmptyElement::at((x, y))
                    + Circle::new((0, 0), radius, set.fill(j).mix(0.6).filled())
                    + Circle::new((0, 0), radius, set.border(j).stroke_width(1))
            }))
            .map_err(draw_err)?;
        if let Some(label) = set.label() {
            let fill = set.fill(0);
            anno.label(label)
                .legend(move |(x, y)| Circle::new((x + 7, y), 5, fill.mix(0.6).filled()));
        }
    }
    draw_legend(&mut chart, request, &sets)
}

/// Title for charts drawn without the chart layer.
fn draw_title(area: &Area<'_>, request: &ChartRequest) -> Result<(), RenderError> {
    let Some(title) = title(request) else {
        return Ok(());
    };
    let style = text(20).pos(Pos::new(HPos::Center, VPos::Top));
    area.draw(&Text::new(title, (CENTER.0, 12), style))
        .map_err(draw_err)
}

/// Legend for radial charts: one swatch per entry down the right-hand side.
fn draw_key(
    area: &Area<'_>,
    request: &ChartRequest,
    entries: &[(String, RGBColor)],
) -> Result<(), RenderError> {
    if !legend_visible(request) {
        return Ok(());
    }
    let x = CENTER.0 + RADIUS as i32 + 30;
    let rows = (CANVAS_HEIGHT as i32 - 2 * CENTER.1 + 2 * RADIUS as i32) / 22;
    for ((label, color), row) in entries.iter().zip(0..rows.max(1)) {
        let y = CENTER.1 - RADIUS as i32 + 22 * row;
        area.draw(&Rectangle::new([(x, y), (x + 14, y + 14)], color.filled()))
            .map_err(draw_err)?;
        area.draw(&Text::new(label.as_str(), (x + 20, y), text(13)))
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Category labels coloured like the first dataset's slices.
fn slice_key(request: &ChartRequest, sets: &[Dataset<'_>]) -> Vec<(String, RGBColor)> {
    let first = sets.first().map(|set| set.raw);
    request
        .labels()
        .into_iter()
        .enumerate()
        .map(|(j, label)| {
            let color = first
                .and_then(|raw| dataset_color(raw, "backgroundColor", j))
                .unwrap_or(palette(j));
            (label, color)
        })
        .collect()
}

/// Pixel `radius` away from the centre along `angle` (radians, clockwise from 3 o'clock).
fn polar_point(radius: f64, angle: f64) -> (i32, i32) {
    let offset = |d: f64| d.clamp(-MAX_OFFSET, MAX_OFFSET).round() as i32;
    (
        CENTER.0 + offset(radius * angle.cos()),
        CENTER.1 + offset(radius * angle.sin()),
    )
}

/// Outline of an annular sector, clockwise from `start` to `end` (radians).
fn sector(inner: f64, outer: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = ((end - start).to_degrees().ceil() as usize).max(2);
    let angle = |i: usize| start + (end - start) * i as f64 / steps as f64;

    let mut points: Vec<_> = (0..=steps).map(|i| polar_point(outer, angle(i))).collect();
    if inner < 0.5 {
        points.push(CENTER);
    } else {
        points.extend((0..=steps).rev().map(|i| polar_point(inner, angle(i))));
    }
    points
}

fn draw_slice(
    area: &Area<'_>,
    outline: Vec<(i32, i32)>,
    fill: impl Color,
) -> Result<(), RenderError> {
    let mut border = outline.clone();
    if let Some(first) = border.first().copied() {
        border.push(first);
    }
    area.draw(&Polygon::new(outline, fill.filled()))
        .map_err(draw_err)?;
    area.draw(&PathElement::new(border, WHITE.stroke_width(2)))
        .map_err(draw_err)
}

/// Pie and doughnut: one ring per dataset, the first outermost.
fn draw_rings(area: &Area<'_>, request: &ChartRequest, cutout: f64) -> Result<(), RenderError> {
    let sets = datasets(request)?;
    let series = sets
        .iter()
        .map(|d| d.non_negative(request.kind))
        .collect::<Result<Vec<_>, _>>()?;

    draw_title(area, request)?;
    let ring = RADIUS * (1.0 - cutout) / sets.len() as f64;
    for (k, (set, values)) in sets.iter().zip(&series).enumerate() {
        let outer = RADIUS - ring * k as f64;
        let inner = outer - ring;
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            continue;
        }

        let mut start = -PI / 2.0;
        for (j, value) in values.iter().enumerate() {
            let end = start + value / total * 2.0 * PI;
            if *value > 0.0 {
                let fill = dataset_color(set.raw, "backgroundColor", j).unwrap_or(palette(j));
                draw_slice(area, sector(inner, outer, start, end), fill)?;
            }
            start = end;
        }
    }
    draw_key(area, request, &slice_key(request, &sets))
}

fn draw_polar(area: &Area<'_>, request: &ChartRequest) -> Result<(), RenderError> {
    let sets = datasets(request)?;
    let series = sets
        .iter()
        .map(|d| d.non_negative(ChartKind::PolarArea))
        .collect::<Result<Vec<_>, _>>()?;

    draw_title(area, request)?;
    for step in 1..=GRID_LINES {
        let radius = (RADIUS * f64::from(step) / f64::from(GRID_LINES)).round() as u32;
        area.draw(&Circle::new(CENTER, radius, GRID.stroke_width(1)))
            .map_err(draw_err)?;
    }

    let max = series.iter().flatten().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for (set, values) in sets.iter().zip(&series) {
            let sweep = 2.0 * PI / values.len().max(1) as f64;
            for (j, value) in values.iter().enumerate() {
                let start = -PI / 2.0 + sweep * j as f64;
                let fill = dataset_color(set.raw, "backgroundColor", j).unwrap_or(palette(j));
                // Divide first: `RADIUS * value` overflows for values near f64::MAX.
                let radius = RADIUS * (value / max);
                draw_slice(area, sector(0.0, radius, start, start + sweep), fill.mix(0.7))?;
            }
        }
    }
    draw_key(area, request, &slice_key(request, &sets))
}

fn draw_radar(area: &Area<'_>, request: &ChartRequest) -> Result<(), RenderError> {
    let sets = datasets(request)?;
    let series = sets
        .iter()
        .map(|d| d.numbers(ChartKind::Radar))
        .collect::<Result<Vec<_>, _>>()?;

    let spokes = category_count(request, &sets);
    let (lo, hi) = extent(series.iter().flatten().flatten().copied()).unwrap_or((0.0, 1.0));
    let scale = ValueAxis::new(lo, hi, true).range();
    let reach = |v: f64| RADIUS * ((v - scale.start) / (scale.end - scale.start)).clamp(0.0, 1.0);
    let angle = |j: usize| -PI / 2.0 + 2.0 * PI * j as f64 / spokes as f64;
    let vertex = |j: usize, radius: f64| polar_point(radius, angle(j));

    draw_title(area, request)?;
    for step in 1..=GRID_LINES {
        let radius = RADIUS * f64::from(step) / f64::from(GRID_LINES);
        let web: Vec<_> = (0..=spokes).map(|j| vertex(j % spokes, radius)).collect();
        area.draw(&PathElement::new(web, GRID.stroke_width(1)))
            .map_err(draw_err)?;
    }
    let labels = request.labels();
    let spoke_label = text(12).pos(Pos::new(HPos::Center, VPos::Center));
    for j in 0..spokes {
        area.draw(&PathElement::new(
            vec![CENTER, vertex(j, RADIUS)],
            GRID.stroke_width(1),
        ))
        .map_err(draw_err)?;
        if let Some(label) = labels.get(j) {
            let at = vertex(j, RADIUS + 16.0);
            area.draw(&Text::new(label.as_str(), at, spoke_label.clone()))
                .map_err(draw_err)?;
        }
    }

    for (set, values) in sets.iter().zip(&series) {
        let outline: Vec<_> = (0..spokes)
            .map(|j| match values.get(j).copied().flatten() {
                Some(v) => vertex(j, reach(v)),
                None => CENTER,
            })
            .collect();
        let mut border = outline.clone();
        border.extend(outline.first().copied());

        area.draw(&Polygon::new(outline.clone(), set.fill(0).mix(0.2).filled()))
            .map_err(draw_err)?;
        area.draw(&PathElement::new(border, set.border(0).stroke_width(2)))
            .map_err(draw_err)?;
        for point in outline {
            area.draw(&Circle::new(point, 3, set.border(0).filled()))
                .map_err(draw_err)?;
        }
    }

    let key: Vec<_> = sets
        .iter()
        .filter_map(|set| set.label().map(|label| (label.to_string(), set.border(0))))
        .collect();
    draw_key(area, request, &key)
}
