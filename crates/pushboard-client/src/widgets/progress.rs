//! Circular progress indicators.
//!
//! Both widgets take a percentage, clamp it to `[0, 100]`, and render
//! either an SVG fragment or a one-line terminal gauge.

use std::f64::consts::PI;
use std::fmt::Write as _;

const DEFAULT_COLOR: &str = "currentColor";
const TRACK_COLOR: &str = "#e5e7eb";

const LINE_RADIUS: f64 = 53.0;
const LINE_STROKE: f64 = 12.0;
const LINE_CIRCUMFERENCE: f64 = 332.0;
const FILL_RADIUS: f64 = 50.0;

const PIE_START_ANGLE: f64 = 90.0;
const PIE_END_ANGLE: f64 = -270.0;
const PIE_LINE_INNER_RATIO: f64 = 0.8;

/// Clamp a percentage to `[0, 100]`. NaN counts as zero.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressSize {
    Sm,
    #[default]
    Md,
    Lg,
}

impl ProgressSize {
    pub fn pixels(&self) -> u32 {
        match self {
            Self::Sm => 96,
            Self::Md => 128,
            Self::Lg => 160,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressVariant {
    /// Stroked ring.
    #[default]
    Line,
    /// Solid disc.
    Fill,
}

/// Dash geometry of a ring or disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub radius: f64,
    /// Zero for the filled disc.
    pub stroke_width: f64,
    pub circumference: f64,
    pub dash_offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircularProgress {
    value: f64,
    size: ProgressSize,
    variant: ProgressVariant,
    color: String,
}

impl CircularProgress {
    pub fn new(value: f64) -> Self {
        Self {
            value: clamp_percent(value),
            size: ProgressSize::default(),
            variant: ProgressVariant::default(),
            color: DEFAULT_COLOR.to_string(),
        }
    }

    pub fn size(mut self, size: ProgressSize) -> Self {
        self.size = size;
        self
    }

    pub fn variant(mut self, variant: ProgressVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn geometry(&self) -> RingGeometry {
        match self.variant {
            ProgressVariant::Line => RingGeometry {
                radius: LINE_RADIUS,
                stroke_width: LINE_STROKE,
                circumference: LINE_CIRCUMFERENCE,
                dash_offset: LINE_CIRCUMFERENCE - self.value / 100.0 * LINE_CIRCUMFERENCE,
            },
            ProgressVariant::Fill => {
                let circumference = 2.0 * PI * FILL_RADIUS;
                RingGeometry {
                    radius: FILL_RADIUS,
                    stroke_width: 0.0,
                    circumference,
                    dash_offset: (100.0 - self.value) * circumference / 100.0,
                }
            }
        }
    }

    pub fn to_svg(&self) -> String {
        let px = self.size.pixels();
        let g = self.geometry();
        let mut svg = format!(
            r#"<svg width="{px}" height="{px}" transform="rotate(-90)" xmlns="http://www.w3.org/2000/svg">"#
        );

        match self.variant {
            ProgressVariant::Line => {
                let _ = write!(
                    svg,
                    r#"<circle cx="50%" cy="50%" r="{r}" stroke-width="{w}" fill="none" stroke="{TRACK_COLOR}"/>"#,
                    r = g.radius,
                    w = g.stroke_width,
                );
                let _ = write!(
                    svg,
                    r#"<circle cx="50%" cy="50%" r="{r}" stroke-width="{w}" fill="none" stroke="{color}" stroke-linecap="round" stroke-dasharray="{c:.2}" stroke-dashoffset="{o:.2}"/>"#,
                    r = g.radius,
                    w = g.stroke_width,
                    color = self.color,
                    c = g.circumference,
                    o = g.dash_offset,
                );
            }
            ProgressVariant::Fill => {
                let r = g.radius;
                let _ = write!(
                    svg,
                    r#"<circle cx="50%" cy="50%" r="{r}" fill="{TRACK_COLOR}"/>"#
                );
                let _ = write!(
                    svg,
                    r#"<path d="M 50 50 m 0 -{r} a {r} {r} 0 1 1 0 {d} a {r} {r} 0 1 1 0 -{d}" fill="{color}" stroke-dasharray="{c:.2}" stroke-dashoffset="{o:.2}" transform="rotate(-90 50 50)"/>"#,
                    d = 2.0 * r,
                    color = self.color,
                    c = g.circumference,
                    o = g.dash_offset,
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Terminal bar such as `[#####-----]  50%`.
    pub fn gauge(&self, width: usize) -> String {
        gauge(self.value, width)
    }
}

pub(crate) fn gauge(value: f64, width: usize) -> String {
    let value = clamp_percent(value);
    let filled = ((value / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        value
    )
}

/// One sector of a pie, angles in degrees, counter-clockwise positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieSlice {
    pub value: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl PieSlice {
    pub fn sweep(&self) -> f64 {
        (self.start_angle - self.end_angle).abs()
    }
}

/// Two-slice pie: the value and the remainder, drawn clockwise from 12
/// o'clock.
#[derive(Debug, Clone, PartialEq)]
pub struct PieProgress {
    value: f64,
    size: ProgressSize,
    variant: ProgressVariant,
    color: String,
}

impl PieProgress {
    pub fn new(value: f64) -> Self {
        Self {
            value: clamp_percent(value),
            size: ProgressSize::default(),
            variant: ProgressVariant::default(),
            color: DEFAULT_COLOR.to_string(),
        }
    }

    pub fn size(mut self, size: ProgressSize) -> Self {
        self.size = size;
        self
    }

    pub fn variant(mut self, variant: ProgressVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Inner radius as a share of the outer radius.
    pub fn inner_radius_ratio(&self) -> f64 {
        match self.variant {
            ProgressVariant::Line => PIE_LINE_INNER_RATIO,
            ProgressVariant::Fill => 0.0,
        }
    }

    /// Value slice then remainder slice.
    pub fn slices(&self) -> [PieSlice; 2] {
        let total = PIE_START_ANGLE - PIE_END_ANGLE;
        let split = PIE_START_ANGLE - total * self.value / 100.0;
        [
            PieSlice {
                value: self.value,
                start_angle: PIE_START_ANGLE,
                end_angle: split,
            },
            PieSlice {
                value: 100.0 - self.value,
                start_angle: split,
                end_angle: PIE_END_ANGLE,
            },
        ]
    }

    pub fn to_svg(&self) -> String {
        let px = self.size.pixels();
        let center = px as f64 / 2.0;
        let outer = center;
        let inner = outer * self.inner_radius_ratio();
        let [value, rest] = self.slices();

        let mut svg = format!(
            r#"<svg width="{px}" height="{px}" xmlns="http://www.w3.org/2000/svg">"#
        );
        for (slice, fill) in [(value, self.color.as_str()), (rest, TRACK_COLOR)] {
            if let Some(d) = sector_path(center, outer, inner, &slice) {
                let _ = write!(svg, r#"<path d="{d}" fill="{fill}"/>"#);
            }
        }
        svg.push_str("</svg>");
        svg
    }
}

fn point(center: f64, radius: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees.to_radians();
    (center + radius * rad.cos(), center - radius * rad.sin())
}

/// SVG path of an annular sector. `None` for an empty slice.
fn sector_path(center: f64, outer: f64, inner: f64, slice: &PieSlice) -> Option<String> {
    let sweep = slice.sweep();
    if sweep <= f64::EPSILON {
        return None;
    }

    if sweep >= 360.0 - f64::EPSILON {
        let mut d = format!(
            "M {x:.2} {top:.2} A {outer:.2} {outer:.2} 0 1 1 {x:.2} {bottom:.2} A {outer:.2} {outer:.2} 0 1 1 {x:.2} {top:.2} Z",
            x = center,
            top = center - outer,
            bottom = center + outer,
        );
        if inner > 0.0 {
            let _ = write!(
                d,
                " M {x:.2} {top:.2} A {inner:.2} {inner:.2} 0 1 0 {x:.2} {bottom:.2} A {inner:.2} {inner:.2} 0 1 0 {x:.2} {top:.2} Z",
                x = center,
                top = center - inner,
                bottom = center + inner,
            );
        }
        return Some(d);
    }

    let large = if sweep > 180.0 { 1 } else { 0 };
    let (ox0, oy0) = point(center, outer, slice.start_angle);
    let (ox1, oy1) = point(center, outer, slice.end_angle);

    let d = if inner > 0.0 {
        let (ix1, iy1) = point(center, inner, slice.end_angle);
        let (ix0, iy0) = point(center, inner, slice.start_angle);
        format!(
            "M {ox0:.2} {oy0:.2} A {outer:.2} {outer:.2} 0 {large} 1 {ox1:.2} {oy1:.2} \
             L {ix1:.2} {iy1:.2} A {inner:.2} {inner:.2} 0 {large} 0 {ix0:.2} {iy0:.2} Z"
        )
    } else {
        format!(
            "M {center:.2} {center:.2} L {ox0:.2} {oy0:.2} \
             A {outer:.2} {outer:.2} 0 {large} 1 {ox1:.2} {oy1:.2} Z"
        )
    };
    Some(d)
}
