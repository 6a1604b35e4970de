use std::f64::consts::FRAC_1_SQRT_2;

use foamdraw_core::geometry::{Point2, Rect};
use foamdraw_core::sheet::{DrawOp, FontFace, Rgb, StrokeStyle, text_width};

/// 小于该页面跨度的尺寸不标注。
pub const MIN_DIMENSION_SPAN: f64 = 6.0;
/// 尺寸界线越过尺寸线的长度。
pub const EXTENSION_OVERSHOOT: f64 = 3.0;
/// 箭头斜边长度（±45°）。
pub const ARROW_LEG: f64 = 3.5;
pub const LABEL_SIZE: f64 = 6.5;
/// 标注文字背景块在文字宽度之外的总留白。
pub const LABEL_PADDING: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionAxis {
    /// 测量 x 方向跨度，尺寸线水平。
    Horizontal,
    /// 测量 y 方向跨度，尺寸线竖直。
    Vertical,
}

/// 一条尺寸标注。`start`/`end` 为沿测量方向的两个页面坐标，
/// `edge` 为被测形状边缘在垂直方向上的坐标，`line` 为尺寸线所在坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub axis: DimensionAxis,
    pub start: f64,
    pub end: f64,
    pub edge: f64,
    pub line: f64,
    pub value_in: f64,
}

impl Dimension {
    pub fn horizontal(x1: f64, x2: f64, edge_y: f64, line_y: f64, value_in: f64) -> Self {
        Self {
            axis: DimensionAxis::Horizontal,
            start: x1,
            end: x2,
            edge: edge_y,
            line: line_y,
            value_in,
        }
    }

    pub fn vertical(y1: f64, y2: f64, edge_x: f64, line_x: f64, value_in: f64) -> Self {
        Self {
            axis: DimensionAxis::Vertical,
            start: y1,
            end: y2,
            edge: edge_x,
            line: line_x,
            value_in,
        }
    }

    #[inline]
    pub fn span(&self) -> f64 {
        (self.end - self.start).abs()
    }

    #[inline]
    pub fn is_legible(&self) -> bool {
        self.span() >= MIN_DIMENSION_SPAN
    }

    pub fn label(&self) -> String {
        format_inches(self.value_in)
    }

    /// 生成尺寸界线、尺寸线、箭头与文字；跨度不足时不生成任何指令。
    pub fn render(&self) -> Vec<DrawOp> {
        if !self.is_legible() {
            return Vec::new();
        }

        let lo = self.start.min(self.end);
        let hi = self.start.max(self.end);
        let outward = if self.line >= self.edge { 1.0 } else { -1.0 };
        let beyond = self.line + outward * EXTENSION_OVERSHOOT;

        let mut ops = Vec::with_capacity(9);
        for along in [lo, hi] {
            ops.push(self.segment(along, self.edge, along, beyond));
        }
        ops.push(self.segment(lo, self.line, hi, self.line));

        let leg = ARROW_LEG * FRAC_1_SQRT_2;
        for (tip, inward) in [(lo, 1.0), (hi, -1.0)] {
            for side in [1.0, -1.0] {
                ops.push(self.segment(tip, self.line, tip + inward * leg, self.line + side * leg));
            }
        }

        let text = self.label();
        let width = text_width(&text, LABEL_SIZE, FontFace::Regular);
        let center = self.point((lo + hi) * 0.5, self.line);
        ops.push(DrawOp::Rect {
            rect: label_patch(center, width),
            stroke: None,
            fill: Some(Rgb::WHITE),
        });
        ops.push(DrawOp::Text {
            origin: Point2::new(center.x() - width * 0.5, center.y() - LABEL_SIZE * 0.36),
            content: text,
            size: LABEL_SIZE,
            font: FontFace::Regular,
            color: Rgb::BLACK,
        });
        ops
    }

    /// 标注文字的白色背景块；跨度不足、不会绘制时为 `None`。
    pub fn label_patch(&self) -> Option<Rect> {
        if !self.is_legible() {
            return None;
        }
        let width = text_width(&self.label(), LABEL_SIZE, FontFace::Regular);
        let center = self.point((self.start + self.end) * 0.5, self.line);
        Some(label_patch(center, width))
    }

    /// 与 [`Dimension::render`] 相同，但尺寸线或文字背景块越过 `right_limit` 时整条放弃。
    pub fn render_within(&self, right_limit: f64) -> Vec<DrawOp> {
        let Some(patch) = self.label_patch() else {
            return Vec::new();
        };
        let reach = match self.axis {
            DimensionAxis::Vertical => patch.max_x(),
            DimensionAxis::Horizontal => patch.max_x().max(self.start.max(self.end)),
        };
        if reach > right_limit {
            return Vec::new();
        }
        self.render()
    }

    /// 将 (沿测量方向, 垂直方向) 坐标转换为页面点。
    fn point(&self, along: f64, across: f64) -> Point2 {
        match self.axis {
            DimensionAxis::Horizontal => Point2::new(along, across),
            DimensionAxis::Vertical => Point2::new(across, along),
        }
    }

    fn segment(&self, a0: f64, c0: f64, a1: f64, c1: f64) -> DrawOp {
        DrawOp::Line {
            start: self.point(a0, c0),
            end: self.point(a1, c1),
            stroke: StrokeStyle::DIMENSION,
        }
    }
}

fn label_patch(center: Point2, text_width: f64) -> Rect {
    let width = text_width + LABEL_PADDING;
    let height = LABEL_SIZE + 2.0;
    Rect::from_origin_size(
        center.x() - width * 0.5,
        center.y() - height * 0.5,
        width,
        height,
    )
}

/// 英寸数值统一保留两位小数并带英寸符号。
pub fn format_inches(value: f64) -> String {
    format!("{value:.2}\"")
}
