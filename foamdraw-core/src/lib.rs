pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。页面坐标统一为左下角原点、Y 轴向上。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    /// 轴对齐矩形，既用于页面分栏，也用于投影后的外形与包围盒。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Rect {
        min: Point2,
        max: Point2,
    }

    impl Rect {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
            Self {
                min: Point2::new(x, y),
                max: Point2::new(x + width, y + height),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn min_x(&self) -> f64 {
            self.min.x()
        }

        #[inline]
        pub fn min_y(&self) -> f64 {
            self.min.y()
        }

        #[inline]
        pub fn max_x(&self) -> f64 {
            self.max.x()
        }

        #[inline]
        pub fn max_y(&self) -> f64 {
            self.max.y()
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            Point2::from_vec((self.min.as_vec2() + self.max.as_vec2()) * 0.5)
        }

        /// 四边各向内收缩 `amount`；收缩过度时退化为中心处的零尺寸矩形。
        pub fn inset(&self, amount: f64) -> Self {
            let half_w = (self.width() * 0.5).min(amount);
            let half_h = (self.height() * 0.5).min(amount);
            Self {
                min: Point2::new(self.min.x() + half_w, self.min.y() + half_h),
                max: Point2::new(self.max.x() - half_w, self.max.y() - half_h),
            }
        }

        /// 判断 `other` 是否完全落在当前矩形内，允许 `tolerance` 的浮点误差。
        pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
            other.min_x() >= self.min_x() - tolerance
                && other.min_y() >= self.min_y() - tolerance
                && other.max_x() <= self.max_x() + tolerance
                && other.max_y() <= self.max_y() + tolerance
        }

        /// 两矩形内部是否重叠；仅边界相接不算重叠。
        pub fn intersects(&self, other: &Rect) -> bool {
            self.min_x() < other.max_x()
                && other.min_x() < self.max_x()
                && self.min_y() < other.max_y()
                && other.min_y() < self.max_y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point2::from_vec(self.min.as_vec2().min(point.as_vec2()));
            self.max = Point2::from_vec(self.max.as_vec2().max(point.as_vec2()));
        }

        pub fn include_rect(&mut self, other: &Rect) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }
    }
}

pub mod model {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// 修订号缺省值。
    pub const DEFAULT_REVISION: &str = "AS";

    /// 一维区间，单位为英寸。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Span {
        pub start: f64,
        pub end: f64,
    }

    impl Span {
        #[inline]
        pub fn new(start: f64, end: f64) -> Self {
            Self { start, end }
        }

        #[inline]
        pub fn len(self) -> f64 {
            self.end - self.start
        }
    }

    /// 整个泡棉叠层的外包络尺寸（英寸）。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Block {
        pub length_in: f64,
        pub width_in: f64,
        pub height_in: f64,
    }

    impl Block {
        #[inline]
        pub fn new(length_in: f64, width_in: f64, height_in: f64) -> Self {
            Self {
                length_in,
                width_in,
                height_in,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CavityShape {
        #[serde(alias = "rectangle")]
        Rect,
        Circle,
        #[serde(alias = "polygon")]
        Poly,
    }

    impl CavityShape {
        /// 明细表中显示的形状名。
        pub fn schedule_name(self) -> &'static str {
            match self {
                CavityShape::Rect => "RECT",
                CavityShape::Circle => "CIRCLE",
                CavityShape::Poly => "POLY",
            }
        }
    }

    /// 切入单层泡棉的型腔。`x`/`y` 为相对块体占地面的归一化位置，
    /// 原点在左上角，`y` 向下增长。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Cavity {
        pub id: String,
        pub shape: CavityShape,
        pub x: f64,
        pub y: f64,
        pub length_in: f64,
        pub width_in: f64,
        pub depth_in: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub diameter_in: Option<f64>,
        /// 多边形顶点，单位英寸，相对型腔锚点 `(x * L, y * W)`，`y` 向下。
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub points: Option<Vec<Point2>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
    }

    impl Cavity {
        pub fn rect(
            id: impl Into<String>,
            x: f64,
            y: f64,
            length: f64,
            width: f64,
            depth: f64,
        ) -> Self {
            Self {
                id: id.into(),
                shape: CavityShape::Rect,
                x,
                y,
                length_in: length,
                width_in: width,
                depth_in: depth,
                diameter_in: None,
                points: None,
                label: None,
            }
        }

        pub fn circle(
            id: impl Into<String>,
            x: f64,
            y: f64,
            length: f64,
            width: f64,
            depth: f64,
            diameter: Option<f64>,
        ) -> Self {
            Self {
                shape: CavityShape::Circle,
                diameter_in: diameter,
                ..Self::rect(id, x, y, length, width, depth)
            }
        }

        /// 圆形型腔的直径，缺省取 `min(lengthIn, widthIn)`。
        #[inline]
        pub fn diameter(&self) -> f64 {
            self.diameter_in
                .unwrap_or_else(|| self.length_in.min(self.width_in))
        }

        /// 渲染时使用的深度，超过层厚时截断为层厚。
        #[inline]
        pub fn effective_depth(&self, thickness_in: f64) -> f64 {
            self.depth_in.min(thickness_in).max(0.0)
        }

        /// 可作为多边形绘制的顶点；不足三个点时返回 `None`，按矩形退化处理。
        pub fn polygon(&self) -> Option<&[Point2]> {
            match (self.shape, self.points.as_deref()) {
                (CavityShape::Poly, Some(points)) if points.len() >= 3 => Some(points),
                _ => None,
            }
        }

        /// 型腔在块体占地面上的范围：(沿长度方向, 沿宽度方向自顶边向下)。
        pub fn footprint(&self, block: &Block) -> (Span, Span) {
            let anchor_x = self.x * block.length_in;
            let anchor_y = self.y * block.width_in;
            if let Some(points) = self.polygon() {
                let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
                let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
                for point in points {
                    min_x = min_x.min(point.x());
                    max_x = max_x.max(point.x());
                    min_y = min_y.min(point.y());
                    max_y = max_y.max(point.y());
                }
                return (
                    Span::new(anchor_x + min_x, anchor_x + max_x),
                    Span::new(anchor_y + min_y, anchor_y + max_y),
                );
            }
            match self.shape {
                CavityShape::Circle => {
                    let radius = self.diameter() * 0.5;
                    let cx = anchor_x + self.length_in * 0.5;
                    let cy = anchor_y + self.width_in * 0.5;
                    (
                        Span::new(cx - radius, cx + radius),
                        Span::new(cy - radius, cy + radius),
                    )
                }
                CavityShape::Rect | CavityShape::Poly => (
                    Span::new(anchor_x, anchor_x + self.length_in),
                    Span::new(anchor_y, anchor_y + self.width_in),
                ),
            }
        }
    }

    /// 单层泡棉。列表下标 0 为底层，之后依次向上叠放。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Layer {
        pub id: String,
        pub label: String,
        pub thickness_in: f64,
        pub material_name: String,
        #[serde(default)]
        pub cavities: Vec<Cavity>,
    }

    impl Layer {
        pub fn new(
            id: impl Into<String>,
            label: impl Into<String>,
            thickness_in: f64,
            material_name: impl Into<String>,
        ) -> Self {
            Self {
                id: id.into(),
                label: label.into(),
                thickness_in,
                material_name: material_name.into(),
                cavities: Vec::new(),
            }
        }

        pub fn with_cavity(mut self, cavity: Cavity) -> Self {
            self.cavities.push(cavity);
            self
        }
    }

    fn default_revision() -> String {
        DEFAULT_REVISION.to_string()
    }

    /// 出图引擎的顶层只读输入。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DrawingInput {
        pub quote_no: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub customer_name: Option<String>,
        pub block: Block,
        pub layers: Vec<Layer>,
        #[serde(default = "default_revision")]
        pub revision: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub date: Option<String>,
        #[serde(default)]
        pub notes: Vec<String>,
    }

    impl DrawingInput {
        pub fn new(quote_no: impl Into<String>, block: Block, layers: Vec<Layer>) -> Self {
            Self {
                quote_no: quote_no.into(),
                customer_name: None,
                block,
                layers,
                revision: default_revision(),
                date: None,
                notes: Vec::new(),
            }
        }

        /// 各层厚度之和。
        pub fn stack_height(&self) -> f64 {
            self.layers.iter().map(|layer| layer.thickness_in).sum()
        }
    }
}

pub mod sheet {
    use crate::geometry::{Point2, Rect};

    /// 页面尺寸：11×8.5 英寸横向，单位为 1/72 英寸。
    pub const PAGE_WIDTH: f64 = 792.0;
    pub const PAGE_HEIGHT: f64 = 612.0;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Rgb {
        pub r: f64,
        pub g: f64,
        pub b: f64,
    }

    impl Rgb {
        pub const BLACK: Rgb = Rgb::gray(0.0);
        pub const WHITE: Rgb = Rgb::gray(1.0);
        pub const INK: Rgb = Rgb::gray(0.16);
        pub const MUTED: Rgb = Rgb::gray(0.45);
        pub const SHADE: Rgb = Rgb::gray(0.88);

        #[inline]
        pub const fn gray(level: f64) -> Self {
            Self {
                r: level,
                g: level,
                b: level,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct StrokeStyle {
        pub width: f64,
        pub color: Rgb,
    }

    impl StrokeStyle {
        pub const OUTLINE: StrokeStyle = StrokeStyle {
            width: 1.0,
            color: Rgb::BLACK,
        };
        pub const THIN: StrokeStyle = StrokeStyle {
            width: 0.5,
            color: Rgb::BLACK,
        };
        pub const DIMENSION: StrokeStyle = StrokeStyle {
            width: 0.4,
            color: Rgb::INK,
        };
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FontFace {
        Regular,
        Bold,
    }

    /// 页面上的一条绘图指令。文字的 `origin` 为左侧基线点，对齐已在排版阶段完成。
    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawOp {
        Line {
            start: Point2,
            end: Point2,
            stroke: StrokeStyle,
        },
        Rect {
            rect: Rect,
            stroke: Option<StrokeStyle>,
            fill: Option<Rgb>,
        },
        Circle {
            center: Point2,
            radius: f64,
            stroke: Option<StrokeStyle>,
            fill: Option<Rgb>,
        },
        Polygon {
            points: Vec<Point2>,
            stroke: Option<StrokeStyle>,
            fill: Option<Rgb>,
        },
        Text {
            origin: Point2,
            content: String,
            size: f64,
            font: FontFace,
            color: Rgb,
        },
    }

    impl DrawOp {
        /// 指令在页面上占据的范围，文字按度量宽度与字号估算。
        pub fn bounds(&self) -> Rect {
            let mut bounds = Rect::empty();
            match self {
                DrawOp::Line { start, end, .. } => {
                    bounds.include_point(*start);
                    bounds.include_point(*end);
                }
                DrawOp::Rect { rect, .. } => bounds.include_rect(rect),
                DrawOp::Circle { center, radius, .. } => {
                    bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                    bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
                }
                DrawOp::Polygon { points, .. } => {
                    for point in points {
                        bounds.include_point(*point);
                    }
                }
                DrawOp::Text {
                    origin,
                    content,
                    size,
                    font,
                    ..
                } => {
                    bounds.include_point(*origin);
                    bounds.include_point(Point2::new(
                        origin.x() + text_width(content, *size, *font),
                        origin.y() + size,
                    ));
                }
            }
            bounds
        }

        #[inline]
        pub fn text(&self) -> Option<&str> {
            match self {
                DrawOp::Text { content, .. } => Some(content),
                _ => None,
            }
        }
    }

    /// 单页图纸。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Sheet {
        pub width: f64,
        pub height: f64,
        pub ops: Vec<DrawOp>,
    }

    impl Sheet {
        pub fn new() -> Self {
            Self {
                width: PAGE_WIDTH,
                height: PAGE_HEIGHT,
                ops: Vec::new(),
            }
        }

        #[inline]
        pub fn push(&mut self, op: DrawOp) {
            self.ops.push(op);
        }

        #[inline]
        pub fn extend(&mut self, ops: impl IntoIterator<Item = DrawOp>) {
            self.ops.extend(ops);
        }

        #[inline]
        pub fn page_rect(&self) -> Rect {
            Rect::from_origin_size(0.0, 0.0, self.width, self.height)
        }

        /// 依绘制顺序返回页面上的所有文字。
        pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
            self.ops.iter().filter_map(DrawOp::text)
        }
    }

    impl Default for Sheet {
        fn default() -> Self {
            Self::new()
        }
    }

    /// 多页图纸文档，页序与层序一致。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Drawing {
        pub title: String,
        pub sheets: Vec<Sheet>,
    }

    impl Drawing {
        #[inline]
        pub fn page_count(&self) -> usize {
            self.sheets.len()
        }
    }

    // Helvetica / Helvetica-Bold 的 AFM 字宽（1/1000 em），覆盖 ASCII 32..=126。
    #[rustfmt::skip]
    const HELVETICA_WIDTHS: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
        1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
        333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
        556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ];

    #[rustfmt::skip]
    const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
        975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
        333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
        611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ];

    const FALLBACK_WIDTH: u16 = 556;

    /// 以基础 14 字体的字宽估算文字宽度（页面单位）。
    pub fn text_width(text: &str, size: f64, font: FontFace) -> f64 {
        let table = match font {
            FontFace::Regular => &HELVETICA_WIDTHS,
            FontFace::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        let units: u32 = text
            .chars()
            .map(|ch| {
                let code = ch as u32;
                if (32..=126).contains(&code) {
                    u32::from(table[(code - 32) as usize])
                } else {
                    u32::from(FALLBACK_WIDTH)
                }
            })
            .sum();
        f64::from(units) * size / 1000.0
    }
}
