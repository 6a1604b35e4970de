use foamdraw_core::geometry::{Point2, Rect};
use foamdraw_core::model::{Block, Cavity, CavityShape, Layer, Span};

use crate::errors::EngineError;

/// 外形占可用视口的比例，其余留给尺寸标注。
pub const FILL_FACTOR: f64 = 0.82;
/// 分栏四周为尺寸线预留的边距。
pub const DIMENSION_GUTTER: f64 = 24.0;

/// 型腔深度的锚定方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CavityDepthAnchor {
    /// 自层顶面向下开挖。
    Top,
    /// 自层底面向上计算。
    Bottom,
}

/// 现行出图规范：型腔自顶面悬挂。
pub const DEPTH_ANCHOR_POLICY: CavityDepthAnchor = CavityDepthAnchor::Top;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Front,
    Top,
    Right,
}

impl ViewKind {
    /// 页面上从左到右的排列顺序。
    pub const ALL: [ViewKind; 3] = [ViewKind::Front, ViewKind::Top, ViewKind::Right];

    pub fn descriptor(self) -> ViewDescriptor {
        match self {
            ViewKind::Front => ViewDescriptor {
                horizontal: Axis::Length,
                vertical: Axis::Thickness,
                flip_y: false,
            },
            ViewKind::Top => ViewDescriptor {
                horizontal: Axis::Length,
                vertical: Axis::Width,
                flip_y: true,
            },
            ViewKind::Right => ViewDescriptor {
                horizontal: Axis::Width,
                vertical: Axis::Thickness,
                flip_y: false,
            },
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            ViewKind::Front => "FRONT VIEW (L\u{d7}H)",
            ViewKind::Top => "TOP VIEW (L\u{d7}W)",
            ViewKind::Right => "RIGHT VIEW (W\u{d7}H)",
        }
    }
}

/// 模型中的物理轴。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// 块体长度，沿归一化 `x`。
    Length,
    /// 块体宽度，沿归一化 `y`（自顶边向下）。
    Width,
    /// 当前层厚度。
    Thickness,
}

impl Axis {
    fn extent(self, block: &Block, layer: &Layer) -> f64 {
        match self {
            Axis::Length => block.length_in,
            Axis::Width => block.width_in,
            Axis::Thickness => layer.thickness_in,
        }
    }

    fn cavity_span(
        self,
        cavity: &Cavity,
        block: &Block,
        layer: &Layer,
        anchor: CavityDepthAnchor,
    ) -> Span {
        match self {
            Axis::Length => cavity.footprint(block).0,
            Axis::Width => cavity.footprint(block).1,
            Axis::Thickness => {
                let thickness = layer.thickness_in;
                let depth = cavity.effective_depth(thickness);
                match anchor {
                    CavityDepthAnchor::Top => Span::new(thickness - depth, thickness),
                    CavityDepthAnchor::Bottom => Span::new(0.0, depth),
                }
            }
        }
    }

    fn polygon_coord(self, cavity: &Cavity, block: &Block, point: Point2) -> Option<f64> {
        match self {
            Axis::Length => Some(cavity.x * block.length_in + point.x()),
            Axis::Width => Some(cavity.y * block.width_in + point.y()),
            Axis::Thickness => None,
        }
    }
}

/// 视图的声明式描述：水平/竖直各映射哪根物理轴，竖直方向是否需要翻转。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub horizontal: Axis,
    pub vertical: Axis,
    /// 竖直轴的模型坐标自顶边向下增长，需翻转到 Y 向上的页面坐标。
    pub flip_y: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectedShape {
    Rect(Rect),
    Circle { center: Point2, radius: f64 },
    Polygon(Vec<Point2>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCavity {
    /// 型腔在层内的序号。
    pub index: usize,
    pub shape: ProjectedShape,
    /// 页面坐标下的包围盒。
    pub extent: Rect,
    /// 水平方向的物理尺寸（英寸）。
    pub horizontal_in: f64,
    /// 竖直方向的物理尺寸（英寸），深度已截断。
    pub vertical_in: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedView {
    pub kind: ViewKind,
    pub column: Rect,
    pub viewport: Rect,
    pub scale: f64,
    pub origin: Point2,
    pub outline: Rect,
    pub horizontal_in: f64,
    pub vertical_in: f64,
    pub cavities: Vec<ProjectedCavity>,
}

impl ProjectedView {
    /// 视图在页面上的缩放比例。
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

struct Mapping {
    origin: Point2,
    scale: f64,
    vertical_extent: f64,
    flip_y: bool,
}

impl Mapping {
    #[inline]
    fn x(&self, h: f64) -> f64 {
        self.origin.x() + h * self.scale
    }

    #[inline]
    fn y(&self, v: f64) -> f64 {
        if self.flip_y {
            self.origin.y() + (self.vertical_extent - v) * self.scale
        } else {
            self.origin.y() + v * self.scale
        }
    }

    fn rect(&self, h: Span, v: Span) -> Rect {
        let (y0, y1) = (self.y(v.start), self.y(v.end));
        Rect::new(
            Point2::new(self.x(h.start), y0.min(y1)),
            Point2::new(self.x(h.end), y0.max(y1)),
        )
    }
}

/// 将单层模型投影到给定分栏：计算统一比例与居中原点，并生成外形与各型腔的页面几何。
///
/// 比例与原点在每个视图、每一页上独立计算。
pub fn project_view(
    block: &Block,
    layer: &Layer,
    kind: ViewKind,
    column: Rect,
    anchor: CavityDepthAnchor,
) -> Result<ProjectedView, EngineError> {
    let descriptor = kind.descriptor();
    let dim1 = descriptor.horizontal.extent(block, layer);
    let dim2 = descriptor.vertical.extent(block, layer);
    let viewport = column.inset(DIMENSION_GUTTER);

    let scale = (viewport.width() / dim1).min(viewport.height() / dim2) * FILL_FACTOR;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(EngineError::DegenerateView {
            layer: layer.id.clone(),
            view: kind,
        });
    }

    let origin = Point2::new(
        viewport.min_x() + (viewport.width() - dim1 * scale) * 0.5,
        viewport.min_y() + (viewport.height() - dim2 * scale) * 0.5,
    );
    let mapping = Mapping {
        origin,
        scale,
        vertical_extent: dim2,
        flip_y: descriptor.flip_y,
    };
    let outline = mapping.rect(Span::new(0.0, dim1), Span::new(0.0, dim2));

    let cavities = layer
        .cavities
        .iter()
        .enumerate()
        .map(|(index, cavity)| {
            let h = descriptor.horizontal.cavity_span(cavity, block, layer, anchor);
            let v = descriptor.vertical.cavity_span(cavity, block, layer, anchor);
            let extent = mapping.rect(h, v);
            let shape = project_shape(&descriptor, &mapping, cavity, block, extent);
            ProjectedCavity {
                index,
                shape,
                extent,
                horizontal_in: h.len(),
                vertical_in: v.len(),
            }
        })
        .collect();

    Ok(ProjectedView {
        kind,
        column,
        viewport,
        scale,
        origin,
        outline,
        horizontal_in: dim1,
        vertical_in: dim2,
        cavities,
    })
}

fn project_shape(
    descriptor: &ViewDescriptor,
    mapping: &Mapping,
    cavity: &Cavity,
    block: &Block,
    extent: Rect,
) -> ProjectedShape {
    // 剖切方向（含厚度轴）只呈现矩形轮廓
    if descriptor.vertical == Axis::Thickness || descriptor.horizontal == Axis::Thickness {
        return ProjectedShape::Rect(extent);
    }
    if let Some(points) = cavity.polygon() {
        let mapped: Option<Vec<Point2>> = points
            .iter()
            .map(|point| {
                let h = descriptor.horizontal.polygon_coord(cavity, block, *point)?;
                let v = descriptor.vertical.polygon_coord(cavity, block, *point)?;
                Some(Point2::new(mapping.x(h), mapping.y(v)))
            })
            .collect();
        if let Some(mapped) = mapped {
            return ProjectedShape::Polygon(mapped);
        }
    }
    match cavity.shape {
        CavityShape::Circle => ProjectedShape::Circle {
            center: extent.center(),
            radius: cavity.diameter() * 0.5 * mapping.scale,
        },
        CavityShape::Rect | CavityShape::Poly => ProjectedShape::Rect(extent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn column() -> Rect {
        Rect::from_origin_size(40.0, 100.0, 300.0, 200.0)
    }

    fn plain_layer(thickness: f64) -> Layer {
        Layer::new("L1", "Base", thickness, "PE 2.2")
    }

    #[test]
    fn front_scale_matches_fill_formula() {
        let block = Block::new(12.0, 10.0, 3.0);
        let layer = plain_layer(3.0);
        let view = project_view(&block, &layer, ViewKind::Front, column(), DEPTH_ANCHOR_POLICY)
            .expect("project front view");

        let avail_w = 300.0 - 2.0 * DIMENSION_GUTTER;
        let avail_h = 200.0 - 2.0 * DIMENSION_GUTTER;
        let expected = (avail_w / 12.0).min(avail_h / 3.0) * FILL_FACTOR;
        assert!((view.scale() - expected).abs() < TOL);
        assert!((view.outline.width() - 12.0 * expected).abs() < TOL);
        assert!((view.outline.height() - 3.0 * expected).abs() < TOL);
    }

    #[test]
    fn outline_is_centered_in_viewport() {
        let block = Block::new(12.0, 10.0, 3.0);
        let layer = plain_layer(3.0);
        let view = project_view(&block, &layer, ViewKind::Top, column(), DEPTH_ANCHOR_POLICY)
            .expect("project top view");
        let outline_center = view.outline.center();
        let viewport_center = view.viewport.center();
        assert!((outline_center.x() - viewport_center.x()).abs() < TOL);
        assert!((outline_center.y() - viewport_center.y()).abs() < TOL);
        assert!(view.column.contains_rect(&view.outline, TOL));
    }

    #[test]
    fn front_and_top_scales_are_independent() {
        let block = Block::new(12.0, 10.0, 3.0);
        let layer = plain_layer(3.0);
        let front = project_view(&block, &layer, ViewKind::Front, column(), DEPTH_ANCHOR_POLICY)
            .expect("front");
        let top = project_view(&block, &layer, ViewKind::Top, column(), DEPTH_ANCHOR_POLICY)
            .expect("top");

        let avail_w: f64 = 252.0;
        let avail_h: f64 = 152.0;
        assert!((front.scale() - (avail_w / 12.0).min(avail_h / 3.0) * FILL_FACTOR).abs() < TOL);
        assert!((top.scale() - (avail_w / 12.0).min(avail_h / 10.0) * FILL_FACTOR).abs() < TOL);
        assert!((front.scale() - top.scale()).abs() > 1e-6);
    }

    #[test]
    fn deep_cavity_is_clamped_and_hangs_from_top_face() {
        let block = Block::new(12.0, 10.0, 2.0);
        let layer = plain_layer(2.0).with_cavity(Cavity::rect("c1", 0.25, 0.1, 3.0, 2.0, 5.0));

        for kind in [ViewKind::Front, ViewKind::Right] {
            let view = project_view(&block, &layer, kind, column(), DEPTH_ANCHOR_POLICY)
                .expect("project view");
            let cavity = &view.cavities[0];
            assert!((cavity.extent.height() - 2.0 * view.scale()).abs() < TOL);
            assert!((cavity.extent.max_y() - view.outline.max_y()).abs() < TOL);
            assert!((cavity.vertical_in - 2.0).abs() < TOL);
        }
    }

    #[test]
    fn shallow_cavity_top_edge_matches_layer_top() {
        let block = Block::new(12.0, 10.0, 2.0);
        let layer = plain_layer(2.0).with_cavity(Cavity::rect("c1", 0.5, 0.5, 2.0, 2.0, 0.5));
        let view = project_view(&block, &layer, ViewKind::Front, column(), DEPTH_ANCHOR_POLICY)
            .expect("front");
        let cavity = &view.cavities[0];
        assert!((cavity.extent.max_y() - view.outline.max_y()).abs() < TOL);
        assert!((cavity.extent.height() - 0.5 * view.scale()).abs() < TOL);
        assert!((cavity.extent.min_x() - (view.origin.x() + 6.0 * view.scale())).abs() < TOL);
    }

    #[test]
    fn bottom_anchor_policy_rests_cavity_on_bottom_face() {
        let block = Block::new(12.0, 10.0, 2.0);
        let layer = plain_layer(2.0).with_cavity(Cavity::rect("c1", 0.5, 0.5, 2.0, 2.0, 0.5));
        let view = project_view(
            &block,
            &layer,
            ViewKind::Front,
            column(),
            CavityDepthAnchor::Bottom,
        )
        .expect("front");
        let cavity = &view.cavities[0];
        assert!((cavity.extent.min_y() - view.outline.min_y()).abs() < TOL);
    }

    #[test]
    fn top_view_flips_normalized_y_once() {
        let block = Block::new(10.0, 10.0, 1.0);
        let layer = plain_layer(1.0).with_cavity(Cavity::rect("near-top", 0.0, 0.0, 2.0, 2.0, 0.5));
        let view = project_view(&block, &layer, ViewKind::Top, column(), DEPTH_ANCHOR_POLICY)
            .expect("top");
        let cavity = &view.cavities[0];
        // 归一化 y = 0 位于占地面顶边，页面上对应外形的上边缘
        assert!((cavity.extent.max_y() - view.outline.max_y()).abs() < TOL);
        assert!((cavity.extent.min_x() - view.outline.min_x()).abs() < TOL);
    }

    #[test]
    fn right_view_places_cavity_by_y() {
        let block = Block::new(10.0, 8.0, 1.0);
        let layer = plain_layer(1.0).with_cavity(Cavity::rect("c1", 0.0, 0.5, 2.0, 2.0, 0.5));
        let view = project_view(&block, &layer, ViewKind::Right, column(), DEPTH_ANCHOR_POLICY)
            .expect("right");
        let cavity = &view.cavities[0];
        assert!((cavity.extent.min_x() - (view.origin.x() + 4.0 * view.scale())).abs() < TOL);
        assert!((cavity.horizontal_in - 2.0).abs() < TOL);
    }

    #[test]
    fn circle_uses_default_diameter_in_top_view() {
        let block = Block::new(12.0, 10.0, 2.0);
        let layer =
            plain_layer(2.0).with_cavity(Cavity::circle("c1", 0.2, 0.2, 4.0, 6.0, 1.0, None));
        let view = project_view(&block, &layer, ViewKind::Top, column(), DEPTH_ANCHOR_POLICY)
            .expect("top");
        let cavity = &view.cavities[0];
        match &cavity.shape {
            ProjectedShape::Circle { radius, center } => {
                assert!((radius - 2.0 * view.scale()).abs() < TOL);
                let expected_x = view.origin.x() + (0.2 * 12.0 + 2.0) * view.scale();
                let expected_y = view.origin.y() + (10.0 - (0.2 * 10.0 + 3.0)) * view.scale();
                assert!((center.x() - expected_x).abs() < TOL);
                assert!((center.y() - expected_y).abs() < TOL);
            }
            other => panic!("expected circle, got {other:?}"),
        }
        assert!((cavity.horizontal_in - 4.0).abs() < TOL);
    }

    #[test]
    fn polygon_cavity_projects_vertices_in_top_view() {
        let block = Block::new(10.0, 10.0, 1.0);
        let mut cavity = Cavity::rect("p1", 0.1, 0.1, 1.0, 1.0, 0.5);
        cavity.shape = CavityShape::Poly;
        cavity.points = Some(vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 2.0),
        ]);
        let layer = plain_layer(1.0).with_cavity(cavity);

        let top = project_view(&block, &layer, ViewKind::Top, column(), DEPTH_ANCHOR_POLICY)
            .expect("top");
        match &top.cavities[0].shape {
            ProjectedShape::Polygon(points) => assert_eq!(points.len(), 3),
            other => panic!("expected polygon, got {other:?}"),
        }

        let front = project_view(&block, &layer, ViewKind::Front, column(), DEPTH_ANCHOR_POLICY)
            .expect("front");
        assert!(matches!(front.cavities[0].shape, ProjectedShape::Rect(_)));
        assert!((front.cavities[0].horizontal_in - 3.0).abs() < TOL);
    }

    #[test]
    fn zero_sized_column_is_rejected() {
        let block = Block::new(12.0, 10.0, 2.0);
        let layer = plain_layer(2.0);
        let tiny = Rect::from_origin_size(0.0, 0.0, 40.0, 40.0);
        let err = project_view(&block, &layer, ViewKind::Front, tiny, DEPTH_ANCHOR_POLICY)
            .unwrap_err();
        assert!(matches!(err, EngineError::DegenerateView { view: ViewKind::Front, .. }));
    }
}
