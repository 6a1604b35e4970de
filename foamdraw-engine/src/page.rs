use foamdraw_core::geometry::{Point2, Rect};
use foamdraw_core::model::{DrawingInput, Layer};
use foamdraw_core::sheet::{
    DrawOp, FontFace, PAGE_HEIGHT, PAGE_WIDTH, Rgb, Sheet, StrokeStyle, text_width,
};
use tracing::debug;

use crate::dimension::Dimension;
use crate::errors::EngineError;
use crate::projection::{
    CavityDepthAnchor, ProjectedShape, ProjectedView, ViewKind, project_view,
};
use crate::schedule::{NotesPanel, PanelReport, render_notes_panel};
use crate::typeset::{centered, fit_text, text};

pub const PAGE_MARGIN: f64 = 24.0;
pub const TITLE_BLOCK_HEIGHT: f64 = 54.0;
pub const NOTES_PANEL_HEIGHT: f64 = 126.0;
pub const COLUMN_HEADER_HEIGHT: f64 = 18.0;
pub const VIEW_COLUMNS: usize = 3;

/// 整体尺寸线距外形的距离。
const OVERALL_DIMENSION_OFFSET: f64 = 12.0;
/// 型腔尺寸线距型腔边缘的距离。
const CAVITY_DIMENSION_OFFSET: f64 = 8.0;
/// 型腔标注文字与分栏边缘之间至少保留的距离。
const LABEL_COLUMN_MARGIN: f64 = 4.0;
const HEADER_TEXT_SIZE: f64 = 8.0;
const CAVITY_LABEL_SIZE: f64 = 5.5;
const TITLE_DARK_SHARE: f64 = 0.56;
const TITLE_FIELD_COUNT: usize = 4;

/// 页面固定网格。所有矩形均为左下角原点、Y 向上的页面坐标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGrid {
    pub frame: Rect,
    pub title_block: Rect,
    pub notes_panel: Rect,
    pub header_strip: Rect,
    pub columns: [Rect; VIEW_COLUMNS],
}

impl PageGrid {
    pub fn standard() -> Self {
        let frame = Rect::from_origin_size(
            PAGE_MARGIN,
            PAGE_MARGIN,
            PAGE_WIDTH - 2.0 * PAGE_MARGIN,
            PAGE_HEIGHT - 2.0 * PAGE_MARGIN,
        );
        let title_block =
            Rect::from_origin_size(frame.min_x(), frame.min_y(), frame.width(), TITLE_BLOCK_HEIGHT);
        let notes_panel = Rect::from_origin_size(
            frame.min_x(),
            title_block.max_y(),
            frame.width(),
            NOTES_PANEL_HEIGHT,
        );
        let header_strip = Rect::from_origin_size(
            frame.min_x(),
            frame.max_y() - COLUMN_HEADER_HEIGHT,
            frame.width(),
            COLUMN_HEADER_HEIGHT,
        );
        let column_width = frame.width() / VIEW_COLUMNS as f64;
        let views_bottom = notes_panel.max_y();
        let views_height = header_strip.min_y() - views_bottom;
        let columns = std::array::from_fn(|i| {
            Rect::from_origin_size(
                frame.min_x() + column_width * i as f64,
                views_bottom,
                column_width,
                views_height,
            )
        });
        Self {
            frame,
            title_block,
            notes_panel,
            header_strip,
            columns,
        }
    }
}

impl Default for PageGrid {
    fn default() -> Self {
        Self::standard()
    }
}

/// 单页排版所需的上下文。
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub input: &'a DrawingInput,
    pub layer_index: usize,
    pub notes: &'a [String],
    pub date: &'a str,
    pub title: &'a str,
}

/// 排版结果：页面本身以及投影、面板统计，便于调用方检查。
#[derive(Debug, Clone)]
pub struct ComposedPage {
    pub sheet: Sheet,
    pub views: Vec<ProjectedView>,
    pub panel: PanelReport,
}

#[derive(Debug, Clone)]
pub struct PageComposer {
    grid: PageGrid,
    depth_anchor: CavityDepthAnchor,
}

impl PageComposer {
    pub fn new(depth_anchor: CavityDepthAnchor) -> Self {
        Self {
            grid: PageGrid::standard(),
            depth_anchor,
        }
    }

    #[inline]
    pub fn grid(&self) -> &PageGrid {
        &self.grid
    }

    /// 为一层生成一页：三个视图、备注面板与标题栏。
    pub fn compose(&self, ctx: &PageContext<'_>) -> Result<ComposedPage, EngineError> {
        let input = ctx.input;
        let layer = input
            .layers
            .get(ctx.layer_index)
            .ok_or(EngineError::LayerOutOfRange {
                index: ctx.layer_index,
                count: input.layers.len(),
            })?;

        let mut sheet = Sheet::new();
        self.draw_frame(&mut sheet);

        let mut views = Vec::with_capacity(VIEW_COLUMNS);
        for (kind, column) in ViewKind::ALL.into_iter().zip(self.grid.columns) {
            let view = project_view(&input.block, layer, kind, column, self.depth_anchor)?;
            draw_view(&mut sheet, &view, layer);
            views.push(view);
        }

        let panel = NotesPanel {
            block: &input.block,
            layer,
            layer_index: ctx.layer_index,
            layer_count: input.layers.len(),
            notes: ctx.notes,
        };
        let (panel_ops, panel_report) = render_notes_panel(self.grid.notes_panel, &panel);
        sheet.extend(panel_ops);

        self.draw_title_block(&mut sheet, ctx, layer);

        debug!(
            layer = %layer.id,
            index = ctx.layer_index,
            ops = sheet.ops.len(),
            rows = panel_report.rows_drawn,
            "页面排版完成"
        );
        Ok(ComposedPage {
            sheet,
            views,
            panel: panel_report,
        })
    }

    fn draw_frame(&self, sheet: &mut Sheet) {
        let grid = &self.grid;
        sheet.push(DrawOp::Rect {
            rect: grid.frame,
            stroke: Some(StrokeStyle::OUTLINE),
            fill: None,
        });
        for y in [
            grid.header_strip.min_y(),
            grid.notes_panel.max_y(),
            grid.title_block.max_y(),
        ] {
            sheet.push(horizontal_rule(grid.frame.min_x(), grid.frame.max_x(), y));
        }
        for column in &grid.columns[1..] {
            sheet.push(DrawOp::Line {
                start: Point2::new(column.min_x(), column.min_y()),
                end: Point2::new(column.min_x(), grid.frame.max_y()),
                stroke: StrokeStyle::THIN,
            });
        }
        for (kind, column) in ViewKind::ALL.into_iter().zip(grid.columns) {
            let baseline =
                grid.header_strip.min_y() + (COLUMN_HEADER_HEIGHT - HEADER_TEXT_SIZE) * 0.5 + 1.0;
            sheet.push(centered(
                column.center().x(),
                baseline,
                kind.header(),
                HEADER_TEXT_SIZE,
                FontFace::Bold,
                Rgb::BLACK,
            ));
        }
    }

    fn draw_title_block(&self, sheet: &mut Sheet, ctx: &PageContext<'_>, layer: &Layer) {
        let area = self.grid.title_block;
        let input = ctx.input;
        let layer_count = input.layers.len();

        let dark = Rect::from_origin_size(
            area.min_x(),
            area.min_y(),
            area.width() * TITLE_DARK_SHARE,
            area.height(),
        );
        sheet.push(DrawOp::Rect {
            rect: dark,
            stroke: None,
            fill: Some(Rgb::INK),
        });

        let x = dark.min_x() + 10.0;
        let max_width = dark.width() - 20.0;
        let mut lines = vec![
            (fit_text(ctx.title, 11.0, FontFace::Bold, max_width), 11.0, FontFace::Bold),
            (
                fit_text(
                    &format!(
                        "QUOTE {}   LAYER {}: {}",
                        input.quote_no,
                        ctx.layer_index + 1,
                        layer.label
                    ),
                    8.0,
                    FontFace::Regular,
                    max_width,
                ),
                8.0,
                FontFace::Regular,
            ),
        ];
        let customer = input
            .customer_name
            .as_deref()
            .filter(|name| !name.trim().is_empty());
        if let Some(customer) = customer {
            lines.push((
                fit_text(&format!("CUSTOMER {customer}"), 8.0, FontFace::Regular, max_width),
                8.0,
                FontFace::Regular,
            ));
        }
        let mut baseline = dark.max_y() - 16.0;
        for (content, size, font) in lines {
            sheet.push(text(x, baseline, content, size, font, Rgb::WHITE));
            baseline -= 13.0;
        }

        let fields = [
            ("REVISION", input.revision.clone()),
            ("DATE", ctx.date.to_string()),
            ("SCALE", "NTS".to_string()),
            ("SHEET", format!("{} OF {}", ctx.layer_index + 1, layer_count)),
        ];
        let field_width = (area.max_x() - dark.max_x()) / TITLE_FIELD_COUNT as f64;
        for (i, (label, value)) in fields.into_iter().enumerate() {
            let cell = Rect::from_origin_size(
                dark.max_x() + field_width * i as f64,
                area.min_y(),
                field_width,
                area.height(),
            );
            sheet.push(DrawOp::Rect {
                rect: cell,
                stroke: Some(StrokeStyle::THIN),
                fill: None,
            });
            sheet.push(text(
                cell.min_x() + 5.0,
                cell.max_y() - 11.0,
                label,
                6.0,
                FontFace::Regular,
                Rgb::MUTED,
            ));
            sheet.push(centered(
                cell.center().x(),
                cell.min_y() + 14.0,
                fit_text(&value, 10.0, FontFace::Bold, cell.width() - 8.0),
                10.0,
                FontFace::Bold,
                Rgb::BLACK,
            ));
        }
    }
}

impl Default for PageComposer {
    fn default() -> Self {
        Self::new(crate::projection::DEPTH_ANCHOR_POLICY)
    }
}

fn horizontal_rule(x0: f64, x1: f64, y: f64) -> DrawOp {
    DrawOp::Line {
        start: Point2::new(x0, y),
        end: Point2::new(x1, y),
        stroke: StrokeStyle::THIN,
    }
}

fn draw_view(sheet: &mut Sheet, view: &ProjectedView, layer: &Layer) {
    sheet.push(DrawOp::Rect {
        rect: view.outline,
        stroke: Some(StrokeStyle::OUTLINE),
        fill: None,
    });

    for cavity in &view.cavities {
        let op = match &cavity.shape {
            ProjectedShape::Rect(rect) => DrawOp::Rect {
                rect: *rect,
                stroke: Some(StrokeStyle::THIN),
                fill: Some(Rgb::SHADE),
            },
            ProjectedShape::Circle { center, radius } => DrawOp::Circle {
                center: *center,
                radius: *radius,
                stroke: Some(StrokeStyle::THIN),
                fill: Some(Rgb::SHADE),
            },
            ProjectedShape::Polygon(points) => DrawOp::Polygon {
                points: points.clone(),
                stroke: Some(StrokeStyle::THIN),
                fill: Some(Rgb::SHADE),
            },
        };
        sheet.push(op);
    }

    let outline = view.outline;
    let mut labels = LabelPlacer::new(view.column.inset(LABEL_COLUMN_MARGIN));
    labels.place_fixed(
        sheet,
        Dimension::horizontal(
            outline.min_x(),
            outline.max_x(),
            outline.min_y(),
            outline.min_y() - OVERALL_DIMENSION_OFFSET,
            view.horizontal_in,
        ),
    );
    labels.place_fixed(
        sheet,
        Dimension::vertical(
            outline.min_y(),
            outline.max_y(),
            outline.min_x(),
            outline.min_x() - OVERALL_DIMENSION_OFFSET,
            view.vertical_in,
        ),
    );

    for cavity in &view.cavities {
        let extent = cavity.extent;
        // 先放下方，与整体尺寸或其他标注冲突时改放上方
        labels.place_first(
            sheet,
            [
                Dimension::horizontal(
                    extent.min_x(),
                    extent.max_x(),
                    extent.min_y(),
                    extent.min_y() - CAVITY_DIMENSION_OFFSET,
                    cavity.horizontal_in,
                ),
                Dimension::horizontal(
                    extent.min_x(),
                    extent.max_x(),
                    extent.max_y(),
                    extent.max_y() + CAVITY_DIMENSION_OFFSET,
                    cavity.horizontal_in,
                ),
            ],
        );
        // 圆形在俯视图中两向尺寸相同，只标一次
        if !matches!(cavity.shape, ProjectedShape::Circle { .. }) {
            labels.place_first(
                sheet,
                [
                    Dimension::vertical(
                        extent.min_y(),
                        extent.max_y(),
                        extent.max_x(),
                        extent.max_x() + CAVITY_DIMENSION_OFFSET,
                        cavity.vertical_in,
                    ),
                    Dimension::vertical(
                        extent.min_y(),
                        extent.max_y(),
                        extent.min_x(),
                        extent.min_x() - CAVITY_DIMENSION_OFFSET,
                        cavity.vertical_in,
                    ),
                ],
            );
        }

        if view.kind == ViewKind::Top {
            if let Some(label) = layer.cavities[cavity.index].label.as_deref() {
                if text_width(label, CAVITY_LABEL_SIZE, FontFace::Regular) <= extent.width() {
                    let center = extent.center();
                    let op = centered(
                        center.x(),
                        center.y() - CAVITY_LABEL_SIZE * 0.36,
                        label,
                        CAVITY_LABEL_SIZE,
                        FontFace::Regular,
                        Rgb::INK,
                    );
                    if labels.claim(op.bounds()) {
                        sheet.push(op);
                    }
                }
            }
        }
    }
}

/// 单个视图内已占用的文字区域。后放的标注不得压住先放的文字，也不得越出分栏边距。
struct LabelPlacer {
    bounds: Rect,
    placed: Vec<Rect>,
}

impl LabelPlacer {
    fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            placed: Vec::new(),
        }
    }

    fn is_free(&self, area: &Rect) -> bool {
        !self.placed.iter().any(|placed| placed.intersects(area))
    }

    /// 区域空闲则占用并返回 `true`。
    fn claim(&mut self, area: Rect) -> bool {
        if !self.is_free(&area) {
            return false;
        }
        self.placed.push(area);
        true
    }

    /// 整体尺寸总是绘制。
    fn place_fixed(&mut self, sheet: &mut Sheet, dimension: Dimension) {
        if let Some(patch) = dimension.label_patch() {
            self.placed.push(patch);
        }
        sheet.extend(dimension.render());
    }

    /// 依次尝试候选位置，放下第一个不冲突的；都放不下时整条省略。
    fn place_first<const N: usize>(&mut self, sheet: &mut Sheet, candidates: [Dimension; N]) {
        for dimension in candidates {
            let Some(patch) = dimension.label_patch() else {
                return;
            };
            if patch.min_x() < self.bounds.min_x() || !self.is_free(&patch) {
                continue;
            }
            let ops = dimension.render_within(self.bounds.max_x());
            if ops.is_empty() {
                continue;
            }
            self.placed.push(patch);
            sheet.extend(ops);
            return;
        }
    }
}
