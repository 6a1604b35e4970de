use foamdraw_core::geometry::{Point2, Rect};
use foamdraw_core::model::{Block, Layer};
use foamdraw_core::sheet::{DrawOp, FontFace, Rgb, StrokeStyle};
use tracing::debug;

use crate::dimension::format_inches;
use crate::typeset::{fit_text, text};

pub const LINE_HEIGHT: f64 = 9.0;
pub const TEXT_SIZE: f64 = 6.5;
pub const PANEL_TOP_PADDING: f64 = 6.0;
pub const PANEL_BOTTOM_PADDING: f64 = 4.0;
const COLUMN_PADDING: f64 = 8.0;
/// 通用说明栏占面板宽度的比例。
const NOTES_COLUMN_SHARE: f64 = 0.45;
/// 基线距行框底部的高度。
const BASELINE_LIFT: f64 = 2.0;

/// 明细表之前固定占用的行数：层标题、厚度/材料、块体/型腔数、表头。
pub const SCHEDULE_PREAMBLE_LINES: usize = 4;

/// 明细表各列相对右栏左缘的偏移。
const SCHEDULE_COLUMNS: [(&str, f64); 5] = [
    ("#", 0.0),
    ("L", 22.0),
    ("W", 70.0),
    ("D", 118.0),
    ("SHAPE", 166.0),
];

/// 未提供说明时使用的通用技术要求。
pub const DEFAULT_NOTES: [&str; 5] = [
    "ALL DIMENSIONS ARE IN INCHES.",
    "TOLERANCE +/- 0.06\" UNLESS OTHERWISE NOTED.",
    "CAVITY DEPTHS ARE MEASURED FROM THE TOP FACE OF THE LAYER.",
    "LAYER 1 IS THE BASE LAYER; LAYERS STACK UPWARD IN SHEET ORDER.",
    "VIEWS ARE SCALED INDEPENDENTLY TO FIT (NTS).",
];

/// 面板内的竖向游标：记录下一行的上沿与可用下限。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelCursor {
    top: f64,
    floor: f64,
}

impl PanelCursor {
    pub fn new(area: Rect) -> Self {
        Self {
            top: area.max_y() - PANEL_TOP_PADDING,
            floor: area.min_y() + PANEL_BOTTOM_PADDING,
        }
    }

    #[inline]
    pub fn remaining(&self) -> f64 {
        self.top - self.floor
    }

    /// 面板唯一的溢出检查：剩余高度容得下一行时返回该行基线和推进后的游标。
    pub fn next_line(self, line_height: f64) -> Option<(f64, PanelCursor)> {
        let bottom = self.top - line_height;
        if bottom < self.floor - 1e-9 {
            return None;
        }
        Some((
            bottom + BASELINE_LIFT,
            PanelCursor {
                top: bottom,
                floor: self.floor,
            },
        ))
    }
}

/// 面板的一行：若干 (x, 文字) 单元格共用同一基线与字体。
struct Row {
    cells: Vec<(f64, String)>,
    font: FontFace,
}

impl Row {
    fn single(x: f64, content: String, font: FontFace) -> Self {
        Self {
            cells: vec![(x, content)],
            font,
        }
    }
}

fn draw_rows(
    mut cursor: PanelCursor,
    rows: impl IntoIterator<Item = Row>,
    ops: &mut Vec<DrawOp>,
) -> (PanelCursor, usize) {
    let mut drawn = 0;
    for row in rows {
        let Some((baseline, next)) = cursor.next_line(LINE_HEIGHT) else {
            break;
        };
        for (x, content) in row.cells {
            ops.push(text(x, baseline, content, TEXT_SIZE, row.font, Rgb::BLACK));
        }
        cursor = next;
        drawn += 1;
    }
    (cursor, drawn)
}

/// 备注面板的输入。
#[derive(Debug, Clone, Copy)]
pub struct NotesPanel<'a> {
    pub block: &'a Block,
    pub layer: &'a Layer,
    pub layer_index: usize,
    pub layer_count: usize,
    pub notes: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelReport {
    pub notes_drawn: usize,
    pub rows_drawn: usize,
    pub rows_truncated: usize,
}

/// 绘制备注与型腔明细面板：左栏通用说明，右栏层信息与型腔明细表。
/// 超出面板下限的行静默截断。
pub fn render_notes_panel(area: Rect, panel: &NotesPanel<'_>) -> (Vec<DrawOp>, PanelReport) {
    let mut ops = Vec::new();
    let split_x = area.min_x() + area.width() * NOTES_COLUMN_SHARE;
    ops.push(DrawOp::Line {
        start: Point2::new(split_x, area.min_y()),
        end: Point2::new(split_x, area.max_y()),
        stroke: StrokeStyle::THIN,
    });

    let notes_area = Rect::new(area.min(), Point2::new(split_x, area.max_y()));
    let notes_drawn = render_notes(notes_area, panel.notes, &mut ops);

    let schedule_area = Rect::new(Point2::new(split_x, area.min_y()), area.max());
    let (rows_drawn, rows_total) = render_schedule(schedule_area, panel, &mut ops);

    let report = PanelReport {
        notes_drawn,
        rows_drawn,
        rows_truncated: rows_total - rows_drawn,
    };
    if report.rows_truncated > 0 {
        debug!(
            layer = %panel.layer.id,
            drawn = report.rows_drawn,
            truncated = report.rows_truncated,
            "型腔明细超出面板，已截断"
        );
    }
    (ops, report)
}

fn render_notes(area: Rect, notes: &[String], ops: &mut Vec<DrawOp>) -> usize {
    let x = area.min_x() + COLUMN_PADDING;
    let max_width = area.width() - 2.0 * COLUMN_PADDING;
    let cursor = PanelCursor::new(area);

    let heading = Row::single(x, "GENERAL NOTES".to_string(), FontFace::Bold);
    let (cursor, heading_drawn) = draw_rows(cursor, [heading], ops);
    if heading_drawn == 0 {
        return 0;
    }

    let rows = notes.iter().enumerate().map(|(index, note)| {
        let numbered = format!("{}. {}", index + 1, note.trim());
        Row::single(
            x,
            fit_text(&numbered, TEXT_SIZE, FontFace::Regular, max_width),
            FontFace::Regular,
        )
    });
    let (_, drawn) = draw_rows(cursor, rows, ops);
    drawn
}

fn render_schedule(area: Rect, panel: &NotesPanel<'_>, ops: &mut Vec<DrawOp>) -> (usize, usize) {
    let x = area.min_x() + COLUMN_PADDING;
    let max_width = area.width() - 2.0 * COLUMN_PADDING;
    let layer = panel.layer;
    let block = panel.block;

    let preamble = [
        Row::single(
            x,
            fit_text(
                &format!(
                    "LAYER {} OF {}: {}",
                    panel.layer_index + 1,
                    panel.layer_count,
                    layer.label
                ),
                TEXT_SIZE,
                FontFace::Bold,
                max_width,
            ),
            FontFace::Bold,
        ),
        Row::single(
            x,
            fit_text(
                &format!(
                    "THICKNESS {}   MATERIAL {}",
                    format_inches(layer.thickness_in),
                    layer.material_name
                ),
                TEXT_SIZE,
                FontFace::Regular,
                max_width,
            ),
            FontFace::Regular,
        ),
        Row::single(
            x,
            format!(
                "BLOCK {} x {} x {}   CAVITIES {}",
                format_inches(block.length_in),
                format_inches(block.width_in),
                format_inches(block.height_in),
                layer.cavities.len()
            ),
            FontFace::Regular,
        ),
        Row {
            cells: SCHEDULE_COLUMNS
                .iter()
                .map(|(name, offset)| (x + offset, (*name).to_string()))
                .collect(),
            font: FontFace::Bold,
        },
    ];
    let (cursor, _) = draw_rows(PanelCursor::new(area), preamble, ops);

    let rows = layer.cavities.iter().enumerate().map(|(index, cavity)| {
        let (along_length, along_width) = cavity.footprint(block);
        let values = [
            format!("{}", index + 1),
            format_inches(along_length.len()),
            format_inches(along_width.len()),
            format_inches(cavity.effective_depth(layer.thickness_in)),
            cavity.shape.schedule_name().to_string(),
        ];
        Row {
            cells: SCHEDULE_COLUMNS
                .iter()
                .zip(values)
                .map(|((_, offset), value)| (x + offset, value))
                .collect(),
            font: FontFace::Regular,
        }
    });
    let (cursor, drawn) = draw_rows(cursor, rows, ops);

    if layer.cavities.is_empty() {
        let placeholder = Row::single(x, "NO CAVITIES".to_string(), FontFace::Regular);
        draw_rows(cursor, [placeholder], ops);
    }
    (drawn, layer.cavities.len())
}
