use std::fs;
use std::path::{Path, PathBuf};

use foamdraw_core::geometry::Point2;
use foamdraw_core::model::DrawingInput;
use foamdraw_core::sheet::{Drawing, DrawOp, FontFace, Rgb, Sheet, StrokeStyle};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use thiserror::Error;
use tracing::{debug, info};

pub const PRODUCER: &str = concat!("foamdraw ", env!("CARGO_PKG_VERSION"));

/// 三次贝塞尔逼近四分之一圆弧的控制点系数。
const KAPPA: f64 = 0.552_284_749_830_793_4;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to encode PDF: {0}")]
    Encode(#[source] lopdf::Error),
}

pub trait InputLoader {
    fn load(&self, path: &Path) -> Result<DrawingInput, IoError>;
}

pub trait DrawingSaver {
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError>;
}

/// 读取布局 JSON（camelCase 字段）。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFacade;

impl JsonFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, data: &str) -> Result<DrawingInput, IoError> {
        Ok(serde_json::from_str(data)?)
    }
}

impl InputLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<DrawingInput, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let input = self.parse(&data)?;
        info!(
            path = %path.display(),
            quote = %input.quote_no,
            layers = input.layers.len(),
            "已读取布局"
        );
        Ok(input)
    }
}

/// 把内存图纸序列化为 PDF：每张图纸一页，基础 14 字体，坐标原样写出（左下原点）。
#[derive(Debug, Clone, Copy)]
pub struct PdfFacade {
    compress: bool,
}

impl PdfFacade {
    pub fn new() -> Self {
        Self { compress: true }
    }

    /// 内容流不压缩，便于检查输出。
    pub fn uncompressed() -> Self {
        Self { compress: false }
    }

    pub fn encode(&self, drawing: &Drawing) -> Result<Vec<u8>, IoError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary("Helvetica"));
        let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids = Vec::with_capacity(drawing.sheets.len());
        for (index, sheet) in drawing.sheets.iter().enumerate() {
            let content = Content {
                operations: sheet_operations(sheet),
            };
            let encoded = content.encode().map_err(IoError::Encode)?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Integer(sheet.width.round() as i64),
                    Object::Integer(sheet.height.round() as i64),
                ],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            debug!(page = index + 1, ops = sheet.ops.len(), "已写出页面");
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.set_object(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            },
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let stamp = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&drawing.title)),
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(stamp),
        });
        doc.trailer.set("Info", info_id);

        if self.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|err| IoError::Encode(lopdf::Error::from(err)))?;
        Ok(buffer)
    }
}

impl Default for PdfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSaver for PdfFacade {
    /// 先在内存中完成编码，成功后才写文件，失败不会留下残缺输出。
    fn save(&self, drawing: &Drawing, path: &Path) -> Result<(), IoError> {
        let bytes = self.encode(drawing)?;
        fs::write(path, &bytes).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            pages = drawing.page_count(),
            bytes = bytes.len(),
            "已写出 PDF"
        );
        Ok(())
    }
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

#[inline]
fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn fill_color(color: Rgb) -> Operation {
    op("rg", vec![real(color.r), real(color.g), real(color.b)])
}

fn stroke_style(ops: &mut Vec<Operation>, stroke: StrokeStyle) {
    ops.push(op("w", vec![real(stroke.width)]));
    ops.push(op(
        "RG",
        vec![real(stroke.color.r), real(stroke.color.g), real(stroke.color.b)],
    ));
}

/// 根据描边与填充组合选择绘制算子，两者皆无时返回 `None`。
fn paint(
    ops: &mut Vec<Operation>,
    stroke: Option<StrokeStyle>,
    fill: Option<Rgb>,
) -> Option<&'static str> {
    if let Some(color) = fill {
        ops.push(fill_color(color));
    }
    if let Some(stroke) = stroke {
        stroke_style(ops, stroke);
    }
    match (stroke.is_some(), fill.is_some()) {
        (true, true) => Some("B"),
        (true, false) => Some("S"),
        (false, true) => Some("f"),
        (false, false) => None,
    }
}

fn move_to(point: Point2) -> Operation {
    op("m", vec![real(point.x()), real(point.y())])
}

fn line_to(point: Point2) -> Operation {
    op("l", vec![real(point.x()), real(point.y())])
}

fn circle_path(ops: &mut Vec<Operation>, center: Point2, radius: f64) {
    let (cx, cy) = (center.x(), center.y());
    let k = radius * KAPPA;
    ops.push(move_to(Point2::new(cx + radius, cy)));
    let quarters = [
        [cx + radius, cy + k, cx + k, cy + radius, cx, cy + radius],
        [cx - k, cy + radius, cx - radius, cy + k, cx - radius, cy],
        [cx - radius, cy - k, cx - k, cy - radius, cx, cy - radius],
        [cx + k, cy - radius, cx + radius, cy - k, cx + radius, cy],
    ];
    for quarter in quarters {
        ops.push(op("c", quarter.into_iter().map(real).collect()));
    }
    ops.push(op("h", Vec::new()));
}

fn sheet_operations(sheet: &Sheet) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(sheet.ops.len() * 4);
    for draw in &sheet.ops {
        match draw {
            DrawOp::Line { start, end, stroke } => {
                stroke_style(&mut ops, *stroke);
                ops.push(move_to(*start));
                ops.push(line_to(*end));
                ops.push(op("S", Vec::new()));
            }
            DrawOp::Rect { rect, stroke, fill } => {
                if let Some(operator) = paint(&mut ops, *stroke, *fill) {
                    ops.push(op(
                        "re",
                        vec![
                            real(rect.min_x()),
                            real(rect.min_y()),
                            real(rect.width()),
                            real(rect.height()),
                        ],
                    ));
                    ops.push(op(operator, Vec::new()));
                }
            }
            DrawOp::Circle {
                center,
                radius,
                stroke,
                fill,
            } => {
                if let Some(operator) = paint(&mut ops, *stroke, *fill) {
                    circle_path(&mut ops, *center, *radius);
                    ops.push(op(operator, Vec::new()));
                }
            }
            DrawOp::Polygon {
                points,
                stroke,
                fill,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    continue;
                };
                if let Some(operator) = paint(&mut ops, *stroke, *fill) {
                    ops.push(move_to(*first));
                    ops.extend(rest.iter().map(|point| line_to(*point)));
                    ops.push(op("h", Vec::new()));
                    ops.push(op(operator, Vec::new()));
                }
            }
            DrawOp::Text {
                origin,
                content,
                size,
                font,
                color,
            } => {
                let font_name = match font {
                    FontFace::Regular => "F1",
                    FontFace::Bold => "F2",
                };
                ops.push(op("BT", Vec::new()));
                ops.push(fill_color(*color));
                ops.push(op("Tf", vec![Object::Name(font_name.into()), real(*size)]));
                ops.push(op("Td", vec![real(origin.x()), real(origin.y())]));
                ops.push(op(
                    "Tj",
                    vec![Object::String(win_ansi(content), StringFormat::Literal)],
                ));
                ops.push(op("ET", Vec::new()));
            }
        }
    }
    ops
}

/// 转为 WinAnsi 字节，Latin-1 以外的字符写作 `?`。
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch as u32 {
            code @ (0x20..=0x7e | 0xa0..=0xff) => code as u8,
            _ => b'?',
        })
        .collect()
}
