use foamdraw_core::geometry::{Point2, Rect};
use foamdraw_core::sheet::{Drawing, DrawOp, FontFace, Rgb, Sheet, StrokeStyle};
use foamdraw_io::{DrawingSaver, IoError, PdfFacade};
use lopdf::content::Content;
use lopdf::{Document, Object};

fn sample_sheet(label: &str) -> Sheet {
    let mut sheet = Sheet::new();
    sheet.push(DrawOp::Rect {
        rect: Rect::from_origin_size(24.0, 24.0, 744.0, 564.0),
        stroke: Some(StrokeStyle::OUTLINE),
        fill: None,
    });
    sheet.push(DrawOp::Line {
        start: Point2::new(24.0, 204.0),
        end: Point2::new(768.0, 204.0),
        stroke: StrokeStyle::THIN,
    });
    sheet.push(DrawOp::Circle {
        center: Point2::new(300.0, 300.0),
        radius: 20.0,
        stroke: Some(StrokeStyle::THIN),
        fill: Some(Rgb::SHADE),
    });
    sheet.push(DrawOp::Text {
        origin: Point2::new(40.0, 560.0),
        content: label.to_string(),
        size: 9.0,
        font: FontFace::Bold,
        color: Rgb::BLACK,
    });
    sheet
}

fn sample_drawing(pages: usize) -> Drawing {
    Drawing {
        title: "FOAM INSERT LAYOUT Q-9".to_string(),
        sheets: (0..pages).map(|i| sample_sheet(&format!("PAGE {}", i + 1))).collect(),
    }
}

#[test]
fn every_page_is_letter_landscape() {
    let bytes = PdfFacade::new().encode(&sample_drawing(3)).expect("编码 PDF 失败");
    assert!(bytes.starts_with(b"%PDF-"));

    let doc = Document::load_mem(&bytes).expect("解析生成的 PDF 失败");
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    for page_id in pages.values() {
        let page = doc.get_dictionary(*page_id).expect("页面字典");
        let media_box = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .expect("MediaBox");
        let values: Vec<i64> = media_box
            .iter()
            .map(|value| value.as_i64().expect("整数坐标"))
            .collect();
        assert_eq!(values, vec![0, 0, 792, 612]);
    }
}

#[test]
fn content_stream_keeps_text_and_order() {
    let bytes = PdfFacade::uncompressed()
        .encode(&sample_drawing(2))
        .expect("编码 PDF 失败");
    let doc = Document::load_mem(&bytes).expect("解析生成的 PDF 失败");
    let pages = doc.get_pages();
    let second = pages.get(&2).copied().expect("第二页");

    let raw = doc.get_page_content(second).expect("页面内容");
    let content = Content::decode(&raw).expect("解析内容流");
    let operators: Vec<&str> = content
        .operations
        .iter()
        .map(|operation| operation.operator.as_str())
        .collect();
    assert!(operators.contains(&"re"));
    assert!(operators.contains(&"B"));
    assert_eq!(operators.last(), Some(&"ET"));

    let label = content
        .operations
        .iter()
        .find(|operation| operation.operator == "Tj")
        .and_then(|operation| operation.operands.first())
        .and_then(|operand| operand.as_str().ok())
        .expect("文字");
    assert_eq!(label, b"PAGE 2");
}

#[test]
fn info_dictionary_carries_title() {
    let bytes = PdfFacade::new().encode(&sample_drawing(1)).expect("编码 PDF 失败");
    let doc = Document::load_mem(&bytes).expect("解析生成的 PDF 失败");
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .expect("Info 字典");
    let title = info.get(b"Title").and_then(Object::as_str).expect("标题");
    assert_eq!(title, b"FOAM INSERT LAYOUT Q-9");
}

#[test]
fn save_writes_file() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("Q-9.pdf");
    PdfFacade::new()
        .save(&sample_drawing(2), &path)
        .expect("写出 PDF 失败");

    let doc = Document::load(&path).expect("读取写出的 PDF 失败");
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn save_into_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("missing").join("out.pdf");
    let err = PdfFacade::new()
        .save(&sample_drawing(1), &path)
        .expect_err("目录不存在应当失败");
    assert!(matches!(err, IoError::WriteError { .. }));
    assert!(!path.exists());
}
