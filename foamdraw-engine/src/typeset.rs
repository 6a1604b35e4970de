use foamdraw_core::geometry::Point2;
use foamdraw_core::sheet::{DrawOp, FontFace, Rgb, text_width};

const ELLIPSIS: &str = "...";

#[inline]
pub fn text(
    x: f64,
    baseline: f64,
    content: impl Into<String>,
    size: f64,
    font: FontFace,
    color: Rgb,
) -> DrawOp {
    DrawOp::Text {
        origin: Point2::new(x, baseline),
        content: content.into(),
        size,
        font,
        color,
    }
}

/// 以 `center_x` 为中心水平居中的文字。
pub fn centered(
    center_x: f64,
    baseline: f64,
    content: impl Into<String>,
    size: f64,
    font: FontFace,
    color: Rgb,
) -> DrawOp {
    let content = content.into();
    let width = text_width(&content, size, font);
    text(center_x - width * 0.5, baseline, content, size, font, color)
}

/// 截断超出 `max_width` 的文字并补省略号；放不下省略号时返回空串。
pub fn fit_text(content: &str, size: f64, font: FontFace, max_width: f64) -> String {
    if text_width(content, size, font) <= max_width {
        return content.to_string();
    }
    let budget = max_width - text_width(ELLIPSIS, size, font);
    if budget <= 0.0 {
        return String::new();
    }
    let mut fitted = String::new();
    for ch in content.chars() {
        fitted.push(ch);
        if text_width(&fitted, size, font) > budget {
            fitted.pop();
            break;
        }
    }
    let trimmed = fitted.trim_end();
    format!("{trimmed}{ELLIPSIS}")
}
