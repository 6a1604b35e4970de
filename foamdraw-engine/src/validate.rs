use foamdraw_core::model::{Cavity, DrawingInput};
use tracing::warn;

use crate::errors::EngineError;

/// 允许的浮点误差（英寸）。
const TOLERANCE_IN: f64 = 1e-9;

/// 校验通过后仍值得关注的问题；严格模式下视为错误。
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub advisories: Vec<EngineError>,
}

impl ValidationReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }
}

#[inline]
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// 在排版任何页面之前校验输入。结构性问题直接返回错误；
/// 叠层高度与型腔越界属于提示项，`strict` 为真时升级为错误。
pub fn validate(input: &DrawingInput, strict: bool) -> Result<ValidationReport, EngineError> {
    if input.layers.is_empty() {
        return Err(EngineError::EmptyLayers);
    }

    let block = &input.block;
    for (field, value) in [
        ("lengthIn", block.length_in),
        ("widthIn", block.width_in),
        ("heightIn", block.height_in),
    ] {
        if !positive(value) {
            return Err(EngineError::InvalidBlock { field, value });
        }
    }

    let mut report = ValidationReport::default();
    for (index, layer) in input.layers.iter().enumerate() {
        if !positive(layer.thickness_in) {
            return Err(EngineError::InvalidLayer {
                index,
                reason: format!("thicknessIn must be positive, got {}", layer.thickness_in),
            });
        }
        for cavity in &layer.cavities {
            check_cavity(index, cavity)?;

            let (along_length, along_width) = cavity.footprint(block);
            let outside = along_length.start < -TOLERANCE_IN
                || along_width.start < -TOLERANCE_IN
                || along_length.end > block.length_in + TOLERANCE_IN
                || along_width.end > block.width_in + TOLERANCE_IN;
            if outside {
                report.advisories.push(EngineError::CavityOutsideFootprint {
                    layer: index,
                    cavity: cavity.id.clone(),
                });
            }
        }
    }

    let stack = input.stack_height();
    if stack > block.height_in + TOLERANCE_IN {
        report.advisories.push(EngineError::StackExceedsBlock {
            stack_in: stack,
            block_in: block.height_in,
        });
    }

    if strict && !report.advisories.is_empty() {
        return Err(report.advisories.remove(0));
    }
    for advisory in &report.advisories {
        warn!(quote = %input.quote_no, issue = %advisory, "输入校验提示");
    }
    Ok(report)
}

fn check_cavity(layer: usize, cavity: &Cavity) -> Result<(), EngineError> {
    let invalid = |reason: String| EngineError::InvalidCavity {
        layer,
        cavity: cavity.id.clone(),
        reason,
    };
    for (field, value) in [
        ("lengthIn", cavity.length_in),
        ("widthIn", cavity.width_in),
        ("depthIn", cavity.depth_in),
    ] {
        if !positive(value) {
            return Err(invalid(format!("{field} must be positive, got {value}")));
        }
    }
    if let Some(diameter) = cavity.diameter_in {
        if !positive(diameter) {
            return Err(invalid(format!("diameterIn must be positive, got {diameter}")));
        }
    }
    for (field, value) in [("x", cavity.x), ("y", cavity.y)] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!("{field} must lie in [0, 1], got {value}")));
        }
    }
    if let Some(points) = &cavity.points {
        if points.iter().any(|p| !p.x().is_finite() || !p.y().is_finite()) {
            return Err(invalid("points must be finite".to_string()));
        }
    }
    Ok(())
}
