pub mod assemble;
pub mod dimension;
pub mod page;
pub mod projection;
pub mod schedule;
pub mod typeset;
pub mod validate;

pub use assemble::{DocumentAssembler, render_pdf};

pub mod errors {
    use foamdraw_io::IoError;
    use thiserror::Error;

    use crate::projection::ViewKind;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("drawing has no layers")]
        EmptyLayers,
        #[error("block {field} must be a positive finite number, got {value}")]
        InvalidBlock { field: &'static str, value: f64 },
        #[error("layer {index}: {reason}")]
        InvalidLayer { index: usize, reason: String },
        #[error("layer {layer}, cavity `{cavity}`: {reason}")]
        InvalidCavity {
            layer: usize,
            cavity: String,
            reason: String,
        },
        #[error("layer stack of {stack_in} in exceeds block height {block_in} in")]
        StackExceedsBlock { stack_in: f64, block_in: f64 },
        #[error("layer {layer}, cavity `{cavity}` extends past the block footprint")]
        CavityOutsideFootprint { layer: usize, cavity: String },
        #[error("layer `{layer}` has no drawable {view:?} view")]
        DegenerateView { layer: String, view: ViewKind },
        #[error("layer index {index} out of range ({count} layers)")]
        LayerOutOfRange { index: usize, count: usize },
        #[error(transparent)]
        Io(#[from] IoError),
    }
}

pub mod options {
    use crate::projection::{CavityDepthAnchor, DEPTH_ANCHOR_POLICY};
    use crate::schedule::DEFAULT_NOTES;

    pub const DEFAULT_TITLE: &str = "FOAM INSERT LAYOUT";

    /// 出图参数。输入自带的日期与备注优先于这里的取值。
    #[derive(Debug, Clone)]
    pub struct RenderOptions {
        pub title: String,
        pub default_notes: Vec<String>,
        /// `None` 表示使用当天日期。
        pub date: Option<String>,
        pub strict: bool,
        pub depth_anchor: CavityDepthAnchor,
    }

    impl Default for RenderOptions {
        fn default() -> Self {
            Self {
                title: DEFAULT_TITLE.to_string(),
                default_notes: DEFAULT_NOTES.iter().map(|note| note.to_string()).collect(),
                date: None,
                strict: false,
                depth_anchor: DEPTH_ANCHOR_POLICY,
            }
        }
    }
}
