use foamdraw_core::model::DrawingInput;
use foamdraw_core::sheet::Drawing;
use foamdraw_io::PdfFacade;
use tracing::info;

use crate::errors::EngineError;
use crate::options::RenderOptions;
use crate::page::{PageComposer, PageContext};
use crate::validate::validate;

/// 出图入口：先整体校验，再逐层排版，每层一页，页序与层序一致。
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    options: RenderOptions,
    composer: PageComposer,
}

impl DocumentAssembler {
    pub fn new(options: RenderOptions) -> Self {
        let composer = PageComposer::new(options.depth_anchor);
        Self { options, composer }
    }

    #[inline]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// 生成内存中的多页图纸。任何一层失败都会使整次调用失败，不返回残缺文档。
    pub fn assemble(&self, input: &DrawingInput) -> Result<Drawing, EngineError> {
        validate(input, self.options.strict)?;

        let date = input
            .date
            .clone()
            .or_else(|| self.options.date.clone())
            .unwrap_or_else(today);
        let notes: &[String] = if input.notes.is_empty() {
            &self.options.default_notes
        } else {
            &input.notes
        };

        let sheets = (0..input.layers.len())
            .map(|layer_index| {
                let ctx = PageContext {
                    input,
                    layer_index,
                    notes,
                    date: &date,
                    title: &self.options.title,
                };
                self.composer.compose(&ctx).map(|page| page.sheet)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            quote = %input.quote_no,
            pages = sheets.len(),
            "图纸排版完成"
        );
        Ok(Drawing {
            title: format!("{} {}", self.options.title, input.quote_no),
            sheets,
        })
    }

    /// 生成并序列化为 PDF 字节流。
    pub fn render_pdf(&self, input: &DrawingInput) -> Result<Vec<u8>, EngineError> {
        let drawing = self.assemble(input)?;
        Ok(PdfFacade::new().encode(&drawing)?)
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

/// 使用默认选项生成 PDF。
pub fn render_pdf(input: &DrawingInput) -> Result<Vec<u8>, EngineError> {
    DocumentAssembler::default().render_pdf(input)
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
