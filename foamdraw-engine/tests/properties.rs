//! 投影、尺寸与分页的性质测试。

use proptest::prelude::*;

use foamdraw_core::model::{Block, Cavity, DrawingInput, Layer};
use foamdraw_engine::dimension::Dimension;
use foamdraw_engine::options::RenderOptions;
use foamdraw_engine::page::{PageComposer, PageContext, PageGrid};
use foamdraw_engine::projection::{
    CavityDepthAnchor, DIMENSION_GUTTER, FILL_FACTOR, ViewKind, project_view,
};
use foamdraw_engine::DocumentAssembler;

const TOL: f64 = 1e-9;

fn arb_dim() -> impl Strategy<Value = f64> {
    0.25f64..120.0
}

fn options() -> RenderOptions {
    RenderOptions {
        date: Some("2026-03-04".to_string()),
        ..RenderOptions::default()
    }
}

proptest! {
    #[test]
    fn single_layer_views_fit_their_columns(l in arb_dim(), w in arb_dim(), h in arb_dim()) {
        let input = DrawingInput::new(
            "Q-P1",
            Block::new(l, w, h),
            vec![Layer::new("L1", "Solid", h, "PE")],
        );
        let drawing = DocumentAssembler::new(options()).assemble(&input).unwrap();
        prop_assert_eq!(drawing.page_count(), 1);

        let notes = Vec::new();
        let composer = PageComposer::default();
        let page = composer
            .compose(&PageContext {
                input: &input,
                layer_index: 0,
                notes: &notes,
                date: "2026-03-04",
                title: "P1",
            })
            .unwrap();
        prop_assert_eq!(page.views.len(), 3);
        for (view, column) in page.views.iter().zip(composer.grid().columns) {
            prop_assert!(view.outline.width() > 0.0);
            prop_assert!(view.outline.height() > 0.0);
            prop_assert!(column.contains_rect(&view.outline, 1e-6));
        }
    }

    #[test]
    fn front_scale_matches_fill_formula(l in arb_dim(), t in arb_dim()) {
        let column = PageGrid::standard().columns[0];
        let block = Block::new(l, 8.0, t);
        let layer = Layer::new("L1", "Base", t, "PE");
        let view = project_view(&block, &layer, ViewKind::Front, column, CavityDepthAnchor::Top)
            .unwrap();

        let avail_w = column.width() - 2.0 * DIMENSION_GUTTER;
        let avail_h = column.height() - 2.0 * DIMENSION_GUTTER;
        let expected = (avail_w / l).min(avail_h / t) * FILL_FACTOR;
        prop_assert!((view.scale() - expected).abs() <= TOL * expected.max(1.0));
    }

    #[test]
    fn deep_cavities_are_clamped_to_layer(t in 0.5f64..4.0, extra in 0.1f64..10.0) {
        let column = PageGrid::standard().columns[0];
        let block = Block::new(12.0, 10.0, t);
        let layer = Layer::new("L1", "Base", t, "PE")
            .with_cavity(Cavity::rect("deep", 0.2, 0.2, 3.0, 2.0, t + extra));
        for kind in [ViewKind::Front, ViewKind::Right] {
            let view = project_view(&block, &layer, kind, column, CavityDepthAnchor::Top).unwrap();
            let cavity = &view.cavities[0];
            prop_assert!((cavity.extent.height() - t * view.scale()).abs() < 1e-6);
            prop_assert!((cavity.vertical_in - t).abs() < TOL);
        }
    }

    #[test]
    fn short_dimensions_emit_nothing(x in 0.0f64..500.0, gap in 0.0f64..5.999, y in 0.0f64..500.0) {
        prop_assert!(Dimension::horizontal(x, x + gap, y, y - 10.0, 1.0).render().is_empty());
        prop_assert!(Dimension::vertical(y, y + gap, x, x + 10.0, 1.0).render().is_empty());
    }

    #[test]
    fn page_count_follows_layer_count(count in 1usize..6, thickness in 0.5f64..3.0) {
        let layers = (0..count)
            .map(|i| {
                Layer::new(format!("L{i}"), format!("Layer {i}"), thickness, "PE")
                    .with_cavity(Cavity::circle(format!("c{i}"), 0.3, 0.3, 2.0, 2.0, 0.5, None))
            })
            .collect();
        let input = DrawingInput::new(
            "Q-P5",
            Block::new(16.0, 12.0, thickness * count as f64),
            layers,
        );
        let drawing = DocumentAssembler::new(options()).assemble(&input).unwrap();
        prop_assert_eq!(drawing.page_count(), count);
    }
}

#[test]
fn independent_view_scales_differ() {
    let block = Block::new(12.0, 10.0, 3.0);
    let layer = Layer::new("L1", "Solid", 3.0, "PE");
    let column = foamdraw_core::geometry::Rect::from_origin_size(0.0, 0.0, 300.0, 200.0);

    let front = project_view(&block, &layer, ViewKind::Front, column, CavityDepthAnchor::Top).unwrap();
    let top = project_view(&block, &layer, ViewKind::Top, column, CavityDepthAnchor::Top).unwrap();

    let avail_w = 300.0 - 2.0 * DIMENSION_GUTTER;
    let avail_h = 200.0 - 2.0 * DIMENSION_GUTTER;
    assert!((front.scale() - (avail_w / 12.0).min(avail_h / 3.0) * FILL_FACTOR).abs() < TOL);
    assert!((top.scale() - (avail_w / 12.0).min(avail_h / 10.0) * FILL_FACTOR).abs() < TOL);
    assert!((front.scale() - top.scale()).abs() > 1e-6);
}
