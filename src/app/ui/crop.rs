use super::super::{PicChangerApp, Screen};
use super::editor::fit_size;
use super::icons;
use egui::{Color32, CornerRadius, Rect, Sense, Stroke, StrokeKind, pos2};

const OVERLAY: Color32 = Color32::from_black_alpha(140);
const SELECTION_STROKE: f32 = 2.0;

impl PicChangerApp {
    pub(crate) fn ui_crop(&mut self, ctx: &egui::Context) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };
        editor.sync_crop_preview(ctx);
        let mut apply = false;
        let mut cancel = false;

        let Some(session) = editor.crop.as_mut() else {
            return;
        };
        egui::TopBottomPanel::bottom("crop_controls").show(ctx, |ui| {
            ui.add_space(8.0);
            let running = session.is_running();
            let mut side = session.rect().width;
            let slider = egui::Slider::new(&mut side, session.min_side()..=session.max_side())
                .text("Size")
                .suffix(" px");
            if ui.add_enabled(!running, slider).changed() {
                session.set_side(side);
            }
            let (max_w, max_h) = session.request().max_result_size;
            ui.small(format!("Square 1:1, result at most {max_w}×{max_h} px"));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!running, egui::Button::new("Cancel"))
                    .on_hover_text("Leave without cropping (Esc)")
                    .clicked()
                {
                    cancel = true;
                }
                let label = format!("{} Apply", icons::ICON_APPLY);
                if ui.add_enabled(!running, egui::Button::new(label)).clicked() {
                    apply = true;
                }
                if running {
                    ui.spinner();
                }
            });
            ui.add_space(8.0);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::BLACK))
            .show(ctx, |ui| {
                let Some(preview) = session.preview.as_ref() else {
                    ui.centered_and_justified(egui::Ui::spinner);
                    return;
                };
                let texture_id = preview.texture.id();
                let size = fit_size(preview.size, ui.available_size());
                let (w, _) = session.source_size();
                #[allow(clippy::cast_precision_loss)]
                let scale = if w == 0 { 0.0 } else { size.x / w as f32 };
                let (canvas, response) = ui
                    .centered_and_justified(|ui| ui.allocate_exact_size(size, Sense::drag()))
                    .inner;
                if response.dragged() && scale > 0.0 && !session.is_running() {
                    let delta = response.drag_delta() / scale;
                    session.drag_by(delta.x, delta.y);
                }

                let painter = ui.painter_at(canvas);
                let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
                painter.image(texture_id, canvas, uv, Color32::WHITE);

                let rect = session.rect();
                #[allow(clippy::cast_precision_loss)]
                let selection = Rect::from_min_size(
                    canvas.min + egui::vec2(rect.x as f32, rect.y as f32) * scale,
                    egui::vec2(rect.width as f32, rect.height as f32) * scale,
                );
                for shade in outside_bands(canvas, selection) {
                    painter.rect_filled(shade, CornerRadius::ZERO, OVERLAY);
                }
                painter.rect_stroke(
                    selection,
                    CornerRadius::ZERO,
                    Stroke::new(SELECTION_STROKE, Color32::WHITE),
                    StrokeKind::Inside,
                );
                if response.hovered() {
                    ctx.set_cursor_icon(egui::CursorIcon::Grab);
                }
            });

        if apply {
            editor.apply_crop();
        } else if cancel {
            editor.cancel_crop();
        }
    }
}

/// The four bands of `canvas` around `selection`, for the dimming overlay.
fn outside_bands(canvas: Rect, selection: Rect) -> [Rect; 4] {
    [
        Rect::from_min_max(canvas.min, pos2(canvas.max.x, selection.min.y)),
        Rect::from_min_max(pos2(canvas.min.x, selection.max.y), canvas.max),
        Rect::from_min_max(
            pos2(canvas.min.x, selection.min.y),
            pos2(selection.min.x, selection.max.y),
        ),
        Rect::from_min_max(
            pos2(selection.max.x, selection.min.y),
            pos2(canvas.max.x, selection.max.y),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_everything_but_the_selection() {
        let canvas = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 50.0));
        let selection = Rect::from_min_max(pos2(30.0, 10.0), pos2(70.0, 40.0));
        let area: f32 = outside_bands(canvas, selection).iter().map(Rect::area).sum();
        assert!((area - (100.0 * 50.0 - 40.0 * 30.0)).abs() < f32::EPSILON);
        for band in outside_bands(canvas, selection) {
            assert!(!band.intersects(selection.shrink(0.5)));
        }
    }
}
