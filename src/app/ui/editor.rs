use super::super::{GalleryTarget, PicChangerApp, Route, Screen};
use super::icons;
use crate::image::ColorFilter;
use egui::{Color32, CornerRadius, Sense, StrokeKind};

const SWATCH_SIZE: f32 = 60.0;
const SWATCH_GAP: f32 = 12.0;

enum EditorAction {
    Back,
    Exit,
    Gallery,
}

impl PicChangerApp {
    pub(crate) fn ui_editor(&mut self, ctx: &egui::Context) {
        let in_crop = matches!(&self.screen, Screen::Editor(editor) if editor.crop.is_some());
        if in_crop {
            self.ui_crop(ctx);
            return;
        }

        let mut action = None;
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };

        egui::TopBottomPanel::top("editor_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(format!("{} Back", icons::ICON_BACK))
                    .on_hover_text("Return to the start screen")
                    .clicked()
                {
                    action = Some(EditorAction::Back);
                }
                ui.separator();
                ui.label(editor.current().display_name());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .button(icons::ICON_CLOSE)
                        .on_hover_text("Exit")
                        .clicked()
                    {
                        action = Some(EditorAction::Exit);
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("editor_controls").show(ctx, |ui| {
            let has_image = editor.displayed().is_some();
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                for filter in ColorFilter::ALL {
                    if filter_swatch(ui, filter, editor.selection() == filter, has_image).clicked()
                    {
                        editor.select_filter(filter);
                    }
                    ui.add_space(SWATCH_GAP - ui.spacing().item_spacing.x);
                }
                let crop = egui::Button::new(format!("{} Crop", icons::ICON_CROP))
                    .min_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE));
                if ui
                    .add_enabled(has_image, crop)
                    .on_hover_text("Crop to a square")
                    .clicked()
                {
                    editor.start_crop(&mut self.toasts);
                }
            });
            ui.add_space(12.0);

            let full = egui::vec2(ui.available_width(), 36.0);
            if ui
                .add(egui::Button::new("Look at other photos in gallery").min_size(full))
                .clicked()
            {
                action = Some(EditorAction::Gallery);
            }
            ui.add_space(8.0);
            let save = egui::Button::new(format!("{} SAVE", icons::ICON_SAVE)).min_size(full);
            if ui
                .add_enabled(has_image, save)
                .on_hover_text("Save a copy to the picture library (Ctrl+S)")
                .clicked()
            {
                editor.save(&mut self.toasts);
            }
            ui.add_space(8.0);
            let overwrite =
                egui::Button::new(format!("{} Overwrite original", icons::ICON_OVERWRITE))
                    .min_size(full);
            if ui
                .add_enabled(has_image, overwrite)
                .on_hover_text("Replace the original photo in the picture library")
                .clicked()
            {
                editor.request_overwrite(&mut self.toasts);
            }
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let loading = editor.is_loading();
            match editor.sync_texture(ctx) {
                Some(texture) => {
                    let size = fit_size(texture.size, ui.available_size());
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Image::new((texture.texture.id(), size)));
                    });
                }
                None if loading => {
                    ui.centered_and_justified(egui::Ui::spinner);
                }
                None => {
                    ui.centered_and_justified(|ui| ui.label("No image"));
                }
            }
        });

        self.ui_overwrite_prompt(ctx);

        match action {
            Some(EditorAction::Back) => self.navigate(Route::Picker),
            Some(EditorAction::Exit) => self.exit_requested = true,
            Some(EditorAction::Gallery) => {
                self.open_gallery_dialog(GalleryTarget::ReplaceInEditor);
            }
            None => {}
        }
    }
}

fn filter_swatch(
    ui: &mut egui::Ui,
    filter: ColorFilter,
    selected: bool,
    enabled: bool,
) -> egui::Response {
    let sense = if enabled {
        Sense::click()
    } else {
        Sense::hover()
    };
    let (rect, response) = ui.allocate_exact_size(egui::vec2(SWATCH_SIZE, SWATCH_SIZE), sense);
    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        painter.rect_filled(rect, CornerRadius::same(4), filter.swatch_color());
        if selected {
            let stroke = ui.visuals().selection.stroke;
            painter.rect_stroke(
                rect,
                CornerRadius::same(4),
                egui::Stroke::new(3.0, stroke.color),
                StrokeKind::Outside,
            );
        }
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            filter.label(),
            egui::FontId::proportional(13.0),
            Color32::WHITE,
        );
    }
    response.on_hover_text(format!("{} filter", filter.label()))
}

/// Largest size with the texture's aspect that fits `available`, never upscaled.
pub(crate) fn fit_size(texture: [usize; 2], available: egui::Vec2) -> egui::Vec2 {
    #[allow(clippy::cast_precision_loss)]
    let size = egui::vec2(texture[0] as f32, texture[1] as f32);
    if size.x <= 0.0 || size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (available.x / size.x).min(available.y / size.y).min(1.0);
    size * scale.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_size_keeps_aspect_and_never_upscales() {
        assert_eq!(fit_size([400, 200], egui::vec2(200.0, 200.0)), egui::vec2(200.0, 100.0));
        assert_eq!(fit_size([100, 50], egui::vec2(800.0, 800.0)), egui::vec2(100.0, 50.0));
        assert_eq!(fit_size([0, 50], egui::vec2(800.0, 800.0)), egui::Vec2::ZERO);
    }
}
