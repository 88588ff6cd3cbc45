use super::super::{GalleryTarget, PicChangerApp, Screen};
use super::icons;

const ACTION_BUTTON_HEIGHT: f32 = 56.0;

impl PicChangerApp {
    pub(crate) fn ui_picker(&mut self, ctx: &egui::Context) {
        let mut open_gallery = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let Screen::Picker(picker) = &mut self.screen else {
                return;
            };
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                ui.heading("PicChanger");
                ui.add_space(24.0);
                let width = ui.available_width().min(360.0);
                let size = egui::vec2(width, ACTION_BUTTON_HEIGHT);

                let gallery = egui::Button::new(format!(
                    "{} Choose a photo from gallery",
                    icons::ICON_GALLERY
                ))
                .min_size(size);
                if ui
                    .add(gallery)
                    .on_hover_text("Open an image file (Ctrl+O)")
                    .clicked()
                {
                    open_gallery = true;
                }
                ui.add_space(16.0);

                let camera =
                    egui::Button::new(format!("{} Take a photo", icons::ICON_CAMERA)).min_size(size);
                if ui.add_enabled(!picker.is_busy(), camera).clicked() {
                    picker.take_photo(&mut self.toasts);
                }

                if picker.is_busy() {
                    ui.add_space(16.0);
                    ui.horizontal(|ui| {
                        ui.spinner();
                        if picker.is_awaiting_permission() {
                            ui.label("Waiting for camera permission…");
                        } else {
                            ui.label("Taking photo…");
                        }
                    });
                }
            });
        });
        if open_gallery {
            self.open_gallery_dialog(GalleryTarget::OpenEditor);
        }
    }
}
