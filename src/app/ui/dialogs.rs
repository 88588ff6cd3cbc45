use super::super::{GalleryTarget, NativeDialog, PicChangerApp, Screen};
use egui_file_dialog::FileDialog;
use std::path::Path;

impl PicChangerApp {
    pub(crate) fn open_gallery_dialog(&mut self, target: GalleryTarget) {
        let mut dialog = Self::make_open_dialog(self.last_image_dir.as_deref());
        dialog.pick_file();
        self.active_dialog = Some(NativeDialog::Gallery { dialog, target });
    }

    pub(crate) fn make_open_dialog(initial_dir: Option<&Path>) -> FileDialog {
        // Keep in sync with enabled `image` crate features.
        let mut dialog = FileDialog::new()
            .title("Choose a photo")
            .add_file_filter_extensions(
                "All images",
                vec![
                    "png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "tga", "tiff", "tif", "pnm",
                    "pbm", "pgm", "ppm", "hdr", "dds",
                ],
            )
            .add_file_filter_extensions("JPEG/JPG", vec!["jpg", "jpeg"])
            .add_file_filter_extensions("PNG", vec!["png"])
            .default_file_filter("All images");
        if let Some(dir) = initial_dir {
            dialog = dialog.initial_directory(dir.to_path_buf());
        }
        dialog
    }

    /// Consent prompt shown before the original file is replaced.
    pub(crate) fn ui_overwrite_prompt(&mut self, ctx: &egui::Context) {
        let Screen::Editor(editor) = &mut self.screen else {
            return;
        };
        let Some(request) = editor.overwrite_prompt.as_ref() else {
            return;
        };
        let name = request.uri.display_name();
        let location = request.id.relative_path().display().to_string();
        let mut confirm = false;
        let mut cancel = false;
        egui::Window::new("Overwrite original?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!("Replace {name} with the edited photo?"));
                ui.small(location);
                ui.label("This cannot be undone.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    if ui.button("Overwrite").clicked() {
                        confirm = true;
                    }
                });
            });
        if confirm {
            editor.confirm_overwrite(&mut self.toasts);
        } else if cancel || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            editor.cancel_overwrite();
        }
    }
}

