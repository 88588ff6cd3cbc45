use super::super::toast::{ToastKind, Toasts};
use egui::{Color32, CornerRadius};

const TOAST_MARGIN: f32 = 16.0;

const fn toast_colors(kind: ToastKind) -> (Color32, Color32) {
    match kind {
        ToastKind::Info => (Color32::from_rgb(50, 50, 56), Color32::WHITE),
        ToastKind::Success => (Color32::from_rgb(34, 110, 60), Color32::WHITE),
        ToastKind::Warning => (Color32::from_rgb(160, 100, 20), Color32::WHITE),
    }
}

/// Draw the live toasts stacked in the bottom-right corner.
pub fn show(ctx: &egui::Context, toasts: &Toasts) {
    if toasts.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("toasts"))
        .order(egui::Order::Tooltip)
        .anchor(
            egui::Align2::RIGHT_BOTTOM,
            egui::vec2(-TOAST_MARGIN, -TOAST_MARGIN),
        )
        .interactable(false)
        .show(ctx, |ui| {
            ui.with_layout(egui::Layout::bottom_up(egui::Align::Max), |ui| {
                for toast in toasts.iter().rev() {
                    let (fill, text) = toast_colors(toast.kind);
                    egui::Frame::NONE
                        .fill(fill)
                        .corner_radius(CornerRadius::same(6))
                        .inner_margin(egui::Margin::symmetric(12, 8))
                        .show(ui, |ui| {
                            ui.colored_label(text, &toast.message);
                        });
                    ui.add_space(6.0);
                }
            });
        });
}
