//! Main egui/eframe application state and screen navigation.

use crate::image_ref::ImageRef;
use crate::wiring::AppComponent;
use egui::{Context, Key};
use egui_file_dialog::{DialogState, FileDialog};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

mod crop;
mod editor;
mod picker;
#[cfg(test)]
mod testing;
mod toast;
mod ui;

use editor::EditorScreen;
use picker::PickerScreen;
use toast::Toasts;

const EDITOR_ROUTE: &str = "editor";
const PICKER_ROUTE: &str = "main";
const IMAGE_URI_ARG: &str = "imageUri";

/// Navigation destination, with its string form `main` or `editor?imageUri=<uri>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Picker,
    Editor { image: ImageRef },
}

impl Route {
    pub fn parse(text: &str) -> Option<Self> {
        if text == PICKER_ROUTE {
            return Some(Self::Picker);
        }
        let query = text.strip_prefix(EDITOR_ROUTE)?.strip_prefix('?')?;
        let value = query
            .split('&')
            .find_map(|pair| pair.strip_prefix(IMAGE_URI_ARG)?.strip_prefix('='))?;
        ImageRef::parse(value).map(|image| Self::Editor { image })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Picker => f.write_str(PICKER_ROUTE),
            Self::Editor { image } => write!(f, "{EDITOR_ROUTE}?{IMAGE_URI_ARG}={image}"),
        }
    }
}

enum Screen {
    Picker(PickerScreen),
    Editor(Box<EditorScreen>),
}

/// Where a picked gallery file goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GalleryTarget {
    OpenEditor,
    ReplaceInEditor,
}

enum NativeDialog {
    Gallery {
        dialog: FileDialog,
        target: GalleryTarget,
    },
}

pub struct PicChangerApp {
    component: AppComponent,
    screen: Screen,
    route: Route,
    toasts: Toasts,
    active_dialog: Option<NativeDialog>,
    last_image_dir: Option<PathBuf>,
    exit_requested: bool,
}

impl PicChangerApp {
    pub fn new(component: AppComponent) -> Self {
        let screen = Screen::Picker(PickerScreen::new(
            component.camera.clone(),
            component.inject(),
        ));
        Self {
            component,
            screen,
            route: Route::Picker,
            toasts: Toasts::default(),
            active_dialog: None,
            last_image_dir: None,
            exit_requested: false,
        }
    }

    /// Create the app and navigate to `initial_route` when given.
    pub fn new_with_initial_route(component: AppComponent, initial_route: Option<Route>) -> Self {
        let mut app = Self::new(component);
        if let Some(route) = initial_route {
            if let Route::Editor { image } = &route {
                app.remember_image_dir_from_path(&image.to_path());
            }
            app.navigate(route);
        }
        app
    }

    pub const fn route(&self) -> &Route {
        &self.route
    }

    fn navigate(&mut self, route: Route) {
        log::debug!("navigate to {route}");
        self.active_dialog = None;
        self.screen = match &route {
            Route::Picker => Screen::Picker(PickerScreen::new(
                self.component.camera.clone(),
                self.component.inject(),
            )),
            Route::Editor { image } => Screen::Editor(Box::new(EditorScreen::new(
                self.component.inject(),
                &self.component.config,
                image.clone(),
            ))),
        };
        self.route = route;
    }

    fn remember_image_dir_from_path(&mut self, path: &Path) {
        let dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        self.last_image_dir = Some(dir);
    }

    /// Route a file chosen in the gallery dialog.
    fn handle_gallery_pick(&mut self, path: &Path, target: GalleryTarget) {
        self.remember_image_dir_from_path(path);
        let image = ImageRef::from_path(path);
        if target == GalleryTarget::ReplaceInEditor
            && let Screen::Editor(editor) = &mut self.screen
        {
            editor.replace_image(image.clone());
            self.route = Route::Editor { image };
            return;
        }
        self.navigate(Route::Editor { image });
    }

    fn poll_screen(&mut self) {
        match &mut self.screen {
            Screen::Picker(picker) => {
                if let Some(image) = picker.poll(&mut self.toasts) {
                    self.navigate(Route::Editor { image });
                }
            }
            Screen::Editor(editor) => {
                editor.poll(&mut self.toasts);
                let current = editor.current();
                if !matches!(&self.route, Route::Editor { image } if image == current) {
                    self.route = Route::Editor {
                        image: current.clone(),
                    };
                }
            }
        }
    }

    fn is_busy(&self) -> bool {
        match &self.screen {
            Screen::Picker(picker) => picker.is_busy(),
            Screen::Editor(editor) => editor.is_loading() || editor.crop.is_some(),
        }
    }

    fn handle_hotkeys(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() || self.active_dialog.is_some() {
            return;
        }
        // Ctrl/Cmd + O: open image
        if ctx.input(|i| i.key_pressed(Key::O) && i.modifiers.command) {
            let target = match self.screen {
                Screen::Picker(_) => GalleryTarget::OpenEditor,
                Screen::Editor(_) => GalleryTarget::ReplaceInEditor,
            };
            self.open_gallery_dialog(target);
        }
        if let Screen::Editor(editor) = &mut self.screen {
            // Ctrl/Cmd + S: save a copy
            if editor.crop.is_none() && ctx.input(|i| i.key_pressed(Key::S) && i.modifiers.command)
            {
                editor.save(&mut self.toasts);
            }
            // Esc: leave the crop tool
            if editor.crop.is_some() && ctx.input(|i| i.key_pressed(Key::Escape)) {
                editor.cancel_crop();
            }
        }
    }

    fn drive_dialog(&mut self, ctx: &Context) {
        let mut close_dialog = false;
        let mut picked: Option<(PathBuf, GalleryTarget)> = None;
        if let Some(NativeDialog::Gallery { dialog, target }) = self.active_dialog.as_mut() {
            dialog.update(ctx);
            if let Some(path) = dialog.take_picked() {
                picked = Some((path, *target));
                close_dialog = true;
            } else {
                match dialog.state() {
                    DialogState::Cancelled | DialogState::Closed => close_dialog = true,
                    _ => {}
                }
            }
        }
        if close_dialog {
            self.active_dialog = None;
        }
        if let Some((path, target)) = picked {
            self.handle_gallery_pick(&path, target);
        }
    }
}

impl eframe::App for PicChangerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_screen();
        self.handle_hotkeys(ctx);

        if matches!(self.screen, Screen::Picker(_)) {
            self.ui_picker(ctx);
        } else {
            self.ui_editor(ctx);
        }
        self.drive_dialog(ctx);

        let now = Instant::now();
        self.toasts.prune(now);
        ui::toasts::show(ctx, &self.toasts);
        if let Some(expiry) = self.toasts.next_expiry() {
            ctx.request_repaint_after(expiry.saturating_duration_since(now));
        }
        if self.is_busy() {
            ctx.request_repaint();
        }

        if self.exit_requested {
            log::info!("exit requested");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraDevice;
    use crate::config::AppConfig;
    use crate::image::ColorFilter;
    use std::sync::Arc;
    use testing::{FakeCamera, poll_until, test_storage};

    fn app_in(root: &Path) -> PicChangerApp {
        let mut config = AppConfig::default();
        config.cache_dir = Some(root.join("cache"));
        let camera: Arc<dyn CameraDevice> = Arc::new(FakeCamera::granted());
        let component =
            AppComponent::with_services(config, test_storage(&root.join("Pictures")), camera);
        PicChangerApp::new(component)
    }

    fn seed(root: &Path, name: &str) -> PathBuf {
        let path = root.join(name);
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 200, 30, 255]))
            .save(&path)
            .expect("seed");
        path
    }

    #[test]
    fn route_strings_round_trip() {
        let image = ImageRef::from_path(Path::new("/photos/a b.jpg"));
        let route = Route::Editor {
            image: image.clone(),
        };
        let text = route.to_string();
        assert_eq!(text, format!("editor?imageUri={image}"));
        assert_eq!(Route::parse(&text), Some(route));
        assert_eq!(Route::parse("main"), Some(Route::Picker));
        assert_eq!(Route::parse("editor"), None);
        assert_eq!(Route::parse("editor?other=1"), None);
        assert_eq!(Route::parse("settings"), None);
    }

    #[test]
    fn starts_on_picker_unless_given_an_image() {
        let dir = tempfile::tempdir().expect("temp dir");
        let app = app_in(dir.path());
        assert_eq!(app.route(), &Route::Picker);

        let path = seed(dir.path(), "start.png");
        let route = Route::Editor {
            image: ImageRef::from_path(&path),
        };
        let component = app.component.clone();
        let app = PicChangerApp::new_with_initial_route(component, Some(route.clone()));
        assert_eq!(app.route(), &route);
        assert_eq!(app.last_image_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn gallery_pick_from_picker_opens_editor() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = app_in(dir.path());
        let path = seed(dir.path(), "pick.png");
        app.handle_gallery_pick(&path, GalleryTarget::OpenEditor);
        assert!(matches!(app.screen, Screen::Editor(_)));
        assert_eq!(
            app.route(),
            &Route::Editor {
                image: ImageRef::from_path(&path)
            }
        );
    }

    #[test]
    fn gallery_pick_in_editor_replaces_image_and_resets_filter() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = app_in(dir.path());
        let first = seed(dir.path(), "first.png");
        let second = seed(dir.path(), "second.png");
        app.handle_gallery_pick(&first, GalleryTarget::OpenEditor);
        let ready = poll_until(|| {
            app.poll_screen();
            match &app.screen {
                Screen::Editor(editor) => editor.displayed().map(|_| ()),
                Screen::Picker(_) => None,
            }
        });
        assert!(ready.is_some());
        if let Screen::Editor(editor) = &mut app.screen {
            editor.select_filter(ColorFilter::Red);
        }

        app.handle_gallery_pick(&second, GalleryTarget::ReplaceInEditor);
        let Screen::Editor(editor) = &app.screen else {
            panic!("expected editor");
        };
        assert_eq!(editor.selection(), ColorFilter::Normal);
        assert_eq!(editor.current(), &ImageRef::from_path(&second));
    }

    #[test]
    fn captured_photo_navigates_to_editor() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut app = app_in(dir.path());
        if let Screen::Picker(picker) = &mut app.screen {
            picker.take_photo(&mut app.toasts);
        }
        let opened = poll_until(|| {
            app.poll_screen();
            matches!(app.route(), Route::Editor { .. }).then_some(())
        });
        assert!(opened.is_some());
    }
}
