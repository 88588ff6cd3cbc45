pub(crate) mod crop;
pub(crate) mod dialogs;
pub(crate) mod editor;
pub(crate) mod icons;
pub(crate) mod picker;
pub(crate) mod toasts;
