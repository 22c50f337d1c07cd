use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use crate::model::{Notice, NoticeLevel};

/// Modal dialogs shown from the UI thread.
pub trait Dialogs {
    /// Blocks until the user dismisses the message.
    fn show(&self, notice: &Notice);
    /// `None` when the user cancels.
    fn pick_folder(&self, start: &str) -> Option<PathBuf>;
}

/// Native dialogs via rfd.
pub struct NativeDialogs;

impl Dialogs for NativeDialogs {
    fn show(&self, notice: &Notice) {
        show_message(notice);
    }

    fn pick_folder(&self, start: &str) -> Option<PathBuf> {
        let mut dialog = FileDialog::new();
        if Path::new(start).is_dir() {
            dialog = dialog.set_directory(start);
        }
        dialog.pick_folder()
    }
}

/// Also used before the main window exists.
pub fn show_message(notice: &Notice) {
    let level = match notice.level {
        NoticeLevel::Info => MessageLevel::Info,
        NoticeLevel::Warning => MessageLevel::Warning,
        NoticeLevel::Error => MessageLevel::Error,
    };
    MessageDialog::new()
        .set_level(level)
        .set_title(&notice.title)
        .set_description(&notice.body)
        .set_buttons(MessageButtons::Ok)
        .show();
}
