/*
 * winctl: typed wrappers over native Win32 windows and controls.
 *
 * A `Session` carries the per-process UI state (module instance, font, DPI,
 * ID allocators). Windows and controls are declared against it, handlers are
 * attached through per-window event tables, and the native objects come into
 * existence when the parent window is created. Resize layout, DPI arithmetic,
 * the handle registry and the cross-thread task queue are plain Rust and
 * build and test on every platform; everything touching Win32 is compiled on
 * Windows only.
 */
pub mod config;
pub mod dpi;
pub mod error;
pub(crate) mod events;
pub(crate) mod ids;
pub mod layout;
pub(crate) mod registry;
pub mod types;
pub(crate) mod ui_thread;

#[cfg(target_os = "windows")]
pub mod controls;
#[cfg(target_os = "windows")]
pub mod file;
#[cfg(target_os = "windows")]
pub mod session;
#[cfg(target_os = "windows")]
pub(crate) mod subclass;
#[cfg(target_os = "windows")]
pub mod traits;
#[cfg(target_os = "windows")]
pub(crate) mod window_common;
#[cfg(target_os = "windows")]
pub mod window_dialog;
#[cfg(target_os = "windows")]
pub mod window_main;
#[cfg(target_os = "windows")]
pub mod window_modal;

pub use config::SessionConfig;
pub use dpi::Dpi;
pub use error::{PlatformError, Result as PlatformResult};
pub use layout::PartWidth;
pub use types::{ControlId, Point, Rect, ResizePolicy, Size, WmArgs};

#[cfg(target_os = "windows")]
pub use controls::{
    Button, ButtonOpts, CheckBox, CheckBoxOpts, ComboBox, ComboBoxOpts, Edit, EditOpts, Label,
    LabelOpts, ListView, ListViewChange, ListViewOpts, ProgressBar, ProgressBarOpts, RadioButton,
    RadioGroup, RadioGroupOpts, StatusBar, StatusBarOpts, StatusBarPart, Tab, TabItem, TabOpts,
    TextAlign, TreeView, TreeViewItem, TreeViewOpts,
};
#[cfg(target_os = "windows")]
pub use file::{File, FileAccess, FileMapped};
#[cfg(target_os = "windows")]
pub use session::{Session, UiFont};
#[cfg(target_os = "windows")]
pub use traits::{Child, Focusable, Parent, TextControl, Window};
#[cfg(target_os = "windows")]
pub use window_common::UiThreadHandle;
#[cfg(target_os = "windows")]
pub use window_dialog::WindowDialog;
#[cfg(target_os = "windows")]
pub use window_main::{WindowMain, WindowMainOpts};
#[cfg(target_os = "windows")]
pub use window_modal::{WindowModal, WindowModalOpts};
