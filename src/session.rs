/*
 * The session owns every piece of state that would otherwise be a process
 * global: the module instance, the control and subclass ID counters, the
 * system DPI and the cached UI font. Windows and controls receive a
 * `Session` at construction and keep a cheap clone of it.
 *
 * Like every window handle, a session is bound to the thread that created it.
 */
use crate::config::SessionConfig;
use crate::dpi::Dpi;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::ids::{ControlIdAllocator, SubclassIdAllocator};
use crate::types::{ControlId, Size};

use std::cell::RefCell;
use std::ffi::c_void;
use std::rc::Rc;

use windows::Win32::{
    Foundation::{HINSTANCE, SIZE},
    Graphics::Gdi::{
        CreateFontIndirectW, DeleteObject, GetDC, GetDeviceCaps, GetTextExtentPoint32W, HFONT,
        LOGPIXELSX, LOGPIXELSY, ReleaseDC, SelectObject,
    },
    System::LibraryLoader::GetModuleHandleW,
    UI::{
        Controls::{
            ICC_BAR_CLASSES, ICC_LISTVIEW_CLASSES, ICC_PROGRESS_CLASS, ICC_STANDARD_CLASSES,
            ICC_TAB_CLASSES, ICC_TREEVIEW_CLASSES, INITCOMMONCONTROLSEX, InitCommonControlsEx,
        },
        HiDpi::GetDpiForSystem,
        WindowsAndMessaging::{
            NONCLIENTMETRICSW, SPI_GETNONCLIENTMETRICS, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
            SystemParametersInfoW,
        },
    },
};

/// The system message font, released when the last session clone drops.
#[derive(Debug)]
pub struct UiFont {
    hfont: HFONT,
}

impl UiFont {
    fn from_system() -> PlatformResult<Self> {
        let mut ncm = NONCLIENTMETRICSW {
            cbSize: std::mem::size_of::<NONCLIENTMETRICSW>() as u32,
            ..Default::default()
        };
        unsafe {
            SystemParametersInfoW(
                SPI_GETNONCLIENTMETRICS,
                ncm.cbSize,
                Some(&mut ncm as *mut NONCLIENTMETRICSW as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
            .map_err(|e| {
                PlatformError::win32_call("SystemParametersInfoW(SPI_GETNONCLIENTMETRICS)", e.message())
            })?;
            let hfont = CreateFontIndirectW(&ncm.lfMessageFont);
            if hfont.is_invalid() {
                return Err(PlatformError::win32_call(
                    "CreateFontIndirectW",
                    "system message font could not be created",
                ));
            }
            Ok(Self { hfont })
        }
    }

    pub fn hfont(&self) -> HFONT {
        self.hfont
    }
}

impl Drop for UiFont {
    fn drop(&mut self) {
        if !self.hfont.is_invalid() {
            unsafe {
                let _ = DeleteObject(self.hfont.into());
            }
            log::debug!("UiFont: system font released.");
        }
    }
}

#[derive(Debug)]
struct SessionInner {
    config: SessionConfig,
    h_instance: HINSTANCE,
    dpi: Dpi,
    font: UiFont,
    control_ids: RefCell<ControlIdAllocator>,
    subclass_ids: RefCell<SubclassIdAllocator>,
}

#[derive(Debug, Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

fn query_system_dpi(reference: u32) -> Dpi {
    let dpi = unsafe { GetDpiForSystem() };
    if dpi != 0 {
        return Dpi::new(dpi, dpi).with_reference(reference);
    }
    // Pre-Windows 10 fallback.
    unsafe {
        let hdc = GetDC(None);
        let x = GetDeviceCaps(Some(hdc), LOGPIXELSX) as u32;
        let y = GetDeviceCaps(Some(hdc), LOGPIXELSY) as u32;
        ReleaseDC(None, hdc);
        Dpi::new(x, y).with_reference(reference)
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> PlatformResult<Self> {
        config.validate()?;
        let h_instance: HINSTANCE = unsafe { GetModuleHandleW(None) }
            .map_err(|e| PlatformError::InitializationFailed(format!("GetModuleHandleW: {e:?}")))?
            .into();

        let icc = INITCOMMONCONTROLSEX {
            dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
            dwICC: ICC_STANDARD_CLASSES
                | ICC_BAR_CLASSES
                | ICC_TAB_CLASSES
                | ICC_LISTVIEW_CLASSES
                | ICC_TREEVIEW_CLASSES
                | ICC_PROGRESS_CLASS,
        };
        if !unsafe { InitCommonControlsEx(&icc) }.as_bool() {
            return Err(PlatformError::InitializationFailed(
                "InitCommonControlsEx failed".to_string(),
            ));
        }

        let dpi = query_system_dpi(config.reference_dpi);
        let font = UiFont::from_system()?;
        log::debug!(
            "Session: '{}' initialized, DPI {}x{} (reference {}).",
            config.app_name,
            dpi.x,
            dpi.y,
            dpi.reference
        );

        Ok(Self {
            inner: Rc::new(SessionInner {
                control_ids: RefCell::new(ControlIdAllocator::new(config.first_control_id)),
                subclass_ids: RefCell::new(SubclassIdAllocator::new(config.first_subclass_id)),
                config,
                h_instance,
                dpi,
                font,
            }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn h_instance(&self) -> HINSTANCE {
        self.inner.h_instance
    }

    pub fn dpi(&self) -> Dpi {
        self.inner.dpi
    }

    pub fn ui_font(&self) -> &UiFont {
        &self.inner.font
    }

    pub fn next_control_id(&self) -> PlatformResult<ControlId> {
        self.inner.control_ids.borrow_mut().next_id()
    }

    pub fn next_subclass_id(&self) -> usize {
        self.inner.subclass_ids.borrow_mut().next_id()
    }

    /*
     * Measures `text` in the session font. Multi-line text reports the widest
     * line and the summed line heights; an empty line still counts one line.
     */
    pub fn measure_text(&self, text: &str) -> PlatformResult<Size> {
        unsafe {
            let hdc = GetDC(None);
            if hdc.is_invalid() {
                return Err(PlatformError::win32_call("GetDC", "screen DC unavailable"));
            }
            let previous = SelectObject(hdc, self.inner.font.hfont().into());
            let mut total = Size::default();
            let mut failed = None;
            for line in text.split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                // Measuring "" yields zero height, so use a blank.
                let wide: Vec<u16> = if line.is_empty() { " " } else { line }
                    .encode_utf16()
                    .collect();
                let mut sz = SIZE::default();
                if !GetTextExtentPoint32W(hdc, &wide, &mut sz).as_bool() {
                    failed = Some(line.to_string());
                    break;
                }
                total.cx = total.cx.max(if line.is_empty() { 0 } else { sz.cx });
                total.cy += sz.cy;
            }
            SelectObject(hdc, previous);
            ReleaseDC(None, hdc);
            match failed {
                Some(line) => Err(PlatformError::win32_call(
                    "GetTextExtentPoint32W",
                    format!("text {line:?}"),
                )),
                None => Ok(total),
            }
        }
    }
}
