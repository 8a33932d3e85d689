//! GDI pixel capture for the Win32 backend
//!
//! Every native handle is owned by a guard that releases it on drop, so all
//! exit paths (including early `?` returns) free what was acquired. Guards are
//! declared in acquisition order and therefore dropped in reverse:
//! selection, bitmap, memory DC, source DC.
//!
//! All functions here block and must run on the blocking pool.

use std::{mem, ptr};

use windows_sys::Win32::{
    Foundation::HWND,
    Graphics::Gdi::{
        BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
        DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, HBITMAP, HDC, HGDIOBJ, ReleaseDC,
        SRCCOPY, SelectObject,
    },
    Storage::Xps::PrintWindow,
    UI::WindowsAndMessaging::{
        GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
        SM_YVIRTUALSCREEN,
    },
};

use super::ImageBuffer;
use crate::error::{AutomationError, AutomationResult};

#[allow(clippy::upper_case_acronyms)]
type BOOL = i32;
const FALSE: BOOL = 0;

/// Renders layered and DirectComposition content (Windows 8.1+)
const PW_RENDERFULLCONTENT: u32 = 2;

/// Device context obtained with `GetDC`
struct WindowDc {
    hwnd: HWND,
    hdc: HDC,
}

impl WindowDc {
    /// DC for `hwnd`, or for the whole virtual screen when `hwnd` is null
    fn get(hwnd: HWND) -> AutomationResult<Self> {
        // SAFETY: GetDC accepts null (screen) or any window handle; a stale
        // handle yields null, which is checked below
        let hdc = unsafe { GetDC(hwnd) };
        if hdc.is_null() {
            return Err(AutomationError::platform("GetDC", "no device context"));
        }
        Ok(Self { hwnd, hdc })
    }
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        // SAFETY: hdc was returned by GetDC for this hwnd
        unsafe { ReleaseDC(self.hwnd, self.hdc) };
    }
}

/// Memory DC compatible with a source DC
struct MemoryDc(HDC);

impl MemoryDc {
    fn compatible(source: &WindowDc) -> AutomationResult<Self> {
        // SAFETY: source.hdc is live for the guard's lifetime
        let hdc = unsafe { CreateCompatibleDC(source.hdc) };
        if hdc.is_null() {
            return Err(AutomationError::platform("CreateCompatibleDC", "returned null"));
        }
        Ok(Self(hdc))
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        // SAFETY: created by CreateCompatibleDC and not yet deleted
        unsafe { DeleteDC(self.0) };
    }
}

/// Device-dependent bitmap
struct Bitmap(HBITMAP);

impl Bitmap {
    fn compatible(source: &WindowDc, width: i32, height: i32) -> AutomationResult<Self> {
        // SAFETY: source.hdc is live; dimensions were validated by the caller
        let bitmap = unsafe { CreateCompatibleBitmap(source.hdc, width, height) };
        if bitmap.is_null() {
            return Err(AutomationError::platform(
                "CreateCompatibleBitmap",
                format!("cannot allocate {width}x{height} bitmap"),
            ));
        }
        Ok(Self(bitmap))
    }
}

impl Drop for Bitmap {
    fn drop(&mut self) {
        // SAFETY: the bitmap is deselected before this guard drops
        unsafe { DeleteObject(self.0 as HGDIOBJ) };
    }
}

/// Bitmap selected into a memory DC; restores the previous object on drop
struct Selection<'a> {
    dc: &'a MemoryDc,
    previous: HGDIOBJ,
}

impl<'a> Selection<'a> {
    fn select(dc: &'a MemoryDc, bitmap: &Bitmap) -> AutomationResult<Self> {
        // SAFETY: both handles are live for the selection's lifetime
        let previous = unsafe { SelectObject(dc.0, bitmap.0 as HGDIOBJ) };
        if previous.is_null() {
            return Err(AutomationError::platform("SelectObject", "returned null"));
        }
        Ok(Self { dc, previous })
    }
}

impl Drop for Selection<'_> {
    fn drop(&mut self) {
        // SAFETY: previous was returned by SelectObject on this DC
        unsafe { SelectObject(self.dc.0, self.previous) };
    }
}

/// Virtual screen bounds as (left, top, width, height)
pub(crate) fn virtual_screen_bounds() -> (i32, i32, i32, i32) {
    // SAFETY: GetSystemMetrics has no preconditions
    unsafe {
        (
            GetSystemMetrics(SM_XVIRTUALSCREEN),
            GetSystemMetrics(SM_YVIRTUALSCREEN),
            GetSystemMetrics(SM_CXVIRTUALSCREEN),
            GetSystemMetrics(SM_CYVIRTUALSCREEN),
        )
    }
}

fn check_size(width: i32, height: i32) -> AutomationResult<()> {
    if width <= 0 || height <= 0 {
        return Err(AutomationError::platform(
            "capture",
            format!("empty capture area {width}x{height}"),
        ));
    }
    Ok(())
}

/// Copies a deselected bitmap into a top-down BGRA buffer
fn read_pixels(dc: &WindowDc, bitmap: &Bitmap, width: i32, height: i32) -> AutomationResult<ImageBuffer> {
    // SAFETY: BITMAPINFO is plain data; all-zero is a valid starting state
    let mut info: BITMAPINFO = unsafe { mem::zeroed() };
    info.bmiHeader = BITMAPINFOHEADER {
        biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
        biWidth: width,
        // Negative height requests top-down rows
        biHeight: -height,
        biPlanes: 1,
        biBitCount: 32,
        biCompression: BI_RGB,
        biSizeImage: 0,
        biXPelsPerMeter: 0,
        biYPelsPerMeter: 0,
        biClrUsed: 0,
        biClrImportant: 0,
    };

    let mut pixels = vec![0u8; width as usize * height as usize * 4];

    // SAFETY: the buffer holds height rows of width 32-bit pixels, matching
    // the header; the bitmap is not selected into any DC
    let rows = unsafe {
        GetDIBits(
            dc.hdc,
            bitmap.0,
            0,
            height as u32,
            pixels.as_mut_ptr().cast(),
            &mut info,
            DIB_RGB_COLORS,
        )
    };
    if rows == 0 {
        return Err(AutomationError::platform("GetDIBits", "no scan lines copied"));
    }

    ImageBuffer::from_bgra(width as u32, height as u32, pixels)
}

/// Blits a rectangle of the screen into an image
///
/// Coordinates are virtual-screen coordinates; the primary monitor's top-left
/// corner is (0, 0).
pub(crate) fn capture_screen_area(x: i32, y: i32, width: i32, height: i32) -> AutomationResult<ImageBuffer> {
    check_size(width, height)?;

    let screen = WindowDc::get(ptr::null_mut())?;
    let memory = MemoryDc::compatible(&screen)?;
    let bitmap = Bitmap::compatible(&screen, width, height)?;

    {
        let _selection = Selection::select(&memory, &bitmap)?;
        // SAFETY: both DCs are live; the bitmap is selected into `memory`
        let ok = unsafe { BitBlt(memory.0, 0, 0, width, height, screen.hdc, x, y, SRCCOPY) };
        if ok == FALSE {
            return Err(AutomationError::platform("BitBlt", "screen copy failed"));
        }
    }

    read_pixels(&screen, &bitmap, width, height)
}

/// Renders a window's full content without focusing or showing it
pub(crate) fn capture_window_content(hwnd: HWND, width: i32, height: i32) -> AutomationResult<ImageBuffer> {
    check_size(width, height)?;

    let window = WindowDc::get(hwnd)?;
    let memory = MemoryDc::compatible(&window)?;
    let bitmap = Bitmap::compatible(&window, width, height)?;

    {
        let _selection = Selection::select(&memory, &bitmap)?;
        // SAFETY: hwnd produced `window`; the bitmap is selected into `memory`
        let ok = unsafe { PrintWindow(hwnd, memory.0, PW_RENDERFULLCONTENT) };
        if ok == FALSE {
            return Err(AutomationError::platform("PrintWindow", "window did not render"));
        }
    }

    read_pixels(&window, &bitmap, width, height)
}
