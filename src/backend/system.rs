//! Backend over the system libzbar
//!
//! Handles are the native object addresses. Every accessor that hands out a
//! set or symbol takes a native reference first, matching the ownership
//! contract of [`Backend`].

use libc::{c_char, c_int, c_uint, c_ulong, c_void};

use super::Backend;
use crate::handle::RawHandle;
use crate::image::{Crop, Fourcc};

#[repr(C)]
#[allow(non_camel_case_types)]
struct zbar_image_t {
    _opaque: [u8; 0],
}

#[repr(C)]
#[allow(non_camel_case_types)]
struct zbar_image_scanner_t {
    _opaque: [u8; 0],
}

#[repr(C)]
#[allow(non_camel_case_types)]
struct zbar_symbol_set_t {
    _opaque: [u8; 0],
}

#[repr(C)]
#[allow(non_camel_case_types)]
struct zbar_symbol_t {
    _opaque: [u8; 0],
}

#[allow(non_camel_case_types)]
type zbar_image_cleanup_handler_t = unsafe extern "C" fn(image: *mut zbar_image_t);

extern "C" {
    fn zbar_image_create() -> *mut zbar_image_t;
    fn zbar_image_destroy(image: *mut zbar_image_t);
    fn zbar_image_convert(image: *const zbar_image_t, format: c_ulong) -> *mut zbar_image_t;
    fn zbar_image_get_format(image: *const zbar_image_t) -> c_ulong;
    fn zbar_image_get_sequence(image: *const zbar_image_t) -> c_uint;
    fn zbar_image_get_size(image: *const zbar_image_t, width: *mut c_uint, height: *mut c_uint);
    fn zbar_image_get_crop(
        image: *const zbar_image_t,
        x: *mut c_uint,
        y: *mut c_uint,
        width: *mut c_uint,
        height: *mut c_uint,
    );
    fn zbar_image_get_data(image: *const zbar_image_t) -> *const c_void;
    fn zbar_image_get_data_length(image: *const zbar_image_t) -> c_ulong;
    fn zbar_image_get_symbols(image: *const zbar_image_t) -> *const zbar_symbol_set_t;
    fn zbar_image_set_format(image: *mut zbar_image_t, format: c_ulong);
    fn zbar_image_set_sequence(image: *mut zbar_image_t, sequence: c_uint);
    fn zbar_image_set_size(image: *mut zbar_image_t, width: c_uint, height: c_uint);
    fn zbar_image_set_crop(
        image: *mut zbar_image_t,
        x: c_uint,
        y: c_uint,
        width: c_uint,
        height: c_uint,
    );
    fn zbar_image_set_data(
        image: *mut zbar_image_t,
        data: *const c_void,
        len: c_ulong,
        cleanup: Option<zbar_image_cleanup_handler_t>,
    );
    fn zbar_image_free_data(image: *mut zbar_image_t);

    fn zbar_image_scanner_create() -> *mut zbar_image_scanner_t;
    fn zbar_image_scanner_destroy(scanner: *mut zbar_image_scanner_t);
    fn zbar_image_scanner_set_config(
        scanner: *mut zbar_image_scanner_t,
        symbology: c_int,
        config: c_int,
        value: c_int,
    ) -> c_int;
    fn zbar_image_scanner_get_config(
        scanner: *mut zbar_image_scanner_t,
        symbology: c_int,
        config: c_int,
        value: *mut c_int,
    ) -> c_int;
    fn zbar_image_scanner_enable_cache(scanner: *mut zbar_image_scanner_t, enable: c_int);
    fn zbar_image_scanner_get_results(scanner: *const zbar_image_scanner_t)
        -> *const zbar_symbol_set_t;
    fn zbar_scan_image(scanner: *mut zbar_image_scanner_t, image: *mut zbar_image_t) -> c_int;

    fn zbar_symbol_set_ref(set: *const zbar_symbol_set_t, refs: c_int);
    fn zbar_symbol_set_get_size(set: *const zbar_symbol_set_t) -> c_int;
    fn zbar_symbol_set_first_symbol(set: *const zbar_symbol_set_t) -> *const zbar_symbol_t;

    fn zbar_symbol_ref(symbol: *const zbar_symbol_t, refs: c_int);
    fn zbar_symbol_next(symbol: *const zbar_symbol_t) -> *const zbar_symbol_t;
    fn zbar_symbol_get_type(symbol: *const zbar_symbol_t) -> c_int;
    fn zbar_symbol_get_configs(symbol: *const zbar_symbol_t) -> c_uint;
    fn zbar_symbol_get_modifiers(symbol: *const zbar_symbol_t) -> c_uint;
    fn zbar_symbol_get_data(symbol: *const zbar_symbol_t) -> *const c_char;
    fn zbar_symbol_get_data_length(symbol: *const zbar_symbol_t) -> c_uint;
    fn zbar_symbol_get_quality(symbol: *const zbar_symbol_t) -> c_int;
    fn zbar_symbol_get_count(symbol: *const zbar_symbol_t) -> c_int;
    fn zbar_symbol_get_orientation(symbol: *const zbar_symbol_t) -> c_int;
    fn zbar_symbol_get_loc_size(symbol: *const zbar_symbol_t) -> c_uint;
    fn zbar_symbol_get_loc_x(symbol: *const zbar_symbol_t, index: c_uint) -> c_int;
    fn zbar_symbol_get_loc_y(symbol: *const zbar_symbol_t, index: c_uint) -> c_int;
    fn zbar_symbol_get_components(symbol: *const zbar_symbol_t) -> *const zbar_symbol_set_t;
}

fn handle<T>(ptr: *const T) -> Option<RawHandle> {
    RawHandle::new(ptr as usize as u64)
}

fn image(h: RawHandle) -> *mut zbar_image_t {
    h.get() as usize as *mut zbar_image_t
}

fn scanner(h: RawHandle) -> *mut zbar_image_scanner_t {
    h.get() as usize as *mut zbar_image_scanner_t
}

fn set(h: RawHandle) -> *const zbar_symbol_set_t {
    h.get() as usize as *const zbar_symbol_set_t
}

fn symbol(h: RawHandle) -> *const zbar_symbol_t {
    h.get() as usize as *const zbar_symbol_t
}

/// Take a reference on a borrowed set before handing it out.
unsafe fn acquired_set(ptr: *const zbar_symbol_set_t) -> Option<RawHandle> {
    if ptr.is_null() {
        return None;
    }
    zbar_symbol_set_ref(ptr, 1);
    handle(ptr)
}

unsafe fn acquired_symbol(ptr: *const zbar_symbol_t) -> Option<RawHandle> {
    if ptr.is_null() {
        return None;
    }
    zbar_symbol_ref(ptr, 1);
    handle(ptr)
}

/// libzbar, linked at build time.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemBackend;

// SAFETY: every handle passed in was produced by this backend and is kept
// alive by the `Peer` that owns it; `&mut` access on the owning types keeps
// mutation of one native object on one thread at a time.
impl Backend for SystemBackend {
    fn image_create(&self) -> Option<RawHandle> {
        handle(unsafe { zbar_image_create() })
    }

    fn image_destroy(&self, h: RawHandle) {
        unsafe { zbar_image_destroy(image(h)) }
    }

    fn image_convert(&self, h: RawHandle, format: Fourcc) -> Option<RawHandle> {
        handle(unsafe { zbar_image_convert(image(h), format.as_u32() as c_ulong) })
    }

    fn image_format(&self, h: RawHandle) -> Fourcc {
        Fourcc::from_u32(unsafe { zbar_image_get_format(image(h)) } as u32)
    }

    fn image_set_format(&self, h: RawHandle, format: Fourcc) {
        unsafe { zbar_image_set_format(image(h), format.as_u32() as c_ulong) }
    }

    fn image_sequence(&self, h: RawHandle) -> u32 {
        unsafe { zbar_image_get_sequence(image(h)) }
    }

    fn image_set_sequence(&self, h: RawHandle, sequence: u32) {
        unsafe { zbar_image_set_sequence(image(h), sequence) }
    }

    fn image_size(&self, h: RawHandle) -> (u32, u32) {
        let (mut w, mut ht) = (0, 0);
        unsafe { zbar_image_get_size(image(h), &mut w, &mut ht) };
        (w, ht)
    }

    fn image_set_size(&self, h: RawHandle, width: u32, height: u32) {
        unsafe { zbar_image_set_size(image(h), width, height) }
    }

    fn image_crop(&self, h: RawHandle) -> Crop {
        let mut c = Crop::default();
        unsafe { zbar_image_get_crop(image(h), &mut c.x, &mut c.y, &mut c.width, &mut c.height) };
        c
    }

    fn image_set_crop(&self, h: RawHandle, crop: Crop) {
        unsafe { zbar_image_set_crop(image(h), crop.x, crop.y, crop.width, crop.height) }
    }

    fn image_data(&self, h: RawHandle) -> Vec<u8> {
        unsafe {
            let ptr = zbar_image_get_data(image(h)) as *const u8;
            let len = zbar_image_get_data_length(image(h)) as usize;
            if ptr.is_null() || len == 0 {
                return Vec::new();
            }
            std::slice::from_raw_parts(ptr, len).to_vec()
        }
    }

    fn image_set_data(&self, h: RawHandle, data: &[u8]) {
        unsafe {
            if data.is_empty() {
                zbar_image_set_data(image(h), std::ptr::null(), 0, None);
                return;
            }
            // libzbar keeps the pointer; zbar_image_free_data hands it back to free()
            let buf = libc::malloc(data.len()) as *mut u8;
            if buf.is_null() {
                tracing::warn!(len = data.len(), "could not allocate image data");
                return;
            }
            std::ptr::copy_nonoverlapping(data.as_ptr(), buf, data.len());
            zbar_image_set_data(
                image(h),
                buf as *const c_void,
                data.len() as c_ulong,
                Some(zbar_image_free_data as zbar_image_cleanup_handler_t),
            );
        }
    }

    fn image_symbols(&self, h: RawHandle) -> Option<RawHandle> {
        unsafe { acquired_set(zbar_image_get_symbols(image(h))) }
    }

    fn scanner_create(&self) -> Option<RawHandle> {
        handle(unsafe { zbar_image_scanner_create() })
    }

    fn scanner_destroy(&self, h: RawHandle) {
        unsafe { zbar_image_scanner_destroy(scanner(h)) }
    }

    fn scanner_set_config(&self, h: RawHandle, symbology: i32, option: i32, value: i32) -> bool {
        unsafe { zbar_image_scanner_set_config(scanner(h), symbology, option, value) == 0 }
    }

    fn scanner_config(&self, h: RawHandle, symbology: i32, option: i32) -> Option<i32> {
        let mut value = 0;
        let rc = unsafe { zbar_image_scanner_get_config(scanner(h), symbology, option, &mut value) };
        (rc == 0).then_some(value)
    }

    fn scanner_enable_cache(&self, h: RawHandle, enable: bool) {
        unsafe { zbar_image_scanner_enable_cache(scanner(h), c_int::from(enable)) }
    }

    fn scanner_scan(&self, h: RawHandle, img: RawHandle) -> i32 {
        unsafe { zbar_scan_image(scanner(h), image(img)) }
    }

    fn scanner_results(&self, h: RawHandle) -> Option<RawHandle> {
        unsafe { acquired_set(zbar_image_scanner_get_results(scanner(h))) }
    }

    fn symbol_set_release(&self, h: RawHandle) {
        unsafe { zbar_symbol_set_ref(set(h), -1) }
    }

    fn symbol_set_size(&self, h: RawHandle) -> i32 {
        unsafe { zbar_symbol_set_get_size(set(h)) }
    }

    fn symbol_set_first(&self, h: RawHandle) -> Option<RawHandle> {
        unsafe { acquired_symbol(zbar_symbol_set_first_symbol(set(h))) }
    }

    fn symbol_release(&self, h: RawHandle) {
        unsafe { zbar_symbol_ref(symbol(h), -1) }
    }

    fn symbol_next(&self, h: RawHandle) -> Option<RawHandle> {
        unsafe { acquired_symbol(zbar_symbol_next(symbol(h))) }
    }

    fn symbol_type(&self, h: RawHandle) -> i32 {
        unsafe { zbar_symbol_get_type(symbol(h)) }
    }

    fn symbol_configs(&self, h: RawHandle) -> u32 {
        unsafe { zbar_symbol_get_configs(symbol(h)) }
    }

    fn symbol_modifiers(&self, h: RawHandle) -> u32 {
        unsafe { zbar_symbol_get_modifiers(symbol(h)) }
    }

    fn symbol_data(&self, h: RawHandle) -> Vec<u8> {
        unsafe {
            let ptr = zbar_symbol_get_data(symbol(h)) as *const u8;
            let len = zbar_symbol_get_data_length(symbol(h)) as usize;
            if ptr.is_null() || len == 0 {
                return Vec::new();
            }
            std::slice::from_raw_parts(ptr, len).to_vec()
        }
    }

    fn symbol_quality(&self, h: RawHandle) -> i32 {
        unsafe { zbar_symbol_get_quality(symbol(h)) }
    }

    fn symbol_count(&self, h: RawHandle) -> i32 {
        unsafe { zbar_symbol_get_count(symbol(h)) }
    }

    fn symbol_orientation(&self, h: RawHandle) -> i32 {
        unsafe { zbar_symbol_get_orientation(symbol(h)) }
    }

    fn symbol_location_size(&self, h: RawHandle) -> u32 {
        unsafe { zbar_symbol_get_loc_size(symbol(h)) }
    }

    fn symbol_location_x(&self, h: RawHandle, index: u32) -> i32 {
        unsafe { zbar_symbol_get_loc_x(symbol(h), index) }
    }

    fn symbol_location_y(&self, h: RawHandle, index: u32) -> i32 {
        unsafe { zbar_symbol_get_loc_y(symbol(h), index) }
    }

    fn symbol_components(&self, h: RawHandle) -> Option<RawHandle> {
        unsafe { acquired_set(zbar_symbol_get_components(symbol(h))) }
    }
}
