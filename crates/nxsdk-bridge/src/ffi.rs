//! C ABI entry points for a natively compiled host.
//!
//! The host receives each director as an opaque `NxDirector` pointer and
//! drives it through the functions below. Every function null-checks and
//! UTF-8 checks its inputs; bad input yields the callback's safe default
//! (`true`), never a fault.

use std::ffi::{c_char, c_void, CStr, CString};

use tracing::warn;

use crate::director::DirectorRef;
use crate::host::Console;
use crate::payload::{IntfChange, RawCommand};
use crate::value::FieldValues;

// =============================================================================
// Callback codes for nxsdk_director_post_fields
// =============================================================================

pub const NX_CB_DME: u32 = 0;
pub const NX_CB_DME_DOWNLOAD_DONE: u32 = 1;
pub const NX_CB_L3_ROUTE: u32 = 2;
pub const NX_CB_VRF: u32 = 3;
pub const NX_CB_ADJ: u32 = 4;
pub const NX_CB_MAC: u32 = 5;
/// First interface callback; `NX_CB_INTF_BASE + i` carries the i-th
/// interface change kind (add/del, ipv4, ipv6, state, layer, port member,
/// vrf, vlan).
pub const NX_CB_INTF_BASE: u32 = 16;

/// Opaque director handed to the host.
pub struct NxDirector(DirectorRef);

/// One field/value pair of an event record.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NxFieldValue {
    pub field: *const c_char,
    pub value: *const c_char,
}

/// Console print callback supplied by the host for one command.
pub type NxConsoleFn = extern "C" fn(ctx: *mut c_void, text: *const c_char);

/// Boxes a director for the host. Release with [`nxsdk_director_release`].
pub fn into_raw(director: DirectorRef) -> *mut NxDirector {
    Box::into_raw(Box::new(NxDirector(director)))
}

unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

unsafe fn field_values(fields: *const NxFieldValue, len: usize) -> Option<FieldValues> {
    if len == 0 {
        return Some(Vec::new());
    }
    if fields.is_null() {
        return None;
    }
    std::slice::from_raw_parts(fields, len)
        .iter()
        .map(|fv| Some((c_str(fv.field)?.to_string(), c_str(fv.value)?.to_string())))
        .collect()
}

struct CallbackConsole {
    print: NxConsoleFn,
    ctx: *mut c_void,
}

impl Console for CallbackConsole {
    fn print_console(&self, text: &str) {
        let text = CString::new(text.replace('\0', "")).unwrap_or_default();
        (self.print)(self.ctx, text.as_ptr());
    }
}

struct NoConsole;

impl Console for NoConsole {
    fn print_console(&self, text: &str) {
        tracing::debug!(text, "Console output dropped, host supplied no console");
    }
}

// =============================================================================
// Exported C functions
// =============================================================================

/// Returns the domain code of a director, or -1 for a null pointer.
///
/// # Safety
///
/// - `director` must be null or a pointer obtained from [`into_raw`]
#[no_mangle]
pub unsafe extern "C" fn nxsdk_director_domain(director: *const NxDirector) -> i32 {
    match director.as_ref() {
        Some(d) => d.0.domain().code() as i32,
        None => -1,
    }
}

/// Releases a director the host no longer references.
///
/// # Safety
///
/// - `director` must be null or a pointer obtained from [`into_raw`] that
///   has not been released yet
#[no_mangle]
pub unsafe extern "C" fn nxsdk_director_release(director: *mut NxDirector) {
    if !director.is_null() {
        drop(Box::from_raw(director));
    }
}

/// Delivers an event record to a director.
///
/// Returns the handler's answer for boolean callbacks and `true` for the
/// others, and `true` whenever the input is invalid or does not match the
/// director's domain.
///
/// # Safety
///
/// - `director` must be null or a live pointer obtained from [`into_raw`]
/// - `fields` must be null or point to `len` valid `NxFieldValue`s whose
///   strings are null-terminated
#[no_mangle]
pub unsafe extern "C" fn nxsdk_director_post_fields(
    director: *const NxDirector,
    callback: u32,
    fields: *const NxFieldValue,
    len: usize,
) -> bool {
    let Some(NxDirector(director)) = director.as_ref() else {
        return true;
    };
    let Some(fvs) = field_values(fields, len) else {
        warn!(callback, "Null or non UTF-8 field in host record");
        return true;
    };

    match (director, callback) {
        (DirectorRef::TreeChange(d), NX_CB_DME) => {
            d.post_dme_cb(&fvs);
            true
        }
        (DirectorRef::TreeChange(d), NX_CB_DME_DOWNLOAD_DONE) => {
            let dn = fvs
                .iter()
                .find(|(f, _)| f == "dn")
                .map(|(_, v)| v.as_str())
                .unwrap_or_default();
            d.post_dme_download_done_cb(dn);
            true
        }
        (DirectorRef::Route(d), NX_CB_L3_ROUTE) => d.post_l3_route_cb(&fvs),
        (DirectorRef::Route(d), NX_CB_VRF) => d.post_vrf_cb(&fvs),
        (DirectorRef::Adjacency(d), NX_CB_ADJ) => {
            d.post_adj_cb(&fvs);
            true
        }
        (DirectorRef::Address(d), NX_CB_MAC) => d.post_mac_cb(&fvs),
        (DirectorRef::Interface(d), code) if code >= NX_CB_INTF_BASE => {
            match IntfChange::ALL.get((code - NX_CB_INTF_BASE) as usize) {
                Some(change) => d.post_intf_cb(*change, &fvs),
                None => {
                    warn!(callback, "Unknown interface change code");
                    true
                }
            }
        }
        (director, callback) => {
            warn!(domain = %director.domain(), callback, "Callback does not match director domain");
            true
        }
    }
}

/// Executes a command on a command director.
///
/// `keywords` holds `n_keywords` keyword strings present on the command
/// line; `params` holds parameter name/raw token pairs. Console output goes
/// through `console(ctx, text)` when a callback is given.
///
/// # Safety
///
/// - `director` must be null or a live pointer obtained from [`into_raw`]
/// - `name` and `line` must be null or null-terminated strings
/// - `keywords` must be null or point to `n_keywords` string pointers
/// - `params` must be null or point to `n_params` valid `NxFieldValue`s
/// - `ctx` is passed through to `console` untouched
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn nxsdk_director_post_cli(
    director: *const NxDirector,
    name: *const c_char,
    line: *const c_char,
    keywords: *const *const c_char,
    n_keywords: usize,
    params: *const NxFieldValue,
    n_params: usize,
    console: Option<NxConsoleFn>,
    ctx: *mut c_void,
) -> bool {
    let Some(NxDirector(DirectorRef::Command(director))) = director.as_ref() else {
        return true;
    };
    let Some(name) = c_str(name) else {
        return true;
    };
    let line = c_str(line).unwrap_or(name);

    let keywords: Option<Vec<String>> = if n_keywords == 0 {
        Some(Vec::new())
    } else if keywords.is_null() {
        None
    } else {
        std::slice::from_raw_parts(keywords, n_keywords)
            .iter()
            .map(|k| c_str(*k).map(str::to_string))
            .collect()
    };
    let (Some(keywords), Some(params)) = (keywords, field_values(params, n_params)) else {
        warn!(command = name, "Null or non UTF-8 command input");
        return true;
    };

    let callback_console;
    let console: &dyn Console = match console {
        Some(print) => {
            callback_console = CallbackConsole { print, ctx };
            &callback_console
        }
        None => &NoConsole,
    };

    director.post_cli_cb(&RawCommand {
        name,
        line,
        keywords: &keywords,
        params: &params,
        console,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CommandSpec, CommandTree, ParamSpec};
    use crate::director::{Director, Slot};
    use crate::domain::Domain;
    use crate::error::HandlerResult;
    use crate::handler::{CommandHandler, RouteHandler};
    use crate::host::HostHandle;
    use crate::payload::{CliCommand, L3Route};
    use parking_lot::{Mutex, RwLock};
    use std::sync::Arc;

    struct RejectAll;

    impl RouteHandler for RejectAll {
        fn on_route(&self, _route: &L3Route) -> HandlerResult<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct Threshold(Mutex<Option<i64>>);

    impl CommandHandler for Threshold {
        fn on_command(&self, cmd: &CliCommand<'_>) -> HandlerResult<bool> {
            let value = cmd.int_param("<threshold>")?;
            *self.0.lock() = Some(value);
            cmd.print_console("threshold set");
            Ok(true)
        }
    }

    fn route_director() -> (Arc<Slot<dyn RouteHandler>>, *mut NxDirector) {
        let handler: Arc<dyn RouteHandler> = Arc::new(RejectAll);
        let slot = Slot::new(Domain::RouteEvent, handler);
        slot.activate(HostHandle::from_raw(7).unwrap());
        let raw = into_raw(DirectorRef::Route(Director::new(&slot)));
        (slot, raw)
    }

    #[test]
    fn test_null_director() {
        unsafe {
            assert_eq!(nxsdk_director_domain(std::ptr::null()), -1);
            assert!(nxsdk_director_post_fields(std::ptr::null(), NX_CB_L3_ROUTE, std::ptr::null(), 0));
            nxsdk_director_release(std::ptr::null_mut());
        }
    }

    fn cstrings(items: &[&str]) -> Vec<CString> {
        items.iter().map(|s| CString::new(*s).unwrap()).collect()
    }

    fn pairs(names: &[CString], values: &[CString]) -> Vec<NxFieldValue> {
        names
            .iter()
            .zip(values.iter())
            .map(|(f, v)| NxFieldValue {
                field: f.as_ptr(),
                value: v.as_ptr(),
            })
            .collect()
    }

    #[test]
    fn test_post_route_fields() {
        let (_slot, raw) = route_director();
        let names = cstrings(&["vrf", "address", "mask_len"]);
        let values = cstrings(&["default", "10.0.0.0", "8"]);
        let fields = pairs(&names, &values);

        unsafe {
            assert_eq!(nxsdk_director_domain(raw), Domain::RouteEvent.code() as i32);
            assert!(!nxsdk_director_post_fields(raw, NX_CB_L3_ROUTE, fields.as_ptr(), fields.len()));
            // wrong callback for the domain
            assert!(nxsdk_director_post_fields(raw, NX_CB_MAC, fields.as_ptr(), fields.len()));
            // null field pointer
            let broken = [NxFieldValue {
                field: std::ptr::null(),
                value: values[0].as_ptr(),
            }];
            assert!(nxsdk_director_post_fields(raw, NX_CB_L3_ROUTE, broken.as_ptr(), 1));
            nxsdk_director_release(raw);
        }
    }

    static PRINTED: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());

    extern "C" fn record(_ctx: *mut c_void, text: *const c_char) {
        let text = unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned();
        PRINTED.lock().push(text);
    }

    #[test]
    fn test_post_cli() {
        let mut tree = CommandTree::new();
        tree.add(
            CommandSpec::config("set_port_bw_threshold_cmd", "port bw threshold <threshold>")
                .param("<threshold>", "Threshold", ParamSpec::integer(1, 100)),
        )
        .unwrap();

        let handler = Arc::new(Threshold::default());
        let dyn_handler: Arc<dyn CommandHandler> = handler.clone();
        let slot = Slot::new(Domain::Command, dyn_handler);
        slot.activate(HostHandle::from_raw(3).unwrap());
        let raw = into_raw(DirectorRef::Command(Director::with_commands(
            &slot,
            Arc::new(RwLock::new(tree)),
        )));

        let strings = cstrings(&[
            "set_port_bw_threshold_cmd",
            "port bw threshold 75",
            "threshold",
            "<threshold>",
            "75",
        ]);
        let keywords = [strings[2].as_ptr()];
        let params = pairs(&strings[3..4], &strings[4..5]);
        unsafe {
            assert!(nxsdk_director_post_cli(
                raw,
                strings[0].as_ptr(),
                strings[1].as_ptr(),
                keywords.as_ptr(),
                keywords.len(),
                params.as_ptr(),
                params.len(),
                Some(record),
                std::ptr::null_mut(),
            ));
            nxsdk_director_release(raw);
        }
        assert_eq!(*handler.0.lock(), Some(75));
        assert!(PRINTED.lock().iter().any(|line| line == "threshold set"));
    }
}
