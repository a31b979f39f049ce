//! Raw `td_json_client` bindings and the endpoint wrapper around them.

use std::ffi::{c_char, c_double, c_void, CStr, CString};
use std::time::Duration;

use crate::endpoint::NativeEndpoint;

#[link(name = "tdjson")]
extern "C" {
    fn td_json_client_create() -> *mut c_void;
    fn td_json_client_send(client: *mut c_void, request: *const c_char);
    fn td_json_client_receive(client: *mut c_void, timeout: c_double) -> *const c_char;
    fn td_json_client_destroy(client: *mut c_void);
}

/// Owns one `td_json_client` handle. The raw pointer never leaves this type;
/// dropping the endpoint destroys the native client.
pub struct TdJsonEndpoint {
    handle: *mut c_void,
}

// td_json_client_send may be called from any thread; td_json_client_receive
// from at most one thread at a time. Client routes all receives through its
// single update loop, which satisfies the second half.
unsafe impl Send for TdJsonEndpoint {}
unsafe impl Sync for TdJsonEndpoint {}

impl TdJsonEndpoint {
    pub fn create() -> Self {
        Self {
            handle: unsafe { td_json_client_create() },
        }
    }
}

impl NativeEndpoint for TdJsonEndpoint {
    fn send(&self, request: &str) {
        // serde_json output cannot contain interior NULs, so this only trips
        // on a hand-built payload; drop it rather than abort the process.
        let Ok(raw) = CString::new(request) else {
            return;
        };
        unsafe { td_json_client_send(self.handle, raw.as_ptr()) }
    }

    fn receive(&self, timeout: Duration) -> Option<String> {
        // The returned pointer is owned by TDLib and valid until the next
        // receive call on this handle, which cannot happen concurrently.
        let ptr = unsafe { td_json_client_receive(self.handle, timeout.as_secs_f64()) };
        if ptr.is_null() {
            return None;
        }
        let raw = unsafe { CStr::from_ptr(ptr) };
        Some(raw.to_string_lossy().into_owned())
    }
}

impl Drop for TdJsonEndpoint {
    fn drop(&mut self) {
        unsafe { td_json_client_destroy(self.handle) }
    }
}
