//! Interface index → name resolution

use std::collections::HashMap;

/// Maps kernel interface indices to names
pub trait InterfaceResolver {
    /// Name of the interface with `index`, or `None` if it does not exist
    /// (anymore)
    fn name_of(&self, index: u32) -> Option<String>;
}

/// Resolves names through the kernel with `if_indextoname(3)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[cfg(target_os = "linux")]
impl InterfaceResolver for SystemResolver {
    fn name_of(&self, index: u32) -> Option<String> {
        let mut name = [0 as libc::c_char; libc::IF_NAMESIZE];
        // SAFETY: `name` is IF_NAMESIZE bytes, the size if_indextoname requires.
        let ptr = unsafe { libc::if_indextoname(index, name.as_mut_ptr()) };
        if ptr.is_null() {
            return None;
        }
        // SAFETY: on success the buffer holds a NUL-terminated name.
        let name = unsafe { std::ffi::CStr::from_ptr(name.as_ptr()) };
        Some(name.to_string_lossy().into_owned())
    }
}

#[cfg(not(target_os = "linux"))]
impl InterfaceResolver for SystemResolver {
    fn name_of(&self, _index: u32) -> Option<String> {
        None
    }
}

/// Fixed index → name table
impl InterfaceResolver for HashMap<u32, String> {
    fn name_of(&self, index: u32) -> Option<String> {
        self.get(&index).cloned()
    }
}
