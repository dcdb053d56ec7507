//! `export_bridge_fn!`: one unmangled `extern "C"` symbol per bridge method.

/// Export `$name` as an unmangled C symbol that forwards its arguments, in
/// order, to `BRIDGE.$method` and returns the result unchanged.
///
/// ```ignore
/// export_bridge_fn! {
///     /// Docs land on the exported symbol.
///     fn hostalloc_free(ptr: *mut c_void) => free;
/// }
/// ```
macro_rules! export_bridge_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $argty:ty),* $(,)?) $(-> $ret:ty)? => $method:ident;
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name($($arg: $argty),*) $(-> $ret)? {
            // SAFETY: the C caller upholds the contract documented on the symbol.
            unsafe { $crate::alloc_abi::BRIDGE.$method($($arg),*) }
        }
    };
}

pub(crate) use export_bridge_fn;
