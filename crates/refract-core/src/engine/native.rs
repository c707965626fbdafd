//! Dynamic FFI binding to the native translator library.
//!
//! The library is loaded at runtime and every `Sh*` entry point is resolved
//! once, up front, into a typed function pointer. A missing symbol surfaces
//! as a startup error instead of a crash at first use.

use std::ffi::{c_char, c_int, c_void, CString};

use libloading::Library;

use super::{
    CompileOptions, CompilerHandle, EngineError, InfoKind, InputSpec, OutputDialect,
    ResourceLimits, ShaderStage, TranslatorEngine,
};

type ShInitializeFn = unsafe extern "C" fn() -> c_int;
type ShInitBuiltInResourcesFn = unsafe extern "C" fn(*mut c_void);
type ShConstructCompilerFn =
    unsafe extern "C" fn(c_int, c_int, c_int, *const c_void) -> *mut c_void;
type ShCompileFn =
    unsafe extern "C" fn(*mut c_void, *const *const c_char, c_int, c_int) -> c_int;
type ShGetInfoFn = unsafe extern "C" fn(*mut c_void, c_int, *mut usize);
type ShGetObjectCodeFn = unsafe extern "C" fn(*mut c_void, *mut c_char);
type ShGetInfoLogFn = unsafe extern "C" fn(*mut c_void, *mut c_char);
type ShFinalizeFn = unsafe extern "C" fn() -> c_int;

/// Resolve one symbol, copying the function pointer out of the library.
unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, EngineError> {
    library
        .get::<T>(name.as_bytes())
        .map(|sym| *sym)
        .map_err(|_| EngineError::MissingSymbol(name))
}

/// Translator engine backed by a shared library.
pub struct NativeEngine {
    sh_initialize: ShInitializeFn,
    sh_init_built_in_resources: ShInitBuiltInResourcesFn,
    sh_construct_compiler: ShConstructCompilerFn,
    sh_compile: ShCompileFn,
    sh_get_info: ShGetInfoFn,
    sh_get_object_code: ShGetObjectCodeFn,
    sh_get_info_log: ShGetInfoLogFn,
    sh_finalize: ShFinalizeFn,
    // Must outlive the resolved pointers; fields drop in declaration order,
    // so the library stays last.
    _library: Library,
}

impl NativeEngine {
    /// Load the translator library and resolve every entry point.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let library = unsafe { Library::new(path) }.map_err(|e| EngineError::LibraryLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        unsafe {
            Ok(Self {
                sh_initialize: symbol(&library, "ShInitialize")?,
                sh_init_built_in_resources: symbol(&library, "ShInitBuiltInResources")?,
                sh_construct_compiler: symbol(&library, "ShConstructCompiler")?,
                sh_compile: symbol(&library, "ShCompile")?,
                sh_get_info: symbol(&library, "ShGetInfo")?,
                sh_get_object_code: symbol(&library, "ShGetObjectCode")?,
                sh_get_info_log: symbol(&library, "ShGetInfoLog")?,
                sh_finalize: symbol(&library, "ShFinalize")?,
                _library: library,
            })
        }
    }
}

impl TranslatorEngine for NativeEngine {
    fn global_init(&mut self) -> Result<(), EngineError> {
        let ok = unsafe { (self.sh_initialize)() };
        if ok == 0 {
            return Err(EngineError::InitFailed);
        }
        Ok(())
    }

    fn default_limits(&mut self) -> Result<ResourceLimits, EngineError> {
        let mut limits = ResourceLimits::zeroed();
        unsafe { (self.sh_init_built_in_resources)(limits.as_mut_ptr().cast()) };
        Ok(limits)
    }

    fn construct(
        &mut self,
        stage: ShaderStage,
        spec: InputSpec,
        output: OutputDialect,
        limits: &ResourceLimits,
    ) -> Result<CompilerHandle, EngineError> {
        let raw = unsafe {
            (self.sh_construct_compiler)(
                stage.raw() as c_int,
                spec.raw() as c_int,
                output.raw() as c_int,
                limits.as_ptr().cast(),
            )
        };
        CompilerHandle::new(raw as usize).ok_or(EngineError::ConstructFailed)
    }

    fn compile_pass(
        &mut self,
        handle: CompilerHandle,
        sources: &[&str],
        options: CompileOptions,
    ) -> bool {
        // The ABI takes NUL-terminated strings; interior NULs cannot cross
        // the boundary and are stripped.
        let owned: Vec<CString> = sources
            .iter()
            .map(|s| {
                let cleaned: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
                CString::new(cleaned).unwrap_or_default()
            })
            .collect();
        let pointers: Vec<*const c_char> = owned.iter().map(|c| c.as_ptr()).collect();
        let count = c_int::try_from(pointers.len()).unwrap_or(c_int::MAX);

        let indicator = unsafe {
            (self.sh_compile)(
                handle.raw() as *mut c_void,
                pointers.as_ptr(),
                count,
                options.bits() as c_int,
            )
        };
        indicator != 0
    }

    fn query_info(&mut self, handle: CompilerHandle, kind: InfoKind) -> usize {
        let mut length: usize = 0;
        unsafe {
            (self.sh_get_info)(handle.raw() as *mut c_void, kind.raw() as c_int, &mut length);
        }
        length
    }

    fn fetch_object_code(&mut self, handle: CompilerHandle, buf: &mut [u8]) {
        if buf.is_empty() {
            return;
        }
        unsafe {
            (self.sh_get_object_code)(handle.raw() as *mut c_void, buf.as_mut_ptr().cast());
        }
    }

    fn fetch_info_log(&mut self, handle: CompilerHandle, buf: &mut [u8]) {
        if buf.is_empty() {
            return;
        }
        unsafe {
            (self.sh_get_info_log)(handle.raw() as *mut c_void, buf.as_mut_ptr().cast());
        }
    }

    fn global_finalize(&mut self) {
        unsafe {
            (self.sh_finalize)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_load_failure() {
        let result = NativeEngine::load("/nonexistent/libshtranslator.so");
        assert!(matches!(result, Err(EngineError::LibraryLoad { .. })));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn foreign_library_reports_missing_symbol() {
        // libc loads fine but carries no translator entry points.
        for candidate in ["/lib/x86_64-linux-gnu/libc.so.6", "/lib64/libc.so.6", "libc.so.6"] {
            match NativeEngine::load(candidate) {
                Err(EngineError::MissingSymbol(name)) => {
                    assert_eq!(name, "ShInitialize");
                    return;
                }
                Err(_) => {}
                Ok(_) => panic!("libc should not provide translator symbols"),
            }
        }
    }
}
