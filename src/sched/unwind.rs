use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::thread;

/// Executes `func` and captures any panic, translating it into an `Err`.
pub fn halt_unwinding<F, R>(func: F) -> thread::Result<R>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(func))
}

/// Extracts a printable message from a panic payload.
pub fn describe(payload: &(dyn Any + Send)) -> &str {
    if let Some(v) = payload.downcast_ref::<&'static str>() {
        v
    } else if let Some(v) = payload.downcast_ref::<String>() {
        v.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Aborts the process if dropped while unwinding. Forget it on the happy path.
pub struct AbortIfPanic;

impl Drop for AbortIfPanic {
    fn drop(&mut self) {
        let _ = writeln!(&mut io::stderr(), "detected unexpected panic; aborting");
        process::abort();
    }
}
