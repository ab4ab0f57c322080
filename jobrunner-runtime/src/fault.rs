//! Panic isolation for job bodies.
//!
//! A chaining panic hook records the backtrace at the panic site, but only for
//! panics raised while a job body is executing on the current thread. The
//! boundary then hands message and backtrace to the caller for logging.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static INSIDE_JOB: Cell<bool> = const { Cell::new(false) };
    static PANIC_TRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A panic caught at the job boundary
#[derive(Debug)]
pub(crate) struct Fault {
    pub(crate) message: String,
    pub(crate) backtrace: Option<Backtrace>,
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if INSIDE_JOB.with(Cell::get) {
                PANIC_TRACE.with(|t| *t.borrow_mut() = Some(Backtrace::force_capture()));
            }
            previous(info);
        }));
    });
}

/// Run `f`, converting a panic into a [`Fault`]
pub(crate) fn catch<F: FnOnce()>(f: F) -> Result<(), Fault> {
    install_hook();

    INSIDE_JOB.with(|flag| flag.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    INSIDE_JOB.with(|flag| flag.set(false));

    outcome.map_err(|payload| Fault {
        message: panic_message(payload.as_ref()),
        backtrace: PANIC_TRACE.with(|t| t.borrow_mut().take()),
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
