use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::util::location::SourceLocation;

/// A panic that escaped a test body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
    /// Where the panic was raised, when the hook saw it.
    pub location: Option<SourceLocation>,
}

thread_local! {
    static IN_TEST_BODY: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC_AT: RefCell<Option<SourceLocation>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Install the process-wide hook once.
///
/// Panics raised on a thread that is inside [`catch`] are recorded silently;
/// everything else goes to whichever hook was installed before.
fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_TEST_BODY.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| SourceLocation::new(l.file(), l.line()));
                LAST_PANIC_AT.with_borrow_mut(|slot| *slot = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Convert a panic payload into a string.
///
/// Covers the payloads produced by `panic!`; anything else becomes a placeholder.
pub fn payload_as_string(err: Box<dyn Any + Send + 'static>) -> String {
    err.downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|err| err.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}

/// Run `f`, turning a panic into a [`Fault`] instead of unwinding further.
pub fn catch<F: FnOnce()>(f: F) -> Result<(), Fault> {
    install_hook();
    LAST_PANIC_AT.with_borrow_mut(|slot| *slot = None);

    let was_inside = IN_TEST_BODY.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    IN_TEST_BODY.with(|flag| flag.set(was_inside));

    result.map_err(|payload| Fault {
        message: payload_as_string(payload),
        location: LAST_PANIC_AT.with_borrow_mut(Option::take),
    })
}
