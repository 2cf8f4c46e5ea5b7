use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Returns a flag raised by the first of `signals`. Another signal arriving while
/// the flag is still raised ends the process with status 1, so a blocked prompt
/// can always be left with a second Ctrl-C.
pub fn register(signals: &[i32]) -> io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    for signal in signals {
        // handlers run in registration order: check for shutdown before raising the flag
        signal_hook::flag::register_conditional_shutdown(*signal, 1, flag.clone())?;
        signal_hook::flag::register(*signal, flag.clone())?;
    }
    Ok(flag)
}
