use std::sync::Once;

static INIT: Once = Once::new();

/// Install the `color_eyre` report handler and an `env_logger` backend.
///
/// Safe to call from every context creation; only the first call has an effect.
/// Hosts that already installed a `log` backend can skip this entirely.
pub fn init() {
    INIT.call_once(|| {
        if let Err(e) = color_eyre::install() {
            eprintln!("glove: failed to install eyre handler: {e}");
        }
        // A host application may have installed its own logger already
        let _ = env_logger::try_init();
        log::debug!("glove logging initialized");
    });
}
