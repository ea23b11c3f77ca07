mod app;
mod data;
mod dialogue;
mod field;
mod novel;
mod orchestrator;
mod save;
mod state;
mod title;
mod ui;

#[cfg(test)]
mod test_support;

use std::backtrace::Backtrace;
use std::process::ExitCode;

use tracing::error;

fn main() -> ExitCode {
    install_panic_hook();
    app::run()
}

/// Logs the panic with a captured backtrace before the default hook runs.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = Backtrace::force_capture();
        error!(panic = %info, backtrace = %backtrace, "unhandled_panic");
        default_hook(info);
    }));
}
