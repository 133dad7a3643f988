use std::io::Write;

use log::Level;

/// App name prefixed to installer log lines.
pub const INSTALLER_APP: &str = "K8SKP_SpecInstaller";

/// App name prefixed to discovery log lines.
pub const PROVIDER_APP: &str = "K8SKP_KernelProvider";

/// Initialize stderr logging as `[<app>] message`, with the level spelled
/// out for anything other than INFO. `RUST_LOG` overrides `debug`.
pub fn init(app: &'static str, debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(move |buf, record| match record.level() {
            Level::Info => writeln!(buf, "[{}] {}", app, record.args()),
            level => writeln!(buf, "[{}] {} | {}", app, level, record.args()),
        })
        .init();
}
