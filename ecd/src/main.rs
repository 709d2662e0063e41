//! `ecd` exposes every ACPI embedded controller of the machine as a scheme, `ec0` for the
//! primary controller and `ec1` onward for the others. Reading or writing `/scheme/ec<N>` at an
//! offset accesses the controller's register space at that address.

#[cfg(all(target_os = "redox", any(target_arch = "x86", target_arch = "x86_64")))]
mod scheme;

#[cfg(all(target_os = "redox", any(target_arch = "x86", target_arch = "x86_64")))]
fn daemon(daemon: redox_daemon::Daemon) -> ! {
    use ecd::config::Config;
    use ecd::{Ec, PortList, Registry};
    use log::info;

    use crate::scheme::SchemeExposer;

    common::setup_logging(
        "misc",
        "ec",
        "ecd",
        common::level_from_env("ECD_LOG", log::LevelFilter::Info),
    );

    let mut args = pico_args::Arguments::from_env();
    let config = match args
        .opt_free_from_str::<String>()
        .expect("ecd: failed to parse arguments")
    {
        Some(path) => Config::load(&path)
            .unwrap_or_else(|err| panic!("ecd: failed to load configuration: {err:#}")),
        None => Config::default(),
    };

    common::acquire_port_io_rights().expect("ecd: failed to get I/O permission");

    let mut discovery = PortList::new(config.controllers, Ec::from_ports);
    let mut registry = Registry::init(&mut discovery, &mut SchemeExposer)
        .unwrap_or_else(|err| panic!("ecd: failed to register controllers: {err}"));

    daemon.ready().expect("ecd: failed to mark daemon as ready");

    libredox::call::setrens(0, 0).expect("ecd: failed to enter null namespace");

    registry.serve(|entry| {
        entry.resource_mut().serve();
        info!("ecd: {} unmounted", entry.controller().name());
    });

    registry.shutdown();
    std::process::exit(0);
}

#[cfg(all(target_os = "redox", any(target_arch = "x86", target_arch = "x86_64")))]
fn main() {
    redox_daemon::Daemon::new(daemon).expect("ecd: failed to create daemon");
}

#[cfg(not(all(target_os = "redox", any(target_arch = "x86", target_arch = "x86_64"))))]
fn main() {
    eprintln!("ecd: embedded controllers are only supported on x86 Redox");
    std::process::exit(1);
}
