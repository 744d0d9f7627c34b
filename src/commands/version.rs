//! Version command implementation.

/// Prints package version and the build metadata embedded by `build.rs`.
pub fn command_version() {
    println!("system-monitor {}", env!("CARGO_PKG_VERSION"));
    println!(
        "   git:    {}",
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    );
    println!(
        "   built:  {}",
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    );
    println!("   target: {}/{}", std::env::consts::OS, std::env::consts::ARCH);
}
