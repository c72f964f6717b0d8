//! Command: print version information.

/// Version string: `git describe` at build time, else the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("ENCFIX_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the encfix version to stdout.
pub fn run() {
    println!("encfix {}", version());
}
