//! Build script for aplreg-core
//!
//! Checks the compiler before building:
//! - Minimum Rust version (1.82, for `Option::is_none_or`)
//!
//! No platform checks: decoding, diffing and replay work on any host. Only
//! live reads need `lldb`, and that is discovered at run time.

fn main()
{
    let Ok(min_rust_version) = rustc_version::Version::parse("1.82.0") else {
        return;
    };

    match rustc_version::version() {
        Ok(rustc_version) if rustc_version < min_rust_version => {
            panic!("aplreg-core requires Rust {min_rust_version} or newer, found {rustc_version}");
        }
        Ok(_) => {}
        // If we can't get version (e.g., in some build environments), just warn
        Err(_) => println!("cargo:warning=could not verify Rust version"),
    }
}
