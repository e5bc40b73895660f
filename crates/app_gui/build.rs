use std::env;

fn main() {
    let version =
        env::var("ONCOSCAN_VERSION").unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=ONCOSCAN_VERSION={version}");
    println!("cargo:rerun-if-env-changed=ONCOSCAN_VERSION");
}
