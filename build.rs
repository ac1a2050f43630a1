use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=ZBAR_LIB_DIR");

    // The memory backend needs nothing native; only the `system` feature links libzbar.
    if env::var_os("CARGO_FEATURE_SYSTEM").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("ZBAR_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }
    println!("cargo:rustc-link-lib=zbar");
}
