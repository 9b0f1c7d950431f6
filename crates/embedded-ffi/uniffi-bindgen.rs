//! UniFFI bindgen binary for generating Swift/Kotlin bindings
//!
//! Usage:
//!   cargo run -p embedded-ffi --features bindgen --bin uniffi-bindgen generate \
//!       --library target/aarch64-apple-darwin/release/libembedded_ffi.dylib \
//!       --language swift \
//!       --out-dir generated/swift

fn main() {
    uniffi::uniffi_bindgen_main()
}
