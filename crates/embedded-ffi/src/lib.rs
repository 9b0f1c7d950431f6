//! Swift/Kotlin build target for the embedded SDK
//!
//! The only content is the `embedded::ffi` surface and its UniFFI scaffolding,
//! packaged as a cdylib/staticlib. Bindings are generated in library mode:
//!
//! ```bash
//! cargo build --release -p embedded-ffi
//! cargo run -p embedded-ffi --features bindgen --bin uniffi-bindgen generate \
//!     --library target/release/libembedded_ffi.dylib --language kotlin --out-dir generated/kotlin
//! ```

pub use embedded::ffi::*;

embedded::uniffi_reexport_scaffolding!();
