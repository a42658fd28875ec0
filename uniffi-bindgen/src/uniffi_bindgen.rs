//! Generates Swift and Kotlin bindings for the `meshtag` library.

fn main() {
    uniffi::uniffi_bindgen_main();
}
