//! Entry point for generating foreign-language bindings for threedskit.

fn main() {
    uniffi::uniffi_bindgen_main();
}
