fn main() {
    // Baked into DEFAULT_API_URL / DEFAULT_PUBLISHABLE_KEY via option_env!.
    println!("cargo:rerun-if-env-changed=BANK_LINK_API_URL");
    println!("cargo:rerun-if-env-changed=BANK_LINK_PUBLISHABLE_KEY");
}
