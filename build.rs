fn main() {
    // ESP-IDF link arguments are only needed for firmware builds; host
    // builds (tests, simulation) skip embuild entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
