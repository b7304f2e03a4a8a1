fn main() {
    println!("cargo:rerun-if-env-changed=NURSECALL_AP_SSID");
    println!("cargo:rerun-if-env-changed=NURSECALL_AP_PASS");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
