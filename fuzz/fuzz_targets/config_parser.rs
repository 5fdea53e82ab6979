#![no_main]

use benchguard::detector::DetectionConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Whatever merges must also pass validation
        if let Ok(config) = DetectionConfig::from_toml_str(input) {
            assert!(config.validate().is_ok());
        }
    }
});
