#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use scrollstage::config::loader::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();
        // Only panics matter here
        let _ = loader.load_from_str(yaml_str, Path::new("fuzz.yaml"));
    }
});
