#![no_main]

use libfuzzer_sys::fuzz_target;
use numen::Engine;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut engine = Engine::new();
        let _ = engine.registry_mut().register_name("stat", "x", 0);
        let _ = engine.registry_mut().register_name("stat", "y", 0);

        if let Ok(formula) = engine.parse_formula(s) {
            let store = engine.storehouse();
            let _ = formula.evaluate(&store);
            let _ = formula.to_string();
        }
    }
});
