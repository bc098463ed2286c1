#![no_main]

use libfuzzer_sys::fuzz_target;
use numen::Engine;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut engine = Engine::new();
        let _ = engine.registry_mut().register_name("stat", "x", 0);
        let _ = engine.registry_mut().register_name("stat", "y", 0);

        let mut store = engine.storehouse();
        let workstation = engine.workstation();
        if let Ok(operations) = engine.parse_operations(s) {
            workstation.exec_oper(&mut store, &operations, true);
        }
        if let Ok(process) = engine.parse_process(s) {
            let _ = workstation.exec_proc(&mut store, &process, true);
        }
    }
});
