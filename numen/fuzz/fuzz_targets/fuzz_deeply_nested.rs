#![no_main]

use libfuzzer_sys::fuzz_target;
use numen::Engine;

fuzz_target!(|depth: u8| {
    let engine = Engine::new();

    let depth = depth as usize + 1;

    let mut expr = String::from("1");
    for _ in 0..depth {
        expr = format!("Max({}+1,0)", expr);
    }

    let _ = engine.parse_formula(&expr);
    let _ = engine.parse_condition(&format!("{}>0", expr));
});
