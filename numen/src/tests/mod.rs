// Registry tests
mod registry;

// Parser tests
mod condition_parsing;
mod operation_parsing;


use crate::engine::Engine;
use crate::registry::Id;

/// An engine with each of `names` registered under the `stat` type
pub(crate) fn engine_with(names: &[&str]) -> Engine {
    let mut engine = Engine::new();
    for name in names {
        engine.registry_mut().register_name("stat", name, 0).unwrap();
    }
    engine
}

pub(crate) fn id(engine: &Engine, name: &str) -> Id {
    engine.registry().id_by_name(name).unwrap()
}
