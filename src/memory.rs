//! How a program's final value updates persisted memory.
//!
//! Applied once to the top-level result, never to nested values:
//!
//! - not a map: memory is untouched and the value is the result
//! - a map without `:result`: the whole map is merged into memory and is
//!   also the result
//! - a map with `:result`: every other key is merged into memory and the
//!   `:result` value is the result

use crate::abstractions::map_get;
use crate::language::{Keyword, MapValue, Value};

pub const RESULT_KEY: &str = "result";

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryUpdate {
    pub result: Value,
    /// Keys written to memory by this run
    pub delta: MapValue,
    /// Memory after the delta is merged in
    pub memory: MapValue,
}

pub fn apply_memory_contract(value: Value, memory: MapValue) -> MemoryUpdate {
    let Value::Map(map) = value else {
        return MemoryUpdate {
            result: value,
            delta: MapValue::new(),
            memory,
        };
    };

    let result_key = Value::Keyword(Keyword::new(RESULT_KEY));
    let (result, delta) = match map_get(&map, &result_key).cloned() {
        Some(result) => {
            let mut delta = map;
            delta.remove(&result_key);
            delta.remove(&Value::string(RESULT_KEY));
            (result, delta)
        }
        None => (Value::Map(map.clone()), map),
    };

    let mut memory = memory;
    for (key, value) in delta.iter() {
        memory.insert(key.clone(), value.clone());
    }
    MemoryUpdate {
        result,
        delta,
        memory,
    }
}
