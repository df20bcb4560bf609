//! Property-based tests for string marshalling.
//!
//! Strings that fit in an output buffer (32 bytes for IDs, 80 for titles,
//! terminator included) must come back unchanged; longer strings come back
//! as the longest prefix that fits on a character boundary.

use epanet_wasm::engine::SimulatedEngine;
use epanet_wasm::marshal::ScratchArena;
use epanet_wasm::signature::OutputKind;
use epanet_wasm::{Value, engine::native_arg};
use proptest::prelude::*;

fn round_trip(text: &str, kind: OutputKind) -> Result<String, epanet_wasm::Error> {
    let mut engine = SimulatedEngine::new();
    let mut arena = ScratchArena::new(&mut engine, "roundTrip");
    let slot = arena.allocate_output(kind)?;
    arena.engine().encode_string(slot, text, kind.size())?;
    match arena.decode_output(slot, kind)? {
        Value::Text(s) => Ok(s),
        other => panic!("expected text, got {other:?}"),
    }
}

fn expected_prefix(text: &str, budget: usize) -> &str {
    let mut end = text.len().min(budget - 1);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

proptest! {
    #[test]
    fn prop_ids_round_trip(text in "[a-zA-Z0-9_\\-]{0,31}") {
        prop_assert_eq!(round_trip(&text, OutputKind::Id)?, text);
    }

    #[test]
    fn prop_titles_round_trip(text in "\\PC{0,19}") {
        // At most 19 chars of up to 4 bytes each fits in 79 bytes.
        prop_assert_eq!(round_trip(&text, OutputKind::Title)?, text);
    }

    #[test]
    fn prop_long_strings_truncate_on_char_boundaries(text in "\\PC{0,64}") {
        for kind in [OutputKind::Id, OutputKind::Title] {
            let decoded = round_trip(&text, kind)?;
            prop_assert!(decoded.len() < kind.size());
            prop_assert_eq!(decoded.as_str(), expected_prefix(&text, kind.size()));
        }
    }

    /// Input strings are sized to fit and reach the engine intact.
    #[test]
    fn prop_input_strings_reach_the_engine(text in "\\PC{0,200}") {
        let mut engine = SimulatedEngine::new().with_function("EN_echo", |mem, args| {
            let ptr = native_arg(args, 0, "EN_echo")?;
            Ok(mem.read_c_string(ptr)?.len() as i32)
        });
        let mut arena = ScratchArena::new(&mut engine, "echo");
        let ptr = arena.allocate_string(&text)?;
        let len = arena.engine().call("EN_echo", &[ptr.into()])?;
        prop_assert_eq!(len as usize, text.len());
        drop(arena);
        prop_assert_eq!(engine.live_allocations(), 0);
    }
}
