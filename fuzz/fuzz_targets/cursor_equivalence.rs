#![no_main]

use libfuzzer_sys::fuzz_target;
use treap_bimap::model::CursorEquivalenceInput;

fuzz_target!(|input: CursorEquivalenceInput| {
    treap_bimap::model::run_cursor_equivalence(input.pairs, input.ops);
});
