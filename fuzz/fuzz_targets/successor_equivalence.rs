#![no_main]

use libfuzzer_sys::fuzz_target;
use wavl_index::model::SuccessorEquivalenceInput;

fuzz_target!(|input: SuccessorEquivalenceInput| {
    wavl_index::model::run_successor_equivalence(input.values, input.removals);
});
