#![no_main]

use libfuzzer_sys::fuzz_target;
use minvm::{Fatal, Machine, Recorder, State};

const BUDGET: u64 = 10_000;

fuzz_target!(|data: &[u8]| {
    // Try to convert bytes to UTF-8 string
    if let Ok(source) = std::str::from_utf8(data) {
        // Skip very large inputs to avoid timeouts
        if source.len() > 5000 {
            return;
        }

        let mut machine = Machine::new().with_observer(Recorder::new());
        machine.load(source);

        // Any program must halt, fault, or run out of budget - never panic
        match machine.run_with_budget(BUDGET) {
            Ok(steps) => {
                // Property: a halted machine has IP at or past the end
                assert_eq!(machine.state(), State::Halted);
                assert!(machine.ip() >= machine.program().len() as i64);
                assert!(steps <= BUDGET);
                assert!(!machine.is_faulted());
            }
            Err(Fatal::StepBudgetExhausted { .. }) => {
                assert_eq!(machine.steps(), BUDGET);
                assert!(!machine.is_faulted());
            }
            Err(_) => {
                // Property: a faulted machine refuses to continue
                assert!(machine.is_faulted());
                assert!(matches!(machine.step(), Err(Fatal::Faulted)));
            }
        }

        // Property: the observer saw every completed step, plus the failing
        // one when the machine faulted after fetching an instruction
        let observed = machine.observer().snapshots.len() as u64;
        assert!(observed == machine.steps() || observed == machine.steps() + 1);

        // Property: output is always valid UTF-8 text
        assert!(std::str::from_utf8(machine.output()).is_ok());
    }
});
