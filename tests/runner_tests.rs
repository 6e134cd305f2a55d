// tests/runner_tests.rs

use qecsim::runner::{self, BIT_FLIP_TEST, Backend, DemoError, ExecutionRequest, Verdict};
use qecsim::simulation::{Simulator, SimulatorConfig};
use qecsim::{ExecutionResult, QecError, QecResult, ShotOutcome};

use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// Backend that replays a fixed result and counts calls.
struct MockBackend {
    shots: Vec<ShotOutcome>,
    calls: Cell<usize>,
    last_request: RefCell<Option<ExecutionRequest>>,
}

impl MockBackend {
    fn returning(pairs: &[(u64, u64)]) -> Self {
        Self::with_shots(pairs.iter().copied().map(ShotOutcome::from).collect())
    }

    fn with_shots(shots: Vec<ShotOutcome>) -> Self {
        Self { shots, calls: Cell::new(0), last_request: RefCell::new(None) }
    }
}

impl Backend for MockBackend {
    fn execute(&self, request: &ExecutionRequest) -> QecResult<ExecutionResult> {
        self.calls.set(self.calls.get() + 1);
        *self.last_request.borrow_mut() = Some(request.clone());
        Ok(self.shots.iter().cloned().collect())
    }
}

struct FailingBackend;

impl Backend for FailingBackend {
    fn execute(&self, _request: &ExecutionRequest) -> QecResult<ExecutionResult> {
        Err(QecError::Simulation("device unavailable".to_string()))
    }
}

fn run_with(backend: &MockBackend) -> (QecResult<Verdict>, String) {
    let mut out: Vec<u8> = Vec::new();
    let verdict = runner::run(backend, &mut out);
    (verdict, String::from_utf8(out).expect("report is utf-8"))
}

const STATIC_LINES: [&str; 7] = [
    "--- Starting Hybrid QEC Simulation ---",
    "Code: 3-qubit Bit-Flip Code (Repetition Code)",
    "Simulation Results:",
    "Original Logical State: |0>L (encoded as |000>)",
    "Simulated Error: X-error (Bit-Flip) on Qubit 1",
    "Syndrome S2 Measurement Result: 1 (The Test op only returns S1)",
    "------------------------------",
];

#[test]
fn test_expected_outcome_reports_success() {
    let backend = MockBackend::returning(&[(0, 1)]);
    let (verdict, text) = run_with(&backend);

    assert_eq!(verdict.ok(), Some(Verdict::Success));
    assert!(text.contains("Syndrome S1 Measurement Result: 1 (Expected: 1/One)\n"));
    assert!(text.contains("✅ SUCCESS: Corrected Logical Qubit Measurement is 'Zero'.\n"));
    assert!(text.ends_with("The QEC Recovery operation successfully corrected the Bit-Flip error.\n"));
    assert!(!text.contains("FAILURE"));
    assert_eq!(backend.calls.get(), 1);
}

#[test]
fn test_full_success_report_text() {
    let (_, text) = run_with(&MockBackend::returning(&[(0, 1)]));
    let expected = "\
--- Starting Hybrid QEC Simulation ---
Code: 3-qubit Bit-Flip Code (Repetition Code)

Simulation Results:
Original Logical State: |0>L (encoded as |000>)
Simulated Error: X-error (Bit-Flip) on Qubit 1
Syndrome S1 Measurement Result: 1 (Expected: 1/One)
Syndrome S2 Measurement Result: 1 (The Test op only returns S1)
------------------------------
✅ SUCCESS: Corrected Logical Qubit Measurement is 'Zero'.
The QEC Recovery operation successfully corrected the Bit-Flip error.
";
    assert_eq!(text, expected);
}

#[test]
fn test_uncorrected_outcome_reports_failure() {
    let (verdict, text) = run_with(&MockBackend::returning(&[(1, 1)]));

    assert_eq!(verdict.ok(), Some(Verdict::Failure { corrected_state: 1 }));
    assert!(text.contains("❌ FAILURE: Corrected Logical Qubit Measurement is '1'.\n"));
    assert!(text.ends_with("The QEC failed to correct the error.\n"));
    assert!(!text.contains("SUCCESS"));
}

#[test]
fn test_verdict_ignores_syndrome() {
    let (verdict, text) = run_with(&MockBackend::returning(&[(0, 0)]));

    assert_eq!(verdict.ok(), Some(Verdict::Success));
    assert!(text.contains("Syndrome S1 Measurement Result: 0 (Expected: 1/One)\n"));
    assert!(text.contains("SUCCESS"));
}

#[test]
fn test_request_names_bit_flip_test_with_one_shot() {
    let backend = MockBackend::returning(&[(0, 1)]);
    let _ = run_with(&backend);

    let request = backend.last_request.borrow().clone().expect("backend was called");
    assert_eq!(request.operation().as_str(), BIT_FLIP_TEST);
    assert_eq!(request.shots(), 1);
}

#[test]
fn test_only_first_shot_is_reported() {
    let (verdict, text) = run_with(&MockBackend::returning(&[(0, 1), (1, 0)]));
    assert_eq!(verdict.ok(), Some(Verdict::Success));
    assert!(text.contains("S1 Measurement Result: 1 "));
}

#[test]
fn test_empty_result_is_an_error() {
    let (verdict, text) = run_with(&MockBackend::returning(&[]));

    assert!(matches!(verdict, Err(QecError::EmptyResult)));
    assert!(text.starts_with("--- Starting Hybrid QEC Simulation ---\n"));
    assert!(!text.contains("Simulation Results:"), "no results block without a result");
}

#[test]
fn test_wrong_arity_is_an_error() {
    let backend = MockBackend::with_shots(vec![ShotOutcome::new(vec![0, 1, 1])]);
    let (verdict, _) = run_with(&backend);
    assert!(matches!(verdict, Err(QecError::UnexpectedArity { expected: 2, actual: 3 })));
}

#[test]
fn test_backend_error_propagates_as_execution_failure() {
    let mut out: Vec<u8> = Vec::new();
    let err = runner::run_demo(|| Ok(FailingBackend), &mut out).unwrap_err();

    assert!(matches!(err, DemoError::Execution(QecError::Simulation(_))));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_missing_source_prints_diagnostic_and_never_executes() {
    let backend = MockBackend::returning(&[(0, 1)]);
    let mut out: Vec<u8> = Vec::new();

    let err = runner::run_demo(
        || {
            Err::<&MockBackend, _>(QecError::BackendInitialization {
                path: PathBuf::from("qec_codes.qec"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        },
        &mut out,
    )
    .unwrap_err();

    let text = String::from_utf8(out).expect("utf-8");
    assert_eq!(text, "Error: Could not load qec_codes.qec. Please ensure it is in the same directory.\n");
    assert!(matches!(err, DemoError::Initialization(QecError::BackendInitialization { .. })));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(backend.calls.get(), 0);
}

#[test]
fn test_run_demo_with_simulator_on_missing_file() {
    let config = SimulatorConfig {
        source_path: PathBuf::from("no/such/dir/qec_codes.qec"),
        seed: Some(1),
    };
    let mut out: Vec<u8> = Vec::new();
    let err = runner::run_demo(|| Simulator::initialize(config), &mut out).unwrap_err();

    let text = String::from_utf8(out).expect("utf-8");
    assert_eq!(text.lines().collect::<Vec<_>>(), vec![
        "Error: Could not load qec_codes.qec. Please ensure it is in the same directory."
    ]);
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_run_demo_with_shipped_source_succeeds() {
    let config = SimulatorConfig {
        source_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("qec_codes.qec"),
        seed: Some(5),
    };
    let mut out: Vec<u8> = Vec::new();
    let verdict = runner::run_demo(|| Simulator::initialize(config), &mut out);

    assert!(matches!(verdict, Ok(Verdict::Success)));
    let text = String::from_utf8(out).expect("utf-8");
    assert!(text.contains("Syndrome S1 Measurement Result: 1 (Expected: 1/One)"));
}

#[test]
fn test_exit_status_reports_execution_cause_on_error_stream() {
    let mut out: Vec<u8> = Vec::new();
    let outcome = runner::run_demo(|| Ok(FailingBackend), &mut out);

    let mut err_out: Vec<u8> = Vec::new();
    let status = runner::exit_status(&outcome, &mut err_out);

    assert_eq!(status, 2);
    assert_eq!(
        String::from_utf8(err_out).expect("utf-8"),
        "Error: simulation error: device unavailable\n"
    );
    let report = String::from_utf8(out).expect("utf-8");
    assert!(!report.contains("Error:"), "execution errors stay off the report stream");
}

#[test]
fn test_exit_status_for_success_failure_verdict_and_init_error() {
    let mut err_out: Vec<u8> = Vec::new();
    assert_eq!(runner::exit_status(&Ok(Verdict::Success), &mut err_out), 0);
    assert_eq!(runner::exit_status(&Ok(Verdict::Failure { corrected_state: 1 }), &mut err_out), 0);

    let init = Err(DemoError::Initialization(QecError::EmptyResult));
    assert_eq!(runner::exit_status(&init, &mut err_out), 1);
    assert!(err_out.is_empty(), "initialization diagnostics are written by run_demo");

    assert_ne!(runner::USAGE_EXIT_CODE, 1);
    assert_ne!(runner::USAGE_EXIT_CODE, 2);
}

proptest! {
    #[test]
    fn prop_verdict_depends_only_on_corrected_state(c in any::<u64>(), s in 0u64..=1) {
        let (verdict, text) = run_with(&MockBackend::returning(&[(c, s)]));

        for line in STATIC_LINES {
            prop_assert!(text.lines().any(|l| l == line), "missing line {:?}", line);
        }
        let syndrome_line = format!("Syndrome S1 Measurement Result: {} (Expected: 1/One)", s);
        prop_assert!(text.lines().any(|l| l == syndrome_line));

        if c == 0 {
            prop_assert_eq!(verdict.ok(), Some(Verdict::Success));
            prop_assert!(text.contains("✅ SUCCESS"));
        } else {
            prop_assert_eq!(verdict.ok(), Some(Verdict::Failure { corrected_state: c }));
            let failure_line = format!("❌ FAILURE: Corrected Logical Qubit Measurement is '{}'.", c);
            prop_assert!(text.contains(&failure_line));
        }
    }
}
