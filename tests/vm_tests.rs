// tests/vm_tests.rs

use qecsim::core::{QecError, QubitId};
use qecsim::operations::{Gate, Operation};
use qecsim::vm::{Instruction, ProgramBuilder, Vm};
use rand::SeedableRng;
use rand::rngs::StdRng;

// Helper for QubitId creation
fn qid(id: u64) -> QubitId {
    QubitId(id)
}

fn vm() -> Vm<StdRng> {
    Vm::new(StdRng::seed_from_u64(2024))
}

fn reg(name: &str) -> String {
    name.to_string()
}

#[test]
fn test_vm_classical_logic() -> Result<(), Box<dyn std::error::Error>> {
    let program = ProgramBuilder::new()
        .add(Instruction::LoadImmediate { register: reg("a"), value: 0b1100 })
        .add(Instruction::LoadImmediate { register: reg("b"), value: 0b1010 })
        .add(Instruction::And { r_dest: reg("and"), r_src1: reg("a"), r_src2: reg("b") })
        .add(Instruction::Or { r_dest: reg("or"), r_src1: reg("a"), r_src2: reg("b") })
        .add(Instruction::Xor { r_dest: reg("xor"), r_src1: reg("a"), r_src2: reg("b") })
        .add(Instruction::Not { r_dest: reg("not_a"), r_src: reg("a") })
        .add(Instruction::Not { r_dest: reg("not_unset"), r_src: reg("never_written") })
        .add(Instruction::Copy { source_reg: reg("xor"), dest_reg: reg("copy") })
        .add(Instruction::Halt)
        .build()?;

    let mut vm = vm();
    let outcome = vm.run(&program)?;
    println!("Final Classical Memory: {:?}", vm.get_classical_memory());

    assert!(outcome.values().is_empty(), "halt without return yields an empty tuple");
    assert_eq!(vm.get_classical_register("and"), 0b1000);
    assert_eq!(vm.get_classical_register("or"), 0b1110);
    assert_eq!(vm.get_classical_register("xor"), 0b0110);
    assert_eq!(vm.get_classical_register("copy"), 0b0110);
    // Not is logical, not bitwise
    assert_eq!(vm.get_classical_register("not_a"), 0);
    assert_eq!(vm.get_classical_register("not_unset"), 1);
    assert!(vm.final_state().is_none(), "no qubits were used");
    Ok(())
}

#[test]
fn test_vm_classical_loop() -> Result<(), Box<dyn std::error::Error>> {
    // Toggles `t` until it comes back to zero: two passes through the loop body.
    let program = ProgramBuilder::new()
        .add(Instruction::LoadImmediate { register: reg("one"), value: 1 })
        .add(Instruction::Label(reg("top")))
        .add(Instruction::Xor { r_dest: reg("t"), r_src1: reg("t"), r_src2: reg("one") })
        .add(Instruction::Or { r_dest: reg("seen"), r_src1: reg("seen"), r_src2: reg("t") })
        .add(Instruction::BranchIfZero { register: reg("t"), label: reg("end") })
        .add(Instruction::Jump(reg("top")))
        .add(Instruction::Label(reg("end")))
        .add(Instruction::Halt)
        .build()?;

    println!("Program:\n{}", program);

    // 1 load + 2 * (xor, or, branch) + 1 jump + halt
    let exact_budget = 1 + 2 * 3 + 1 + 1;
    let mut vm = vm().with_step_limit(exact_budget);
    vm.run(&program)?;
    assert_eq!(vm.get_classical_register("t"), 0);
    assert_eq!(vm.get_classical_register("seen"), 1);

    let mut short = Vm::new(StdRng::seed_from_u64(0)).with_step_limit(exact_budget - 1);
    assert!(matches!(short.run(&program), Err(QecError::Simulation(_))));
    Ok(())
}

#[test]
fn test_vm_conditional_quantum() -> Result<(), Box<dyn std::error::Error>> {
    // Measure q0 and flip q1 only if q0 read 1.
    let build = |prepare_one: bool| {
        let mut builder = ProgramBuilder::new().with_qubits(2);
        if prepare_one {
            builder = builder.add(Instruction::QuantumOp(Operation::Gate { target: qid(0), gate: Gate::X }));
        }
        builder
            .add(Instruction::Measure { targets: vec![qid(0)] })
            .add(Instruction::Record { qubit: qid(0), register: reg("m0") })
            .add(Instruction::BranchIfZero { register: reg("m0"), label: reg("after_flip") })
            .add(Instruction::QuantumOp(Operation::Gate { target: qid(1), gate: Gate::X }))
            .add(Instruction::Label(reg("after_flip")))
            .add(Instruction::Measure { targets: vec![qid(1)] })
            .add(Instruction::Record { qubit: qid(1), register: reg("m1") })
            .add(Instruction::Return(vec![reg("m0"), reg("m1")]))
            .build()
    };

    let mut vm = vm();
    assert_eq!(vm.run(&build(true)?)?.values(), &[1, 1]);
    assert_eq!(vm.run(&build(false)?)?.values(), &[0, 0]);

    let state = vm.final_state().ok_or("engine should exist after a quantum run")?;
    assert!((state.probability(0) - 1.0).abs() < 1e-9, "both qubits end in |0>");
    Ok(())
}

#[test]
fn test_vm_state_is_reset_between_runs() -> Result<(), Box<dyn std::error::Error>> {
    let writes = ProgramBuilder::new()
        .add(Instruction::LoadImmediate { register: reg("x"), value: 7 })
        .build()?;
    let reads = ProgramBuilder::new()
        .add(Instruction::Return(vec![reg("x")]))
        .build()?;

    let mut vm = vm();
    vm.run(&writes)?;
    assert_eq!(vm.get_classical_register("x"), 7);
    assert_eq!(vm.run(&reads)?.values(), &[0]);
    Ok(())
}

#[test]
fn test_undefined_and_duplicate_labels_rejected() {
    let undefined = ProgramBuilder::new().add(Instruction::Jump(reg("nowhere"))).build();
    assert!(matches!(undefined, Err(QecError::Program(msg)) if msg.contains("nowhere")));

    let duplicate = ProgramBuilder::new()
        .add(Instruction::Label(reg("here")))
        .add(Instruction::NoOp)
        .add(Instruction::Label(reg("here")))
        .build();
    assert!(matches!(duplicate, Err(QecError::Program(msg)) if msg.contains("duplicate")));
}

#[test]
fn test_infinite_loop_hits_default_step_limit() -> Result<(), Box<dyn std::error::Error>> {
    let program = ProgramBuilder::new()
        .add(Instruction::Label(reg("spin")))
        .add(Instruction::Jump(reg("spin")))
        .build()?;

    let err = vm().run(&program).unwrap_err();
    assert!(matches!(&err, QecError::Simulation(msg) if msg.contains("10000")), "got: {err}");
    Ok(())
}

#[test]
fn test_record_requires_prior_measurement() -> Result<(), Box<dyn std::error::Error>> {
    let program = ProgramBuilder::new()
        .with_qubits(2)
        .add(Instruction::Measure { targets: vec![qid(0)] })
        .add(Instruction::Record { qubit: qid(1), register: reg("m") })
        .build()?;

    assert!(matches!(vm().run(&program), Err(QecError::InvalidOperation(_))));
    Ok(())
}

#[test]
fn test_oversized_register_is_an_error_not_an_abort() -> Result<(), Box<dyn std::error::Error>> {
    // Declared register size far beyond what the engine can hold
    let declared = ProgramBuilder::new()
        .with_qubits(100_000_000_000)
        .add(Instruction::Return(vec![reg("m")]))
        .build()?;
    assert!(matches!(vm().run(&declared), Err(QecError::Simulation(_))));

    // Largest possible id implies a register of usize::MAX qubits
    let far_id = ProgramBuilder::new()
        .add(Instruction::QuantumOp(Operation::Gate { target: qid(u64::MAX), gate: Gate::X }))
        .build()?;
    assert_eq!(far_id.num_qubits(), usize::MAX);
    assert!(matches!(vm().run(&far_id), Err(QecError::Simulation(_))));
    Ok(())
}

#[test]
fn test_oversized_register_rejected_by_source_compiler() {
    let source = "namespace N { operation O() { qubit q[100000000000]; return (m); } }";
    assert!(matches!(
        qecsim::OperationLibrary::parse_str(source),
        Err(QecError::Parse { line: 1, .. })
    ));
}
