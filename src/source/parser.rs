//! Parser for `.qec` operation sources.
//!
//! Parsing and lowering happen in one pass: every `operation` block is
//! compiled straight into a VM [`Program`], with `if`/`else` lowered to
//! branches over generated labels.

use std::collections::HashMap;

use super::lexer::{SpannedToken, Token, tokenize};
use crate::core::{QecError, QecResult, QubitId};
use crate::operations::{Gate, Operation};
use crate::simulation::MAX_QUBITS;
use crate::vm::{Instruction, Program, ProgramBuilder};

/// One compiled operation with its namespace-qualified name.
#[derive(Debug, Clone)]
pub struct CompiledOperation {
    /// `<namespace>.<operation>`
    pub name: String,
    /// Line of the `operation` keyword.
    pub line: usize,
    pub program: Program,
}

/// Parses and compiles every operation in `source`.
pub fn parse(source: &str) -> QecResult<Vec<CompiledOperation>> {
    let tokens = tokenize(source).map_err(|(line, message)| QecError::Parse { line, message })?;
    Parser { tokens, pos: 0 }.parse_file()
}

/// Right-hand side of a `let` statement.
enum Operand {
    Register(String),
    Literal(u64),
}

/// Per-operation compilation state.
#[derive(Default)]
struct Scope {
    /// Register name to (first qubit id, size).
    registers: HashMap<String, (u64, u64)>,
    next_qubit: u64,
    builder: ProgramBuilder,
    next_label: usize,
    next_temp: usize,
}

impl Scope {
    fn fresh_label(&mut self, kind: &str) -> String {
        self.next_label += 1;
        format!("__{}_{}", kind, self.next_label)
    }

    fn fresh_temp(&mut self) -> String {
        self.next_temp += 1;
        format!("__tmp_{}", self.next_temp)
    }

    fn emit(&mut self, instruction: Instruction) {
        self.builder.push(instruction);
    }

    /// Materializes an operand as a register name.
    fn operand_register(&mut self, operand: Operand) -> String {
        match operand {
            Operand::Register(name) => name,
            Operand::Literal(value) => {
                let register = self.fresh_temp();
                self.emit(Instruction::LoadImmediate { register: register.clone(), value });
                register
            }
        }
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Line of the current token, or of the last one at end of input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error<T>(&self, message: impl Into<String>) -> QecResult<T> {
        Err(QecError::Parse { line: self.line(), message: message.into() })
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    fn expect(&mut self, expected: Token) -> QecResult<()> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => {
                let found = token.to_string();
                self.error(format!("expected '{}', found '{}'", expected, found))
            }
            None => self.error(format!("expected '{}', found end of input", expected)),
        }
    }

    fn expect_identifier(&mut self) -> QecResult<String> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            Some(token) => {
                let found = token.to_string();
                self.error(format!("expected identifier, found '{}'", found))
            }
            None => self.error("expected identifier, found end of input"),
        }
    }

    fn expect_int(&mut self) -> QecResult<u64> {
        match self.peek() {
            Some(Token::IntLiteral(value)) => {
                let value = *value;
                self.pos += 1;
                Ok(value)
            }
            Some(token) => {
                let found = token.to_string();
                self.error(format!("expected integer, found '{}'", found))
            }
            None => self.error("expected integer, found end of input"),
        }
    }

    fn parse_file(&mut self) -> QecResult<Vec<CompiledOperation>> {
        let mut operations = Vec::new();
        while !self.is_eof() {
            self.expect(Token::Namespace)?;
            let namespace = self.parse_qualified_name()?;
            self.expect(Token::LBrace)?;
            while !self.check(&Token::RBrace) {
                if self.is_eof() {
                    return self.error(format!("unterminated namespace '{}'", namespace));
                }
                operations.push(self.parse_operation(&namespace)?);
            }
            self.expect(Token::RBrace)?;
        }
        Ok(operations)
    }

    fn parse_qualified_name(&mut self) -> QecResult<String> {
        let mut name = self.expect_identifier()?;
        while self.check(&Token::Dot) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    fn parse_operation(&mut self, namespace: &str) -> QecResult<CompiledOperation> {
        let line = self.line();
        self.expect(Token::Operation)?;
        let name = format!("{}.{}", namespace, self.expect_identifier()?);
        self.expect(Token::LParen)?;
        self.expect(Token::RParen)?;

        let mut scope = Scope::default();
        self.parse_block(&mut scope)?;

        let Scope { builder, next_qubit, .. } = scope;
        let program = builder
            .with_qubits(next_qubit as usize)
            .build()
            .map_err(|e| QecError::Parse { line, message: format!("in operation '{}': {}", name, e) })?;

        Ok(CompiledOperation { name, line, program })
    }

    /// Parses `{ stmt* }`.
    fn parse_block(&mut self, scope: &mut Scope) -> QecResult<()> {
        self.expect(Token::LBrace)?;
        while !self.check(&Token::RBrace) {
            if self.is_eof() {
                return self.error("unterminated block, expected '}'");
            }
            self.parse_statement(scope)?;
        }
        self.expect(Token::RBrace)
    }

    fn parse_statement(&mut self, scope: &mut Scope) -> QecResult<()> {
        match self.peek().cloned() {
            Some(Token::Qubit) => self.parse_qubit_declaration(scope),
            Some(Token::Measure) => {
                self.advance();
                let qubit = self.parse_qubit_ref(scope)?;
                self.expect(Token::Arrow)?;
                let register = self.expect_identifier()?;
                self.expect(Token::Semicolon)?;
                scope.emit(Instruction::Measure { targets: vec![qubit] });
                scope.emit(Instruction::Record { qubit, register });
                Ok(())
            }
            Some(Token::Reset) => {
                self.advance();
                let target = self.parse_qubit_ref(scope)?;
                self.expect(Token::Semicolon)?;
                scope.emit(Instruction::QuantumOp(Operation::Reset { target }));
                Ok(())
            }
            Some(Token::Let) => self.parse_let(scope),
            Some(Token::If) => self.parse_if(scope),
            Some(Token::Return) => {
                self.advance();
                self.expect(Token::LParen)?;
                let mut registers = vec![self.expect_identifier()?];
                while self.check(&Token::Comma) {
                    self.advance();
                    registers.push(self.expect_identifier()?);
                }
                self.expect(Token::RParen)?;
                self.expect(Token::Semicolon)?;
                scope.emit(Instruction::Return(registers));
                Ok(())
            }
            Some(Token::Identifier(name)) => self.parse_gate(scope, &name),
            Some(token) => self.error(format!("unexpected '{}' at start of statement", token)),
            None => self.error("unexpected end of input"),
        }
    }

    fn parse_qubit_declaration(&mut self, scope: &mut Scope) -> QecResult<()> {
        self.expect(Token::Qubit)?;
        let name = self.expect_identifier()?;
        self.expect(Token::LBracket)?;
        let size = self.expect_int()?;
        self.expect(Token::RBracket)?;
        if size == 0 {
            return self.error(format!("qubit register '{}' must hold at least one qubit", name));
        }
        if scope.registers.contains_key(&name) {
            return self.error(format!("qubit register '{}' is already declared", name));
        }
        let Some(total) = scope.next_qubit.checked_add(size).filter(|&total| total <= MAX_QUBITS as u64) else {
            return self.error(format!(
                "qubit register '{}' of size {} exceeds the limit of {} qubits per operation",
                name, size, MAX_QUBITS
            ));
        };
        self.expect(Token::Semicolon)?;
        scope.registers.insert(name, (scope.next_qubit, size));
        scope.next_qubit = total;
        Ok(())
    }

    fn parse_qubit_ref(&mut self, scope: &Scope) -> QecResult<QubitId> {
        let name = self.expect_identifier()?;
        let Some(&(base, size)) = scope.registers.get(&name) else {
            return self.error(format!("undeclared qubit register '{}'", name));
        };
        self.expect(Token::LBracket)?;
        let index = self.expect_int()?;
        if index >= size {
            return self.error(format!(
                "index {} out of range for qubit register '{}' of size {}",
                index, name, size
            ));
        }
        self.expect(Token::RBracket)?;
        Ok(QubitId(base + index))
    }

    fn parse_gate(&mut self, scope: &mut Scope, name: &str) -> QecResult<()> {
        let controlled = match name {
            "cnot" | "cx" => Some(Gate::X),
            "cz" => Some(Gate::Z),
            _ => None,
        };
        let op = match (controlled, Gate::from_mnemonic(name)) {
            (Some(gate), _) => {
                self.advance();
                let control = self.parse_qubit_ref(scope)?;
                self.expect(Token::Comma)?;
                let target = self.parse_qubit_ref(scope)?;
                if control == target {
                    return self.error(format!("'{}' needs distinct control and target qubits", name));
                }
                Operation::Controlled { control, target, gate }
            }
            (None, Some(gate)) => {
                self.advance();
                let target = self.parse_qubit_ref(scope)?;
                Operation::Gate { target, gate }
            }
            (None, None) => return self.error(format!("unknown gate '{}'", name)),
        };
        self.expect(Token::Semicolon)?;
        scope.emit(Instruction::QuantumOp(op));
        Ok(())
    }

    fn parse_operand(&mut self) -> QecResult<Operand> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(Operand::Register(name))
            }
            Some(Token::IntLiteral(value)) => {
                let value = *value;
                self.pos += 1;
                Ok(Operand::Literal(value))
            }
            Some(token) => {
                let found = token.to_string();
                self.error(format!("expected register or integer, found '{}'", found))
            }
            None => self.error("expected register or integer, found end of input"),
        }
    }

    fn parse_let(&mut self, scope: &mut Scope) -> QecResult<()> {
        self.expect(Token::Let)?;
        let r_dest = self.expect_identifier()?;
        self.expect(Token::Eq)?;

        if self.check(&Token::Bang) {
            self.advance();
            let operand = self.parse_operand()?;
            self.expect(Token::Semicolon)?;
            let r_src = scope.operand_register(operand);
            scope.emit(Instruction::Not { r_dest, r_src });
            return Ok(());
        }

        let lhs = self.parse_operand()?;
        let op = match self.peek() {
            Some(Token::Ampersand) | Some(Token::Pipe) | Some(Token::Caret) => self.advance(),
            _ => None,
        };

        let Some(op) = op else {
            self.expect(Token::Semicolon)?;
            match lhs {
                Operand::Register(source_reg) => scope.emit(Instruction::Copy { source_reg, dest_reg: r_dest }),
                Operand::Literal(value) => scope.emit(Instruction::LoadImmediate { register: r_dest, value }),
            }
            return Ok(());
        };

        let rhs = self.parse_operand()?;
        self.expect(Token::Semicolon)?;
        let r_src1 = scope.operand_register(lhs);
        let r_src2 = scope.operand_register(rhs);
        scope.emit(match op {
            Token::Ampersand => Instruction::And { r_dest, r_src1, r_src2 },
            Token::Pipe => Instruction::Or { r_dest, r_src1, r_src2 },
            _ => Instruction::Xor { r_dest, r_src1, r_src2 },
        });
        Ok(())
    }

    fn parse_if(&mut self, scope: &mut Scope) -> QecResult<()> {
        self.expect(Token::If)?;
        let register = self.expect_identifier()?;
        let else_label = scope.fresh_label("else");
        let end_label = scope.fresh_label("endif");

        scope.emit(Instruction::BranchIfZero { register, label: else_label.clone() });
        self.parse_block(scope)?;
        scope.emit(Instruction::Jump(end_label.clone()));
        scope.emit(Instruction::Label(else_label));
        if self.check(&Token::Else) {
            self.advance();
            self.parse_block(scope)?;
        }
        scope.emit(Instruction::Label(end_label));
        Ok(())
    }
}
