// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is free software: you can redistribute it and / or modify it
// under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// Ouro is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU
// Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public
// License along with Ouro (in the LICENSE file). If not, see
// <https://www.gnu.org/licenses/>.

// <>

// src/lib.rs

// Top level lib: declares modules; owns the interpreter session type,
// the one-shot interpreter, and the read - evaluate - print loop.

// <>

//! A tiny interactive Lisp whose cons heap is a fixed ring buffer.
//! There is no garbage collector: the allocation cursor wraps around
//! the region and old cells are simply reused. References to reused
//! cells are detected at every dereference and surface as first-class
//! stale sentinels instead of corrupting the session.

pub mod core;
pub mod eval;
pub mod memmgt;
pub mod parser;
pub mod stdenv;
pub mod symtab;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::core::{context, Prime};
use crate::memmgt::{Region, RING_CELLS};
use crate::symtab::SymbolTable;

/// One interpreter session: a ring region, an intern table, and the
/// primordial objects
pub struct Interp {
    reg: *mut Region,
    tbl: SymbolTable,
    pr: Prime,
}

impl Interp {
    /// Creates a session with the given ring capacity in cells
    pub fn with_cells(cells: u32) -> Self {
        let reg = memmgt::acquire_mem_region(cells);
        let mut tbl = SymbolTable::new();
        let pr = stdenv::prep_environment(reg, &mut tbl);
        Interp { reg, tbl, pr }
    }

    pub fn new() -> Self {
        Self::with_cells(RING_CELLS)
    }

    /// Reads one expression, evaluates it in the user env, and
    /// renders the result
    pub fn run(&mut self, code: &str) -> String {
        let expr = parser::parse(self.reg, &mut self.tbl, code);
        let result = eval::eval(self.reg, &self.pr, expr, self.pr.user_env);
        context(self.reg, &self.pr, result).to_string()
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interp {
    fn drop(&mut self) {
        unsafe { memmgt::destroy_mem_region(self.reg) };
    }
}

/// Interprets a single expression in a fresh session
pub fn interpret(code: &str) -> String {
    Interp::new().run(code)
}

/// Reads expressions line by line, evaluating and printing each,
/// until end of input
pub fn repl() {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("cannot open terminal: {err}");
            return;
        }
    };
    let mut itp = Interp::new();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                println!("{}", itp.run(&line));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("read error: {err:?}");
                break;
            }
        }
    }
}
