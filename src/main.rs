// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is licensed under the terms of the GNU Affero General Public
// License, version 3. See the top level LICENSE file for the license
// text.

// <>

// src/main.rs

// Binary entry point: starts logging, then hands the terminal to the
// read - evaluate - print loop.

// <>

fn main() {
    simple_logger::SimpleLogger::new().init().unwrap();

    ouro::repl();
}
