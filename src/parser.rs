// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is licensed under the terms of the GNU Affero General Public
// License, version 3. See the top level LICENSE file for the license
// text.

// <>

// src/parser.rs

// Reader for Ouro. Turns one S-expression of input text into tagged
// values, allocating list cells in the ring. Reader failures come
// back as error values, never as host errors.

// <>

use crate::core::{bail_err, cons_make, err_make, fixnum_make, nil, nreverse, SlWord};
use crate::memmgt::Region;
use crate::symtab::SymbolTable;

const LPAR: char = '(';
const RPAR: char = ')';
const QUOTE: char = '\'';

/// Parses one expression from the input
pub fn parse(reg: *mut Region, tbl: &mut SymbolTable, code: &str) -> SlWord {
    let mut rest = code;
    read_expr(reg, tbl, &mut rest)
}

fn delimiter_p(c: char) -> bool {
    c == LPAR || c == RPAR || c == QUOTE || c.is_whitespace()
}

fn read_expr(reg: *mut Region, tbl: &mut SymbolTable, s: &mut &str) -> SlWord {
    *s = s.trim_start();
    match s.chars().next() {
        None => err_make("empty input"),
        Some(RPAR) => err_make("invalid syntax"),
        Some(LPAR) => {
            *s = &s[1..];
            read_list(reg, tbl, s)
        }
        Some(QUOTE) => {
            *s = &s[1..];
            let elm = read_expr(reg, tbl, s);
            cons_make(reg, tbl.intern("quote"), cons_make(reg, elm, nil()))
        }
        Some(_) => read_atom(tbl, s),
    }
}

fn read_list(reg: *mut Region, tbl: &mut SymbolTable, s: &mut &str) -> SlWord {
    let mut ret = nil();
    loop {
        *s = s.trim_start();
        match s.chars().next() {
            None => return err_make("unfinished parenthesis"),
            Some(RPAR) => {
                *s = &s[1..];
                break;
            }
            Some(_) => {
                let elm = read_expr(reg, tbl, s);
                bail_err!(reg, elm);
                ret = cons_make(reg, elm, ret);
            }
        }
    }
    nreverse(reg, ret)
}

fn read_atom(tbl: &mut SymbolTable, s: &mut &str) -> SlWord {
    let end = s.find(delimiter_p).unwrap_or(s.len());
    let (atom, rest) = s.split_at(end);
    *s = rest;
    num_or_sym(tbl, atom)
}

/// A whole atom of decimal digits, minus sign allowed, is a fixnum;
/// anything else is a symbol. A leading plus never marks a number,
/// and a digit run too large for a fixnum reads as zero.
fn num_or_sym(tbl: &mut SymbolTable, atom: &str) -> SlWord {
    let digits = atom.strip_prefix('-').unwrap_or(atom);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return tbl.intern(atom);
    }
    match atom.parse::<i64>() {
        Ok(num) => fixnum_make(num),
        Err(_) => fixnum_make(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        cons_p, err_p, fixnum_get, fixnum_p, nil_p, safe_car, safe_cdr, sym_name, sym_p,
    };
    use crate::memmgt;

    fn setup() -> (*mut Region, SymbolTable) {
        (memmgt::acquire_mem_region(64), SymbolTable::new())
    }

    #[test]
    fn reads_atoms() {
        let (reg, mut tbl) = setup();

        let n = parse(reg, &mut tbl, " 42 ");
        assert!(fixnum_p(n));
        assert_eq!(fixnum_get(n), 42);
        assert_eq!(fixnum_get(parse(reg, &mut tbl, "-7")), -7);

        let s = parse(reg, &mut tbl, "foo");
        assert!(sym_p(reg, s));
        assert_eq!(sym_name(s), "foo");

        // not a full integer parse, so a symbol
        assert!(sym_p(reg, parse(reg, &mut tbl, "1x")));
        assert!(sym_p(reg, parse(reg, &mut tbl, "-")));
        assert!(sym_p(reg, parse(reg, &mut tbl, "+5")));

        // out-of-range digit runs read as zero
        assert_eq!(fixnum_get(parse(reg, &mut tbl, "99999999999999999999")), 0);
        assert_eq!(fixnum_get(parse(reg, &mut tbl, "-99999999999999999999")), 0);

        assert!(nil_p(parse(reg, &mut tbl, "nil")));

        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn reads_lists() {
        let (reg, mut tbl) = setup();
        let lst = parse(reg, &mut tbl, "(a (b c) 3)");

        assert!(cons_p(reg, lst));
        assert_eq!(sym_name(safe_car(reg, lst)), "a");

        let inner = safe_car(reg, safe_cdr(reg, lst));
        assert_eq!(sym_name(safe_car(reg, inner)), "b");

        let third = safe_car(reg, safe_cdr(reg, safe_cdr(reg, lst)));
        assert_eq!(fixnum_get(third), 3);
        assert!(nil_p(safe_cdr(reg, safe_cdr(reg, safe_cdr(reg, lst)))));

        // the empty list reads as nil itself
        assert!(nil_p(parse(reg, &mut tbl, "()")));

        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn quote_rewrites() {
        let (reg, mut tbl) = setup();
        let q = parse(reg, &mut tbl, "'x");
        assert_eq!(safe_car(reg, q), tbl.intern("quote"));
        assert_eq!(sym_name(safe_car(reg, safe_cdr(reg, q))), "x");
        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn reader_errors() {
        let (reg, mut tbl) = setup();
        assert!(err_p(reg, parse(reg, &mut tbl, "")));
        assert!(err_p(reg, parse(reg, &mut tbl, "   ")));
        assert!(err_p(reg, parse(reg, &mut tbl, ")")));
        assert!(err_p(reg, parse(reg, &mut tbl, "(1 2")));
        assert!(err_p(reg, parse(reg, &mut tbl, "(1 (2 3)")));
        unsafe { memmgt::destroy_mem_region(reg) };
    }
}
