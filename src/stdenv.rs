// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is licensed under the terms of the GNU Affero General Public
// License, version 3. See the top level LICENSE file for the license
// text.

// <>

// src/stdenv.rs

// The primordial Ouro environment: the immortal global frame, the
// builtin subroutines bound in it, and the freeze that makes them
// permanent.

// <>

use crate::core::{
    bail_stale, cons_make, cons_p, err_make, fixnum_get, fixnum_make, fixnum_p, nil, safe_car,
    safe_cdr, subr_make, sym_p, NativeFn, Prime, SlWord,
};
use crate::eval::env_ins;
use crate::memmgt::{self, Region};
use crate::symtab::SymbolTable;

/// Builds the global and user environments, registers every builtin,
/// and freezes the ring so the primordial cells become immortal
pub fn prep_environment(reg: *mut Region, tbl: &mut SymbolTable) -> Prime {
    let sym_t = tbl.intern("t");
    let sym_quote = tbl.intern("quote");
    let sym_if = tbl.intern("if");
    let sym_lambda = tbl.intern("lambda");
    let sym_defun = tbl.intern("defun");
    let sym_setq = tbl.intern("setq");

    // the closure marker: interned for a stable object, then removed
    // from the map so user code reading "expr" gets an ordinary symbol
    let sym_expr = tbl.intern("expr");
    tbl.unintern("expr");

    let g_env = cons_make(reg, nil(), nil());
    env_ins(reg, sym_t, sym_t, g_env);

    insert_subr(reg, tbl, g_env, "car", subr_car);
    insert_subr(reg, tbl, g_env, "cdr", subr_cdr);
    insert_subr(reg, tbl, g_env, "cons", subr_cons);
    insert_subr(reg, tbl, g_env, "eq", subr_eq);
    insert_subr(reg, tbl, g_env, "atom", subr_atom);
    insert_subr(reg, tbl, g_env, "numberp", subr_numberp);
    insert_subr(reg, tbl, g_env, "symbolp", subr_symbolp);
    insert_subr(reg, tbl, g_env, "+", subr_add);
    insert_subr(reg, tbl, g_env, "*", subr_mul);
    insert_subr(reg, tbl, g_env, "-", subr_sub);
    insert_subr(reg, tbl, g_env, "/", subr_div);
    insert_subr(reg, tbl, g_env, "mod", subr_mod);
    insert_subr(reg, tbl, g_env, "list", subr_list);
    insert_subr(reg, tbl, g_env, "copy", subr_copy);

    let user_env = cons_make(reg, nil(), g_env);

    unsafe { memmgt::freeze(reg) };

    Prime {
        sym_t,
        sym_quote,
        sym_if,
        sym_lambda,
        sym_defun,
        sym_setq,
        sym_expr,
        g_env,
        user_env,
    }
}

fn insert_subr(reg: *mut Region, tbl: &mut SymbolTable, env: SlWord, name: &str, func: NativeFn) {
    let sym = tbl.intern(name);
    env_ins(reg, sym, subr_make(func), env);
}

/// Generates subroutines over the evaluated argument list, binding
/// the leading arguments to the given names
macro_rules! subr_fn {
    ( $reg:ident, $pr:ident;
      $( $fn_name:ident [ $($args:ident),* ] $body:block )+
    ) => {
        $(
            fn $fn_name($reg: *mut Region, $pr: &Prime, args: SlWord) -> SlWord {
                let mut _rest = args;
                $(
                    let $args = safe_car($reg, _rest);
                    _rest = safe_cdr($reg, _rest);
                )*

                $body
            }
        )+
    };
}

subr_fn! {
    _reg, _pr;

    subr_car [x] {
        safe_car(_reg, x)
    }

    subr_cdr [x] {
        safe_cdr(_reg, x)
    }

    subr_cons [x, y] {
        cons_make(_reg, x, y)
    }

    subr_eq [x, y] {
        if x == y { _pr.sym_t } else { nil() }
    }

    subr_atom [x] {
        if cons_p(_reg, x) { nil() } else { _pr.sym_t }
    }

    subr_numberp [x] {
        if fixnum_p(x) { _pr.sym_t } else { nil() }
    }

    subr_symbolp [x] {
        if sym_p(_reg, x) { _pr.sym_t } else { nil() }
    }
}

/// Folds + or * over any number of fixnum arguments
fn arith_fold(reg: *mut Region, args: SlWord, init: i64, op: fn(i64, i64) -> i64) -> SlWord {
    bail_stale!(reg, args);
    let mut acc = init;
    let mut rest = args;
    while cons_p(reg, rest) {
        let a = safe_car(reg, rest);
        rest = safe_cdr(reg, rest);
        if !fixnum_p(a) {
            return err_make("number is expected");
        }
        acc = op(acc, fixnum_get(a));
        bail_stale!(reg, rest);
    }
    fixnum_make(acc)
}

/// Applies a two-fixnum operation; None from the operation reports a
/// zero divisor
fn arith_pair(reg: *mut Region, args: SlWord, op: fn(i64, i64) -> Option<i64>) -> SlWord {
    let x = safe_car(reg, args);
    bail_stale!(reg, x);
    let y = safe_car(reg, safe_cdr(reg, args));
    bail_stale!(reg, y);
    if !fixnum_p(x) || !fixnum_p(y) {
        return err_make("number is expected");
    }
    match op(fixnum_get(x), fixnum_get(y)) {
        Some(num) => fixnum_make(num),
        None => err_make("division by zero"),
    }
}

fn subr_add(reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    arith_fold(reg, args, 0, i64::wrapping_add)
}

fn subr_mul(reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    arith_fold(reg, args, 1, i64::wrapping_mul)
}

fn subr_sub(reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    arith_pair(reg, args, |x, y| Some(x.wrapping_sub(y)))
}

fn subr_div(reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    arith_pair(reg, args, i64::checked_div)
}

fn subr_mod(reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    arith_pair(reg, args, i64::checked_rem)
}

fn subr_list(_reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    args
}

fn subr_copy(reg: *mut Region, _pr: &Prime, args: SlWord) -> SlWord {
    copy_rec(reg, safe_car(reg, args))
}

/// Structural copy of cons structure, stopping at non-cons leaves;
/// the fresh cells carry the current generation
fn copy_rec(reg: *mut Region, obj: SlWord) -> SlWord {
    if cons_p(reg, obj) {
        bail_stale!(reg, obj);
        let car = copy_rec(reg, safe_car(reg, obj));
        let cdr = copy_rec(reg, safe_cdr(reg, obj));
        cons_make(reg, car, cdr)
    } else {
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{cons_ptr, err_p, nil_p};

    fn setup() -> (*mut Region, SymbolTable, Prime) {
        let reg = memmgt::acquire_mem_region(1024);
        let mut tbl = SymbolTable::new();
        let pr = prep_environment(reg, &mut tbl);
        (reg, tbl, pr)
    }

    fn list2(reg: *mut Region, a: SlWord, b: SlWord) -> SlWord {
        cons_make(reg, a, cons_make(reg, b, nil()))
    }

    #[test]
    fn arithmetic_folds() {
        let (reg, _tbl, pr) = setup();
        let args = cons_make(
            reg,
            fixnum_make(1),
            list2(reg, fixnum_make(2), fixnum_make(3)),
        );
        assert_eq!(fixnum_get(subr_add(reg, &pr, args)), 6);
        assert_eq!(fixnum_get(subr_mul(reg, &pr, args)), 6);

        // identities over the empty argument list
        assert_eq!(fixnum_get(subr_add(reg, &pr, nil())), 0);
        assert_eq!(fixnum_get(subr_mul(reg, &pr, nil())), 1);

        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn arithmetic_type_errors() {
        let (reg, mut tbl, pr) = setup();
        let args = list2(reg, fixnum_make(1), tbl.intern("a"));
        assert!(err_p(reg, subr_add(reg, &pr, args)));
        assert!(err_p(reg, subr_sub(reg, &pr, args)));
        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let (reg, _tbl, pr) = setup();
        let args = list2(reg, fixnum_make(1), fixnum_make(0));
        assert!(err_p(reg, subr_div(reg, &pr, args)));
        assert!(err_p(reg, subr_mod(reg, &pr, args)));
        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn predicates_answer_t_or_nil() {
        let (reg, mut tbl, pr) = setup();
        let sym = tbl.intern("a");

        let one = cons_make(reg, fixnum_make(1), nil());
        assert_eq!(subr_numberp(reg, &pr, one), pr.sym_t);
        assert!(nil_p(subr_symbolp(reg, &pr, one)));
        assert_eq!(subr_atom(reg, &pr, one), pr.sym_t);

        let pair = cons_make(reg, cons_make(reg, sym, nil()), nil());
        assert!(nil_p(subr_atom(reg, &pr, pair)));
        assert_eq!(subr_symbolp(reg, &pr, cons_make(reg, sym, nil())), pr.sym_t);

        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn copy_makes_fresh_cells() {
        let (reg, _tbl, pr) = setup();
        let orig = cons_make(reg, fixnum_make(1), cons_make(reg, fixnum_make(2), nil()));
        let copied = subr_copy(reg, &pr, cons_make(reg, orig, nil()));

        assert_ne!(cons_ptr(orig), cons_ptr(copied));
        assert_eq!(safe_car(reg, copied), fixnum_make(1));
        assert_eq!(safe_car(reg, safe_cdr(reg, copied)), fixnum_make(2));

        unsafe { memmgt::destroy_mem_region(reg) };
    }
}
