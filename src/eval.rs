// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is licensed under the terms of the GNU Affero General Public
// License, version 3. See the top level LICENSE file for the license
// text.

// <>

// src/eval.rs

// The Ouro evaluator: one loop over three phases sharing register
// variables, so if-branches, progn tails, and closure application
// transfer control without growing the host stack. Also the
// environment operations the phases depend on.

// <>

use crate::core::{
    bail_err, bail_stale, cons_make, cons_p, cons_ptr, err_make, err_p, fixnum_p, nil, nil_p,
    nreverse, safe_car, safe_cdr, stale_box_p, stale_p, subr_get, subr_p, sym_name, sym_p, Prime,
    SlWord,
};
use crate::memmgt::{self, Region};

/// Phase the machine resumes in at the top of the loop
enum Phase {
    Eval,
    Apply,
    Progn,
}

/// Evaluates one expression in the given environment
///
/// Condition and operand evaluation recurse on the host stack,
/// bounded by input size; everything in tail position is a phase
/// transfer inside the loop.
pub fn eval(reg: *mut Region, pr: &Prime, mut obj: SlWord, mut env: SlWord) -> SlWord {
    let mut phase = Phase::Eval;

    // registers for the apply and progn phases
    let mut fun = nil();
    let mut args = nil();
    let mut body = nil();

    loop {
        match phase {
            Phase::Eval => {
                if fixnum_p(obj)
                    || nil_p(obj)
                    || err_p(reg, obj)
                    || stale_box_p(reg, obj)
                    || subr_p(reg, obj)
                {
                    return obj;
                }
                if sym_p(reg, obj) {
                    let bind = find_var(reg, pr, obj, env);
                    if nil_p(bind) {
                        return err_make(&format!("{} has no value", sym_name(obj)));
                    }
                    bail_stale!(reg, bind);
                    return unsafe { (*cons_ptr(bind)).cdr };
                }
                if !cons_p(reg, obj) {
                    return err_make("unknown object");
                }
                bail_stale!(reg, obj);

                let op = safe_car(reg, obj);
                bail_stale!(reg, op);
                let rest = safe_cdr(reg, obj);
                bail_stale!(reg, rest);

                if op == pr.sym_quote {
                    return safe_car(reg, rest);
                } else if op == pr.sym_if {
                    let test = eval(reg, pr, safe_car(reg, rest), env);
                    bail_err!(reg, test);
                    bail_stale!(reg, test);
                    // branch in tail position; a missing else is nil
                    obj = if nil_p(test) {
                        safe_car(reg, safe_cdr(reg, safe_cdr(reg, rest)))
                    } else {
                        safe_car(reg, safe_cdr(reg, rest))
                    };
                } else if op == pr.sym_lambda {
                    return expr_make(reg, pr, rest, env);
                } else if op == pr.sym_defun {
                    let expr = expr_make(reg, pr, safe_cdr(reg, rest), env);
                    bail_stale!(reg, expr);
                    let sym = safe_car(reg, rest);
                    if !sym_p(reg, sym) {
                        return err_make("1st argument of defun must be a symbol");
                    }
                    env_ins(reg, sym, expr, pr.user_env);
                    return sym;
                } else if op == pr.sym_setq {
                    let val = eval(reg, pr, safe_car(reg, safe_cdr(reg, rest)), env);
                    bail_err!(reg, val);
                    bail_stale!(reg, val);
                    let sym = safe_car(reg, rest);
                    if !sym_p(reg, sym) {
                        return err_make("1st argument of setq must be a symbol");
                    }
                    let bind = find_var(reg, pr, sym, env);
                    if nil_p(bind) {
                        env_ins(reg, sym, val, pr.user_env);
                    } else {
                        bail_stale!(reg, bind);
                        if !memmgt::above_saved(reg, cons_ptr(bind) as usize) {
                            return err_make(&format!("{} is immutable", sym_name(sym)));
                        }
                        unsafe { (*cons_ptr(bind)).cdr = val };
                    }
                    return val;
                } else {
                    fun = eval(reg, pr, op, env);
                    args = evlis(reg, pr, rest, env);
                    phase = Phase::Apply;
                }
            }

            Phase::Apply => {
                bail_stale!(reg, fun);
                bail_stale!(reg, args);
                bail_err!(reg, fun);
                bail_err!(reg, args);

                if subr_p(reg, fun) {
                    return subr_get(fun)(reg, pr, args);
                }
                if cons_p(reg, fun) && safe_car(reg, fun) == pr.sym_expr {
                    // fun = (marker captured-env params . body)
                    let o = safe_cdr(reg, fun);
                    bail_stale!(reg, o);
                    let captured = safe_car(reg, o);
                    bail_stale!(reg, captured);
                    let o = safe_cdr(reg, o);
                    bail_stale!(reg, o);
                    let params = safe_car(reg, o);
                    bail_stale!(reg, params);
                    body = safe_cdr(reg, o);
                    env = cons_make(reg, pairlis(reg, params, args), captured);
                    phase = Phase::Progn;
                } else if cons_p(reg, fun) && safe_car(reg, fun) == pr.sym_lambda {
                    // a literal, unevaluated lambda form applied
                    // directly; the user env stands in as its closure
                    let o = safe_cdr(reg, fun);
                    bail_stale!(reg, o);
                    let params = safe_car(reg, o);
                    bail_stale!(reg, params);
                    body = safe_cdr(reg, o);
                    env = cons_make(reg, pairlis(reg, params, args), pr.user_env);
                    phase = Phase::Progn;
                } else {
                    return err_make("noimpl");
                }
            }

            Phase::Progn => {
                bail_stale!(reg, body);
                let mut ret = nil();
                let mut tail = false;
                while cons_p(reg, body) {
                    let (head, rest) = unsafe {
                        let cell = cons_ptr(body);
                        ((*cell).car, (*cell).cdr)
                    };
                    if nil_p(rest) {
                        // last form transfers back into eval
                        obj = head;
                        phase = Phase::Eval;
                        tail = true;
                        break;
                    }
                    ret = eval(reg, pr, head, env);
                    bail_err!(reg, ret);
                    body = rest;
                    bail_stale!(reg, body);
                }
                if !tail {
                    return ret;
                }
            }
        }
    }
}

/// Builds a closure: the marker, the captured env, then params . body
fn expr_make(reg: *mut Region, pr: &Prime, obj: SlWord, env: SlWord) -> SlWord {
    cons_make(reg, pr.sym_expr, cons_make(reg, env, obj))
}

/// Evaluates each element of a list, left to right
fn evlis(reg: *mut Region, pr: &Prime, mut lst: SlWord, env: SlWord) -> SlWord {
    bail_stale!(reg, lst);
    let mut ret = nil();
    while cons_p(reg, lst) {
        let a = safe_car(reg, lst);
        lst = safe_cdr(reg, lst);
        let elm = eval(reg, pr, a, env);
        bail_err!(reg, elm);
        ret = cons_make(reg, elm, ret);
        bail_stale!(reg, lst);
    }
    nreverse(reg, ret)
}

/// Pairs parameters with arguments positionally; the longer list is
/// silently truncated
fn pairlis(reg: *mut Region, mut lst1: SlWord, mut lst2: SlWord) -> SlWord {
    bail_stale!(reg, lst1);
    bail_stale!(reg, lst2);
    let mut ret = nil();
    while cons_p(reg, lst1) && cons_p(reg, lst2) {
        let x = safe_car(reg, lst1);
        let y = safe_car(reg, lst2);
        lst1 = safe_cdr(reg, lst1);
        lst2 = safe_cdr(reg, lst2);
        ret = cons_make(reg, cons_make(reg, x, y), ret);
        bail_stale!(reg, lst1);
        bail_stale!(reg, lst2);
    }
    nreverse(reg, ret)
}

/// Finds the binding pair for a symbol, newest frame first
///
/// A stale frame restarts the search from the user env; the immortal
/// tail of the chain guarantees that happens at most once, so the
/// walk always terminates.
pub fn find_var(reg: *mut Region, pr: &Prime, sym: SlWord, mut env: SlWord) -> SlWord {
    while cons_p(reg, env) {
        if stale_p(reg, env) {
            env = pr.user_env;
        }
        let mut alist = unsafe { (*cons_ptr(env)).car };
        while cons_p(reg, alist) {
            if stale_p(reg, alist) {
                break;
            }
            if safe_car(reg, safe_car(reg, alist)) == sym {
                return safe_car(reg, alist);
            }
            alist = safe_cdr(reg, alist);
        }
        env = unsafe { (*cons_ptr(env)).cdr };
    }
    nil()
}

/// Prepends a binding to the env's newest frame
pub fn env_ins(reg: *mut Region, sym: SlWord, val: SlWord, env: SlWord) -> SlWord {
    bail_stale!(reg, env);
    let head = cons_make(reg, cons_make(reg, sym, val), unsafe {
        (*cons_ptr(env)).car
    });
    // the allocations above may have wrapped past the frame itself
    bail_stale!(reg, env);
    unsafe { (*cons_ptr(env)).car = head };
    nil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixnum_make;
    use crate::stdenv;
    use crate::symtab::SymbolTable;

    #[test]
    fn pairlis_truncates() {
        let reg = memmgt::acquire_mem_region(64);
        let mut tbl = SymbolTable::new();
        let a = tbl.intern("a");
        let b = tbl.intern("b");

        let params = cons_make(reg, a, cons_make(reg, b, nil()));
        let args = cons_make(reg, fixnum_make(1), nil());
        let pairs = pairlis(reg, params, args);

        // one pair; the unpaired parameter is dropped
        assert_eq!(safe_car(reg, safe_car(reg, pairs)), a);
        assert_eq!(safe_cdr(reg, safe_car(reg, pairs)), fixnum_make(1));
        assert!(nil_p(safe_cdr(reg, pairs)));

        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn find_var_walks_frames() {
        let reg = memmgt::acquire_mem_region(256);
        let mut tbl = SymbolTable::new();
        let pr = stdenv::prep_environment(reg, &mut tbl);

        let x = tbl.intern("x");
        env_ins(reg, x, fixnum_make(5), pr.user_env);
        let bind = find_var(reg, &pr, x, pr.user_env);
        assert_eq!(safe_cdr(reg, bind), fixnum_make(5));

        // global bindings are visible through the user env
        assert!(!nil_p(find_var(reg, &pr, tbl.intern("t"), pr.user_env)));

        assert!(nil_p(find_var(reg, &pr, tbl.intern("absent"), pr.user_env)));

        unsafe { memmgt::destroy_mem_region(reg) };
    }

    #[test]
    fn env_ins_shadows_outer_bindings() {
        let reg = memmgt::acquire_mem_region(256);
        let mut tbl = SymbolTable::new();
        let pr = stdenv::prep_environment(reg, &mut tbl);

        let x = tbl.intern("x");
        env_ins(reg, x, fixnum_make(1), pr.user_env);

        let frame = cons_make(reg, nil(), pr.user_env);
        env_ins(reg, x, fixnum_make(2), frame);

        let bind = find_var(reg, &pr, x, frame);
        assert_eq!(safe_cdr(reg, bind), fixnum_make(2));

        unsafe { memmgt::destroy_mem_region(reg) };
    }
}
