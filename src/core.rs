// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is licensed under the terms of the GNU Affero General Public
// License, version 3. See the top level LICENSE file for the license
// text.

// <>

// src/core.rs

// Ouro value representation: tagged machine words, ring-resident cons
// cells, immortal boxed data, and the staleness oracle consulted at
// every destructuring step. Also renders values for display.

// <>

use std::fmt;
use std::ptr;

use crate::memmgt::{self, Region, CELL_LEN};

/// Every Ouro value is one tagged machine word
///
/// The lowest bit marks a fixnum. A clear low bit with a masked
/// address inside the ring region marks a cons, whose bits 1 to 3
/// carry its allocation generation. Anything else points at a boxed
/// Data record outside the ring.
pub type SlWord = usize;

/// Mask selecting the tag bits of a word
const TAG_MASK: usize = CELL_LEN - 1;

/// A cons cell: two tagged words; lives only in the ring region
#[repr(C)]
pub struct Cons {
    pub car: SlWord,
    pub cdr: SlWord,
}

/// Signature for subroutines implemented in Rust
///
/// Arguments:
/// - Memory region in which to place the result
/// - Primordial objects
/// - Evaluated, nil-terminated argument list
pub type NativeFn = fn(*mut Region, &Prime, SlWord) -> SlWord;

/// Boxed data record; allocated outside the ring, never reclaimed
///
/// Alignment keeps the low four bits of every box address clear, so a
/// box pointer is a valid tagged word as-is.
#[repr(align(16))]
pub enum Data {
    Nil,
    Sym(String),
    Subr(NativeFn),
    Err(String),
    Stale(SlWord),
}

/// The nil singleton; interning the name "nil" resolves to this object
static NIL: Data = Data::Nil;

/// Immortal objects every evaluation needs at hand, created once
/// before the ring freezes
pub struct Prime {
    pub sym_t: SlWord,
    pub sym_quote: SlWord,
    pub sym_if: SlWord,
    pub sym_lambda: SlWord,
    pub sym_defun: SlWord,
    pub sym_setq: SlWord,
    /// Closure marker; uninterned so user code cannot forge closures
    pub sym_expr: SlWord,
    pub g_env: SlWord,
    pub user_env: SlWord,
}

/// Short-circuits the enclosing function with a fresh stale sentinel
/// if the word no longer refers to a live cell
macro_rules! bail_stale {
    ( $reg:expr, $obj:expr ) => {
        if $crate::core::stale_p($reg, $obj) {
            return $crate::core::stale_make($obj);
        }
    };
}

/// Short-circuits the enclosing function, passing an error through
/// unchanged
macro_rules! bail_err {
    ( $reg:expr, $obj:expr ) => {
        if $crate::core::err_p($reg, $obj) {
            return $obj;
        }
    };
}

pub(crate) use {bail_err, bail_stale};

/// Returns the nil object
#[inline(always)]
pub fn nil() -> SlWord {
    &NIL as *const Data as SlWord
}

#[inline(always)]
pub fn nil_p(val: SlWord) -> bool {
    val == nil()
}

/// Checks the fixnum tag, the lowest word bit
#[inline(always)]
pub fn fixnum_p(val: SlWord) -> bool {
    val & 1 != 0
}

#[inline(always)]
pub fn fixnum_make(num: i64) -> SlWord {
    ((num as SlWord) << 1) | 1
}

#[inline(always)]
pub fn fixnum_get(val: SlWord) -> i64 {
    (val as i64) >> 1
}

/// Strips the tag bits from a word, leaving a cell address
#[inline(always)]
pub fn cons_ptr(val: SlWord) -> *mut Cons {
    (val & !TAG_MASK) as *mut Cons
}

#[inline(always)]
fn data_ptr(val: SlWord) -> *const Data {
    (val & !TAG_MASK) as *const Data
}

fn data_ref<'a>(val: SlWord) -> &'a Data {
    unsafe { &*data_ptr(val) }
}

/// Checks whether a word refers into the ring region
#[inline(always)]
pub fn cons_p(reg: *mut Region, val: SlWord) -> bool {
    !fixnum_p(val) && memmgt::in_region(reg, cons_ptr(val) as usize)
}

#[inline(always)]
fn boxed_p(reg: *mut Region, val: SlWord) -> bool {
    !fixnum_p(val) && !cons_p(reg, val)
}

pub fn sym_p(reg: *mut Region, val: SlWord) -> bool {
    boxed_p(reg, val) && matches!(data_ref(val), Data::Sym(_))
}

pub fn subr_p(reg: *mut Region, val: SlWord) -> bool {
    boxed_p(reg, val) && matches!(data_ref(val), Data::Subr(_))
}

pub fn err_p(reg: *mut Region, val: SlWord) -> bool {
    boxed_p(reg, val) && matches!(data_ref(val), Data::Err(_))
}

/// Checks for an already-boxed stale sentinel
pub fn stale_box_p(reg: *mut Region, val: SlWord) -> bool {
    boxed_p(reg, val) && matches!(data_ref(val), Data::Stale(_))
}

/// Generation stamped into a cons word's tag bits
#[inline(always)]
pub fn gen_of(val: SlWord) -> usize {
    (val & TAG_MASK) >> 1
}

/// Whether a word points at ring cells above the immortal line
pub fn fragile_p(reg: *mut Region, val: SlWord) -> bool {
    cons_p(reg, val) && memmgt::above_saved(reg, cons_ptr(val) as usize)
}

/// The staleness oracle: true when a cons word's stamped generation
/// disagrees with the cursor's current view of its address, or when
/// the word is a boxed stale sentinel
pub fn stale_p(reg: *mut Region, val: SlWord) -> bool {
    (fragile_p(reg, val) && gen_of(val) != memmgt::current_gen(reg, cons_ptr(val) as usize))
        || stale_box_p(reg, val)
}

/// Allocates a cons in the ring, stamped with the current generation
pub fn cons_make(reg: *mut Region, car: SlWord, cdr: SlWord) -> SlWord {
    unsafe {
        let cell = memmgt::alloc(reg) as *mut Cons;
        ptr::write(cell, Cons { car, cdr });
        cell as SlWord | (memmgt::generation(reg) << 1)
    }
}

/// Boxes an error value carrying a message
pub fn err_make(msg: &str) -> SlWord {
    Box::into_raw(Box::new(Data::Err(msg.to_owned()))) as SlWord
}

/// Boxes a stale sentinel wrapping the offending word
pub fn stale_make(val: SlWord) -> SlWord {
    Box::into_raw(Box::new(Data::Stale(val))) as SlWord
}

/// Boxes a subroutine
pub fn subr_make(func: NativeFn) -> SlWord {
    Box::into_raw(Box::new(Data::Subr(func))) as SlWord
}

/// Name of a symbol object
pub fn sym_name<'a>(val: SlWord) -> &'a str {
    match data_ref(val) {
        Data::Sym(name) => name,
        _ => panic!("not a symbol"),
    }
}

pub fn subr_get(val: SlWord) -> NativeFn {
    match data_ref(val) {
        Data::Subr(func) => *func,
        _ => panic!("not a subroutine"),
    }
}

/// Car of a cons word, nil for anything else, behind the staleness
/// check that every destructuring step requires
pub fn safe_car(reg: *mut Region, obj: SlWord) -> SlWord {
    bail_stale!(reg, obj);
    if cons_p(reg, obj) {
        unsafe { (*cons_ptr(obj)).car }
    } else {
        nil()
    }
}

/// Cdr counterpart of safe_car
pub fn safe_cdr(reg: *mut Region, obj: SlWord) -> SlWord {
    bail_stale!(reg, obj);
    if cons_p(reg, obj) {
        unsafe { (*cons_ptr(obj)).cdr }
    } else {
        nil()
    }
}

/// Reverses a list in place; permitted because callers only hand it
/// lists not yet reachable from anywhere else
pub fn nreverse(reg: *mut Region, mut lst: SlWord) -> SlWord {
    bail_stale!(reg, lst);
    let mut ret = nil();
    while cons_p(reg, lst) {
        let cell = cons_ptr(lst);
        unsafe {
            let tmp = (*cell).cdr;
            (*cell).cdr = ret;
            ret = lst;
            lst = tmp;
        }
        bail_stale!(reg, lst);
    }
    ret
}

/// Bundles a value with the state needed to render it
pub struct SlContextVal<'a> {
    reg: *mut Region,
    pr: &'a Prime,
    val: SlWord,
}

pub fn context<'a>(reg: *mut Region, pr: &'a Prime, val: SlWord) -> SlContextVal<'a> {
    SlContextVal { reg, pr, val }
}

impl fmt::Display for SlContextVal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (reg, pr) = (self.reg, self.pr);
        let val = self.val;

        if cons_p(reg, val) {
            // closures never leak their internal shape
            if safe_car(reg, val) == pr.sym_expr {
                return write!(f, "<expr>");
            }
            write!(f, "(")?;
            let mut obj = val;
            let mut first = true;
            while cons_p(reg, obj) {
                if !first {
                    write!(f, " ")?;
                }
                first = false;
                let cell = unsafe { &*cons_ptr(obj) };
                write!(f, "{}", context(reg, pr, cell.car))?;
                obj = cell.cdr;
            }
            if !nil_p(obj) {
                write!(f, " . {}", context(reg, pr, obj))?;
            }
            write!(f, ")")
        } else if fixnum_p(val) {
            write!(f, "{}", fixnum_get(val))
        } else {
            match data_ref(val) {
                Data::Nil => write!(f, "nil"),
                Data::Sym(name) => write!(f, "{}", name),
                Data::Subr(_) => write!(f, "<subr>"),
                Data::Err(msg) => write!(f, "<error: {}>", msg),
                Data::Stale(word) => write!(f, "<stale value: {:x}>", word),
            }
        }
    }
}
