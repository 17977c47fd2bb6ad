// Ouro, a tiny interactive Lisp on a ring-buffer cons heap.
// Copyright (C) 2026 the Ouro contributors

// Ouro is licensed under the terms of the GNU Affero General Public
// License, version 3. See the top level LICENSE file for the license
// text.

// <>

// src/symtab.rs

// A table to associate symbol names with their unique boxed objects.

// <>

use fxhash::FxHashMap;

use crate::core::{nil, Data, SlWord};

/// Session-wide intern map; one boxed symbol per name, so symbol
/// equality is word equality
pub struct SymbolTable {
    map: FxHashMap<String, SlWord>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut map = FxHashMap::default();
        // reading the name nil must yield the nil singleton
        map.insert(String::from("nil"), nil());
        Self { map }
    }

    /// Returns the symbol for a name, boxing a new one on first sight
    pub fn intern(&mut self, name: &str) -> SlWord {
        if let Some(&sym) = self.map.get(name) {
            return sym;
        }
        let sym = Box::into_raw(Box::new(Data::Sym(String::from(name)))) as SlWord;
        self.map.insert(String::from(name), sym);
        sym
    }

    /// Drops a name from the map; the object itself lives on, but
    /// future reads of the name produce a distinct, ordinary symbol
    pub fn unintern(&mut self, name: &str) {
        self.map.remove(name);
    }
}
