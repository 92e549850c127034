//! Constant pool: spec.md §4.5, grounded on `orig/cg.cc`'s
//! `get_string_constant_no`/`get_int_constant_no`/`generate_constants`.
//! Every distinct string and integer literal that appears anywhere in the
//! program (plus the ones codegen itself needs — format strings, the
//! empty-string default) is interned once and emitted once, referenced by
//! label everywhere else. Each constant is laid out exactly like any other
//! `String`/`Int` object (header + payload) so the runtime methods that
//! hand one back need no special-casing.

use std::collections::HashMap;

use crate::classtable::{ClassTable, INT_ID, STRING_ID};
use crate::codegen::labels::method_table_label;
use crate::layout::HEADER_WORDS;

/// `orig/cg.cc` pre-registers the empty string and the integer `0` before
/// anything else so every `String`/`Int` field default reuses a single
/// constant rather than forcing a fresh one per class.
#[derive(Debug, Default)]
pub struct ConstantPool {
    strings: Vec<String>,
    string_index: HashMap<String, usize>,
    ints: Vec<i64>,
    int_index: HashMap<i64, usize>,
}

impl ConstantPool {
    pub fn new() -> Self {
        let mut pool = Self::default();
        pool.intern_string("");
        pool.intern_int(0);
        pool
    }

    pub fn intern_string(&mut self, s: &str) -> usize {
        if let Some(&i) = self.string_index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), i);
        i
    }

    pub fn intern_int(&mut self, v: i64) -> usize {
        if let Some(&i) = self.int_index.get(&v) {
            return i;
        }
        let i = self.ints.len();
        self.ints.push(v);
        self.int_index.insert(v, i);
        i
    }

    /// spec.md §6's public label contract: `string_constant_N`. The raw
    /// bytes live at the sibling label `string_data_N` (see `emit`).
    pub fn string_label(i: usize) -> String {
        format!("string_constant_{i}")
    }

    pub fn string_data_label(i: usize) -> String {
        format!("string_data_{i}")
    }

    /// spec.md §6's public label contract: `int_constant_N`.
    pub fn int_label(i: usize) -> String {
        format!("int_constant_{i}")
    }

    pub fn empty_string_label(&self) -> String {
        Self::string_label(self.string_index[""])
    }

    pub fn zero_int_label(&self) -> String {
        Self::int_label(self.int_index[&0])
    }

    /// Looks up the `string_constant_N` label for a class name that
    /// `codegen::prototypes::emit` has already interned for every class in
    /// the table (spec.md §6: class-name headers point into the same
    /// `string_constant_N`/`string_data_N` pool as any other string
    /// literal, not a bespoke per-class label).
    fn class_name_label(&self, name: &str) -> String {
        Self::string_label(self.string_index[name])
    }

    pub fn emit(&self, out: &mut String, table: &ClassTable) {
        out.push_str("\t.data\n");
        let string_name = self.class_name_label(&table.get(STRING_ID).name);
        let string_mtable = method_table_label(table, STRING_ID);
        for (i, s) in self.strings.iter().enumerate() {
            let label = Self::string_label(i);
            let data_label = Self::string_data_label(i);
            out.push_str("\t.balign 8\n");
            out.push_str(&format!("{label}:\n"));
            // Object size in bytes (spec.md §4.5), not words: `Object.copy`
            // passes this straight to `malloc`/`memcpy`.
            out.push_str(&format!("\t.quad {}\n", (HEADER_WORDS + 1) * 8)); // header + data ptr
            out.push_str("\t.quad 0\n"); // GC tag, reserved and unused
            out.push_str(&format!("\t.quad {}\n", STRING_ID.0));
            out.push_str(&format!("\t.quad {string_name}\n"));
            out.push_str(&format!("\t.quad {string_mtable}\n"));
            out.push_str(&format!("\t.quad {data_label}\n"));
            out.push_str(&format!("{data_label}:\n"));
            out.push_str(&format!("\t.string \"{}\"\n", escape(s)));
        }

        let int_name = self.class_name_label(&table.get(INT_ID).name);
        let int_mtable = method_table_label(table, INT_ID);
        for (i, v) in self.ints.iter().enumerate() {
            let label = Self::int_label(i);
            out.push_str("\t.balign 8\n");
            out.push_str(&format!("{label}:\n"));
            out.push_str(&format!("\t.quad {}\n", (HEADER_WORDS + 1) * 8));
            out.push_str("\t.quad 0\n");
            out.push_str(&format!("\t.quad {}\n", INT_ID.0));
            out.push_str(&format!("\t.quad {int_name}\n"));
            out.push_str(&format!("\t.quad {int_mtable}\n"));
            out.push_str(&format!("\t.quad {v}\n"));
        }

        let bool_name = self.class_name_label(&table.get(crate::classtable::BOOL_ID).name);
        let bool_mtable = method_table_label(table, crate::classtable::BOOL_ID);
        for (label, value) in [("bool_constant_false", 0), ("bool_constant_true", 1)] {
            out.push_str("\t.balign 8\n");
            out.push_str(&format!("{label}:\n"));
            out.push_str(&format!("\t.quad {}\n", (HEADER_WORDS + 1) * 8));
            out.push_str("\t.quad 0\n");
            out.push_str(&format!("\t.quad {}\n", crate::classtable::BOOL_ID.0));
            out.push_str(&format!("\t.quad {bool_name}\n"));
            out.push_str(&format!("\t.quad {bool_mtable}\n"));
            out.push_str(&format!("\t.quad {value}\n"));
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '\u{8}' => out.push_str("\\b"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}
