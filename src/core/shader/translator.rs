// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shader bytecode to GLSL translation
//!
//! The shader ISA drives control flow with indexed jumps, subroutine calls
//! and statically counted conditional regions; GLSL has none of that. The
//! translator bridges the gap in two passes:
//!
//! 1. **Discovery**: scan the whole instruction array and record every
//!    block entry offset: subroutine call targets, conditional-jump
//!    targets, and the fallthrough offset after each conditional jump.
//!    Block names must be known up front so prototypes can be
//!    forward-declared.
//! 2. **Emission**: one linear pass over the instructions. Each discovered
//!    offset starts a new GLSL function; a function falls through by
//!    returning the offset of the next block, jumps by returning the jump
//!    target, and ends the program by returning -1. A dispatch loop at the
//!    entry point polls the returned program counter, which recovers the
//!    hardware's direct-jump semantics without `goto`.
//!
//! Conditional (IF-family) regions are not jumps on this hardware: they
//! carry explicit true/false instruction counts, so the emitter tracks an
//! ordered list of open regions, counting each one down per emitted
//! instruction.
//!
//! Translation is a pure function of its inputs; all discovery state is
//! rebuilt per call. Unknown opcodes degrade to comment stubs, never
//! errors.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::instruction::{DestMask, Instruction, Opcode, SwizzlePattern};
use super::ShaderUnit;

/// Hard bound on emitted instructions, against malformed/endless bytecode
const MAX_INSTRUCTIONS: usize = 1024;

/// Iteration cap of the emitted dispatch loop
const DISPATCH_CAP: usize = 1024;

/// Guard threshold for reciprocal and reciprocal-sqrt inputs
///
/// Below this magnitude the hardware saturates instead of producing a
/// non-finite value; the emitted GLSL leaves the destination unmodified.
const RECIPROCAL_GUARD: &str = "1e-7";

/// Translator tuning flags
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslatorOptions {
    /// Also split blocks after NOP-NOP pairs
    ///
    /// A handful of titles pad subroutine ends with two NOPs; treating the
    /// pair as a function-end marker matches their layout. Off by default;
    /// call/jump-target discovery is the canonical rule.
    pub nop_pair_splitting: bool,
}

/// Translate a shader binary into a GLSL vertex program
///
/// `code` is the raw instruction array, `swizzles` the operand descriptor
/// table, `entry_point` the offset execution starts at. The result is a
/// complete compilable program; behavioral equivalence, not readability,
/// is the goal.
pub fn translate(
    code: &[u32],
    swizzles: &[u32],
    entry_point: usize,
    options: &TranslatorOptions,
) -> String {
    let bound = code.len().min(MAX_INSTRUCTIONS);
    let blocks = discover_blocks(code, bound, entry_point, options);

    let mut emitter = Emitter {
        swizzles,
        blocks: &blocks,
        out: String::new(),
        body: String::new(),
        scopes: Vec::new(),
        current_block: 0,
    };

    emitter.emit_prelude(entry_point);
    emitter.emit_functions(code, bound);
    emitter.emit_dispatch(entry_point);
    emitter.out
}

/// Translate the program currently loaded in a shader unit
///
/// Trailing zero words of instruction memory are trimmed first; the
/// instruction array carries no explicit length.
pub fn translate_unit(unit: &ShaderUnit, options: &TranslatorOptions) -> String {
    let len = unit
        .program
        .iter()
        .rposition(|&w| w != 0)
        .map_or(0, |p| p + 1);
    translate(
        &unit.program[..len],
        &unit.swizzles,
        unit.entry_point(),
        options,
    )
}

/// Discovery pass: offset -> synthesized block name
///
/// Must run to completion before emission so every block can be
/// forward-declared. Offset 0 is always a block: the emission pass is
/// linear and needs somewhere to start.
fn discover_blocks(
    code: &[u32],
    bound: usize,
    entry_point: usize,
    options: &TranslatorOptions,
) -> BTreeMap<usize, String> {
    let mut blocks = BTreeMap::new();
    let mut register = |offset: usize| {
        if offset < bound {
            blocks
                .entry(offset)
                .or_insert_with(|| format!("sub_{offset:03x}"));
        }
    };

    register(0);
    register(entry_point);

    for pc in 0..bound {
        let inst = Instruction(code[pc]);
        match inst.opcode() {
            Opcode::Call | Opcode::Callc | Opcode::Callu => {
                register(inst.dest_offset());
            }
            Opcode::Jmpc | Opcode::Jmpu => {
                register(inst.dest_offset());
                register(pc + 1);
            }
            _ => {}
        }
    }

    if options.nop_pair_splitting {
        // Legacy heuristic: two consecutive NOPs mark a subroutine end
        for pc in 0..bound.saturating_sub(2) {
            let a = Instruction(code[pc]).opcode();
            let b = Instruction(code[pc + 1]).opcode();
            if a == Opcode::Nop && b == Opcode::Nop {
                register(pc + 2);
            }
        }
    }

    blocks
}

/// An open statically-counted region (IF true/false branch or LOOP body)
struct Scope {
    kind: ScopeKind,
    /// Instructions left before this region closes
    remaining: usize,
}

enum ScopeKind {
    /// True branch of a conditional; `else_count` instructions follow in
    /// the false branch (0 = no else)
    True { else_count: usize },
    /// False branch of a conditional
    Else,
    /// Loop body; `int_id` selects the integer uniform driving it
    Loop { int_id: usize },
}

struct Emitter<'a> {
    swizzles: &'a [u32],
    blocks: &'a BTreeMap<usize, String>,
    /// Finished program text
    out: String,
    /// Body of the function currently being emitted
    body: String,
    /// Open counted regions, outermost first
    scopes: Vec<Scope>,
    /// Offset of the block the current function started at
    current_block: usize,
}

impl Emitter<'_> {
    /// Append one statement line at the current nesting depth
    fn stmt(&mut self, s: &str) {
        for _ in 0..=self.scopes.len() {
            self.body.push_str("    ");
        }
        self.body.push_str(s);
        self.body.push('\n');
    }

    fn pattern(&self, desc_id: usize) -> SwizzlePattern {
        self.swizzles
            .get(desc_id)
            .map(|&w| SwizzlePattern(w))
            .unwrap_or(SwizzlePattern::IDENTITY)
    }

    // ---- Output assembly ----

    fn emit_prelude(&mut self, entry_point: usize) {
        let out = &mut self.out;
        out.push_str("// Generated vertex program. The source ISA uses unstructured jumps,\n");
        out.push_str("// so blocks are functions returning the next program counter and a\n");
        out.push_str("// dispatch loop polls them; -1 means execution finished.\n");
        out.push_str("#version 330 core\n\n");
        out.push_str("in vec4 attr[16];\n\n");
        out.push_str("out vec4 vtx_color;\n");
        out.push_str("out vec2 vtx_texcoord0;\n");
        out.push_str("out vec2 vtx_texcoord1;\n");
        out.push_str("out vec2 vtx_texcoord2;\n\n");
        out.push_str("uniform vec4 c[96];\n");
        out.push_str("uniform bool bu[16];\n");
        out.push_str("uniform ivec4 iu[4];\n");
        out.push_str("uniform int in_map[16];\n");
        out.push_str("uniform int out_map[7];\n\n");
        out.push_str("vec4 v[16];\n");
        out.push_str("vec4 r[16];\n");
        out.push_str("vec4 o[8];\n");
        out.push_str("ivec2 a0;\n");
        out.push_str("int a_l;\n");
        out.push_str("bvec2 cmp;\n\n");

        // Forward prototypes for every discovered block
        for name in self.blocks.values() {
            let _ = writeln!(out, "int {name}();");
        }
        out.push('\n');
        let _ = writeln!(out, "// entry point: 0x{entry_point:03x}");
    }

    fn open_function(&mut self, offset: usize) {
        self.current_block = offset;
        self.body.clear();
        self.scopes.clear();
    }

    /// Close the current function; `fallthrough` is the next block offset,
    /// or `None` at the end of the program
    fn close_function(&mut self, fallthrough: Option<usize>) {
        // Malformed bytecode can leave counted regions open across a block
        // boundary; close them so the output stays parseable
        while let Some(scope) = self.scopes.pop() {
            if let ScopeKind::Loop { int_id } = scope.kind {
                let indent = "    ".repeat(self.scopes.len() + 2);
                let _ = writeln!(self.body, "{indent}a_l += iu[{int_id}].z;");
            }
            for _ in 0..=self.scopes.len() {
                self.body.push_str("    ");
            }
            self.body.push_str("}\n");
        }

        match fallthrough {
            Some(next) => self.stmt(&format!("return 0x{next:x};")),
            None => self.stmt("return -1;"),
        }

        let name = &self.blocks[&self.current_block];
        let _ = writeln!(self.out, "int {name}() {{");
        self.out.push_str(&self.body);
        self.out.push_str("}\n\n");
    }

    fn emit_functions(&mut self, code: &[u32], bound: usize) {
        if bound == 0 {
            return;
        }
        self.open_function(0);

        for pc in 0..bound {
            if pc != self.current_block && self.blocks.contains_key(&pc) {
                self.close_function(Some(pc));
                self.open_function(pc);
            }

            let outer_scopes = self.scopes.len();
            let stop = self.emit_instruction(code, pc);

            // Count this instruction against every region that was already
            // open before it (not one it just opened itself)
            for scope in &mut self.scopes[..outer_scopes] {
                scope.remaining = scope.remaining.saturating_sub(1);
            }
            self.finish_scopes();

            if stop && self.blocks.range(pc + 1..).next().is_none() {
                // Program ended and nothing reachable follows
                self.close_function(None);
                return;
            }
        }

        self.close_function(None);
    }

    /// Close every innermost region whose countdown reached zero
    fn finish_scopes(&mut self) {
        while let Some(top) = self.scopes.last_mut() {
            if top.remaining > 0 {
                break;
            }
            match top.kind {
                ScopeKind::True { else_count } if else_count > 0 => {
                    top.kind = ScopeKind::Else;
                    top.remaining = else_count;
                    for _ in 0..self.scopes.len() {
                        self.body.push_str("    ");
                    }
                    self.body.push_str("} else {\n");
                }
                ScopeKind::True { .. } | ScopeKind::Else => {
                    self.scopes.pop();
                    for _ in 0..=self.scopes.len() {
                        self.body.push_str("    ");
                    }
                    self.body.push_str("}\n");
                }
                ScopeKind::Loop { int_id } => {
                    self.stmt(&format!("a_l += iu[{int_id}].z;"));
                    self.scopes.pop();
                    for _ in 0..=self.scopes.len() {
                        self.body.push_str("    ");
                    }
                    self.body.push_str("}\n");
                }
            }
        }
    }

    /// Translate one instruction; returns true when it ends the program
    fn emit_instruction(&mut self, code: &[u32], pc: usize) -> bool {
        let inst = Instruction(code[pc]);
        match inst.opcode() {
            Opcode::Add => self.arith_binary(inst, |a, b| format!("{a} + {b}")),
            Opcode::Mul => self.arith_binary(inst, |a, b| format!("{a} * {b}")),
            Opcode::Max => self.arith_binary(inst, |a, b| format!("max({a}, {b})")),
            Opcode::Min => self.arith_binary(inst, |a, b| format!("min({a}, {b})")),
            Opcode::Dp3 => {
                self.arith_binary(inst, |a, b| format!("vec4(dot(({a}).xyz, ({b}).xyz))"))
            }
            Opcode::Dp4 => self.arith_binary(inst, |a, b| format!("vec4(dot({a}, {b}))")),

            Opcode::Mov => {
                let pattern = self.pattern(inst.operand_desc_id());
                let a = src_expr(inst.src1(), inst.address_register(), pattern, 0);
                self.masked_assign(dest_reg(inst.dest()), &a, pattern.dest_mask());
            }

            Opcode::Rcp => self.guarded_scalar(inst, |x| format!("1.0 / {x}")),
            Opcode::Rsq => self.guarded_scalar(inst, |x| format!("inversesqrt({x})")),

            Opcode::Mova => {
                let pattern = self.pattern(inst.operand_desc_id());
                let a = src_expr(inst.src1(), inst.address_register(), pattern, 0);
                let mask = pattern.dest_mask();
                if mask.contains(DestMask::X) {
                    self.stmt(&format!("a0.x = int(({a}).x);"));
                }
                if mask.contains(DestMask::Y) {
                    self.stmt(&format!("a0.y = int(({a}).y);"));
                }
            }

            Opcode::Cmp => {
                let pattern = self.pattern(inst.operand_desc_id());
                let a = src_expr(inst.src1(), inst.address_register(), pattern, 0);
                let b = src_expr(inst.src2(), 0, pattern, 1);
                for (lane, op) in [('x', inst.cmp_op_x()), ('y', inst.cmp_op_y())] {
                    match compare_op(op) {
                        Some(op) => self.stmt(&format!(
                            "cmp.{lane} = ({a}).{lane} {op} ({b}).{lane};"
                        )),
                        // Reserved encodings always pass
                        None => self.stmt(&format!("cmp.{lane} = true;")),
                    }
                }
            }

            Opcode::Mad => {
                let pattern = self.pattern(inst.mad_operand_desc_id());
                let a = src_expr(inst.mad_src1(), 0, pattern, 0);
                let b = src_expr(inst.mad_src2(), 0, pattern, 1);
                let c = src_expr(inst.mad_src3(), 0, pattern, 2);
                let expr = format!("{a} * {b} + {c}");
                self.masked_assign(dest_reg(inst.mad_dest()), &expr, pattern.dest_mask());
            }

            Opcode::Call => self.call_block(inst.dest_offset(), None),
            Opcode::Callc => self.call_block(inst.dest_offset(), Some(condition(inst))),
            Opcode::Callu => {
                let cond = format!("bu[{}]", inst.bool_uniform_id());
                self.call_block(inst.dest_offset(), Some(cond));
            }

            Opcode::Jmpc => {
                let cond = condition(inst);
                self.stmt(&format!(
                    "if ({cond}) {{ return 0x{:x}; }}",
                    inst.dest_offset()
                ));
            }
            Opcode::Jmpu => {
                let id = inst.bool_uniform_id();
                let cond = if inst.jmpu_negated() {
                    format!("!bu[{id}]")
                } else {
                    format!("bu[{id}]")
                };
                self.stmt(&format!(
                    "if ({cond}) {{ return 0x{:x}; }}",
                    inst.dest_offset()
                ));
            }

            Opcode::Ifc => self.open_conditional(condition(inst), inst, pc),
            Opcode::Ifu => {
                let cond = format!("bu[{}]", inst.bool_uniform_id());
                self.open_conditional(cond, inst, pc);
            }

            Opcode::Loop => {
                let id = inst.int_uniform_id();
                self.stmt(&format!("a_l = iu[{id}].y;"));
                self.stmt(&format!(
                    "for (int loop{pc} = 0; loop{pc} <= iu[{id}].x; loop{pc}++) {{"
                ));
                self.scopes.push(Scope {
                    kind: ScopeKind::Loop { int_id: id },
                    remaining: inst.dest_offset().saturating_sub(pc),
                });
            }

            Opcode::Nop => {}
            Opcode::End => {
                self.stmt("return -1;");
                return true;
            }
            Opcode::Unknown(op) => {
                self.stmt(&format!("// unhandled shader opcode 0x{op:02x}"));
            }
        }
        false
    }

    fn arith_binary(&mut self, inst: Instruction, f: impl Fn(&str, &str) -> String) {
        let pattern = self.pattern(inst.operand_desc_id());
        let a = src_expr(inst.src1(), inst.address_register(), pattern, 0);
        let b = src_expr(inst.src2(), 0, pattern, 1);
        let expr = f(&a, &b);
        self.masked_assign(dest_reg(inst.dest()), &expr, pattern.dest_mask());
    }

    /// RCP/RSQ: scalar op on src.x, broadcast, skipped entirely for
    /// near-zero magnitudes (the hardware saturates; GLSL would produce
    /// inf/NaN)
    fn guarded_scalar(&mut self, inst: Instruction, f: impl Fn(&str) -> String) {
        let pattern = self.pattern(inst.operand_desc_id());
        let a = src_expr(inst.src1(), inst.address_register(), pattern, 0);
        let x = format!("({a}).x");
        let scalar = f(&x);
        let dest = dest_reg(inst.dest());
        let mask = pattern.dest_mask();
        let assign = match assignment(&dest, &format!("vec4({scalar})"), mask) {
            Some(s) => s,
            None => return,
        };
        self.stmt(&format!(
            "if (abs({x}) > {RECIPROCAL_GUARD}) {{ {assign} }}"
        ));
    }

    fn masked_assign(&mut self, dest: String, expr: &str, mask: DestMask) {
        if let Some(s) = assignment(&dest, expr, mask) {
            self.stmt(&s);
        }
    }

    /// Direct call to a discovered block; unknown targets become a
    /// harmless comment instead of failing the whole translation
    fn call_block(&mut self, target: usize, cond: Option<String>) {
        match (self.blocks.get(&target), cond) {
            (Some(name), None) => self.stmt(&format!("{name}();")),
            (Some(name), Some(cond)) => self.stmt(&format!("if ({cond}) {{ {name}(); }}")),
            (None, _) => self.stmt(&format!("// call to unregistered offset 0x{target:x}")),
        }
    }

    fn open_conditional(&mut self, cond: String, inst: Instruction, pc: usize) {
        self.stmt(&format!("if ({cond}) {{"));
        self.scopes.push(Scope {
            kind: ScopeKind::True {
                else_count: inst.num_instructions(),
            },
            remaining: inst.dest_offset().saturating_sub(pc + 1),
        });
    }

    fn emit_dispatch(&mut self, entry_point: usize) {
        let out = &mut self.out;
        out.push_str("int run_block(int pc) {\n");
        for (offset, name) in self.blocks {
            let _ = writeln!(out, "    if (pc == 0x{offset:x}) {{ return {name}(); }}");
        }
        out.push_str("    return -1;\n");
        out.push_str("}\n\n");

        out.push_str("void exec_shader() {\n");
        let _ = writeln!(out, "    int pc = 0x{entry_point:x};");
        let _ = writeln!(out, "    for (int i = 0; i < {DISPATCH_CAP}; i++) {{");
        out.push_str("        pc = run_block(pc);\n");
        out.push_str("        if (pc < 0) {\n");
        out.push_str("            return;\n");
        out.push_str("        }\n");
        out.push_str("    }\n");
        out.push_str("}\n\n");

        out.push_str("void main() {\n");
        out.push_str("    for (int i = 0; i < 16; i++) {\n");
        out.push_str("        v[i] = vec4(0.0);\n");
        out.push_str("        r[i] = vec4(0.0);\n");
        out.push_str("    }\n");
        out.push_str("    for (int i = 0; i < 8; i++) {\n");
        out.push_str("        o[i] = vec4(0.0);\n");
        out.push_str("    }\n");
        out.push_str("    for (int i = 0; i < 16; i++) {\n");
        out.push_str("        v[in_map[i]] = attr[i];\n");
        out.push_str("    }\n");
        out.push_str("    a0 = ivec2(0);\n");
        out.push_str("    a_l = 0;\n");
        out.push_str("    cmp = bvec2(false);\n");
        out.push_str("    exec_shader();\n");
        out.push_str("    gl_Position = o[out_map[0]];\n");
        out.push_str("    vtx_color = o[out_map[1]];\n");
        out.push_str("    vtx_texcoord0 = o[out_map[2]].xy;\n");
        out.push_str("    vtx_texcoord1 = o[out_map[3]].xy;\n");
        out.push_str("    vtx_texcoord2 = o[out_map[4]].xy;\n");
        out.push_str("}\n");
    }
}

/// GLSL name of a source register, with address-register offsetting for
/// float uniforms
fn src_reg(reg: u8, addr_sel: u8) -> String {
    match reg {
        0x00..=0x0F => format!("v[{reg}]"),
        0x10..=0x1F => format!("r[{}]", reg - 0x10),
        _ => {
            let base = reg - 0x20;
            match addr_sel {
                1 => format!("c[{base} + a0.x]"),
                2 => format!("c[{base} + a0.y]"),
                3 => format!("c[{base} + a_l]"),
                _ => format!("c[{base}]"),
            }
        }
    }
}

/// Full source operand expression: register, swizzle, negation
fn src_expr(reg: u8, addr_sel: u8, pattern: SwizzlePattern, n: usize) -> String {
    let mut expr = src_reg(reg, addr_sel);
    let suffix = pattern.selector_suffix(n);
    if suffix != "xyzw" {
        expr = format!("{expr}.{suffix}");
    }
    if pattern.negate(n) {
        expr = format!("(-{expr})");
    }
    expr
}

/// GLSL name of a destination register
fn dest_reg(reg: u8) -> String {
    if reg < 0x10 {
        format!("o[{reg}]")
    } else {
        format!("r[{}]", reg - 0x10)
    }
}

/// Write-masked assignment statement; `None` when the mask is empty
fn assignment(dest: &str, expr: &str, mask: DestMask) -> Option<String> {
    if mask.is_empty() {
        return None;
    }
    if mask == DestMask::all() {
        return Some(format!("{dest} = {expr};"));
    }
    let m = mask.suffix();
    Some(format!("{dest}.{m} = ({expr}).{m};"))
}

/// GLSL operator for a comparison encoding; `None` for the reserved
/// always-true encodings
fn compare_op(op: u8) -> Option<&'static str> {
    match op {
        0 => Some("=="),
        1 => Some("!="),
        2 => Some("<"),
        3 => Some("<="),
        4 => Some(">"),
        5 => Some(">="),
        _ => None,
    }
}

/// Condition expression over the two condition-register components
fn condition(inst: Instruction) -> String {
    let x = format!("cmp.x == {}", inst.ref_x());
    let y = format!("cmp.y == {}", inst.ref_y());
    match inst.condition_op() {
        0 => format!("{x} || {y}"),
        1 => format!("{x} && {y}"),
        2 => x,
        _ => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OP_MOV: u32 = 0x13;
    const OP_NOP: u32 = 0x21;
    const OP_END: u32 = 0x22;
    const OP_CALL: u32 = 0x24;
    const OP_IFC: u32 = 0x28;
    const OP_LOOP: u32 = 0x29;
    const OP_JMPC: u32 = 0x2C;
    const OP_RCP: u32 = 0x0E;

    fn mov(dest: u8, src: u8) -> u32 {
        (OP_MOV << 26) | ((dest as u32) << 21) | ((src as u32) << 12)
    }

    fn end() -> u32 {
        OP_END << 26
    }

    fn nop() -> u32 {
        OP_NOP << 26
    }

    fn call(target: u32, num: u32) -> u32 {
        (OP_CALL << 26) | (target << 10) | num
    }

    fn ifc(dest: u32, num: u32) -> u32 {
        // condition op 2: test cmp.x only
        (OP_IFC << 26) | (2 << 22) | (dest << 10) | num
    }

    fn identity_swizzles() -> Vec<u32> {
        vec![SwizzlePattern::IDENTITY.0]
    }

    fn braces_balanced(text: &str) -> bool {
        let open = text.matches('{').count();
        let close = text.matches('}').count();
        open == close
    }

    fn extract_function<'a>(text: &'a str, name: &str) -> &'a str {
        let start = text
            .find(&format!("int {name}() {{"))
            .unwrap_or_else(|| panic!("missing function {name}"));
        let end = text[start..].find("\n}").unwrap() + start;
        &text[start..end]
    }

    #[test]
    fn test_ifc_emits_balanced_conditional() {
        // IFC with a one-instruction true branch and one-instruction else
        let code = [ifc(2, 1), mov(0x10, 0), mov(0x11, 0), end()];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());

        assert!(glsl.contains("if (cmp.x == false) {"));
        assert!(glsl.contains("} else {"));
        assert!(braces_balanced(&glsl), "unbalanced braces:\n{glsl}");

        // Exactly one statement per branch
        let body = extract_function(&glsl, "sub_000");
        assert!(body.contains("r[0] = v[0];"));
        assert!(body.contains("r[1] = v[0];"));
    }

    #[test]
    fn test_conditional_without_else() {
        let code = [ifc(2, 0), mov(0x10, 0), mov(0x11, 1), end()];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(!glsl.contains("else"));
        assert!(braces_balanced(&glsl));
        // The second MOV sits outside the closed conditional
        let body = extract_function(&glsl, "sub_000");
        let if_pos = body.find("if (").unwrap();
        let close_pos = body[if_pos..].find('}').unwrap() + if_pos;
        let second_mov = body.find("r[1] = v[1];").unwrap();
        assert!(second_mov > close_pos);
    }

    #[test]
    fn test_discovery_is_order_independent() {
        // Two disjoint subroutines; only the call order in main differs
        let sub_a = 4;
        let sub_b = 6;
        let mut first = vec![call(sub_a, 1), call(sub_b, 1), end(), nop()];
        first.extend([mov(0x10, 0), end(), mov(0x11, 1), end()]);
        let mut second = vec![call(sub_b, 1), call(sub_a, 1), end(), nop()];
        second.extend([mov(0x10, 0), end(), mov(0x11, 1), end()]);

        let opts = TranslatorOptions::default();
        let glsl_first = translate(&first, &identity_swizzles(), 0, &opts);
        let glsl_second = translate(&second, &identity_swizzles(), 0, &opts);

        assert_eq!(
            extract_function(&glsl_first, "sub_004"),
            extract_function(&glsl_second, "sub_004")
        );
        assert_eq!(
            extract_function(&glsl_first, "sub_006"),
            extract_function(&glsl_second, "sub_006")
        );
    }

    #[test]
    fn test_call_emits_direct_invocation() {
        let code = [call(2, 1), end(), mov(0x10, 0), end()];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        let main_body = extract_function(&glsl, "sub_000");
        assert!(main_body.contains("sub_002();"));
        // Prototype is forward-declared before any body
        let proto = glsl.find("int sub_002();").unwrap();
        let body = glsl.find("int sub_002() {").unwrap();
        assert!(proto < body);
    }

    #[test]
    fn test_rcp_is_guarded() {
        let code = [
            (OP_RCP << 26) | (0x10 << 21) | (0x20 << 12), // RCP r0, c0
            end(),
        ];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(glsl.contains("1e-7"));
        assert!(glsl.contains("1.0 / (c[0]).x"));
    }

    #[test]
    fn test_unknown_opcode_becomes_comment_stub() {
        let code = [0x1F << 26, end()];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(glsl.contains("// unhandled shader opcode 0x1f"));
        assert!(braces_balanced(&glsl));
    }

    #[test]
    fn test_jmpc_translates_to_early_return() {
        let code = [(OP_JMPC << 26) | (2 << 22) | (2 << 10), end(), mov(0x10, 0), end()];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(glsl.contains("if (cmp.x == false) { return 0x2; }"));
        // The fallthrough offset after the jump is its own block
        assert!(glsl.contains("int sub_001() {"));
    }

    #[test]
    fn test_loop_emission() {
        let code = [
            (OP_LOOP << 26) | (1 << 22) | (2 << 10), // LOOP i1, body 1..=2
            mov(0x10, 0),
            mov(0x11, 1),
            end(),
        ];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(glsl.contains("a_l = iu[1].y;"));
        assert!(glsl.contains("for (int loop0 = 0; loop0 <= iu[1].x; loop0++) {"));
        assert!(glsl.contains("a_l += iu[1].z;"));
        assert!(braces_balanced(&glsl));
    }

    #[test]
    fn test_nop_pair_splitting_is_opt_in() {
        let code = [mov(0x10, 0), nop(), nop(), mov(0x11, 1), end()];

        let default = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(!default.contains("int sub_003()"));

        let opts = TranslatorOptions {
            nop_pair_splitting: true,
        };
        let split = translate(&code, &identity_swizzles(), 0, &opts);
        assert!(split.contains("int sub_003() {"));
        assert!(braces_balanced(&split));
    }

    #[test]
    fn test_dispatch_boilerplate() {
        let code = [mov(0x10, 0), end()];
        let glsl = translate(&code, &identity_swizzles(), 0, &TranslatorOptions::default());
        assert!(glsl.starts_with("// Generated vertex program"));
        assert!(glsl.contains("#version 330 core"));
        assert!(glsl.contains("int run_block(int pc) {"));
        assert!(glsl.contains("void exec_shader() {"));
        assert!(glsl.contains("for (int i = 0; i < 1024; i++) {"));
        assert!(glsl.contains("gl_Position = o[out_map[0]];"));
    }

    #[test]
    fn test_entry_point_offsets_dispatch() {
        let code = [end(), end(), mov(0x10, 0), end()];
        let glsl = translate(&code, &identity_swizzles(), 2, &TranslatorOptions::default());
        assert!(glsl.contains("int pc = 0x2;"));
        assert!(glsl.contains("int sub_002() {"));
    }

    #[test]
    fn test_empty_program() {
        let glsl = translate(&[], &[], 0, &TranslatorOptions::default());
        assert!(glsl.contains("run_block"));
        assert!(braces_balanced(&glsl));
    }

    #[test]
    fn test_swizzle_and_negate_in_source() {
        // MOV r0, -v1.wzyx
        let swizzle = {
            let raw = (3 << 11) | (2 << 9) | (1 << 7) | 0xF | (1 << 4);
            vec![raw]
        };
        let code = [mov(0x10, 1), end()];
        let glsl = translate(&code, &swizzle, 0, &TranslatorOptions::default());
        assert!(glsl.contains("r[0] = (-v[1].wzyx);"));
    }

    #[test]
    fn test_masked_destination_write() {
        // Write mask xz only
        let swizzle = vec![(0x1B << 5) | (0x1B << 14) | (0x1B << 23) | 0b1010];
        let code = [mov(0x10, 0), end()];
        let glsl = translate(&code, &swizzle, 0, &TranslatorOptions::default());
        assert!(glsl.contains("r[0].xz = (v[0]).xz;"));
    }

    #[test]
    fn test_translation_is_pure() {
        let code = [call(2, 1), end(), mov(0x10, 0), end()];
        let opts = TranslatorOptions::default();
        let first = translate(&code, &identity_swizzles(), 0, &opts);
        let second = translate(&code, &identity_swizzles(), 0, &opts);
        assert_eq!(first, second);
    }
}
