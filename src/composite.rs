//! Nodes that own a collection of child nodes and fan updates out to them.

use log::warn;

use crate::error::NodeError;
use crate::format::sequence_equals;
use crate::machine::DisassemblyLine;
use crate::node::{DisassemblerLineNode, DisplayNode, Surface, VariableRegisterNode};

pub const VARIABLE_REGISTERS_ID: &str = "variable-registers";
pub const PARTIAL_DISASSEMBLER_ID: &str = "partial-disassembler";

const VARIABLE_REGISTER_COUNT: usize = 16;

/// list the child slot ids, one per line; this is the composite's own markup
fn render_slots<'a>(surface: &mut Surface, ids: impl Iterator<Item = &'a str>) {
    let slots: Vec<&str> = ids.collect();
    surface.write(slots.join("\n"), false);
}

/// V0-VF; sixteen fixed children, never rebuilt
pub struct VariableRegistersNode {
    values: Option<[u8; VARIABLE_REGISTER_COUNT]>,
    registers: Vec<VariableRegisterNode>,
    surface: Surface,
}

impl VariableRegistersNode {
    pub fn new() -> Self {
        let mut node = VariableRegistersNode {
            values: None,
            registers: (0..VARIABLE_REGISTER_COUNT)
                .map(VariableRegisterNode::register_slot)
                .collect(),
            surface: Surface::new(),
        };
        node.render();
        node
    }

    pub fn registers(&self) -> &[VariableRegisterNode] {
        &self.registers
    }

    /// forward each value to its register; true if any register re-rendered
    pub fn update(&mut self, new_values: &[u8]) -> Result<bool, NodeError> {
        if new_values.len() != VARIABLE_REGISTER_COUNT {
            return Err(NodeError::InvalidLength {
                node: VARIABLE_REGISTERS_ID.to_string(),
                expected: VARIABLE_REGISTER_COUNT,
                found: new_values.len(),
            });
        }
        if let Some(values) = &self.values {
            if sequence_equals(values, new_values) {
                return Ok(false);
            }
        }

        let mut cached = [0; VARIABLE_REGISTER_COUNT];
        cached.copy_from_slice(new_values);
        self.values = Some(cached);

        let mut rendered = false;
        for (index, value) in new_values.iter().enumerate() {
            match self.registers.get_mut(index) {
                Some(register) => match register.update(*value) {
                    Ok(changed) => rendered |= changed,
                    Err(error) => warn!("{}", error),
                },
                None => warn!(
                    "{}",
                    NodeError::MissingChild {
                        node: VARIABLE_REGISTERS_ID.to_string(),
                        position: index,
                    }
                ),
            }
        }
        Ok(rendered)
    }
}

impl Default for VariableRegistersNode {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayNode for VariableRegistersNode {
    fn id(&self) -> &str {
        VARIABLE_REGISTERS_ID
    }

    fn render(&mut self) {
        render_slots(&mut self.surface, self.registers.iter().map(|r| r.id()));
    }

    fn surface(&self) -> &Surface {
        &self.surface
    }
}

/// The disassembly window. Its length follows the snapshot, so the child
/// list is reconciled by position: existing lines keep their identity and
/// state, extra lines are created or dropped at the end.
pub struct PartialDisassemblerNode {
    lines: Vec<DisassemblerLineNode>,
    surface: Surface,
}

impl PartialDisassemblerNode {
    pub fn new() -> Self {
        let mut node = PartialDisassemblerNode {
            lines: Vec::new(),
            surface: Surface::new(),
        };
        node.render();
        node
    }

    pub fn lines(&self) -> &[DisassemblerLineNode] {
        &self.lines
    }

    /// true if the slot list was rebuilt or any line re-rendered
    pub fn update(
        &mut self,
        program_counter: u16,
        new_lines: &[DisassemblyLine],
    ) -> Result<bool, NodeError> {
        let mut rendered = false;
        if new_lines.len() != self.lines.len() {
            self.reconcile(new_lines.len());
            self.render();
            rendered = true;
        }

        for (position, line) in new_lines.iter().enumerate() {
            let Some(child) = self.lines.get_mut(position) else {
                warn!(
                    "{}",
                    NodeError::MissingChild {
                        node: PARTIAL_DISASSEMBLER_ID.to_string(),
                        position,
                    }
                );
                continue;
            };
            match child.update(
                line.location == program_counter,
                line.location,
                &line.value,
                &line.disassembly,
            ) {
                Ok(changed) => rendered |= changed,
                Err(error) => warn!("{}", error),
            }
        }
        Ok(rendered)
    }

    fn reconcile(&mut self, length: usize) {
        if length < self.lines.len() {
            self.lines.truncate(length);
        } else {
            let start = self.lines.len();
            self.lines.extend((start..length).map(DisassemblerLineNode::new));
        }
    }
}

impl Default for PartialDisassemblerNode {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayNode for PartialDisassemblerNode {
    fn id(&self) -> &str {
        PARTIAL_DISASSEMBLER_ID
    }

    fn render(&mut self) {
        render_slots(&mut self.surface, self.lines.iter().map(|l| l.id()));
    }

    fn surface(&self) -> &Surface {
        &self.surface
    }
}
