//! Display nodes: small units of view state that hold the last value they
//! were given and only re-render when an update actually changes it.

use crate::error::NodeError;
use crate::format::{render_hex, render_labeled_value, sequence_equals};
use crate::machine::Snapshot;

/// the output target a node renders into
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Surface {
    text: String,
    highlighted: bool,
    renders: usize,
}

impl Surface {
    pub fn new() -> Self {
        Surface::default()
    }

    /// replace the contents; every write counts as one render
    pub fn write(&mut self, text: impl Into<String>, highlighted: bool) {
        self.text = text.into();
        self.highlighted = highlighted;
        self.renders += 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// how many times this surface has been rendered
    pub fn renders(&self) -> usize {
        self.renders
    }
}

/// Every state-bound element of the view implements this. Output is always a
/// pure function of the state the node holds; state only changes through the
/// node's own `update`, which renders only when the new value differs.
pub trait DisplayNode {
    /// stable identifier of the node at the rendering substrate
    fn id(&self) -> &str;

    /// write the node's output from its current state
    fn render(&mut self);

    fn surface(&self) -> &Surface;
}

/// a single labelled number: program counter, index register, a timer or one
/// variable register
pub struct ValueNode<T> {
    id: String,
    label: String,
    width: usize,
    value: T,
    field: Option<fn(&Snapshot) -> T>,
    surface: Surface,
}

pub type ProgramCounterNode = ValueNode<u16>;
pub type IndexRegisterNode = ValueNode<u16>;
pub type DelayTimerNode = ValueNode<u8>;
pub type SoundTimerNode = ValueNode<u8>;
pub type VariableRegisterNode = ValueNode<u8>;

impl<T> ValueNode<T>
where
    T: Copy + Default + PartialEq + Into<u32>,
{
    fn build(id: String, label: String, width: usize, field: Option<fn(&Snapshot) -> T>) -> Self {
        let mut node = ValueNode {
            id,
            label,
            width,
            value: T::default(),
            field,
            surface: Surface::new(),
        };
        node.render();
        node
    }

    fn bound(id: &str, label: &str, width: usize, field: fn(&Snapshot) -> T) -> Self {
        Self::build(id.to_string(), label.to_string(), width, Some(field))
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// the snapshot field this node follows, if it is mounted directly
    pub fn field(&self) -> Option<fn(&Snapshot) -> T> {
        self.field
    }

    pub fn update(&mut self, new_value: T) -> Result<bool, NodeError> {
        if self.value == new_value {
            return Ok(false);
        }
        self.value = new_value;
        self.render();
        Ok(true)
    }
}

impl<T> DisplayNode for ValueNode<T>
where
    T: Copy + Default + PartialEq + Into<u32>,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn render(&mut self) {
        let text = render_labeled_value(&self.label, self.value.into(), self.width);
        self.surface.write(text, false);
    }

    fn surface(&self) -> &Surface {
        &self.surface
    }
}

pub const PROGRAM_COUNTER_ID: &str = "program-counter";
pub const INDEX_REGISTER_ID: &str = "index-register";
pub const DELAY_TIMER_ID: &str = "delay-timer";
pub const SOUND_TIMER_ID: &str = "sound-timer";

impl ValueNode<u16> {
    pub fn program_counter() -> Self {
        Self::bound(PROGRAM_COUNTER_ID, "PROGRAM", 4, |s| s.program_counter)
    }

    pub fn index_register() -> Self {
        Self::bound(INDEX_REGISTER_ID, "INDEX", 4, |s| s.index_register)
    }
}

impl ValueNode<u8> {
    pub fn delay_timer() -> Self {
        Self::bound(DELAY_TIMER_ID, "DELAY", 2, |s| s.delay_timer)
    }

    pub fn sound_timer() -> Self {
        Self::bound(SOUND_TIMER_ID, "SOUND", 2, |s| s.sound_timer)
    }

    /// V0-VF; the index is fixed for the life of the node
    pub fn variable_register(index: usize) -> Result<Self, NodeError> {
        if index > 0xf {
            return Err(NodeError::RegisterIndex(index));
        }
        Ok(Self::register_slot(index))
    }

    /// NB. callers guarantee index is 0-15
    pub(crate) fn register_slot(index: usize) -> Self {
        Self::build(
            format!("variable-register-{}", index),
            format!("V{:X}", index),
            2,
            None,
        )
    }
}

/// one line of the disassembly window
pub struct DisassemblerLineNode {
    id: String,
    is_current_line: bool,
    location: u16,
    value: [u8; 2],
    disassembly: String,
    surface: Surface,
}

impl DisassemblerLineNode {
    pub fn new(position: usize) -> Self {
        let mut line = DisassemblerLineNode {
            id: format!("disassembler-line-{}", position),
            is_current_line: false,
            location: 0,
            value: [0; 2],
            disassembly: String::new(),
            surface: Surface::new(),
        };
        line.render();
        line
    }

    pub fn is_current_line(&self) -> bool {
        self.is_current_line
    }

    pub fn location(&self) -> u16 {
        self.location
    }

    pub fn disassembly(&self) -> &str {
        &self.disassembly
    }

    /// the instruction word, high byte first
    pub fn word(&self) -> u16 {
        (u16::from(self.value[0]) << 8) | u16::from(self.value[1])
    }

    /// `value` must be exactly the two bytes of one instruction word
    pub fn update(
        &mut self,
        is_current_line: bool,
        location: u16,
        value: &[u8],
        disassembly: &str,
    ) -> Result<bool, NodeError> {
        if value.len() != 2 {
            return Err(NodeError::InvalidLength {
                node: self.id.clone(),
                expected: 2,
                found: value.len(),
            });
        }

        if self.is_current_line == is_current_line
            && self.location == location
            && sequence_equals(&self.value, value)
            && self.disassembly == disassembly
        {
            return Ok(false);
        }

        self.is_current_line = is_current_line;
        self.location = location;
        self.value = [value[0], value[1]];
        self.disassembly = disassembly.to_string();
        self.render();
        Ok(true)
    }
}

impl DisplayNode for DisassemblerLineNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn render(&mut self) {
        let text = format!(
            "{}: {} - {}",
            render_hex(self.location.into(), 4, true),
            render_hex(self.word().into(), 4, false),
            self.disassembly
        );
        self.surface.write(text, self.is_current_line);
    }

    fn surface(&self) -> &Surface {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_node_renders_on_construction() {
        let pc = ValueNode::program_counter();
        assert_eq!(pc.surface().renders(), 1);
        assert_eq!(pc.surface().text(), "PROGRAM: 0x0000 / 0");
    }

    #[test]
    fn test_equal_update_renders_once() -> Result<(), NodeError> {
        let mut index = ValueNode::index_register();
        let before = index.surface().renders();
        assert!(index.update(0x2ea)?);
        assert!(!index.update(0x2ea)?);
        assert_eq!(index.surface().renders(), before + 1);
        assert_eq!(index.surface().text(), "INDEX: 0x02ea / 746");
        Ok(())
    }

    #[test]
    fn test_unchanged_initial_value_does_not_render() -> Result<(), NodeError> {
        let mut delay = ValueNode::delay_timer();
        assert!(!delay.update(0)?);
        assert_eq!(delay.surface().renders(), 1);
        Ok(())
    }

    #[test]
    fn test_timer_labels() -> Result<(), NodeError> {
        let mut delay = ValueNode::delay_timer();
        let mut sound = ValueNode::sound_timer();
        delay.update(0x3c)?;
        sound.update(5)?;
        assert_eq!(delay.surface().text(), "DELAY: 0x3c / 60");
        assert_eq!(sound.surface().text(), "SOUND: 0x05 / 5");
        Ok(())
    }

    #[test]
    fn test_variable_register_label_and_index() -> Result<(), NodeError> {
        let mut v = ValueNode::variable_register(0xa)?;
        assert_eq!(v.id(), "variable-register-10");
        v.update(0xff)?;
        assert_eq!(v.surface().text(), "VA: 0xff / 255");
        assert!(v.field().is_none());
        Ok(())
    }

    #[test]
    fn test_variable_register_index_out_of_range() {
        assert_eq!(
            ValueNode::variable_register(16).err(),
            Some(NodeError::RegisterIndex(16))
        );
    }

    #[test]
    fn test_line_current_flag_alone_is_a_change() -> Result<(), NodeError> {
        let mut line = DisassemblerLineNode::new(0);
        let before = line.surface().renders();
        assert!(line.update(true, 0x200, &[0x12, 0x34], "JP 0x234")?);
        assert!(line.surface().is_highlighted());
        assert!(line.update(false, 0x200, &[0x12, 0x34], "JP 0x234")?);
        assert!(!line.surface().is_highlighted());
        assert_eq!(line.surface().renders(), before + 2);
        Ok(())
    }

    #[test]
    fn test_line_equal_update_is_noop() -> Result<(), NodeError> {
        let mut line = DisassemblerLineNode::new(3);
        line.update(false, 0x204, &[0x60, 0x0a], "LD V0, 0x0a")?;
        let rendered = line.surface().renders();
        assert!(!line.update(false, 0x204, &[0x60, 0x0a], "LD V0, 0x0a")?);
        assert_eq!(line.surface().renders(), rendered);
        Ok(())
    }

    #[test]
    fn test_line_word_composition() -> Result<(), NodeError> {
        let mut line = DisassemblerLineNode::new(0);
        line.update(false, 0x200, &[0x12, 0x34], "JP 0x234")?;
        assert_eq!(line.word(), 0x1234);
        assert_eq!(line.surface().text(), "0x0200: 1234 - JP 0x234");
        Ok(())
    }

    #[test]
    fn test_line_rejects_wrong_word_length() {
        let mut line = DisassemblerLineNode::new(1);
        let before = line.surface().renders();
        let result = line.update(true, 0x200, &[0x12], "JP 0x234");
        assert_eq!(
            result,
            Err(NodeError::InvalidLength {
                node: "disassembler-line-1".to_string(),
                expected: 2,
                found: 1,
            })
        );
        assert!(!line.is_current_line());
        assert_eq!(line.location(), 0);
        assert_eq!(line.surface().renders(), before);
    }
}
