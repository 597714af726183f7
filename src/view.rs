//! Node-mount boundary: nodes are registered under stable ids and looked up
//! by id when a snapshot is dispatched. Registration requires `Mounted`, so
//! anything found by id can take a snapshot.

use std::collections::HashMap;

use crate::composite::{PartialDisassemblerNode, VariableRegistersNode};
use crate::error::NodeError;
use crate::machine::Snapshot;
use crate::node::{DisplayNode, Surface, ValueNode};

/// a display node that knows which part of a snapshot it shows
pub trait Mounted: DisplayNode {
    /// update from the node's own snapshot field(s)
    fn sync(&mut self, snapshot: &Snapshot) -> Result<bool, NodeError>;

    /// surfaces to show for this node, in display order
    fn surfaces(&self) -> Vec<&Surface> {
        vec![self.surface()]
    }
}

impl<T> Mounted for ValueNode<T>
where
    T: Copy + Default + PartialEq + Into<u32>,
{
    fn sync(&mut self, snapshot: &Snapshot) -> Result<bool, NodeError> {
        match self.field() {
            Some(field) => self.update(field(snapshot)),
            None => Err(NodeError::Unbound(self.id().to_string())),
        }
    }
}

impl Mounted for VariableRegistersNode {
    fn sync(&mut self, snapshot: &Snapshot) -> Result<bool, NodeError> {
        self.update(&snapshot.variable_registers)
    }

    fn surfaces(&self) -> Vec<&Surface> {
        self.registers().iter().map(|r| r.surface()).collect()
    }
}

impl Mounted for PartialDisassemblerNode {
    fn sync(&mut self, snapshot: &Snapshot) -> Result<bool, NodeError> {
        self.update(snapshot.program_counter, &snapshot.partial_disassembly)
    }

    fn surfaces(&self) -> Vec<&Surface> {
        self.lines().iter().map(|l| l.surface()).collect()
    }
}

#[derive(Default)]
pub struct View {
    nodes: HashMap<String, Box<dyn Mounted>>,
}

impl View {
    pub fn new() -> Self {
        View::default()
    }

    /// every node the debugger shows, mounted under its usual id
    pub fn standard() -> Self {
        let mut view = View::new();
        view.mount(Box::new(ValueNode::program_counter()));
        view.mount(Box::new(ValueNode::index_register()));
        view.mount(Box::new(VariableRegistersNode::new()));
        view.mount(Box::new(ValueNode::delay_timer()));
        view.mount(Box::new(ValueNode::sound_timer()));
        view.mount(Box::new(PartialDisassemblerNode::new()));
        view
    }

    /// mount under the node's own id, returning whatever was there before
    pub fn mount(&mut self, node: Box<dyn Mounted>) -> Option<Box<dyn Mounted>> {
        self.nodes.insert(node.id().to_string(), node)
    }

    pub fn unmount(&mut self, id: &str) -> Option<Box<dyn Mounted>> {
        self.nodes.remove(id)
    }

    pub fn node(&self, id: &str) -> Option<&dyn Mounted> {
        self.nodes.get(id).map(|n| n.as_ref())
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut dyn Mounted> {
        match self.nodes.get_mut(id) {
            Some(node) => Some(node.as_mut()),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
