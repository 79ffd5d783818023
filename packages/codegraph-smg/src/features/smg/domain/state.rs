//! SMG State - heap graph plus program variables plus violations
//!
//! The state is the unit the lattice operations work on. Like the graph it
//! is persistent: variables and violations live in `rpds` structures, so
//! forking a state for two branches is a handful of reference count bumps.

use super::edge::{PointsToEdge, TargetSpecifier};
use super::graph::HeapGraph;
use super::object::ObjectId;
use super::value::{Number, ValueId};
use super::violation::Violation;
use crate::errors::{Result, SmgError};
use rpds::{RedBlackTreeMapSync, VectorSync};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ═══════════════════════════════════════════════════════════════════════════
// Variables
// ═══════════════════════════════════════════════════════════════════════════

/// Identity of a program variable across globals and stack frames
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariableKey {
    Global(String),
    Local { frame_index: usize, name: String },
}

impl VariableKey {
    pub fn name(&self) -> &str {
        match self {
            VariableKey::Global(name) => name,
            VariableKey::Local { name, .. } => name,
        }
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKey::Global(name) => write!(f, "{}", name),
            VariableKey::Local { frame_index, name } => write!(f, "{}@{}", name, frame_index),
        }
    }
}

/// One activation record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub function: String,
    pub variables: RedBlackTreeMapSync<String, ObjectId>,
}

impl StackFrame {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            variables: RedBlackTreeMapSync::new_sync(),
        }
    }
}

/// Globals and the call stack, innermost frame last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMap {
    globals: RedBlackTreeMapSync<String, ObjectId>,
    frames: VectorSync<StackFrame>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global(&mut self, name: impl Into<String>, object: ObjectId) {
        self.globals.insert_mut(name.into(), object);
    }

    pub fn push_frame(&mut self, function: impl Into<String>) {
        self.frames.push_back_mut(StackFrame::new(function));
    }

    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        let frame = self.frames.last().cloned()?;
        self.frames.drop_last_mut();
        Some(frame)
    }

    /// Bind a local in the innermost frame
    pub fn add_local(&mut self, name: impl Into<String>, object: ObjectId) -> Result<()> {
        let mut frame = self
            .frames
            .last()
            .cloned()
            .ok_or_else(|| SmgError::internal("local variable declared without a stack frame"))?;
        frame.variables.insert_mut(name.into(), object);
        self.frames.set_mut(self.frames.len() - 1, frame);
        Ok(())
    }

    /// Innermost binding of `name`, falling back to globals
    pub fn resolve(&self, name: &str) -> Option<ObjectId> {
        self.frames
            .last()
            .and_then(|frame| frame.variables.get(name).copied())
            .or_else(|| self.globals.get(name).copied())
    }

    pub fn get(&self, key: &VariableKey) -> Option<ObjectId> {
        match key {
            VariableKey::Global(name) => self.globals.get(name).copied(),
            VariableKey::Local { frame_index, name } => self
                .frames
                .get(*frame_index)
                .and_then(|frame| frame.variables.get(name).copied()),
        }
    }

    /// All bindings, globals first then frames outermost to innermost
    pub fn entries(&self) -> Vec<(VariableKey, ObjectId)> {
        let globals = self
            .globals
            .iter()
            .map(|(name, obj)| (VariableKey::Global(name.clone()), *obj));
        let locals = self.frames.iter().enumerate().flat_map(|(frame_index, frame)| {
            frame.variables.iter().map(move |(name, obj)| {
                (
                    VariableKey::Local {
                        frame_index,
                        name: name.clone(),
                    },
                    *obj,
                )
            })
        });
        globals.chain(locals).collect()
    }

    pub fn len(&self) -> usize {
        self.globals.size() + self.frames.iter().map(|f| f.variables.size()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// State
// ═══════════════════════════════════════════════════════════════════════════

/// Abstract program state
#[derive(Debug, Clone, Default)]
pub struct SmgState {
    graph: HeapGraph,
    variables: VariableMap,
    violations: VectorSync<Violation>,
}

impl SmgState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &HeapGraph {
        &self.graph
    }

    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    pub fn violations(&self) -> &VectorSync<Violation> {
        &self.violations
    }

    /// Same variables and violations over another graph
    pub fn with_graph(mut self, graph: HeapGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn resolve(&self, name: &str) -> Option<ObjectId> {
        self.variables.resolve(name)
    }

    /// Objects bound to program variables
    pub fn variable_roots(&self) -> Vec<ObjectId> {
        self.variables.entries().into_iter().map(|(_, obj)| obj).collect()
    }

    pub fn has_segments(&self) -> bool {
        self.graph.segments().next().is_some()
    }

    // ───────────────────────────────────────────────────────────────────────
    // Variables
    // ───────────────────────────────────────────────────────────────────────

    /// Declare a global of `size` bits
    pub fn add_global(mut self, name: impl Into<String>, size: u64) -> (Self, ObjectId) {
        let (graph, object) = self.graph.allocate(size);
        self.graph = graph;
        self.variables.add_global(name, object);
        (self, object)
    }

    pub fn push_frame(mut self, function: impl Into<String>) -> Self {
        self.variables.push_frame(function);
        self
    }

    /// Declare a local of `size` bits in the innermost frame
    pub fn add_local(mut self, name: impl Into<String>, size: u64) -> Result<(Self, ObjectId)> {
        if self.variables.frame_count() == 0 {
            return Err(SmgError::internal("local variable declared without a stack frame"));
        }
        let (graph, object) = self.graph.allocate(size);
        self.graph = graph;
        self.variables.add_local(name, object)?;
        Ok((self, object))
    }

    /// Leave the innermost frame, invalidating its locals
    pub fn pop_frame(mut self) -> Self {
        if let Some(frame) = self.variables.pop_frame() {
            for object in frame.variables.values() {
                self.graph.update_object_mut(*object, |obj| obj.valid = false);
            }
        }
        self
    }

    // ───────────────────────────────────────────────────────────────────────
    // Heap access
    // ───────────────────────────────────────────────────────────────────────

    pub fn allocate_heap(mut self, size: u64) -> (Self, ObjectId) {
        let (graph, object) = self.graph.allocate(size);
        self.graph = graph;
        (self, object)
    }

    pub fn new_number(mut self, number: Number) -> (Self, ValueId) {
        let (graph, value) = self.graph.new_number(number);
        self.graph = graph;
        (self, value)
    }

    pub fn new_unknown(mut self) -> (Self, ValueId) {
        let (graph, value) = self.graph.new_unknown();
        self.graph = graph;
        (self, value)
    }

    /// Fresh pointer to `target + offset`, shaped for the target's kind
    pub fn new_pointer(mut self, target: ObjectId, offset: u64) -> (Self, ValueId) {
        let edge = match self.graph.object(target).and_then(|o| o.as_segment()) {
            Some(seg) => PointsToEdge::segment(target, offset, seg.head_nesting_level(), TargetSpecifier::First),
            None => PointsToEdge::region(target, offset),
        };
        let value = self.graph.new_pointer_mut(edge);
        (self, value)
    }

    /// Write a value. Access errors are recorded as violations.
    pub fn write_value(mut self, object: ObjectId, offset: u64, size: u64, value: ValueId) -> Result<Self> {
        match self.graph.clone().write(object, offset, size, value) {
            Ok(graph) => {
                self.graph = graph;
                Ok(self)
            }
            Err(err) => self.record(err, Violation::from_error),
        }
    }

    /// Store a pointer to `target + target_offset` at `object + offset`
    pub fn write_pointer(
        self,
        object: ObjectId,
        offset: u64,
        size: u64,
        target: ObjectId,
        target_offset: u64,
    ) -> Result<Self> {
        let (state, pointer) = self.new_pointer(target, target_offset);
        state.write_value(object, offset, size, pointer)
    }

    /// Read a value. Access errors are recorded and yield a fresh unknown.
    pub fn read_value(mut self, object: ObjectId, offset: u64, size: u64) -> Result<(Self, ValueId)> {
        match self.graph.clone().read(object, offset, size) {
            Ok((graph, value)) => {
                self.graph = graph;
                Ok((self, value))
            }
            Err(err) => {
                let state = self.record(err, Violation::from_error)?;
                Ok(state.new_unknown())
            }
        }
    }

    /// Free an object. Invalid frees are recorded as violations.
    pub fn free(mut self, object: ObjectId) -> Result<Self> {
        match self.graph.clone().free(object) {
            Ok(graph) => {
                self.graph = graph;
                Ok(self)
            }
            Err(err) => self.record(err, Violation::from_free_error),
        }
    }

    pub fn add_violation(mut self, violation: Violation) -> Self {
        self.violations.push_back_mut(violation);
        self
    }

    fn record(self, err: SmgError, classify: fn(&SmgError) -> Option<Violation>) -> Result<Self> {
        match classify(&err) {
            Some(violation) => {
                debug!(violation = %violation, "recording memory violation");
                Ok(self.add_violation(violation))
            }
            None => Err(err),
        }
    }
}
