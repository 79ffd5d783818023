//! Test data builders
//!
//! Every list node is a 192-bit region: `next` at 0, `prev` at 64 (doubly
//! linked lists only), data at 128.

use codegraph_smg::features::smg::{ListSegment, Number, ObjectId, SmgState, TargetSpecifier, ValueId};

pub const NODE_SIZE: u64 = 192;
pub const NEXT: u64 = 0;
pub const PREV: u64 = 64;
pub const DATA: u64 = 128;
pub const PTR: u64 = 64;

/// Concrete list built into a state
#[derive(Debug, Clone)]
pub struct BuiltList {
    pub state: SmgState,
    /// Variable object holding the head pointer
    pub variable: ObjectId,
    pub nodes: Vec<ObjectId>,
}

/// Builder for concrete linked lists hanging off a global variable
#[derive(Debug, Clone)]
pub struct ListBuilder {
    len: usize,
    data: i128,
    doubly: bool,
    variable: String,
}

impl ListBuilder {
    /// Singly linked list of `len` nodes
    pub fn singly(len: usize) -> Self {
        Self {
            len,
            data: 7,
            doubly: false,
            variable: "head".to_string(),
        }
    }

    /// Doubly linked list of `len` nodes
    pub fn doubly(len: usize) -> Self {
        Self {
            doubly: true,
            ..Self::singly(len)
        }
    }

    /// Data stored in every node
    pub fn data(mut self, data: i128) -> Self {
        self.data = data;
        self
    }

    /// Name of the global holding the head pointer
    pub fn variable(mut self, name: &str) -> Self {
        self.variable = name.to_string();
        self
    }

    pub fn build(self) -> BuiltList {
        self.build_on(SmgState::new())
    }

    /// Build into an existing state
    pub fn build_on(self, state: SmgState) -> BuiltList {
        let (mut state, variable) = state.add_global(self.variable.as_str(), PTR);
        let mut nodes = Vec::with_capacity(self.len);
        for _ in 0..self.len {
            let (s, node) = state.allocate_heap(NODE_SIZE);
            state = s;
            nodes.push(node);
        }

        let (s, data) = state.new_number(Number::Integer(self.data));
        state = s;

        state = match nodes.first() {
            Some(&first) => state.write_pointer(variable, 0, PTR, first, 0).unwrap(),
            None => state.write_value(variable, 0, PTR, ValueId::ZERO).unwrap(),
        };

        for (i, &node) in nodes.iter().enumerate() {
            state = state.write_value(node, DATA, PTR, data).unwrap();
            state = match nodes.get(i + 1) {
                Some(&next) => state.write_pointer(node, NEXT, PTR, next, 0).unwrap(),
                None => state.write_value(node, NEXT, PTR, ValueId::ZERO).unwrap(),
            };
            if self.doubly {
                state = match i.checked_sub(1).map(|p| nodes[p]) {
                    Some(prev) => state.write_pointer(node, PREV, PTR, prev, 0).unwrap(),
                    None => state.write_value(node, PREV, PTR, ValueId::ZERO).unwrap(),
                };
            }
        }

        BuiltList { state, variable, nodes }
    }
}

/// Global `head` pointing to one list segment `SEG[min+]` whose links are null
pub fn segment_state(min: u32, doubly: bool) -> (SmgState, ObjectId) {
    let (state, head) = SmgState::new().add_global("head", PTR);
    let descriptor = if doubly {
        ListSegment::doubly(min, 0, NEXT, PREV)
    } else {
        ListSegment::singly(min, 0, NEXT)
    };
    let (graph, seg) = state.graph().clone().allocate_segment(NODE_SIZE, descriptor);
    let state = state.with_graph(graph);

    let (state, data) = state.new_number(Number::Integer(7));
    let mut state = state.write_value(seg, DATA, PTR, data).unwrap();
    state = state.write_value(seg, NEXT, PTR, ValueId::ZERO).unwrap();
    if doubly {
        state = state.write_value(seg, PREV, PTR, ValueId::ZERO).unwrap();
    }

    let (state, pointer) = state.new_pointer(seg, 0);
    let state = state.write_value(head, 0, PTR, pointer).unwrap();
    (state, seg)
}

/// Add a global `name` holding a pointer into `seg` with an explicit position
pub fn point_into(state: SmgState, name: &str, seg: ObjectId, level: u32, specifier: TargetSpecifier) -> (SmgState, ValueId) {
    let (state, var) = state.add_global(name, PTR);
    let (graph, pointer) = state.graph().clone().create_pointer(seg, 0, level, specifier);
    let state = state.with_graph(graph).write_value(var, 0, PTR, pointer).unwrap();
    (state, pointer)
}

/// Top-level nodes whose data field points to a private sublist of
/// `sublengths[i]` 128-bit nodes
pub fn list_of_lists(sublengths: &[usize]) -> (SmgState, Vec<ObjectId>) {
    let (mut state, head) = SmgState::new().add_global("head", PTR);
    let mut tops = Vec::new();
    for &sublen in sublengths {
        let (s, top) = state.allocate_heap(NODE_SIZE);
        state = s;
        let mut subs = Vec::new();
        for _ in 0..sublen {
            let (s, sub) = state.allocate_heap(128);
            state = s;
            subs.push(sub);
        }
        let (s, one) = state.new_number(Number::Integer(1));
        state = s;
        for (i, &sub) in subs.iter().enumerate() {
            state = state.write_value(sub, 64, 64, one).unwrap();
            state = match subs.get(i + 1) {
                Some(&next) => state.write_pointer(sub, 0, 64, next, 0).unwrap(),
                None => state.write_value(sub, 0, 64, ValueId::ZERO).unwrap(),
            };
        }
        state = state.write_pointer(top, DATA, PTR, subs[0], 0).unwrap();
        tops.push(top);
    }
    for (i, &top) in tops.iter().enumerate() {
        state = match tops.get(i + 1) {
            Some(&next) => state.write_pointer(top, NEXT, PTR, next, 0).unwrap(),
            None => state.write_value(top, NEXT, PTR, ValueId::ZERO).unwrap(),
        };
    }
    let state = state.write_pointer(head, 0, PTR, tops[0], 0).unwrap();
    (state, tops)
}
