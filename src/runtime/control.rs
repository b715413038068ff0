//! Label stack for structured control flow
//!
//! Every `block`, `loop` and `if` pushes a label when entered. A label
//! records how many values a branch to it carries, the operand stack height
//! to unwind to, and where execution continues. Continuations come from the
//! side table built during validation, so a branch is a constant-time jump.

/// A label on the label stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    /// Values carried by a branch: results for blocks and ifs, parameters
    /// for loops
    pub arity: usize,
    /// Operand stack height below the construct's parameters
    pub height: usize,
    /// For loops the position of the `loop` instruction, otherwise the
    /// position of the matching `end`
    pub target: u32,
    pub is_loop: bool,
}

impl Label {
    pub fn block(arity: usize, height: usize, end_pc: u32) -> Self {
        Label {
            arity,
            height,
            target: end_pc,
            is_loop: false,
        }
    }

    pub fn looping(arity: usize, height: usize, loop_pc: u32) -> Self {
        Label {
            arity,
            height,
            target: loop_pc,
            is_loop: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct LabelStack {
    labels: Vec<Label>,
}

impl LabelStack {
    pub fn new() -> Self {
        LabelStack { labels: Vec::new() }
    }

    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn pop(&mut self) -> Option<Label> {
        self.labels.pop()
    }

    /// Get the nth label from the top (0 = innermost)
    pub fn get(&self, depth: u32) -> Option<&Label> {
        let len = self.labels.len();
        if depth as usize >= len {
            return None;
        }
        self.labels.get(len - 1 - depth as usize)
    }

    /// Drop labels until `len` remain
    pub fn truncate(&mut self, len: usize) {
        self.labels.truncate(len);
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_counts_from_top() {
        let mut labels = LabelStack::new();
        labels.push(Label::block(1, 0, 10));
        labels.push(Label::looping(0, 2, 3));
        assert_eq!(labels.depth(), 2);
        assert!(labels.get(0).unwrap().is_loop);
        assert_eq!(labels.get(1).unwrap().target, 10);
        assert!(labels.get(2).is_none());
    }

    #[test]
    fn test_truncate_and_pop() {
        let mut labels = LabelStack::new();
        for i in 0..4 {
            labels.push(Label::block(0, i, i as u32));
        }
        labels.truncate(1);
        assert_eq!(labels.pop().unwrap().height, 0);
        assert!(labels.is_empty());
    }
}
