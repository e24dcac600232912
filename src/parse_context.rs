//! Per-call state of the PEG interpreter
//!
//! Tracks the rule stack for left-recursion detection, the packrat memo
//! table, and the farthest failure seen, which becomes the reported error.
//! A context lives for exactly one matcher invocation.

use crate::input_stream::Checkpoint;
use crate::parse_tree::ParseTree;
use std::collections::{HashMap, HashSet};

/// Memo key: definition index, position, and last visited token slot
pub type MemoKey = (usize, usize, Option<usize>);

/// Memoized outcome of a definition: its tree fragments and the cursor
/// state after it, or `None` for failure
pub type MemoEntry = Option<(Vec<ParseTree>, Checkpoint)>;

#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Recursion depth (for debugging)
    pub depth: usize,

    /// (definition, position) pairs currently on the call stack
    pub left_recursion: HashSet<(usize, usize)>,

    pub memo_cache: HashMap<MemoKey, MemoEntry>,

    /// Definitions currently being matched, innermost last
    rule_stack: Vec<usize>,

    /// Farthest failing position and the definition active there
    farthest: Option<(usize, usize)>,

    /// Nesting of lookahead; failures inside are not reported
    lookahead: usize,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a definition at a position; false on left recursion
    pub fn enter_rule(&mut self, rule: usize, position: usize) -> bool {
        self.depth += 1;
        self.rule_stack.push(rule);
        self.left_recursion.insert((rule, position))
    }

    /// Leave a definition; `entered` is what `enter_rule` returned
    pub fn exit_rule(&mut self, rule: usize, position: usize, entered: bool) {
        self.depth = self.depth.saturating_sub(1);
        self.rule_stack.pop();
        if entered {
            self.left_recursion.remove(&(rule, position));
        }
    }

    pub fn current_rule(&self) -> Option<usize> {
        self.rule_stack.last().copied()
    }

    pub fn enter_lookahead(&mut self) {
        self.lookahead += 1;
    }

    pub fn exit_lookahead(&mut self) {
        self.lookahead = self.lookahead.saturating_sub(1);
    }

    /// Note a terminal failure; the first failure at the farthest position wins
    pub fn record_failure(&mut self, position: usize) {
        if self.lookahead > 0 {
            return;
        }
        let Some(rule) = self.current_rule() else {
            return;
        };
        match self.farthest {
            Some((farthest, _)) if farthest >= position => {}
            _ => self.farthest = Some((position, rule)),
        }
    }

    /// Record a failure unconditionally, outside any lookahead
    pub fn force_failure(&mut self, position: usize, rule: usize) {
        match self.farthest {
            Some((farthest, _)) if farthest >= position => {}
            _ => self.farthest = Some((position, rule)),
        }
    }

    /// (position, definition) of the farthest failure
    pub fn farthest_failure(&self) -> Option<(usize, usize)> {
        self.farthest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = ParseContext::new();
        assert_eq!(ctx.depth, 0);
        assert!(ctx.left_recursion.is_empty());
        assert_eq!(ctx.farthest_failure(), None);
    }

    #[test]
    fn test_enter_exit_rule() {
        let mut ctx = ParseContext::new();

        assert!(ctx.enter_rule(0, 0));
        assert_eq!(ctx.depth, 1);
        assert_eq!(ctx.current_rule(), Some(0));

        // Same definition at same position is left recursion
        assert!(!ctx.enter_rule(0, 0));
        ctx.exit_rule(0, 0, false);
        assert!(ctx.left_recursion.contains(&(0, 0)));

        ctx.exit_rule(0, 0, true);
        assert_eq!(ctx.depth, 0);
        assert!(ctx.left_recursion.is_empty());
        assert_eq!(ctx.current_rule(), None);
    }

    #[test]
    fn test_nested_rules() {
        let mut ctx = ParseContext::new();

        assert!(ctx.enter_rule(1, 0));
        assert!(ctx.enter_rule(2, 5));
        assert_eq!(ctx.current_rule(), Some(2));

        ctx.exit_rule(2, 5, true);
        assert_eq!(ctx.current_rule(), Some(1));
        assert!(!ctx.left_recursion.contains(&(2, 5)));
    }

    #[test]
    fn test_farthest_failure() {
        let mut ctx = ParseContext::new();
        ctx.enter_rule(3, 0);
        ctx.record_failure(2);
        ctx.enter_rule(4, 2);
        ctx.record_failure(5);
        ctx.exit_rule(4, 2, true);
        ctx.record_failure(5);
        ctx.record_failure(1);
        assert_eq!(ctx.farthest_failure(), Some((5, 4)));
    }

    #[test]
    fn test_lookahead_failures_ignored() {
        let mut ctx = ParseContext::new();
        ctx.enter_rule(0, 0);
        ctx.enter_lookahead();
        ctx.record_failure(7);
        ctx.exit_lookahead();
        assert_eq!(ctx.farthest_failure(), None);
        ctx.record_failure(1);
        assert_eq!(ctx.farthest_failure(), Some((1, 0)));
    }
}
