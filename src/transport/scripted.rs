//! Deterministic transport replaying a fixed outcome sequence.

use std::collections::VecDeque;

use super::Transport;

/// Transport whose outcomes are given up front.
///
/// Once the script is exhausted every attempt returns the fallback outcome.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    outcomes: VecDeque<bool>,
    fallback: bool,
    calls: usize,
}

impl ScriptedTransport {
    /// Script the given outcomes, then fail.
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            fallback: false,
            calls: 0,
        }
    }

    /// Every attempt returns `outcome`.
    pub fn always(outcome: bool) -> Self {
        Self {
            outcomes: VecDeque::new(),
            fallback: outcome,
            calls: 0,
        }
    }

    /// Outcome used after the script runs out.
    pub fn with_fallback(mut self, outcome: bool) -> Self {
        self.fallback = outcome;
        self
    }

    /// Number of frames handed to this transport.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Scripted outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, _frame: &[u8]) -> bool {
        self.calls += 1;
        self.outcomes.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_fallback() {
        let mut transport = ScriptedTransport::new([true, false]);

        assert!(transport.send(b""));
        assert!(!transport.send(b""));
        assert!(!transport.send(b""));
        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.remaining(), 0);
    }

    #[test]
    fn test_custom_fallback() {
        let mut transport = ScriptedTransport::new([false]).with_fallback(true);
        assert!(!transport.send(b""));
        assert!(transport.send(b""));
    }

    #[test]
    fn test_always() {
        let mut ok = ScriptedTransport::always(true);
        let mut fail = ScriptedTransport::always(false);
        for _ in 0..5 {
            assert!(ok.send(b"x"));
            assert!(!fail.send(b"x"));
        }
    }
}
