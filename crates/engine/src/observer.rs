use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normalize,
    Index,
    Resolve,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normalize => "normalize",
            Self::Index => "index",
            Self::Resolve => "resolve",
        })
    }
}

/// Progress hooks, called on the thread driving the build
pub trait BuildObserver {
    fn phase_started(&self, _phase: Phase) {}

    fn lexemes_normalized(&self, _count: usize) {}

    fn relations_resolved(&self, _count: usize) {}

    fn phase_finished(&self, _phase: Phase) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}
