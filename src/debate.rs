//! Rolling-window bookkeeping for a debate.
//!
//! During the first round every member may see up to one message per member;
//! afterwards the window shrinks to the configured steady-state bound.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::providers::types::message::Message;

/// Upper bound on the rolling window once the first round is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowBound {
    /// As many messages as there are members.
    Members,
    /// One message fewer than there are members.
    #[default]
    MembersMinusOne,
    Fixed(usize),
}

impl WindowBound {
    pub fn resolve(&self, members: usize) -> usize {
        match self {
            WindowBound::Members => members,
            WindowBound::MembersMinusOne => members.saturating_sub(1),
            WindowBound::Fixed(n) => *n,
        }
    }
}

impl fmt::Display for WindowBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowBound::Members => write!(f, "members"),
            WindowBound::MembersMinusOne => write!(f, "members-minus-one"),
            WindowBound::Fixed(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for WindowBound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "members" => Ok(WindowBound::Members),
            "members-minus-one" => Ok(WindowBound::MembersMinusOne),
            other => other.parse::<usize>().map(WindowBound::Fixed).map_err(|_| {
                format!(
                    "invalid window bound '{}': expected 'members', 'members-minus-one' or a number",
                    other
                )
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebateOptions {
    pub iterations: usize,
    /// Log every turn at info level instead of debug.
    pub verbose: bool,
    pub window: WindowBound,
}

impl Default for DebateOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            verbose: false,
            window: WindowBound::default(),
        }
    }
}

impl DebateOptions {
    /// Window bound in effect during `iteration` (zero-based) for a group of `members`.
    pub fn bound_for(&self, iteration: usize, members: usize) -> usize {
        if iteration == 0 {
            members
        } else {
            self.window.resolve(members)
        }
    }
}

/// The most recent messages of a debate, trimmed from the front.
#[derive(Debug, Default)]
pub struct RollingWindow {
    messages: VecDeque<Message>,
}

impl RollingWindow {
    pub fn new(seed: Message) -> Self {
        Self {
            messages: VecDeque::from([seed]),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Drop the oldest messages until at most `bound` remain.
    pub fn fit(&mut self, bound: usize) {
        while self.messages.len() > bound {
            self.messages.pop_front();
        }
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
