//! Selection policies for the available set
//!
//! A policy only decides which remaining member of the current cycle is
//! dispensed next. Either way every member is dispensed at most once per cycle.

use rand::Rng;
use std::collections::VecDeque;

use crate::models::Address;

/// How the next address is picked from the available set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Uniformly random among the remaining members
    #[default]
    Random,
    /// In the order the cycle was filled
    Fifo,
}

impl SelectionPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "random" | "rand" => Some(Self::Random),
            "fifo" | "queue" | "in_order" | "in-order" => Some(Self::Fifo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Fifo => "fifo",
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Addresses not yet dispensed in the current rotation cycle
#[derive(Debug, Default)]
pub(crate) struct AvailableSet {
    queue: VecDeque<Address>,
}

impl AvailableSet {
    /// Replace the contents with a fresh cycle
    pub(crate) fn refill<I>(&mut self, addresses: I)
    where
        I: IntoIterator<Item = Address>,
    {
        self.queue.clear();
        self.queue.extend(addresses);
    }

    /// Remove and return the next member according to `policy`
    pub(crate) fn take(&mut self, policy: SelectionPolicy) -> Option<Address> {
        match policy {
            SelectionPolicy::Fifo => self.queue.pop_front(),
            SelectionPolicy::Random => {
                if self.queue.is_empty() {
                    return None;
                }
                let idx = rand::thread_rng().gen_range(0..self.queue.len());
                self.queue.swap_remove_back(idx)
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}
