use relay_proto::Address;
use std::collections::VecDeque;

/// Ordered messages waiting for their target to finish connecting (spec.md §4.3).
#[derive(Default)]
pub struct PendingQueue {
    entries: VecDeque<(Vec<u8>, Address)>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, bytes: Vec<u8>, target: Address) {
        self.entries.push_back((bytes, target));
    }

    /// Removes and returns every entry targeting `addr`, oldest first.
    /// Used both to drain on connect-accepted and to drop on failure/disconnect.
    pub fn take_for_target(&mut self, addr: Address) -> Vec<Vec<u8>> {
        let mut taken = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.entries.len());
        for (bytes, target) in self.entries.drain(..) {
            if target == addr {
                taken.push(bytes);
            } else {
                remaining.push_back((bytes, target));
            }
        }
        self.entries = remaining;
        taken
    }

    pub fn targets(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.iter().map(|(_, target)| *target)
    }

    pub fn has_target(&self, addr: Address) -> bool {
        self.entries.iter().any(|(_, target)| *target == addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last: u8) -> Address {
        Address::new(Ipv4Addr::new(10, 0, 0, last), 50110)
    }

    #[test]
    fn drains_in_submission_order_per_target() {
        let mut queue = PendingQueue::new();
        queue.enqueue(vec![1], addr(1));
        queue.enqueue(vec![2], addr(2));
        queue.enqueue(vec![3], addr(1));

        let drained = queue.take_for_target(addr(1));
        assert_eq!(drained, vec![vec![1], vec![3]]);
        assert!(queue.has_target(addr(2)));
        assert!(!queue.has_target(addr(1)));
    }
}
