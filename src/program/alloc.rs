//! Storage assignment for normalized chain nodes.
//!
//! Linear scan with last-use liveness. A node's value occupies one
//! location from its definition to its last read; locations of dead values
//! are recycled, lowest temporary first, so the same node list always gets
//! the same assignment.

use std::collections::BTreeSet;

use super::Operand;

/// A chain step after normalization. Node 0 is always `Input`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    Input,
    /// Product of two earlier nodes.
    Mul(usize, usize),
    /// Earlier node squared `count` times.
    Sqr(usize, u32),
}

impl Node {
    pub(crate) fn operands(&self) -> (Option<usize>, Option<usize>) {
        match *self {
            Node::Input => (None, None),
            Node::Mul(x, y) => (Some(x), Some(y)),
            Node::Sqr(x, _) => (Some(x), None),
        }
    }
}

pub(crate) struct Allocation {
    /// Location of every node's value; `slots[0]` is `Input`.
    pub(crate) slots: Vec<Operand>,
    pub(crate) temporaries: u32,
}

/// Free locations. The accumulator is preferred over temporaries.
struct Pool {
    acc_free: bool,
    free: BTreeSet<u32>,
    next_temp: u32,
}

impl Pool {
    fn take(&mut self) -> Operand {
        if self.acc_free {
            self.acc_free = false;
            return Operand::Acc;
        }
        if let Some(t) = self.free.pop_first() {
            return Operand::Temp(t);
        }
        let t = self.next_temp;
        self.next_temp += 1;
        Operand::Temp(t)
    }

    fn claim(&mut self, slot: Operand) {
        match slot {
            Operand::Acc => self.acc_free = false,
            Operand::Temp(t) => {
                self.free.remove(&t);
            }
            Operand::Input => {}
        }
    }

    fn release(&mut self, slot: Operand) {
        match slot {
            Operand::Acc => self.acc_free = true,
            Operand::Temp(t) => {
                self.free.insert(t);
            }
            Operand::Input => {}
        }
    }
}

pub(crate) fn allocate(nodes: &[Node]) -> Allocation {
    let n = nodes.len();
    let last = n.saturating_sub(1);

    let mut last_use: Vec<Option<usize>> = vec![None; n];
    for (i, node) in nodes.iter().enumerate() {
        let (x, y) = node.operands();
        for operand in x.into_iter().chain(y) {
            last_use[operand] = Some(i);
        }
    }

    let mut pool = Pool {
        acc_free: true,
        free: BTreeSet::new(),
        next_temp: 0,
    };
    let mut slots = vec![Operand::Input; n];

    for i in 1..n {
        let (x, y) = nodes[i].operands();
        let mut dying: Vec<usize> = Vec::with_capacity(2);
        for operand in x.into_iter().chain(y) {
            if last_use[operand] == Some(i) && !dying.contains(&operand) {
                dying.push(operand);
            }
        }

        let out = if i == last {
            Operand::Acc
        } else if let Some(&reuse) = dying.iter().find(|&&d| slots[d] != Operand::Input) {
            slots[reuse]
        } else {
            pool.take()
        };

        // Compute-then-store: an operand's location may receive the output.
        for d in dying {
            if slots[d] != out {
                pool.release(slots[d]);
            }
        }
        pool.claim(out);
        slots[i] = out;

        if last_use[i].is_none() && i != last {
            pool.release(out);
        }
    }

    Allocation {
        slots,
        temporaries: pool.next_temp,
    }
}
