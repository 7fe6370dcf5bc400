//! Chain to program compilation.
//!
//! Three passes: validate the chain, normalize it into multiply and
//! squaring-run nodes, then assign storage and emit instructions. The
//! result depends only on the chain and the options.

use super::alloc::{allocate, Node};
use super::{Instruction, Operand, Program};
use crate::chain::{AdditionChain, Op};
use crate::error::ChainError;

/// How a run of `k` squarings is written out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SquareShape {
    /// One `SquareRun` per run (with a leading `Square` when not in place).
    #[default]
    Run,
    /// `k` separate `Square` instructions.
    Unrolled,
}

impl SquareShape {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "run" => Some(SquareShape::Run),
            "unrolled" => Some(SquareShape::Unrolled),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SquareShape::Run => "run",
            SquareShape::Unrolled => "unrolled",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub shape: SquareShape,
}

/// Compile with default options.
pub fn compile(chain: &AdditionChain) -> Result<Program, ChainError> {
    compile_with(chain, &CompileOptions::default())
}

pub fn compile_with(chain: &AdditionChain, options: &CompileOptions) -> Result<Program, ChainError> {
    chain.validate()?;

    let nodes = normalize(chain);
    let alloc = allocate(&nodes);

    let mut instructions = Vec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate().skip(1) {
        let out = alloc.slots[i];
        match *node {
            Node::Input => {}
            Node::Mul(a, b) => instructions.push(Instruction::Mul {
                out,
                x: alloc.slots[a],
                y: alloc.slots[b],
            }),
            Node::Sqr(a, count) => {
                emit_run(&mut instructions, out, alloc.slots[a], count, options.shape)
            }
        }
    }

    Ok(Program::new(
        chain.target().clone(),
        instructions,
        alloc.temporaries,
    ))
}

/// Rewrite chain steps as nodes. `Add(a, a)` becomes a squaring, and a
/// squaring whose operand is the previous squaring (read nowhere else)
/// extends that run instead of starting a new node.
pub(crate) fn normalize(chain: &AdditionChain) -> Vec<Node> {
    let steps = chain.steps();

    let mut uses = vec![0usize; steps.len() + 1];
    for op in steps {
        let (x, y) = op.operands();
        uses[x] += 1;
        if let Some(y) = y {
            uses[y] += 1;
        }
    }

    let mut nodes = vec![Node::Input];
    // step index -> node index
    let mut node_of = vec![0usize; steps.len() + 1];

    for (i, op) in steps.iter().enumerate() {
        let step = i + 1;
        let (of, count) = match *op {
            Op::Double(of) => (of, 1),
            Op::Shift(of, count) => (of, count),
            Op::Add(x, y) if x == y => (x, 1),
            Op::Add(x, y) => {
                nodes.push(Node::Mul(node_of[x], node_of[y]));
                node_of[step] = nodes.len() - 1;
                continue;
            }
        };

        let prev = nodes.len() - 1;
        match nodes[prev] {
            Node::Sqr(inner, k) if node_of[of] == prev && uses[of] == 1 => {
                nodes[prev] = Node::Sqr(inner, k + count);
                node_of[step] = prev;
            }
            _ => {
                nodes.push(Node::Sqr(node_of[of], count));
                node_of[step] = nodes.len() - 1;
            }
        }
    }
    nodes
}

fn emit_run(out_list: &mut Vec<Instruction>, out: Operand, x: Operand, count: u32, shape: SquareShape) {
    match shape {
        SquareShape::Run => {
            if count == 1 {
                out_list.push(Instruction::Square { out, x });
            } else if x == out {
                out_list.push(Instruction::SquareRun { out, x: out, count });
            } else {
                out_list.push(Instruction::Square { out, x });
                out_list.push(Instruction::SquareRun {
                    out,
                    x: out,
                    count: count - 1,
                });
            }
        }
        SquareShape::Unrolled => {
            out_list.push(Instruction::Square { out, x });
            for _ in 1..count {
                out_list.push(Instruction::Square { out, x: out });
            }
        }
    }
}
