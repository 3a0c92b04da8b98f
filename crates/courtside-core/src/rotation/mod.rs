//! Who plays next and with whom: the resting queue, the quartet selector,
//! the team partition optimizer and the carry-over controller.

pub mod carryover;
pub mod config;
pub mod partition;
pub mod quartet;
pub mod queue;

pub use carryover::{CarryOverContext, CarryOverError, CarryOverPlan, plan_carry_over, resolve_collisions};
pub use config::{
    CarryOverConfig, LimitsConfig, PartitionWeights, RotationConfig, SelectionWeights,
    SocialBiasConfig, ValidationError,
};
pub use partition::{PAIRINGS, PartitionContext, PartitionCost, choose_best_pairing, partition_cost};
pub use quartet::{QuartetPick, SelectionContext, SelectionStage, choose_quartet, score_group};
pub use queue::RestingQueue;

/// All `choose`-element index subsets of `0..len`, in lexicographic order.
pub(crate) fn choose_index_combinations(len: usize, choose: usize) -> Vec<Vec<usize>> {
    if choose == 0 {
        return vec![Vec::new()];
    }
    if choose > len {
        return Vec::new();
    }
    fn backtrack(
        start: usize,
        len: usize,
        choose: usize,
        current: &mut Vec<usize>,
        output: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == choose {
            output.push(current.clone());
            return;
        }
        for idx in start..len {
            current.push(idx);
            backtrack(idx + 1, len, choose, current, output);
            current.pop();
        }
    }

    let mut output = Vec::new();
    backtrack(0, len, choose, &mut Vec::new(), &mut output);
    output
}
