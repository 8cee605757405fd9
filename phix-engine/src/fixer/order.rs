//! Execution-order resolution.
//!
//! The active fixers and their `runs_before` declarations form a directed
//! graph. It is resolved once per configuration into a total order: a
//! topological sort that, among the fixers currently free of obligations,
//! always picks the highest priority and falls back to registration order
//! on ties. The same configuration therefore always yields the same
//! schedule.

use std::collections::HashMap;

use crate::fixer::{ConfigurationError, Fixer};

/// Orders `fixers`, consuming and returning them.
///
/// `runs_before` targets missing from the set are ignored. A dependency
/// cycle is a configuration error carrying the names still blocked.
pub fn sort_fixers(
    fixers: Vec<Box<dyn Fixer>>,
) -> Result<Vec<Box<dyn Fixer>>, ConfigurationError> {
    let count = fixers.len();
    let index_by_name: HashMap<&'static str, usize> = fixers
        .iter()
        .enumerate()
        .map(|(index, fixer)| (fixer.name(), index))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut blockers = vec![0usize; count];
    for (index, fixer) in fixers.iter().enumerate() {
        for target in fixer.runs_before() {
            if let Some(&target_index) = index_by_name.get(target) {
                successors[index].push(target_index);
                blockers[target_index] += 1;
            }
        }
    }

    let mut ready: Vec<usize> = (0..count).filter(|&i| blockers[i] == 0).collect();
    let mut schedule = Vec::with_capacity(count);
    while !ready.is_empty() {
        let mut best = 0;
        for position in 1..ready.len() {
            let candidate = ready[position];
            let chosen = ready[best];
            let priority = fixers[candidate].priority();
            let chosen_priority = fixers[chosen].priority();
            if priority > chosen_priority || (priority == chosen_priority && candidate < chosen) {
                best = position;
            }
        }
        let next = ready.swap_remove(best);
        schedule.push(next);
        for &follower in &successors[next] {
            blockers[follower] -= 1;
            if blockers[follower] == 0 {
                ready.push(follower);
            }
        }
    }

    if schedule.len() != count {
        let mut names: Vec<String> = fixers
            .iter()
            .enumerate()
            .filter(|(index, _)| blockers[*index] > 0)
            .map(|(_, fixer)| fixer.name().to_string())
            .collect();
        names.sort();
        return Err(ConfigurationError::DependencyCycle { names });
    }

    let mut slots: Vec<Option<Box<dyn Fixer>>> = fixers.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(count);
    for index in schedule {
        if let Some(fixer) = slots[index].take() {
            ordered.push(fixer);
        }
    }
    Ok(ordered)
}
