//! Level unlock gate
//!
//! The first level of the chain is always open. Every other level opens once
//! its immediate predecessor has been completed. Ids outside the chain are
//! locked.

use crate::catalog;

/// Whether `level_id` is playable given the completed level ids
pub fn is_unlocked(level_id: &str, completed: &[String]) -> bool {
    is_unlocked_in(&catalog::chain(), level_id, completed)
}

/// Same gate against an explicit chain
pub fn is_unlocked_in(chain: &[&str], level_id: &str, completed: &[String]) -> bool {
    match chain.iter().position(|id| *id == level_id) {
        Some(0) => true,
        Some(idx) => {
            let previous = chain[idx - 1];
            completed.iter().any(|id| id == previous)
        }
        None => false,
    }
}

/// Experience level after completing `level_id` for the first time.
///
/// Completing chain index k raises the level to at least k + 2. Unknown ids
/// leave it unchanged.
pub fn experience_after_completion(current: i32, level_id: &str) -> i32 {
    match catalog::chain_index(level_id) {
        Some(idx) => current.max(idx as i32 + 2),
        None => current,
    }
}
