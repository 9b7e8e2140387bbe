//! Object parent graph checks

use super::types::Object;
use crate::error::{Error, Result};

/// Fail if any parent chain loops.
///
/// Each chain is followed for at most `objects.len()` steps; a chain that
/// is still going after that, or that returns to its start, is a cycle.
pub fn validate_hierarchy(objects: &[Object]) -> Result<()> {
    for (start, object) in objects.iter().enumerate() {
        let mut current = object.parent;
        let mut steps = 0;
        while let Some(parent) = current {
            if parent == start || steps >= objects.len() {
                return Err(Error::CyclicHierarchy {
                    object: object.name.clone(),
                });
            }
            steps += 1;
            current = objects.get(parent).and_then(|o| o.parent);
        }
    }
    Ok(())
}
