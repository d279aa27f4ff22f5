/*
 * Monotonic ID allocators owned by a `Session`. Control IDs start at a
 * configurable base and are never reused; callers that need a specific ID
 * skip the allocator entirely and no collision check is made against them.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::ControlId;

pub const DEFAULT_FIRST_CONTROL_ID: u16 = 20000;
pub const DEFAULT_FIRST_SUBCLASS_ID: usize = 1;

#[derive(Debug)]
pub struct ControlIdAllocator {
    next: Option<u16>,
}

impl ControlIdAllocator {
    pub fn new(base: u16) -> Self {
        Self { next: Some(base) }
    }

    pub fn next_id(&mut self) -> PlatformResult<ControlId> {
        let id = self.next.ok_or_else(|| {
            PlatformError::OperationFailed("control ID range exhausted".to_string())
        })?;
        self.next = id.checked_add(1);
        log::trace!("ControlIdAllocator: handing out control ID {id}");
        Ok(ControlId::new(id))
    }
}

impl Default for ControlIdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_CONTROL_ID)
    }
}

#[derive(Debug)]
pub struct SubclassIdAllocator {
    next: usize,
}

impl SubclassIdAllocator {
    pub fn new(first: usize) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for SubclassIdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_SUBCLASS_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_control_ids_are_distinct_and_strictly_increasing() {
        // Arrange
        let mut alloc = ControlIdAllocator::default();
        // Act
        let ids: Vec<ControlId> = (0..500).map(|_| alloc.next_id().unwrap()).collect();
        // Assert
        assert_eq!(ids[0].raw(), DEFAULT_FIRST_CONTROL_ID);
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn control_id_allocator_reports_exhaustion_instead_of_wrapping() {
        let mut alloc = ControlIdAllocator::new(u16::MAX - 1);
        assert_eq!(alloc.next_id().unwrap().raw(), u16::MAX - 1);
        assert_eq!(alloc.next_id().unwrap().raw(), u16::MAX);
        let err = alloc.next_id().expect_err("range should be exhausted");
        assert!(err.to_string().contains("exhausted"));
    }

    #[test]
    fn subclass_ids_increase_from_first() {
        let mut alloc = SubclassIdAllocator::new(7);
        assert_eq!(alloc.next_id(), 7);
        assert_eq!(alloc.next_id(), 8);
        assert_eq!(alloc.next_id(), 9);
    }
}
