use hashbrown::HashMap;

use crate::types::TaskResult;

/// Restores stream order for results that finish out of order.
pub struct Buffer {
    buffer: HashMap<u64, TaskResult>,

    next_idx: u64,
}

impl Buffer {
    #[inline]
    pub fn new(start: u64) -> Self {
        Self { buffer: HashMap::new(), next_idx: start }
    }

    /// Stores `result` and returns every result that is now contiguous with
    /// what has already been released.
    #[must_use]
    pub fn add(&mut self, result: TaskResult) -> Vec<TaskResult> {
        self.buffer.insert(result.index, result);

        let mut ready = Vec::new();
        while let Some(result) = self.buffer.remove(&self.next_idx) {
            ready.push(result);
            self.next_idx += 1;
        }

        ready
    }

    /// Results held back because an earlier index never arrived.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub const fn next_index(&self) -> u64 {
        self.next_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;

    fn result(index: u64) -> TaskResult {
        let task = Task { data: Vec::new(), index, last: false };
        TaskResult::ok(&task, vec![index as u8], 1)
    }

    #[test]
    fn test_in_order_release() {
        let mut buffer = Buffer::new(0);
        assert_eq!(buffer.add(result(0)).len(), 1);
        assert_eq!(buffer.add(result(1)).len(), 1);
        assert_eq!(buffer.next_index(), 2);
    }

    #[test]
    fn test_out_of_order_release() {
        let mut buffer = Buffer::new(0);
        assert!(buffer.add(result(2)).is_empty());
        assert!(buffer.add(result(1)).is_empty());
        assert_eq!(buffer.pending(), 2);

        let ready = buffer.add(result(0));
        let indices: Vec<u64> = ready.iter().map(|r| r.index).collect();

        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_gap_stays_pending() {
        let mut buffer = Buffer::new(0);
        let _ = buffer.add(result(0));
        assert!(buffer.add(result(2)).is_empty());
        assert_eq!(buffer.pending(), 1);
    }
}
