//! Generation priority and the pending-generation queue

use crate::core::types::Vec3;
use crate::voxel::chunk::ChunkCoord;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Priority of a chunk centered at `center` for an observer at `observer`
///
/// `scale / (distance + 1)`: closer chunks get larger values. Without a
/// known observer every chunk has priority 0.
pub fn chunk_priority(scale: f32, observer: Option<Vec3>, center: Vec3) -> f32 {
    match observer {
        Some(pos) => scale / (pos.distance(center) + 1.0),
        None => 0.0,
    }
}

/// A pending chunk generation
#[derive(Clone, Copy, Debug)]
pub struct GenerationTask {
    pub coord: ChunkCoord,
    pub priority: f32, // Higher = more important
}

impl Eq for GenerationTask {}

impl PartialEq for GenerationTask {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord
    }
}

impl Ord for GenerationTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

impl PartialOrd for GenerationTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority-ordered queue holding each coordinate at most once
///
/// Tasks are kept sorted ascending so the highest priority pops from the
/// end. Equal priorities pop in insertion order.
#[derive(Debug, Default)]
pub struct GenerationQueue {
    tasks: Vec<GenerationTask>,
    members: HashSet<ChunkCoord>,
}

impl GenerationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task; returns `false` if the coordinate is already queued
    pub fn push(&mut self, task: GenerationTask) -> bool {
        if !self.members.insert(task.coord) {
            return false;
        }
        let at = self.tasks.partition_point(|t| t.cmp(&task) == Ordering::Less);
        self.tasks.insert(at, task);
        true
    }

    /// Take the highest priority task
    pub fn pop(&mut self) -> Option<GenerationTask> {
        let task = self.tasks.pop()?;
        self.members.remove(&task.coord);
        Some(task)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.members.contains(&coord)
    }

    /// Drop a queued coordinate; returns whether it was queued
    pub fn remove(&mut self, coord: ChunkCoord) -> bool {
        if !self.members.remove(&coord) {
            return false;
        }
        self.tasks.retain(|t| t.coord != coord);
        true
    }

    /// Recompute every priority and restore the ordering
    pub fn reprioritize(&mut self, mut priority: impl FnMut(ChunkCoord) -> f32) {
        for task in &mut self.tasks {
            task.priority = priority(task.coord);
        }
        // Stable, so ties keep their pop order
        self.tasks.sort_by(|a, b| a.cmp(b));
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks from highest to lowest priority
    pub fn iter(&self) -> impl Iterator<Item = &GenerationTask> {
        self.tasks.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(x: i32, priority: f32) -> GenerationTask {
        GenerationTask { coord: ChunkCoord::new(x, 0, 0), priority }
    }

    #[test]
    fn test_priority_monotonic() {
        let observer = Some(Vec3::ZERO);
        let mut last = f32::INFINITY;
        for i in 0..50 {
            let p = chunk_priority(10_000.0, observer, Vec3::new(i as f32 * 37.0, 5.0, 0.0));
            assert!(p < last);
            last = p;
        }
        assert_eq!(chunk_priority(10_000.0, observer, Vec3::ZERO), 10_000.0);
    }

    #[test]
    fn test_priority_without_observer() {
        assert_eq!(chunk_priority(10_000.0, None, Vec3::splat(100.0)), 0.0);
    }

    #[test]
    fn test_queue_pops_highest_first() {
        let mut queue = GenerationQueue::new();
        queue.push(task(0, 1.0));
        queue.push(task(1, 5.0));
        queue.push(task(2, 3.0));

        let order: Vec<i32> = std::iter::from_fn(|| queue.pop()).map(|t| t.coord.x).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_membership() {
        let mut queue = GenerationQueue::new();
        assert!(queue.push(task(7, 1.0)));
        assert!(!queue.push(task(7, 9.0)));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(ChunkCoord::new(7, 0, 0)));

        let popped = queue.pop().unwrap();
        assert_eq!(popped.priority, 1.0);
        assert!(!queue.contains(ChunkCoord::new(7, 0, 0)));

        // Can be queued again once dequeued
        assert!(queue.push(task(7, 2.0)));
    }

    #[test]
    fn test_ties_pop_in_insertion_order() {
        let mut queue = GenerationQueue::new();
        for x in 0..4 {
            queue.push(task(x, 1.0));
        }
        let order: Vec<i32> = std::iter::from_fn(|| queue.pop()).map(|t| t.coord.x).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reprioritize() {
        let mut queue = GenerationQueue::new();
        queue.push(task(0, 3.0));
        queue.push(task(1, 2.0));
        queue.push(task(2, 1.0));

        queue.reprioritize(|c| c.x as f32);
        let order: Vec<i32> = queue.iter().map(|t| t.coord.x).collect();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut queue = GenerationQueue::new();
        queue.push(task(0, 1.0));
        queue.push(task(1, 2.0));
        assert!(queue.remove(ChunkCoord::new(0, 0, 0)));
        assert!(!queue.remove(ChunkCoord::new(0, 0, 0)));
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains(ChunkCoord::new(1, 0, 0)));
    }
}
