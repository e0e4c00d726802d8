use instant::Instant;

/// Identifier of a repeating per-frame task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTaskId(u64);

#[derive(Debug)]
struct FrameTask {
    id: FrameTaskId,
    owner: String,
    started: Instant,
    frames: u64,
}

/// Cancellable display-refresh callbacks.
///
/// A task stays scheduled until cancelled; each [`FrameScheduler::tick`]
/// reports the owners due for a frame. Hosts call `tick` once per display
/// refresh.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    tasks: Vec<FrameTask>,
    next_id: u64,
    last_tick: Option<Instant>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a repeating frame task for `owner`
    pub fn request(&mut self, owner: &str) -> FrameTaskId {
        self.next_id += 1;
        let id = FrameTaskId(self.next_id);
        self.tasks.push(FrameTask {
            id,
            owner: owner.to_string(),
            started: Instant::now(),
            frames: 0,
        });
        log::trace!("frame task {:?} scheduled for {}", id, owner);
        id
    }

    /// Cancel a task. Returns `false` if it was not scheduled.
    pub fn cancel(&mut self, id: FrameTaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        before != self.tasks.len()
    }

    pub fn is_active(&self, id: FrameTaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    /// Advance one frame, returning the owners to run in scheduling order
    pub fn tick(&mut self) -> Vec<String> {
        self.last_tick = Some(Instant::now());
        self.tasks
            .iter_mut()
            .map(|task| {
                task.frames += 1;
                task.owner.clone()
            })
            .collect()
    }

    /// Frames delivered to a task so far
    pub fn frames_delivered(&self, id: FrameTaskId) -> Option<u64> {
        self.tasks.iter().find(|task| task.id == id).map(|task| task.frames)
    }

    /// Mean frame rate of a task since it was scheduled
    pub fn frame_rate(&self, id: FrameTaskId) -> Option<f64> {
        let task = self.tasks.iter().find(|task| task.id == id)?;
        let elapsed = self.last_tick?.duration_since(task.started).as_secs_f64();
        (elapsed > 0.0).then(|| task.frames as f64 / elapsed)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }
}
