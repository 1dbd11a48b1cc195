//! Parallel chunk execution using Rayon.
//!
//! Tasks arrive in order from the reader and are spread over Rayon's
//! work-stealing pool with `par_bridge`. Results leave in completion order;
//! the writer puts them back in sequence.

use std::sync::Arc;

use flume::{Receiver, Sender};
use rayon::prelude::*;

use crate::types::{Task, TaskResult};
use crate::worker::pipeline::Pipeline;

pub struct Executor {
    pipeline: Arc<Pipeline>,
}

impl Executor {
    #[inline]
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }

    /// Processes tasks until the reader closes its channel or the writer
    /// stops listening.
    ///
    /// Blocks the calling thread; run it off the async executor.
    pub fn process(&self, tasks: &Receiver<Task>, results: &Sender<TaskResult>) {
        // A send error means the writer has given up; stop pulling work.
        let _ = tasks.iter().par_bridge().try_for_each(|task| results.send(self.pipeline.process(task)));
    }
}
