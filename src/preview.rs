//! Asynchronous preview computation.
//!
//! A slider can fire many preview requests per second. Each request is
//! rendered on a rayon pool and reports back over an mpsc channel. Results are
//! accepted only when they answer the most recent request of the current
//! generation:
//!
//! - **Sequence numbers** increase with every [`PreviewPipeline::submit`].
//!   A result whose number is not the latest issued one has been superseded and
//!   is dropped, whatever order the workers finish in.
//! - **Generations** are bumped by [`PreviewPipeline::invalidate`], which the
//!   session calls on every commit, undo, redo, crop, resize, load and close.
//!   A preview computed against an old baseline can never overwrite the new
//!   state.
//!
//! Baselines are shared with workers through `Arc`, so submitting a request
//! never copies pixels.

use crate::imaging::{Adjustment, Intensity, PixelBuffer};
use log::debug;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

struct Rendered {
    seq: u64,
    generation: u64,
    buffer: PixelBuffer,
}

pub struct PreviewPipeline {
    pool: rayon::ThreadPool,
    tx: Sender<Rendered>,
    rx: Receiver<Rendered>,
    next_seq: u64,
    latest: Option<u64>,
    generation: u64,
    outstanding: usize,
}

impl PreviewPipeline {
    /// Build a pipeline backed by `threads` workers.
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("retouch-preview-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            pool,
            tx,
            rx,
            next_seq: 0,
            latest: None,
            generation: 0,
            outstanding: 0,
        })
    }

    /// Queue a render of `adjustment` against `baseline`. Returns the request's
    /// sequence number.
    pub fn submit(
        &mut self,
        baseline: Arc<PixelBuffer>,
        original: Arc<PixelBuffer>,
        adjustment: Adjustment,
        intensity: Intensity,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest = Some(seq);
        self.outstanding += 1;

        let generation = self.generation;
        let tx = self.tx.clone();
        self.pool.spawn(move || {
            let buffer = adjustment.render(&baseline, &original, intensity);
            // The receiver lives as long as the pipeline; a send error only
            // means the pipeline was dropped mid-render.
            let _ = tx.send(Rendered {
                seq,
                generation,
                buffer,
            });
        });
        debug!("preview #{seq} queued: {adjustment} @ {intensity}");
        seq
    }

    /// Forget every in-flight request. Their results will be dropped on arrival.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.latest = None;
    }

    /// Requests submitted but not yet collected.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Collect finished renders without blocking. Returns the winning buffer,
    /// if the latest request has completed since the last call.
    pub fn drain(&mut self) -> Option<PixelBuffer> {
        let mut winner = None;
        loop {
            match self.rx.try_recv() {
                Ok(rendered) => {
                    if let Some(buffer) = self.accept(rendered) {
                        winner = Some(buffer);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        winner
    }

    /// Block until every outstanding request has reported, then return the
    /// winner as [`drain`](Self::drain) would.
    pub fn wait(&mut self) -> Option<PixelBuffer> {
        let mut winner = None;
        while self.outstanding > 0 {
            let Ok(rendered) = self.rx.recv() else {
                break;
            };
            if let Some(buffer) = self.accept(rendered) {
                winner = Some(buffer);
            }
        }
        winner
    }

    fn accept(&mut self, rendered: Rendered) -> Option<PixelBuffer> {
        self.outstanding = self.outstanding.saturating_sub(1);
        if rendered.generation != self.generation {
            debug!("preview #{} dropped: baseline changed", rendered.seq);
            return None;
        }
        if self.latest != Some(rendered.seq) {
            debug!("preview #{} dropped: superseded", rendered.seq);
            return None;
        }
        self.latest = None;
        Some(rendered.buffer)
    }
}
