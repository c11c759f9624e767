//! Background commit of finished manipulations
//!
//! When a drag, scale or rotation ends, the final transform is baked into
//! the object's persistent geometry on a worker thread so the next frame is
//! not blocked. The frame thread hands over an owned snapshot; the worker
//! builds the baked result completely and swaps it into the shared store
//! under a short write lock. The live scene transform is never touched by
//! the worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use arpen_core::{BoundingBox, CornerSet, NodeId, Transform};
use glam::Vec3;
use parking_lot::RwLock;

/// Persistent geometry of a committed object
#[derive(Debug, Clone, PartialEq)]
pub struct BakedGeometry {
    pub transform: Transform,
    pub world_bounds: BoundingBox,
    pub corners: [Vec3; 8],
    /// Number of commits baked for this object
    pub revision: u64,
}

/// Shared store of baked geometry
pub type BakedStore = Arc<RwLock<HashMap<NodeId, BakedGeometry>>>;

enum BakeJob {
    Bake {
        id: NodeId,
        transform: Transform,
        local_bounds: BoundingBox,
    },
}

/// Fire-and-forget bake queue backed by one worker thread
pub struct BakeWorker {
    sender: Option<Sender<BakeJob>>,
    handle: Option<JoinHandle<()>>,
    store: BakedStore,
}

impl Default for BakeWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl BakeWorker {
    pub fn new() -> Self {
        let store: BakedStore = Arc::new(RwLock::new(HashMap::new()));
        let (sender, receiver) = mpsc::channel::<BakeJob>();
        let worker_store = store.clone();
        let spawned = std::thread::Builder::new()
            .name("bake-worker".to_string())
            .spawn(move || {
                for job in receiver {
                    run_job(&worker_store, job);
                }
                tracing::debug!("Bake worker drained");
            });

        match spawned {
            Ok(handle) => Self {
                sender: Some(sender),
                handle: Some(handle),
                store,
            },
            Err(e) => {
                tracing::warn!("Failed to start bake worker, baking inline: {}", e);
                Self {
                    sender: None,
                    handle: None,
                    store,
                }
            }
        }
    }

    /// Queue a snapshot for baking. Never blocks on the bake itself.
    pub fn submit(&self, id: NodeId, transform: Transform, local_bounds: BoundingBox) {
        let job = BakeJob::Bake {
            id,
            transform,
            local_bounds,
        };
        let job = match &self.sender {
            Some(sender) => match sender.send(job) {
                Ok(()) => return,
                Err(mpsc::SendError(job)) => job,
            },
            None => job,
        };
        run_job(&self.store, job);
    }

    /// Shared handle to the baked results
    pub fn store(&self) -> BakedStore {
        self.store.clone()
    }

    pub fn baked(&self, id: NodeId) -> Option<BakedGeometry> {
        self.store.read().get(&id).cloned()
    }

    /// Finish queued jobs and stop the worker.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Bake worker panicked");
            }
        }
    }
}

impl Drop for BakeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_job(store: &BakedStore, job: BakeJob) {
    match job {
        BakeJob::Bake {
            id,
            transform,
            local_bounds,
        } => {
            let corners = *CornerSet::from_transform(&transform, &local_bounds).corners();
            let world_bounds = BoundingBox::from_points(corners);
            let revision = store.read().get(&id).map_or(0, |b| b.revision) + 1;
            let baked = BakedGeometry {
                transform,
                world_bounds,
                corners,
                revision,
            };
            store.write().insert(id, baked);
            tracing::debug!("Baked {} (revision {})", id, revision);
        }
    }
}
