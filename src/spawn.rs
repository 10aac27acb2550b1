//! Where the dashboard's asynchronous work runs.
//!
//! Everything is single-threaded. In the browser tasks go to the page's
//! microtask queue; natively and in tests they go to a
//! `futures::executor::LocalPool`.

use futures::future::LocalBoxFuture;

pub trait Spawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

impl Spawner for futures::executor::LocalSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        use futures::task::LocalSpawnExt;
        if let Err(e) = LocalSpawnExt::spawn_local(self, task) {
            log::warn!("Dropping task, executor is shut down: {}", e);
        }
    }
}

/// Runs tasks with `wasm_bindgen_futures::spawn_local`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

#[cfg(target_arch = "wasm32")]
impl Spawner for BrowserSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
