//! In-process fakes of the voting backend and the host site for tests.
//!
//! [`spawn`] starts one axum server on an ephemeral local port that answers
//! both the backend's JSON endpoints and the host's settings and editorial
//! pages. Both halves share one [`World`], so a profile write on the host side
//! is what `create-token` observes, as with the real services.

mod backend;
mod site;
mod world;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use tokio::task::JoinHandle;

pub use world::{FakeUser, World};

pub const SESSION_COOKIE: &str = "REVEL_SESSION";

/// Shared handle on the fake world.
#[derive(Clone, Default)]
pub struct WorldHandle(Arc<Mutex<World>>);

impl WorldHandle {
    pub fn new(world: World) -> Self {
        Self(Arc::new(Mutex::new(world)))
    }

    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running fake server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub world: WorldHandle,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Base URL usable as both backend URL and host origin.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn router(world: WorldHandle) -> Router {
    Router::new()
        .merge(backend::router())
        .merge(site::router())
        .with_state(world)
}

/// Bind to `127.0.0.1:0` and serve `world` until the returned server drops.
pub async fn spawn(world: World) -> std::io::Result<TestServer> {
    let world = WorldHandle::new(world);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let app = router(world.clone());
    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("fake server error: {err}");
        }
    });
    Ok(TestServer { addr, world, task })
}
