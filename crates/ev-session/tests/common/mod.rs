#![allow(dead_code)]

use std::sync::Arc;

use ev_session::{
    AtCoderHost, FsCredentialStore, HostSite, MemCredentialStore, NullRenderer, PageContext,
    Session, SessionConfig,
};
use ev_testkit::{TestServer, World};

pub const CONTEST: &str = "abc300";

pub fn config(server: &TestServer) -> SessionConfig {
    SessionConfig::default()
        .with_backend_url(server.url())
        .with_host_origin(server.url())
}

pub fn host(server: &TestServer, user: &str) -> Arc<dyn HostSite> {
    let session = server.world.lock().session_of(user).map(str::to_string);
    let context = PageContext::new(CONTEST).with_user(user);
    Arc::new(AtCoderHost::new(&config(server), context, session.as_deref()).expect("host"))
}

pub fn session(server: &TestServer, user: &str, store: MemCredentialStore) -> Session {
    Session::from_config(
        &config(server),
        host(server, user),
        Arc::new(store),
        Arc::new(NullRenderer),
    )
    .expect("session")
}

pub fn fs_session(server: &TestServer, user: &str, store: FsCredentialStore) -> Session {
    Session::from_config(
        &config(server),
        host(server, user),
        Arc::new(store),
        Arc::new(NullRenderer),
    )
    .expect("session")
}

pub fn world_with_links(links: &[&str]) -> World {
    World::new()
        .with_user("alice", 2750, "Kyoto Univ")
        .with_user("bob", 1200, "")
        .with_editorial_page(&format!("contests/{CONTEST}/editorial"), links)
}
