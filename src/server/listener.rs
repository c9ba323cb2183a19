use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::http::handler::Handler;
use crate::http::resource::StaticFiles;
use crate::server::event_loop::EventLoop;
use crate::session::SessionStore;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.listen_addr))?;
    info!("Listening on {}", cfg.server.listen_addr);

    let handler = build_handler(cfg).await?;
    EventLoop::new(listener, handler).run().await
}

/// Wires the static file root and the session store from configuration.
pub async fn build_handler(cfg: &Config) -> anyhow::Result<Handler> {
    let dir = &cfg.session.dir;
    if tokio::fs::metadata(dir).await.is_err() {
        warn!(dir = %dir.display(), "Session directory missing, sessions cannot be created");
    }

    let sessions = if cfg.session.resume_counter {
        SessionStore::resume(dir)
            .await
            .with_context(|| format!("failed to scan session directory {}", dir.display()))?
    } else {
        SessionStore::new(dir)
    };

    let files = StaticFiles::new(&cfg.static_files.root, &cfg.static_files.index);
    info!(
        root = %files.root().display(),
        sessions = %sessions.dir().display(),
        "Serving"
    );

    Ok(Handler::new(files, sessions, cfg.session.max_age))
}
