pub mod server;
pub mod sweeper;

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::state::AppState;

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// A long-running service. `start` is expected to run until shutdown;
/// returning or panicking gets the service restarted.
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  /// Spawns a supervisor per plugin and returns their handles.
  pub fn run(self, app: Arc<AppState>) -> Vec<JoinHandle<()>> {
    self
      .plugins
      .into_iter()
      .map(|plugin| tokio::spawn(supervise(plugin, app.clone())))
      .collect()
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>) {
  let name = plugin.name();
  info!("Service `{name}` started");

  loop {
    let task = {
      let (plugin, app) = (plugin.clone(), app.clone());
      tokio::spawn(async move { plugin.start(app).await })
    };

    match task.await {
      Ok(Ok(())) => warn!("Service `{name}` stopped unexpectedly"),
      Ok(Err(err)) => error!("Service `{name}` failed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!("Service `{name}` shut down");
        break;
      }
      Err(_) => error!("Service `{name}` panicked"),
    }

    sleep(RESTART_DELAY).await;
    info!("Restarting service `{name}`...");
  }
}
