use crate::loader::{HttpFetcher, ImageFetcher};
use crate::platform::{HeadlessPlatform, HistoryAction, PlatformApi};
use crate::{App, AppConfig, AppSharedState, Capture, Error, Result};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

enum Command {
    Navigate(String, HistoryAction, oneshot::Sender<Result<()>>),
    RenderHtml(oneshot::Sender<Result<String>>),
    SetTitle(String, oneshot::Sender<Result<()>>),
    SetLogged(bool, oneshot::Sender<Result<()>>),
    SharedState(oneshot::Sender<Result<Arc<AppSharedState>>>),
    /// Export; `true` waits for every image slot first
    Export(bool, oneshot::Sender<Result<Capture>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly app handle backed by a dedicated UI thread.
///
/// The UI thread owns the [`App`] and applies commands one at a time, so all
/// state changes happen on a single thread while image loads run on the
/// tokio runtime the handle was created from.
#[derive(Clone)]
pub struct AppHandle {
    cmd_tx: Sender<Command>,
}

impl AppHandle {
    /// Create an app on the headless platform with HTTP image fetching.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let platform = Arc::new(HeadlessPlatform::new(config.download_dir.clone()));
        Self::with_parts(config, platform, fetcher).await
    }

    /// Create an app with explicit platform and fetcher.
    pub async fn with_parts(
        config: AppConfig,
        platform: Arc<dyn PlatformApi>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Other(format!("AppHandle needs a tokio runtime: {}", e)))?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut app = match App::new(config, platform, fetcher, runtime.clone()) {
                Ok(a) => a,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Navigate(path, action, resp) => {
                        app.navigate(&path, action);
                        let _ = resp.send(Ok(()));
                    }
                    Command::RenderHtml(resp) => {
                        let _ = resp.send(Ok(app.render_html()));
                    }
                    Command::SetTitle(title, resp) => {
                        let _ = resp.send(app.set_title(&title));
                    }
                    Command::SetLogged(logged, resp) => {
                        app.set_logged(logged);
                        let _ = resp.send(Ok(()));
                    }
                    Command::SharedState(resp) => {
                        let _ = resp.send(Ok(app.shared_state()));
                    }
                    Command::Export(wait, resp) => {
                        let res = if wait {
                            runtime.block_on(app.export_when_ready())
                        } else {
                            app.export()
                        };
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        drop(app);
                        let _ = resp.send(Ok(()));
                        return;
                    }
                }
            }
        });

        // Wait for the UI thread to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("App init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        what: &str,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(make(tx));
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))?
    }

    pub async fn navigate(&self, path: &str, action: HistoryAction) -> Result<()> {
        let path = path.to_string();
        self.request("Navigate", |tx| Command::Navigate(path, action, tx)).await
    }

    pub async fn render_html(&self) -> Result<String> {
        self.request("RenderHtml", Command::RenderHtml).await
    }

    /// Type into the photo screen's title input
    pub async fn set_title(&self, title: &str) -> Result<()> {
        let title = title.to_string();
        self.request("SetTitle", |tx| Command::SetTitle(title, tx)).await
    }

    pub async fn set_logged(&self, logged: bool) -> Result<()> {
        self.request("SetLogged", |tx| Command::SetLogged(logged, tx)).await
    }

    pub async fn shared_state(&self) -> Result<Arc<AppSharedState>> {
        self.request("SharedState", Command::SharedState).await
    }

    /// Wait for the current screen's images, then capture and download it.
    pub async fn export(&self) -> Result<Capture> {
        self.request("Export", |tx| Command::Export(true, tx)).await
    }

    /// Capture and download immediately; unresolved images stay blank.
    pub async fn export_now(&self) -> Result<Capture> {
        self.request("Export", |tx| Command::Export(false, tx)).await
    }

    /// Shutdown the UI thread and unmount the app.
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await
    }
}
