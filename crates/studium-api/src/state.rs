//! Application state shared across handlers.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use studium_core::{ProgressHub, RuntimeInfo};
use studium_db::Database;
use studium_engine::{ChatEngine, Generator, PodcastService, Retriever};
use studium_inference::BackendSelector;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub selector: Arc<BackendSelector>,
    pub retriever: Arc<Retriever>,
    pub chat: Arc<ChatEngine>,
    pub generator: Arc<Generator>,
    pub podcasts: Arc<PodcastService>,
    pub hub: Arc<ProgressHub>,
    pub runtime: Arc<RuntimeInfo>,
    /// Cancel flag for the in-flight model download, if any.
    pub download_cancel: Arc<AtomicBool>,
    pub upload_dir: PathBuf,
    pub audio_dir: PathBuf,
}

impl AppState {
    pub fn new(db: Database, upload_dir: PathBuf, audio_dir: PathBuf) -> Self {
        let selector = Arc::new(BackendSelector::new());
        let hub = Arc::new(ProgressHub::new());
        let retriever = Arc::new(Retriever::new(db.clone(), selector.clone()));
        let chat = Arc::new(ChatEngine::new(db.clone(), selector.clone(), retriever.clone()));
        let generator = Arc::new(Generator::new(db.clone(), selector.clone(), retriever.clone()));
        let podcasts = Arc::new(PodcastService::new(
            db.clone(),
            selector.clone(),
            retriever.clone(),
            audio_dir.clone(),
        ));

        Self {
            db,
            selector,
            retriever,
            chat,
            generator,
            podcasts,
            hub,
            runtime: Arc::new(RuntimeInfo::probe()),
            download_cancel: Arc::new(AtomicBool::new(false)),
            upload_dir,
            audio_dir,
        }
    }
}
