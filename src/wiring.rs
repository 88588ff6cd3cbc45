//! Object graph assembled once at startup.

use crate::camera::{CameraDevice, NokhwaCamera};
use crate::config::AppConfig;
use crate::storage::{MediaStore, StorageRepository};
use std::sync::Arc;

/// Providers for the shared services.
pub struct AppModule;

impl AppModule {
    pub fn provide_media_store(config: &AppConfig) -> MediaStore {
        MediaStore::new(config.storage.resolved_pictures_dir())
    }

    pub fn provide_storage_repository(
        config: &AppConfig,
        media: MediaStore,
    ) -> Arc<StorageRepository> {
        Arc::new(StorageRepository::new(media, config.storage.clone()))
    }

    pub fn provide_camera(config: &AppConfig) -> Arc<dyn CameraDevice> {
        Arc::new(NokhwaCamera::new(
            &config.camera,
            config.storage.effective_jpeg_quality(),
        ))
    }
}

/// Singletons handed to the screens that need them.
#[derive(Clone)]
pub struct AppComponent {
    pub config: Arc<AppConfig>,
    pub storage: Arc<StorageRepository>,
    pub camera: Arc<dyn CameraDevice>,
}

impl AppComponent {
    pub fn create(config: AppConfig) -> Self {
        let media = AppModule::provide_media_store(&config);
        let storage = AppModule::provide_storage_repository(&config, media);
        let camera = AppModule::provide_camera(&config);
        log::debug!(
            "picture collection at {}",
            storage.media().root().display()
        );
        Self::with_services(config, storage, camera)
    }

    /// Hand out the shared storage adapter.
    pub fn inject(&self) -> Arc<StorageRepository> {
        Arc::clone(&self.storage)
    }

    /// Graph built from already constructed services.
    pub fn with_services(
        config: AppConfig,
        storage: Arc<StorageRepository>,
        camera: Arc<dyn CameraDevice>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            camera,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_shares_one_storage_instance() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = AppConfig::default();
        config.storage.pictures_dir = Some(dir.path().to_path_buf());
        let component = AppComponent::create(config);
        let first = component.inject();
        let second = component.clone().inject();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(component.storage.media().root(), dir.path());
    }
}
