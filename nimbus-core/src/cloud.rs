//! Wires the managers and the completion dispatcher together.

use std::sync::Arc;

use crate::completion::CompletionDispatcher;
use crate::job::JobManager;
use crate::manager::ManagerContext;
use crate::template::TemplateManager;
use crate::volume::VolumeManager;
use crate::volume_image::VolumeImageManager;

/// One handle on every manager, sharing a single context.
#[derive(Clone)]
pub struct Cloud {
    pub volumes: VolumeManager,
    pub images: VolumeImageManager,
    pub templates: TemplateManager,
    pub jobs: JobManager,
    pub dispatcher: Arc<CompletionDispatcher>,
}

impl Cloud {
    pub fn new(ctx: ManagerContext) -> Self {
        let volumes = VolumeManager::new(ctx.clone());
        let images = VolumeImageManager::new(ctx.clone());

        let mut dispatcher = CompletionDispatcher::new(ctx.jobs.clone());
        dispatcher.register(Arc::new(volumes.clone()));
        dispatcher.register(Arc::new(images.clone()));

        Self {
            templates: volumes.templates().clone(),
            jobs: ctx.jobs.clone(),
            volumes,
            images,
            dispatcher: Arc::new(dispatcher),
        }
    }
}
