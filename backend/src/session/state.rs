//! The single-user editing session.
//!
//! The server holds exactly one active `Dataset`, one `SelectedRecord` and one active
//! `Template`. Each lives in its own slot behind an `Arc<RwLock>` and is replaced
//! wholesale, never patched in place. Readers clone the current value (the dataset is an
//! `Arc`, so that clone is cheap) and work on that snapshot; a concurrent upload or edit
//! swaps the slot without disturbing them.

use crate::error::ValidationError;
use common::model::dataset::Dataset;
use common::model::selection::SelectedRecord;
use common::model::template::Template;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct SessionState {
    dataset: Arc<RwLock<Option<Arc<Dataset>>>>,
    selected: Arc<RwLock<Option<SelectedRecord>>>,
    template: Arc<RwLock<Option<Template>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.read().await.clone()
    }

    /// Installs a freshly loaded dataset and drops the current selection, which referred
    /// to the old one. Returns the dataset that was replaced.
    pub async fn replace_dataset(&self, dataset: Dataset) -> Option<Arc<Dataset>> {
        let mut slot = self.dataset.write().await;
        let mut selected = self.selected.write().await;
        *selected = None;
        slot.replace(Arc::new(dataset))
    }

    pub async fn selected(&self) -> Option<SelectedRecord> {
        self.selected.read().await.clone()
    }

    pub async fn select(&self, record: SelectedRecord) {
        *self.selected.write().await = Some(record);
    }

    pub async fn active_template(&self) -> Option<Template> {
        self.template.read().await.clone()
    }

    pub async fn set_active_template(&self, template: Template) {
        *self.template.write().await = Some(template);
    }

    /// Runs an editing command against the active template and stores its result.
    ///
    /// The slot is only written when `command` succeeds, so a rejected edit leaves the
    /// previous template in place.
    pub async fn edit_template<F>(&self, command: F) -> Result<Template, ValidationError>
    where
        F: FnOnce(&Template) -> Result<Template, ValidationError>,
    {
        let mut slot = self.template.write().await;
        let current = slot.as_ref().ok_or(ValidationError::NoActiveTemplate)?;
        let next = command(current)?;
        *slot = Some(next.clone());
        Ok(next)
    }
}
