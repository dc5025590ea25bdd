use super::error::MatchError;
use image::GrayImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Lazy-loading cache of reference templates.
///
/// Templates are read from a fixed directory on first use, converted to
/// grayscale and kept for the lifetime of the process. The template set is
/// small and fixed per deployment, so the cache is unbounded and never
/// evicted.
pub struct TemplateStore {
    template_dir: PathBuf,
    cache: Mutex<HashMap<String, Arc<GrayImage>>>,
}

impl TemplateStore {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Return the named template, loading and caching it on first access.
    pub fn get(&self, name: &str) -> Result<Arc<GrayImage>, MatchError> {
        if let Some(template) = self.cache.lock().expect("template cache poisoned").get(name) {
            return Ok(Arc::clone(template));
        }

        let path = self.template_dir.join(name);
        if !path.exists() {
            return Err(MatchError::TemplateMissing { path });
        }
        let template = image::open(&path)
            .map_err(|source| MatchError::TemplateDecode {
                path: path.clone(),
                source,
            })?
            .to_luma8();
        log::debug!(
            "Loaded template '{}' ({}x{}) from {:?}",
            name,
            template.width(),
            template.height(),
            path
        );

        let template = Arc::new(template);
        self.cache
            .lock()
            .expect("template cache poisoned")
            .insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }

    #[cfg(test)]
    pub fn cached_count(&self) -> usize {
        self.cache.lock().expect("template cache poisoned").len()
    }
}
