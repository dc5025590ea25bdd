use super::error::MatchError;
use super::store::TemplateStore;
use image::GrayImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};

/// Default confidence threshold for template matching.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Top-left pixel offset of a match in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// A successful template match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub template: String,
    pub location: Point,
    pub confidence: f32,
}

/// Matches named templates against captured screenshots.
///
/// Scoring is a sliding-window normalized cross-correlation over all valid
/// offsets; the best score wins and is gated by the threshold. Deterministic
/// for identical inputs, no side effects beyond template cache population.
pub struct TemplateMatcher {
    store: TemplateStore,
    threshold: f32,
}

impl TemplateMatcher {
    pub fn new(store: TemplateStore, threshold: f32) -> Self {
        Self { store, threshold }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Search for a template in raw screenshot bytes.
    ///
    /// Returns `None` both when the template simply is not on screen and
    /// when the screenshot or template cannot be used at all. The failure
    /// reasons are logged but deliberately not surfaced to control flow:
    /// handlers must treat "no match" uniformly.
    pub fn find_in_screen(&self, screen_bytes: &[u8], template_name: &str) -> Option<MatchResult> {
        self.find_with_threshold(screen_bytes, template_name, self.threshold)
    }

    pub fn find_with_threshold(
        &self,
        screen_bytes: &[u8],
        template_name: &str,
        threshold: f32,
    ) -> Option<MatchResult> {
        match self.try_find(screen_bytes, template_name, threshold) {
            Ok(result) => result,
            Err(MatchError::ScreenDecode { source }) => {
                // A garbled capture is a normal transient condition.
                log::warn!("Could not decode screenshot: {source}");
                None
            }
            Err(e) => {
                log::error!("Template matching for '{template_name}' degraded to no-match: {e}");
                None
            }
        }
    }

    fn try_find(
        &self,
        screen_bytes: &[u8],
        template_name: &str,
        threshold: f32,
    ) -> Result<Option<MatchResult>, MatchError> {
        let screen = image::load_from_memory(screen_bytes)
            .map_err(|source| MatchError::ScreenDecode { source })?
            .to_luma8();
        let template = self.store.get(template_name)?;

        let best = best_match(&screen, &template, template_name)?;
        if best.confidence >= threshold {
            log::debug!(
                "Template '{}' matched at ({}, {}) with confidence {:.3}",
                template_name,
                best.location.x,
                best.location.y,
                best.confidence
            );
            Ok(Some(best))
        } else {
            log::trace!(
                "Template '{}' not found (best {:.3} < threshold {:.3})",
                template_name,
                best.confidence,
                threshold
            );
            Ok(None)
        }
    }
}

/// Run normalized cross-correlation and return the best-scoring offset.
fn best_match(
    screen: &GrayImage,
    template: &GrayImage,
    template_name: &str,
) -> Result<MatchResult, MatchError> {
    if template.width() > screen.width() || template.height() > screen.height() {
        return Err(MatchError::TemplateLargerThanScreen {
            name: template_name.to_string(),
            tw: template.width(),
            th: template.height(),
            sw: screen.width(),
            sh: screen.height(),
        });
    }

    let scores = match_template(
        screen,
        template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );

    let mut best = MatchResult {
        template: template_name.to_string(),
        location: Point { x: 0, y: 0 },
        confidence: f32::MIN,
    };
    for (x, y, pixel) in scores.enumerate_pixels() {
        let score = pixel[0];
        if score > best.confidence {
            best.confidence = score;
            best.location = Point { x, y };
        }
    }
    Ok(best)
}
