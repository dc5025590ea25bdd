//! Tests for template loading, matching and the wait-for-any poller.

use super::matcher::{Point, TemplateMatcher};
use super::store::TemplateStore;
use super::waiter::wait_for_any;
use crate::testutil::{
    blank_screen, encode_png, marker_patch, screen_with, write_template, FakeDevice,
};
use crate::vision::error::MatchError;
use image::{GrayImage, Luma};
use tempfile::TempDir;
use tokio::time::{Duration, Instant};

fn matcher_with(templates: &[(&str, usize)]) -> (TempDir, TemplateMatcher) {
    let dir = TempDir::new().expect("temp dir");
    for &(name, seed) in templates {
        write_template(dir.path(), name, seed);
    }
    let store = TemplateStore::new(dir.path());
    (dir, TemplateMatcher::new(store, 0.8))
}

#[test]
fn store_caches_templates_forever() {
    let dir = TempDir::new().expect("temp dir");
    write_template(dir.path(), "victory.png", 0);
    let store = TemplateStore::new(dir.path());

    let first = store.get("victory.png").expect("first load");
    assert_eq!(store.cached_count(), 1);

    // Remove the backing file; the cached copy must keep serving.
    std::fs::remove_file(dir.path().join("victory.png")).expect("remove");
    let second = store.get("victory.png").expect("cached load");
    assert_eq!(first.as_raw(), second.as_raw());
    assert_eq!(store.cached_count(), 1);
}

#[test]
fn store_reports_missing_template() {
    let dir = TempDir::new().expect("temp dir");
    let store = TemplateStore::new(dir.path());
    match store.get("nope.png") {
        Err(MatchError::TemplateMissing { path }) => {
            assert!(path.ends_with("nope.png"));
        }
        other => panic!("expected TemplateMissing, got {other:?}"),
    }
}

#[test]
fn store_reports_undecodable_template() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("broken.png"), b"this is not a png").expect("write");
    let store = TemplateStore::new(dir.path());
    assert!(matches!(
        store.get("broken.png"),
        Err(MatchError::TemplateDecode { .. })
    ));
}

#[test]
fn matcher_finds_planted_patch_at_exact_offset() {
    let (_dir, matcher) = matcher_with(&[("victory.png", 0)]);
    let screen = screen_with(&[(0, 20, 30)]);

    let found = matcher.find_in_screen(&screen, "victory.png").expect("match");
    assert_eq!(found.location, Point { x: 20, y: 30 });
    assert!(found.confidence > 0.99);
}

#[test]
fn matcher_is_deterministic() {
    let (_dir, matcher) = matcher_with(&[("victory.png", 0)]);
    let screen = screen_with(&[(0, 41, 7)]);

    let a = matcher.find_in_screen(&screen, "victory.png");
    let b = matcher.find_in_screen(&screen, "victory.png");
    assert_eq!(a, b);
}

#[test]
fn matcher_rejects_foreign_pattern() {
    let (_dir, matcher) = matcher_with(&[("victory.png", 0), ("defeat.png", 3)]);
    let screen = screen_with(&[(0, 20, 30)]);

    assert!(matcher.find_in_screen(&screen, "victory.png").is_some());
    assert!(matcher.find_in_screen(&screen, "defeat.png").is_none());
}

#[test]
fn matcher_treats_corrupt_screen_as_no_match() {
    let (_dir, matcher) = matcher_with(&[("victory.png", 0)]);
    assert!(matcher.find_in_screen(b"garbage bytes", "victory.png").is_none());
}

#[test]
fn matcher_treats_missing_template_as_no_match() {
    let (_dir, matcher) = matcher_with(&[]);
    let screen = blank_screen();
    assert!(matcher.find_in_screen(&screen, "victory.png").is_none());
}

#[test]
fn matcher_rejects_template_larger_than_screen() {
    let dir = TempDir::new().expect("temp dir");
    let huge = GrayImage::from_pixel(200, 200, Luma([128]));
    huge.save(dir.path().join("huge.png")).expect("save");
    let matcher = TemplateMatcher::new(TemplateStore::new(dir.path()), 0.8);

    assert!(matcher.find_in_screen(&blank_screen(), "huge.png").is_none());
}

#[test]
fn matcher_threshold_gates_weak_scores() {
    let (_dir, matcher) = matcher_with(&[("victory.png", 0)]);
    let screen = encode_png(&marker_patch(1));

    // Orthogonal stripes correlate weakly; an absurdly low threshold still
    // accepts the best offset, the default rejects it.
    assert!(matcher.find_with_threshold(&screen, "victory.png", 0.01).is_some());
    assert!(matcher.find_in_screen(&screen, "victory.png").is_none());
}

#[tokio::test(start_paused = true)]
async fn waiter_returns_first_candidate_in_list_order() {
    let (_dir, matcher) = matcher_with(&[("a.png", 0), ("b.png", 3)]);
    // One screenshot matching both candidates.
    let screen = screen_with(&[(0, 10, 10), (3, 60, 60)]);

    let device = FakeDevice::showing(screen.clone());
    let found = wait_for_any(
        &device,
        &matcher,
        &["a.png", "b.png"],
        Duration::from_secs(1),
        Duration::from_millis(10),
    )
    .await;
    assert_eq!(found.expect("match").0, "a.png");

    let device = FakeDevice::showing(screen);
    let found = wait_for_any(
        &device,
        &matcher,
        &["b.png", "a.png"],
        Duration::from_secs(1),
        Duration::from_millis(10),
    )
    .await;
    assert_eq!(found.expect("match").0, "b.png");
}

#[tokio::test(start_paused = true)]
async fn waiter_times_out_within_bound() {
    let (_dir, matcher) = matcher_with(&[("a.png", 0)]);
    let device = FakeDevice::showing(blank_screen());

    let timeout = Duration::from_millis(100);
    let poll = Duration::from_millis(10);
    let start = Instant::now();
    let found = wait_for_any(&device, &matcher, &["a.png"], timeout, poll).await;
    let elapsed = start.elapsed();

    assert!(found.is_none());
    assert!(elapsed >= timeout);
    assert!(elapsed <= timeout + poll + Duration::from_millis(20));
}

#[tokio::test(start_paused = true)]
async fn waiter_skips_capture_failures() {
    let (_dir, matcher) = matcher_with(&[("a.png", 0)]);
    // Two failed captures, then a matching frame.
    let device = FakeDevice::new(vec![None, None, Some(screen_with(&[(0, 5, 5)]))]);

    let found = wait_for_any(
        &device,
        &matcher,
        &["a.png"],
        Duration::from_secs(1),
        Duration::from_millis(10),
    )
    .await;
    assert!(found.is_some());
}
