use std::sync::Arc;
use std::thread;
use std::time::Duration;

use shanan_overlay::{
  Category, Detection, DisplayMode, OverlayRenderer, RecordingSurface, RectF, RenderState,
  ResultBundle,
};

const EPS: f32 = 1e-3;

fn bundle(width: u32, height: u32, rotation: i32) -> ResultBundle {
  ResultBundle::new(
    vec![
      Detection::new(
        RectF::new(40.0, 30.0, 120.0, 150.0),
        vec![Category::new("person", 0.93), Category::new("chair", 0.12)],
      ),
      Detection::new(
        RectF::new(200.0, 100.0, 260.0, 180.0),
        vec![Category::new("bottle", 0.55)],
      ),
    ],
    Duration::from_millis(20),
    height,
    width,
    rotation,
  )
}

fn state(
  width: u32,
  height: u32,
  rotation: i32,
  view: (u32, u32),
  mode: DisplayMode,
) -> Arc<RenderState> {
  let renderer = OverlayRenderer::default();
  assert!(renderer.set_result(bundle(width, height, rotation), view.0, view.1, mode));
  renderer.state().unwrap()
}

#[test]
fn test_rotated_dimensions_follow_rotation() {
  for rotation in [0, 180] {
    let s = state(640, 480, rotation, (800, 600), DisplayMode::Contain);
    assert_eq!(s.rotated_dimensions(), (640, 480));
  }
  for rotation in [90, 270] {
    let s = state(640, 480, rotation, (800, 600), DisplayMode::Contain);
    assert_eq!(s.rotated_dimensions(), (480, 640));
  }
}

#[test]
fn test_contain_fits_inside_view() {
  let cases = [
    (640, 480, 0, (1080, 1920)),
    (640, 480, 90, (1080, 1920)),
    (1920, 1080, 270, (800, 600)),
    (300, 300, 180, (1000, 400)),
  ];
  for (w, h, rot, view) in cases {
    let s = state(w, h, rot, view, DisplayMode::Contain);
    let (rw, rh) = s.rotated_dimensions();
    let sw = rw as f32 * s.scale_factor();
    let sh = rh as f32 * s.scale_factor();
    assert!(sw <= view.0 as f32 + EPS && sh <= view.1 as f32 + EPS);
    assert!((sw - view.0 as f32).abs() < EPS || (sh - view.1 as f32).abs() < EPS);
  }
}

#[test]
fn test_cover_fills_view() {
  let cases = [
    (640, 480, 0, (1080, 1920)),
    (640, 480, 90, (1080, 1920)),
    (1920, 1080, 270, (800, 600)),
    (300, 300, 180, (1000, 400)),
  ];
  for (w, h, rot, view) in cases {
    let s = state(w, h, rot, view, DisplayMode::Cover);
    let (rw, rh) = s.rotated_dimensions();
    let sw = rw as f32 * s.scale_factor();
    let sh = rh as f32 * s.scale_factor();
    assert!(sw >= view.0 as f32 - EPS && sh >= view.1 as f32 - EPS);
    assert!((sw - view.0 as f32).abs() < EPS || (sh - view.1 as f32).abs() < EPS);
  }
}

#[test]
fn test_square_contain_centers_without_offset() {
  let s = state(500, 500, 0, (1000, 1000), DisplayMode::Contain);
  assert!((s.scale_factor() - 2.0).abs() < EPS);
  assert_eq!(s.offset(), (0.0, 0.0));

  let s = state(500, 500, 0, (500, 500), DisplayMode::Contain);
  assert_eq!(s.scale_factor(), 1.0);
  assert_eq!(s.offset(), (0.0, 0.0));
}

#[test]
fn test_rotated_cover_scale() {
  let s = state(400, 300, 90, (800, 600), DisplayMode::Cover);
  assert_eq!(s.rotated_dimensions(), (300, 400));
  assert!((s.scale_factor() - 2.667).abs() < EPS);
}

#[test]
fn test_unsupported_rotation_keeps_state() {
  let renderer = OverlayRenderer::default();
  assert!(renderer.set_result(bundle(400, 300, 0), 800, 600, DisplayMode::Contain));
  let before = renderer.state().unwrap();

  assert!(!renderer.set_result(bundle(400, 300, 45), 1000, 1000, DisplayMode::Cover));
  let after = renderer.state().unwrap();
  assert!(Arc::ptr_eq(&before, &after));
  assert_eq!(after.scale_factor(), before.scale_factor());
  assert_eq!(renderer.view_size(), (800, 600));
  assert_eq!(renderer.display_mode(), DisplayMode::Contain);
}

#[test]
fn test_unsupported_rotation_on_empty_renderer() {
  let renderer = OverlayRenderer::default();
  assert!(!renderer.set_result(bundle(400, 300, 45), 800, 600, DisplayMode::Cover));
  assert!(renderer.state().is_none());
}

#[test]
fn test_clear_then_draw_is_empty() {
  let renderer = OverlayRenderer::default();
  assert!(renderer.set_result(bundle(400, 300, 0), 800, 600, DisplayMode::Cover));
  renderer.clear();

  let mut surface = RecordingSurface::new();
  renderer.draw(&mut surface);
  assert!(surface.is_empty());
}

#[test]
fn test_draw_without_result_is_empty() {
  let renderer = OverlayRenderer::default();
  let mut surface = RecordingSurface::new();
  renderer.draw(&mut surface);
  assert!(surface.is_empty());
}

#[test]
fn test_draw_is_idempotent() {
  let renderer = OverlayRenderer::default();
  assert!(renderer.set_result(bundle(640, 480, 90), 1080, 1920, DisplayMode::Cover));

  let mut first = RecordingSurface::new();
  let mut second = RecordingSurface::new();
  renderer.draw(&mut first);
  renderer.draw(&mut second);
  assert!(!first.is_empty());
  assert_eq!(first.into_ops(), second.into_ops());
}

#[test]
fn test_only_top_label_is_drawn() {
  let renderer = OverlayRenderer::default();
  assert!(renderer.set_result(bundle(400, 300, 0), 400, 300, DisplayMode::Contain));

  let mut surface = RecordingSurface::new();
  renderer.draw(&mut surface);
  let texts: Vec<_> = surface.texts().collect();
  assert_eq!(texts, vec!["person 0.93", "bottle 0.55"]);
  // 每个目标：检测框 + 标签背景
  assert_eq!(surface.rects().count(), 4);
}

#[test]
fn test_rotation_180_mirrors_about_view_center() {
  let s = state(400, 300, 180, (400, 300), DisplayMode::Contain);
  let rect = s.map_box(&s.bundle().detections()[0]);
  assert!((rect.left - 280.0).abs() < EPS);
  assert!((rect.top - 150.0).abs() < EPS);
  assert!((rect.right - 360.0).abs() < EPS);
  assert!((rect.bottom - 270.0).abs() < EPS);
}

fn assert_rect(actual: RectF, expected: RectF) {
  assert!(
    (actual.left - expected.left).abs() < EPS
      && (actual.top - expected.top).abs() < EPS
      && (actual.right - expected.right).abs() < EPS
      && (actual.bottom - expected.bottom).abs() < EPS,
    "{:?} != {:?}",
    actual,
    expected
  );
}

/// 源图像 400x300，视图 800x800，contain；第一个目标 (40, 30, 120, 150)
fn first_box_in_square_view(rotation: i32) -> (Arc<RenderState>, RectF) {
  let s = state(400, 300, rotation, (800, 800), DisplayMode::Contain);
  assert_eq!(s.rotation().degrees(), rotation);
  let detection = &s.bundle().detections()[0];
  let rect = s.map_box(detection);
  assert_eq!(s.transform().map_rect(detection.bounding_box()), rect);
  (s, rect)
}

#[test]
fn test_rotation_90_centers_before_rotating() {
  let (s, rect) = first_box_in_square_view(90);
  assert_eq!(s.scale_factor(), 2.0);
  assert_eq!(s.offset(), (100.0, 0.0));
  // 缩放 (80, 60, 240, 300)，平移 (180, 60, 340, 300)，绕 (400, 400) 旋转 90°
  assert_rect(rect, RectF::new(500.0, 180.0, 740.0, 340.0));
}

#[test]
fn test_rotation_180_centers_before_rotating() {
  let (s, rect) = first_box_in_square_view(180);
  assert_eq!(s.scale_factor(), 2.0);
  assert_eq!(s.offset(), (0.0, 100.0));
  // 缩放 (80, 60, 240, 300)，平移 (80, 160, 240, 400)，绕 (400, 400) 旋转 180°
  assert_rect(rect, RectF::new(560.0, 400.0, 720.0, 640.0));
}

#[test]
fn test_rotation_270_centers_before_rotating() {
  let (s, rect) = first_box_in_square_view(270);
  assert_eq!(s.offset(), (100.0, 0.0));
  // 平移后 (180, 60, 340, 300)，旋转 270°：(x, y) -> (y, 800 - x)
  assert_rect(rect, RectF::new(60.0, 460.0, 300.0, 620.0));
}

#[test]
fn test_resize_recomputes_scale() {
  let renderer = OverlayRenderer::default();
  assert!(renderer.set_result(bundle(400, 300, 0), 400, 300, DisplayMode::Contain));
  let before = renderer.state().unwrap();
  assert_eq!(before.scale_factor(), 1.0);

  assert!(renderer.set_view_size(800, 600));
  let after = renderer.state().unwrap();
  assert_eq!(after.scale_factor(), 2.0);
  assert_eq!(after.view_size(), (800, 600));
  assert!(Arc::ptr_eq(before.bundle(), after.bundle()));

  let mut surface = RecordingSurface::new();
  renderer.draw(&mut surface);
  let (first_box, _) = surface.rects().next().unwrap();
  assert_eq!(*first_box, RectF::new(80.0, 60.0, 240.0, 300.0));
}

#[test]
fn test_resize_without_result_only_records_size() {
  let renderer = OverlayRenderer::default();
  assert!(!renderer.set_view_size(1280, 720));
  assert!(renderer.state().is_none());
  assert_eq!(renderer.view_size(), (1280, 720));
}

#[test]
fn test_concurrent_updates_never_tear() {
  let renderer = Arc::new(OverlayRenderer::default());
  let writers: Vec<_> = (0..4)
    .map(|i| {
      let renderer = renderer.clone();
      thread::spawn(move || {
        for n in 0..200u32 {
          let view = 400 + (i * 200 + n) % 400;
          renderer.set_result(bundle(400, 300, 90 * (n as i32 % 4)), view, view, DisplayMode::Cover);
        }
      })
    })
    .collect();

  for _ in 0..200 {
    if let Some(s) = renderer.state() {
      // 缩放系数必须与快照自身的视图尺寸和源尺寸一致
      let (vw, vh) = s.view_size();
      let (rw, rh) = s.rotated_dimensions();
      let expected = (vw as f32 / rw as f32).max(vh as f32 / rh as f32);
      assert!((s.scale_factor() - expected).abs() < 1e-5);
    }
    let mut surface = RecordingSurface::new();
    renderer.draw(&mut surface);
  }

  for writer in writers {
    writer.join().unwrap();
  }
  assert!(renderer.state().is_some());
}
