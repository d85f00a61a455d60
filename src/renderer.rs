// 该文件是 Shanan （山南西风） 项目的一部分。
// src/renderer.rs - 检测结果叠加层渲染
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::{
  OverlayError,
  detection::{Detection, ResultBundle, Rotation},
  geometry::{DisplayMode, RectF, RunningMode, Transform},
  surface::{DrawSurface, Paint},
};

// 绘制样式常量
const BOX_STROKE_WIDTH: f32 = 8.0;
const LABEL_TEXT_SIZE: f32 = 50.0;
const BOUNDING_RECT_TEXT_PADDING: f32 = 8.0;
const BOX_COLOR: [u8; 4] = [0, 0, 0, 255];
const LABEL_BACKGROUND_COLOR: [u8; 4] = [0, 0, 0, 255];
const LABEL_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];

/// 叠加层绘制样式
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
  pub box_paint: Paint,
  pub label_background_paint: Paint,
  pub label_text_paint: Paint,
  pub label_padding: f32,
}

impl Default for OverlayStyle {
  fn default() -> Self {
    Self {
      box_paint: Paint::stroke(BOX_COLOR, BOX_STROKE_WIDTH),
      label_background_paint: Paint::fill(LABEL_BACKGROUND_COLOR).with_text_size(LABEL_TEXT_SIZE),
      label_text_paint: Paint::fill(LABEL_TEXT_COLOR).with_text_size(LABEL_TEXT_SIZE),
      label_padding: BOUNDING_RECT_TEXT_PADDING,
    }
  }
}

impl OverlayStyle {
  pub fn with_box_color(mut self, color: [u8; 4]) -> Self {
    self.box_paint.color = color;
    self
  }

  pub fn with_stroke_width(mut self, width: f32) -> Self {
    self.box_paint.stroke_width = width;
    self
  }

  pub fn with_text_size(mut self, size: f32) -> Self {
    self.label_background_paint.text_size = size;
    self.label_text_paint.text_size = size;
    self
  }

  pub fn with_label_colors(mut self, background: [u8; 4], text: [u8; 4]) -> Self {
    self.label_background_paint.color = background;
    self.label_text_paint.color = text;
    self
  }

  pub fn with_label_padding(mut self, padding: f32) -> Self {
    self.label_padding = padding;
    self
  }
}

/// 由当前检测结果与当前视图尺寸共同导出的渲染状态，创建后不可变
#[derive(Debug, Clone)]
pub struct RenderState {
  bundle: Arc<ResultBundle>,
  rotation: Rotation,
  display_mode: DisplayMode,
  view_width: u32,
  view_height: u32,
  rotated_width: u32,
  rotated_height: u32,
  scale_factor: f32,
  transform: Transform,
}

impl RenderState {
  /// 缩放 -> 居中平移 -> 绕视图中心旋转，顺序固定
  pub fn compute(
    bundle: Arc<ResultBundle>,
    view_width: u32,
    view_height: u32,
    display_mode: DisplayMode,
  ) -> Result<Self, OverlayError> {
    let rotation = Rotation::try_from(bundle.input_image_rotation())?;

    let (source_width, source_height) = (bundle.input_image_width(), bundle.input_image_height());
    if source_width == 0 || source_height == 0 {
      return Err(OverlayError::InvalidSourceSize {
        width: source_width,
        height: source_height,
      });
    }
    if view_width == 0 || view_height == 0 {
      return Err(OverlayError::InvalidViewSize {
        width: view_width,
        height: view_height,
      });
    }

    let (rotated_width, rotated_height) = rotation.rotated_dimensions(source_width, source_height);
    let (vw, vh) = (view_width as f32, view_height as f32);
    let (rw, rh) = (rotated_width as f32, rotated_height as f32);

    let scale_factor = display_mode
      .scale_factor(vw, vh, rw, rh)
      .ok_or(OverlayError::InvalidViewSize {
        width: view_width,
        height: view_height,
      })?;

    let transform = Transform::identity()
      .post_scale(scale_factor, scale_factor)
      .post_translate((vw - rw * scale_factor) / 2.0, (vh - rh * scale_factor) / 2.0)
      .post_rotate(rotation, vw / 2.0, vh / 2.0);

    Ok(Self {
      bundle,
      rotation,
      display_mode,
      view_width,
      view_height,
      rotated_width,
      rotated_height,
      scale_factor,
      transform,
    })
  }

  pub fn bundle(&self) -> &Arc<ResultBundle> {
    &self.bundle
  }

  pub fn rotation(&self) -> Rotation {
    self.rotation
  }

  pub fn display_mode(&self) -> DisplayMode {
    self.display_mode
  }

  pub fn view_size(&self) -> (u32, u32) {
    (self.view_width, self.view_height)
  }

  pub fn rotated_dimensions(&self) -> (u32, u32) {
    (self.rotated_width, self.rotated_height)
  }

  pub fn scale_factor(&self) -> f32 {
    self.scale_factor
  }

  /// 居中平移量
  pub fn offset(&self) -> (f32, f32) {
    (
      (self.view_width as f32 - self.rotated_width as f32 * self.scale_factor) / 2.0,
      (self.view_height as f32 - self.rotated_height as f32 * self.scale_factor) / 2.0,
    )
  }

  pub fn transform(&self) -> &Transform {
    &self.transform
  }

  /// 检测框在视图空间中的位置
  pub fn map_box(&self, detection: &Detection) -> RectF {
    self.transform.map_rect(detection.bounding_box())
  }
}

#[derive(Debug, Clone, Copy)]
struct ViewConfig {
  width: u32,
  height: u32,
  display_mode: DisplayMode,
}

struct Slot {
  state: Option<Arc<RenderState>>,
  view: ViewConfig,
  style: Arc<OverlayStyle>,
}

/// 检测结果叠加层渲染器。
///
/// `set_result` 可在推理工作线程调用，`draw` 在界面线程调用。
/// 状态以 `Arc<RenderState>` 整体替换，绘制时只读取一份快照。
pub struct OverlayRenderer {
  slot: Mutex<Slot>,
  base_style: OverlayStyle,
}

impl Default for OverlayRenderer {
  fn default() -> Self {
    Self::new(OverlayStyle::default())
  }
}

impl OverlayRenderer {
  pub fn new(style: OverlayStyle) -> Self {
    Self {
      slot: Mutex::new(Slot {
        state: None,
        view: ViewConfig {
          width: 0,
          height: 0,
          display_mode: DisplayMode::default(),
        },
        style: Arc::new(style.clone()),
      }),
      base_style: style,
    }
  }

  fn lock(&self) -> MutexGuard<'_, Slot> {
    self.slot.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// 替换渲染状态。旋转角度不受支持或尺寸无效时保持原状态并返回 `false`。
  pub fn set_result(
    &self,
    bundle: ResultBundle,
    view_width: u32,
    view_height: u32,
    display_mode: DisplayMode,
  ) -> bool {
    let view = ViewConfig {
      width: view_width,
      height: view_height,
      display_mode,
    };
    let mut slot = self.lock();
    Self::install(&mut slot, view, Arc::new(bundle))
  }

  /// 视图尺寸变化：用当前结果与新尺寸重新计算。
  /// 尚无结果时只记录尺寸，返回 `false`。
  pub fn set_view_size(&self, view_width: u32, view_height: u32) -> bool {
    let mut slot = self.lock();
    let view = ViewConfig {
      width: view_width,
      height: view_height,
      ..slot.view
    };
    Self::reconfigure(&mut slot, view)
  }

  pub fn set_display_mode(&self, display_mode: DisplayMode) -> bool {
    let mut slot = self.lock();
    let view = ViewConfig {
      display_mode,
      ..slot.view
    };
    Self::reconfigure(&mut slot, view)
  }

  pub fn set_running_mode(&self, running_mode: RunningMode) -> bool {
    self.set_display_mode(running_mode.display_mode())
  }

  pub fn set_style(&self, style: OverlayStyle) {
    self.lock().style = Arc::new(style);
  }

  /// 清空渲染状态，样式恢复为初始值
  pub fn clear(&self) {
    let mut slot = self.lock();
    slot.state = None;
    slot.style = Arc::new(self.base_style.clone());
    debug!("叠加层已清空");
  }

  pub fn state(&self) -> Option<Arc<RenderState>> {
    self.lock().state.clone()
  }

  pub fn style(&self) -> Arc<OverlayStyle> {
    self.lock().style.clone()
  }

  pub fn view_size(&self) -> (u32, u32) {
    let slot = self.lock();
    (slot.view.width, slot.view.height)
  }

  pub fn display_mode(&self) -> DisplayMode {
    self.lock().view.display_mode
  }

  /// 绘制当前状态；无状态时不绘制任何内容
  pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
    let (state, style) = {
      let slot = self.lock();
      (slot.state.clone(), slot.style.clone())
    };
    let Some(state) = state else {
      return;
    };

    for detection in state.bundle().detections() {
      let rect = state.map_box(detection);
      surface.draw_rect(rect, &style.box_paint);
      if let Some(category) = detection.top_category() {
        let text = label_text(category.label(), category.score());
        draw_label(surface, &style, &text, &rect);
      }
    }
  }

  /// 使用已记录的视图尺寸与显示模式安装结果
  pub(crate) fn on_bundle(&self, bundle: ResultBundle) -> bool {
    let mut slot = self.lock();
    let view = slot.view;
    Self::install(&mut slot, view, Arc::new(bundle))
  }

  fn reconfigure(slot: &mut Slot, view: ViewConfig) -> bool {
    match slot.state.as_ref().map(|state| state.bundle().clone()) {
      Some(bundle) => Self::install(slot, view, bundle),
      None => {
        slot.view = view;
        false
      }
    }
  }

  /// 状态与视图配置一起提交；计算失败时两者都保持不变
  fn install(slot: &mut Slot, view: ViewConfig, bundle: Arc<ResultBundle>) -> bool {
    match RenderState::compute(bundle, view.width, view.height, view.display_mode) {
      Ok(state) => {
        debug!(
          "更新叠加层: {} 个目标, 缩放 {:.3}, 视图 {}x{}",
          state.bundle().detections().len(),
          state.scale_factor(),
          view.width,
          view.height
        );
        slot.state = Some(Arc::new(state));
        slot.view = view;
        true
      }
      Err(err) => {
        warn!("忽略检测结果: {}", err);
        false
      }
    }
  }
}

/// 标签文本：名称 + 两位小数置信度
pub fn label_text(label: &str, score: f32) -> String {
  format!("{} {:.2}", label, score)
}

fn draw_label<S: DrawSurface + ?Sized>(
  surface: &mut S,
  style: &OverlayStyle,
  text: &str,
  anchor: &RectF,
) {
  let bounds = surface.measure_text(text, &style.label_background_paint);
  let background = RectF::new(
    anchor.left,
    anchor.top,
    anchor.left + bounds.width + style.label_padding,
    anchor.top + bounds.height + style.label_padding,
  );
  surface.draw_rect(background, &style.label_background_paint);
  surface.draw_text(
    text,
    anchor.left,
    anchor.top + bounds.height,
    &style.label_text_paint,
  );
}
