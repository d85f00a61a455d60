// 该文件是 Shanan （山南西风） 项目的一部分。
// src/surface/image_surface.rs - 基于 RgbaImage 的光栅化表面
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::debug;

use crate::{
  geometry::RectF,
  surface::{DrawSurface, Paint, PaintStyle, TextBounds, estimate_text_bounds},
};

#[derive(Error, Debug)]
pub enum SurfaceError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体加载错误: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
}

// 内置默认字体
const DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// 在图像上光栅化绘制指令。未加载字体时仅绘制矩形，文本度量退化为估计值。
pub struct ImageSurface {
  image: RgbaImage,
  font: Option<FontArc>,
}

impl ImageSurface {
  pub fn new(width: u32, height: u32, background: [u8; 4]) -> Self {
    Self::from_image(RgbaImage::from_pixel(width, height, Rgba(background)))
  }

  pub fn from_image(image: RgbaImage) -> Self {
    Self { image, font: None }
  }

  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = Some(font);
    self
  }

  pub fn default_font() -> Result<FontArc, SurfaceError> {
    Ok(FontArc::try_from_slice(DEFAULT_FONT)?)
  }

  pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, SurfaceError> {
    let data = std::fs::read(path.as_ref())?;
    let font = FontArc::try_from_vec(data)?;
    debug!("字体加载成功: {}", path.as_ref().display());
    Ok(font)
  }

  pub fn image(&self) -> &RgbaImage {
    &self.image
  }

  pub fn into_image(self) -> RgbaImage {
    self.image
  }

  /// 四舍五入到像素网格；含非有限值时返回 `None`
  fn pixel_rect(rect: &RectF) -> Option<[f64; 4]> {
    let coords = [rect.left, rect.top, rect.right, rect.bottom];
    if coords.iter().any(|v| !v.is_finite()) {
      return None;
    }
    Some(coords.map(|v| (v as f64).round()))
  }

  /// 将 `[left, right) x [top, bottom)` 裁剪到画布内，裁剪后为空时返回 `None`
  fn clamp_to_canvas(&self, left: f64, top: f64, right: f64, bottom: f64) -> Option<Rect> {
    let (w, h) = (self.image.width() as f64, self.image.height() as f64);
    let x_min = left.clamp(0.0, w);
    let y_min = top.clamp(0.0, h);
    let x_max = right.clamp(0.0, w);
    let y_max = bottom.clamp(0.0, h);
    if !(x_max > x_min && y_max > y_min) {
      return None;
    }
    Some(
      Rect::at(x_min as i32, y_min as i32).of_size((x_max - x_min) as u32, (y_max - y_min) as u32),
    )
  }

  fn fill_region(&mut self, left: f64, top: f64, right: f64, bottom: f64, color: Rgba<u8>) {
    if let Some(r) = self.clamp_to_canvas(left, top, right, bottom) {
      draw_filled_rect_mut(&mut self.image, r, color);
    }
  }

  fn stroke_rect(&mut self, rect: &RectF, paint: &Paint) {
    let Some([x_min, y_min, x_max, y_max]) = Self::pixel_rect(rect) else {
      return;
    };
    let color = Rgba(paint.color);

    // 线宽以边为中心向内外扩展；四条边各自作为填充带裁剪绘制，画布外的边不落笔
    let thickness = paint.stroke_width.round().max(1.0) as f64;
    let outer = (thickness / 2.0).floor();
    let inner = thickness - outer;
    let (ol, ot, or, ob) = (x_min - outer, y_min - outer, x_max + outer, y_max + outer);
    let (il, it, ir, ib) = (x_min + inner, y_min + inner, x_max - inner, y_max - inner);

    if ir <= il || ib <= it {
      self.fill_region(ol, ot, or, ob, color);
      return;
    }
    self.fill_region(ol, ot, or, it, color);
    self.fill_region(ol, ib, or, ob, color);
    self.fill_region(ol, it, il, ib, color);
    self.fill_region(ir, it, or, ib, color);
  }

  fn fill_rect(&mut self, rect: &RectF, paint: &Paint) {
    let Some([x_min, y_min, x_max, y_max]) = Self::pixel_rect(rect) else {
      return;
    };
    self.fill_region(x_min, y_min, x_max, y_max, Rgba(paint.color));
  }
}

impl DrawSurface for ImageSurface {
  fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
    match paint.style {
      PaintStyle::Stroke => self.stroke_rect(&rect, paint),
      PaintStyle::Fill => self.fill_rect(&rect, paint),
    }
  }

  fn draw_text(&mut self, text: &str, x: f32, baseline: f32, paint: &Paint) {
    let Some(font) = self.font.as_ref() else {
      return;
    };
    if !x.is_finite() || !baseline.is_finite() || paint.text_size <= 0.0 {
      return;
    }
    let scale = PxScale::from(paint.text_size);
    let (_, height) = text_size(scale, font, text);
    // imageproc 以左上角定位文本
    let left = x.round() as i32;
    let top = (baseline.round() as i32).saturating_sub(height as i32);
    if left >= self.image.width() as i32 || top >= self.image.height() as i32 {
      return;
    }
    draw_text_mut(
      &mut self.image,
      Rgba(paint.color),
      left,
      top,
      scale,
      font,
      text,
    );
  }

  fn measure_text(&self, text: &str, paint: &Paint) -> TextBounds {
    match self.font.as_ref() {
      Some(font) if paint.text_size > 0.0 => {
        let (width, height) = text_size(PxScale::from(paint.text_size), font, text);
        TextBounds {
          width: width as f32,
          height: height as f32,
        }
      }
      _ => estimate_text_bounds(text, paint),
    }
  }
}
