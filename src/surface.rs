// 该文件是 Shanan （山南西风） 项目的一部分。
// src/surface.rs - 二维绘制表面
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

use crate::geometry::RectF;

// 无字体时的文本度量估计（相对字号）
const ESTIMATED_CHAR_WIDTH: f32 = 0.5;
const ESTIMATED_TEXT_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
  Fill,
  Stroke,
}

/// 画笔：颜色为 RGBA
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
  pub color: [u8; 4],
  pub style: PaintStyle,
  pub stroke_width: f32,
  pub text_size: f32,
}

impl Paint {
  pub fn fill(color: [u8; 4]) -> Self {
    Self {
      color,
      style: PaintStyle::Fill,
      stroke_width: 0.0,
      text_size: 0.0,
    }
  }

  pub fn stroke(color: [u8; 4], stroke_width: f32) -> Self {
    Self {
      color,
      style: PaintStyle::Stroke,
      stroke_width,
      text_size: 0.0,
    }
  }

  pub fn with_text_size(mut self, text_size: f32) -> Self {
    self.text_size = text_size;
    self
  }
}

/// 文本度量结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextBounds {
  pub width: f32,
  pub height: f32,
}

/// 即时模式绘制能力集
pub trait DrawSurface {
  /// 按 `paint.style` 描边或填充矩形
  fn draw_rect(&mut self, rect: RectF, paint: &Paint);

  /// `(x, baseline)` 为文本基线起点
  fn draw_text(&mut self, text: &str, x: f32, baseline: f32, paint: &Paint);

  fn measure_text(&self, text: &str, paint: &Paint) -> TextBounds;
}

impl<S: DrawSurface + ?Sized> DrawSurface for &mut S {
  fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
    (**self).draw_rect(rect, paint)
  }

  fn draw_text(&mut self, text: &str, x: f32, baseline: f32, paint: &Paint) {
    (**self).draw_text(text, x, baseline, paint)
  }

  fn measure_text(&self, text: &str, paint: &Paint) -> TextBounds {
    (**self).measure_text(text, paint)
  }
}

pub(crate) fn estimate_text_bounds(text: &str, paint: &Paint) -> TextBounds {
  TextBounds {
    width: (text.chars().count() as f32 * paint.text_size * ESTIMATED_CHAR_WIDTH).ceil(),
    height: (paint.text_size * ESTIMATED_TEXT_HEIGHT).ceil(),
  }
}

mod recording;
pub use self::recording::{DrawOp, RecordingSurface};

#[cfg(feature = "image_surface")]
mod image_surface;
#[cfg(feature = "image_surface")]
pub use self::image_surface::{ImageSurface, SurfaceError};
