// 该文件是 Shanan （山南西风） 项目的一部分。
// src/surface/recording.rs - 记录绘制指令的表面
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

use crate::{
  geometry::RectF,
  surface::{DrawSurface, Paint, TextBounds, estimate_text_bounds},
};

/// 一条绘制指令
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
  Rect {
    rect: RectF,
    paint: Paint,
  },
  Text {
    text: String,
    x: f32,
    baseline: f32,
    paint: Paint,
  },
}

/// 不做光栅化，只按顺序记录绘制指令
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
  ops: Vec<DrawOp>,
}

impl RecordingSurface {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn ops(&self) -> &[DrawOp] {
    &self.ops
  }

  pub fn into_ops(self) -> Vec<DrawOp> {
    self.ops
  }

  pub fn is_empty(&self) -> bool {
    self.ops.is_empty()
  }

  pub fn rects(&self) -> impl Iterator<Item = (&RectF, &Paint)> {
    self.ops.iter().filter_map(|op| match op {
      DrawOp::Rect { rect, paint } => Some((rect, paint)),
      DrawOp::Text { .. } => None,
    })
  }

  pub fn texts(&self) -> impl Iterator<Item = &str> {
    self.ops.iter().filter_map(|op| match op {
      DrawOp::Text { text, .. } => Some(text.as_str()),
      DrawOp::Rect { .. } => None,
    })
  }
}

impl DrawSurface for RecordingSurface {
  fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
    self.ops.push(DrawOp::Rect {
      rect,
      paint: paint.clone(),
    });
  }

  fn draw_text(&mut self, text: &str, x: f32, baseline: f32, paint: &Paint) {
    self.ops.push(DrawOp::Text {
      text: text.to_string(),
      x,
      baseline,
      paint: paint.clone(),
    });
  }

  fn measure_text(&self, text: &str, paint: &Paint) -> TextBounds {
    estimate_text_bounds(text, paint)
  }
}
