// 该文件是 Shanan （山南西风） 项目的一部分。
// src/geometry.rs - 源图像空间到视图空间的几何变换
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

use nalgebra::{Matrix3, Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::detection::Rotation;

/// 轴对齐矩形，左上角为原点，y 轴向下
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RectF {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl RectF {
  #[inline]
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
    }
  }

  #[inline]
  pub fn width(&self) -> f32 {
    self.right - self.left
  }

  #[inline]
  pub fn height(&self) -> f32 {
    self.bottom - self.top
  }

  /// 四个角点，顺时针：左上、右上、右下、左下
  pub fn corners(&self) -> [(f32, f32); 4] {
    [
      (self.left, self.top),
      (self.right, self.top),
      (self.right, self.bottom),
      (self.left, self.bottom),
    ]
  }
}

/// 缩放策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
  /// 完整放入视图，不裁剪（静态图像/视频回放）
  #[default]
  Contain,
  /// 铺满视图，裁剪多余部分（实时预览）
  Cover,
}

impl DisplayMode {
  /// 按策略计算缩放系数。任一尺寸非正或非有限值时返回 `None`。
  pub fn scale_factor(
    self,
    view_width: f32,
    view_height: f32,
    rotated_width: f32,
    rotated_height: f32,
  ) -> Option<f32> {
    let dims = [view_width, view_height, rotated_width, rotated_height];
    if dims.iter().any(|v| !v.is_finite() || *v <= 0.0) {
      return None;
    }

    let sx = view_width / rotated_width;
    let sy = view_height / rotated_height;
    Some(match self {
      DisplayMode::Contain => sx.min(sy),
      DisplayMode::Cover => sx.max(sy),
    })
  }
}

/// 检测器运行模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunningMode {
  #[default]
  Image,
  Video,
  LiveStream,
}

impl RunningMode {
  pub fn display_mode(self) -> DisplayMode {
    match self {
      RunningMode::Image | RunningMode::Video => DisplayMode::Contain,
      RunningMode::LiveStream => DisplayMode::Cover,
    }
  }
}

impl From<RunningMode> for DisplayMode {
  fn from(mode: RunningMode) -> Self {
    mode.display_mode()
  }
}

/// 二维仿射变换（齐次 3x3 矩阵）。
///
/// `post_*` 系列方法把新的变换追加在已有变换之后，
/// 即先应用已有变换，再应用新变换。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
  matrix: Matrix3<f32>,
}

impl Default for Transform {
  fn default() -> Self {
    Self::identity()
  }
}

impl Transform {
  pub fn identity() -> Self {
    Self {
      matrix: Matrix3::identity(),
    }
  }

  pub fn matrix(&self) -> &Matrix3<f32> {
    &self.matrix
  }

  pub fn post_scale(self, sx: f32, sy: f32) -> Self {
    Self {
      matrix: Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy)) * self.matrix,
    }
  }

  pub fn post_translate(self, dx: f32, dy: f32) -> Self {
    Self {
      matrix: Matrix3::new_translation(&Vector2::new(dx, dy)) * self.matrix,
    }
  }

  /// 绕 `(px, py)` 旋转。直角的正余弦取精确值，避免 90° 时残留 1e-8 量级误差。
  pub fn post_rotate(self, rotation: Rotation, px: f32, py: f32) -> Self {
    let (sin, cos) = rotation.sin_cos();
    #[rustfmt::skip]
    let rotate = Matrix3::new(
      cos, -sin, px - cos * px + sin * py,
      sin,  cos, py - sin * px - cos * py,
      0.0,  0.0, 1.0,
    );
    Self {
      matrix: rotate * self.matrix,
    }
  }

  pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
    let p = self.matrix.transform_point(&Point2::new(x, y));
    (p.x, p.y)
  }

  /// 映射四个角点，返回其轴对齐包围盒
  pub fn map_rect(&self, rect: &RectF) -> RectF {
    let mut out = RectF::new(f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for (x, y) in rect.corners() {
      let (mx, my) = self.map_point(x, y);
      out.left = out.left.min(mx);
      out.top = out.top.min(my);
      out.right = out.right.max(mx);
      out.bottom = out.bottom.max(my);
    }
    out
  }
}
