// 该文件是 Shanan （山南西风） 项目的一部分。
// src/detection.rs - 检测结果定义
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
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{OverlayError, geometry::RectF};

/// 标签候选
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  label: String,
  score: f32,
}

impl Category {
  pub fn new(label: impl Into<String>, score: f32) -> Self {
    Self {
      label: label.into(),
      score,
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn score(&self) -> f32 {
    self.score
  }
}

/// 单个检测目标，创建后不可变。候选标签按置信度降序排列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DetectionRecord")]
pub struct Detection {
  bounding_box: RectF,
  categories: Vec<Category>,
}

#[derive(Deserialize)]
struct DetectionRecord {
  bounding_box: RectF,
  #[serde(default)]
  categories: Vec<Category>,
}

impl From<DetectionRecord> for Detection {
  fn from(record: DetectionRecord) -> Self {
    Detection::new(record.bounding_box, record.categories)
  }
}

impl Detection {
  pub fn new(bounding_box: RectF, mut categories: Vec<Category>) -> Self {
    categories.sort_by(|a, b| b.score.total_cmp(&a.score));
    Self {
      bounding_box,
      categories,
    }
  }

  pub fn bounding_box(&self) -> &RectF {
    &self.bounding_box
  }

  pub fn categories(&self) -> &[Category] {
    &self.categories
  }

  /// 置信度最高的候选
  pub fn top_category(&self) -> Option<&Category> {
    self.categories.first()
  }
}

/// 旋转角度，仅支持直角
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
  #[default]
  Deg0,
  Deg90,
  Deg180,
  Deg270,
}

impl Rotation {
  pub fn degrees(self) -> i32 {
    match self {
      Rotation::Deg0 => 0,
      Rotation::Deg90 => 90,
      Rotation::Deg180 => 180,
      Rotation::Deg270 => 270,
    }
  }

  /// `(sin, cos)`，取精确值
  pub fn sin_cos(self) -> (f32, f32) {
    match self {
      Rotation::Deg0 => (0.0, 1.0),
      Rotation::Deg90 => (1.0, 0.0),
      Rotation::Deg180 => (0.0, -1.0),
      Rotation::Deg270 => (-1.0, 0.0),
    }
  }

  /// 90°/270° 时传感器宽高互换
  pub fn swaps_axes(self) -> bool {
    matches!(self, Rotation::Deg90 | Rotation::Deg270)
  }

  /// 旋转后的宽高
  pub fn rotated_dimensions(self, width: u32, height: u32) -> (u32, u32) {
    if self.swaps_axes() {
      (height, width)
    } else {
      (width, height)
    }
  }
}

impl TryFrom<i32> for Rotation {
  type Error = OverlayError;

  fn try_from(degrees: i32) -> Result<Self, Self::Error> {
    match degrees {
      0 => Ok(Rotation::Deg0),
      90 => Ok(Rotation::Deg90),
      180 => Ok(Rotation::Deg180),
      270 => Ok(Rotation::Deg270),
      other => Err(OverlayError::UnsupportedRotation(other)),
    }
  }
}

/// 一帧的完整检测输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
  #[serde(default)]
  detections: Vec<Detection>,
  #[serde(default)]
  inference_time_ms: u64,
  input_image_height: u32,
  input_image_width: u32,
  #[serde(default)]
  input_image_rotation: i32,
}

#[derive(Error, Debug)]
pub enum ResultFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

impl ResultBundle {
  /// `rotation` 保留相机给出的原始角度，校验在渲染端进行
  pub fn new(
    detections: Vec<Detection>,
    inference_time: Duration,
    input_image_height: u32,
    input_image_width: u32,
    input_image_rotation: i32,
  ) -> Self {
    Self {
      detections,
      inference_time_ms: inference_time.as_millis() as u64,
      input_image_height,
      input_image_width,
      input_image_rotation,
    }
  }

  pub fn from_json_str(json: &str) -> Result<Self, ResultFileError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ResultFileError> {
    let data = std::fs::read_to_string(path)?;
    Self::from_json_str(&data)
  }

  pub fn detections(&self) -> &[Detection] {
    &self.detections
  }

  pub fn inference_time(&self) -> Duration {
    Duration::from_millis(self.inference_time_ms)
  }

  pub fn input_image_height(&self) -> u32 {
    self.input_image_height
  }

  pub fn input_image_width(&self) -> u32 {
    self.input_image_width
  }

  pub fn input_image_rotation(&self) -> i32 {
    self.input_image_rotation
  }

  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }
}
