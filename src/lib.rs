// 该文件是 Shanan （山南西风） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod detection;
pub mod geometry;
pub mod listener;
pub mod output;
pub mod renderer;
pub mod surface;

pub use detection::{Category, Detection, ResultBundle, Rotation};
pub use geometry::{DisplayMode, RectF, RunningMode, Transform};
pub use listener::{DetectorListener, ErrorCode};
pub use renderer::{OverlayRenderer, OverlayStyle, RenderState};
pub use surface::{DrawOp, DrawSurface, Paint, PaintStyle, RecordingSurface, TextBounds};

use thiserror::Error;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 叠加层几何计算错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
  #[error("不支持的旋转角度: {0}")]
  UnsupportedRotation(i32),
  #[error("源图像尺寸无效: {width}x{height}")]
  InvalidSourceSize { width: u32, height: u32 },
  #[error("视图尺寸无效: {width}x{height}")]
  InvalidViewSize { width: u32, height: u32 },
}
