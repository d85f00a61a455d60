// 该文件是 Shanan （山南西风） 项目的一部分。
// src/listener.rs - 检测结果回调
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

use std::sync::Arc;

use tracing::error;

use crate::{detection::ResultBundle, renderer::OverlayRenderer};

/// 检测器上报的错误码，渲染端不做解释
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
  #[default]
  Other = 0,
  Gpu = 1,
}

impl ErrorCode {
  pub fn code(self) -> i32 {
    self as i32
  }
}

impl From<i32> for ErrorCode {
  fn from(code: i32) -> Self {
    match code {
      1 => ErrorCode::Gpu,
      _ => ErrorCode::Other,
    }
  }
}

/// 每完成一次检测调用一次
pub trait DetectorListener {
  fn on_error(&self, error: &str, code: ErrorCode);
  fn on_results(&self, bundle: ResultBundle);
}

impl<L: DetectorListener + ?Sized> DetectorListener for Arc<L> {
  fn on_error(&self, error: &str, code: ErrorCode) {
    (**self).on_error(error, code)
  }

  fn on_results(&self, bundle: ResultBundle) {
    (**self).on_results(bundle)
  }
}

/// 结果使用渲染器已记录的视图尺寸与显示模式；新结果直接覆盖旧结果
impl DetectorListener for OverlayRenderer {
  fn on_error(&self, error: &str, code: ErrorCode) {
    error!("检测器错误({}): {}", code.code(), error);
  }

  fn on_results(&self, bundle: ResultBundle) {
    self.on_bundle(bundle);
  }
}
