// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/overlay_render.rs - 将检测结果渲染为叠加层图像
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

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use url::Url;

use shanan_overlay::{
  DisplayMode, FromUrl, OverlayRenderer, OverlayStyle, ResultBundle,
  output::{OutputWrapper, Render},
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
  /// 完整放入视图（图像/视频）
  Contain,
  /// 铺满视图（实时预览）
  Cover,
}

impl From<Mode> for DisplayMode {
  fn from(mode: Mode) -> Self {
    match mode {
      Mode::Contain => DisplayMode::Contain,
      Mode::Cover => DisplayMode::Cover,
    }
  }
}

/// 叠加层渲染参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测结果 JSON 文件
  #[arg(long, value_name = "FILE")]
  result: PathBuf,
  /// 视图宽度
  #[arg(long, value_name = "PIXELS")]
  view_width: u32,
  /// 视图高度
  #[arg(long, value_name = "PIXELS")]
  view_height: u32,
  /// 缩放策略
  #[arg(long, value_enum, default_value_t = Mode::Cover)]
  mode: Mode,
  /// 输出路径，例如 image:///tmp/overlay.png?background=black&font=/path/font.ttf
  #[arg(long, value_name = "OUTPUT")]
  output: Url,
  /// 检测框线宽
  #[arg(long, default_value = "8")]
  stroke_width: f32,
  /// 标签字号
  #[arg(long, default_value = "50")]
  text_size: f32,
  /// 标签字体文件（TTF/OTF），缺省使用内置字体
  #[arg(long, value_name = "FILE")]
  font: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let mut args = Args::parse();
  if let Some(font) = args.font.as_ref() {
    args
      .output
      .query_pairs_mut()
      .append_pair("font", &font.to_string_lossy());
  }

  info!("检测结果: {}", args.result.display());
  info!("视图尺寸: {}x{}", args.view_width, args.view_height);
  info!("缩放策略: {:?}", args.mode);
  info!("输出路径: {}", args.output);

  let bundle = ResultBundle::from_json_file(&args.result)?;
  info!(
    "读取 {} 个目标, 源图像 {}x{}, 旋转 {}°, 推理耗时 {:.2?}",
    bundle.detections().len(),
    bundle.input_image_width(),
    bundle.input_image_height(),
    bundle.input_image_rotation(),
    bundle.inference_time()
  );

  let style = OverlayStyle::default()
    .with_stroke_width(args.stroke_width)
    .with_text_size(args.text_size);
  let renderer = OverlayRenderer::new(style);
  if !renderer.set_result(bundle, args.view_width, args.view_height, args.mode.into()) {
    anyhow::bail!("检测结果无法渲染，请检查旋转角度与尺寸");
  }

  let output = OutputWrapper::from_url(&args.output)?;
  output.render_result(&renderer)?;

  info!("渲染完成");
  Ok(())
}
