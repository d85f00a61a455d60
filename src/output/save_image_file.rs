// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/save_image_file.rs - 保存叠加层图像文件
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

use ab_glyph::FontArc;
use image::RgbaImage;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::Render,
  renderer::OverlayRenderer,
  surface::{ImageSurface, SurfaceError},
};

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

/// 将叠加层绘制到视图大小的画布上并保存。未指定字体时使用内置字体。
///
/// URL 形如 `image:///tmp/overlay.png?background=black&font=/usr/share/fonts/DejaVuSans.ttf`，
/// `background` 可取 `transparent`（默认）、`black`、`white`。
pub struct SaveImageFileOutput {
  path: String,
  background: [u8; 4],
  font: FontArc,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("绘制表面错误: {0}")]
  SurfaceError(#[from] SurfaceError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("未知的背景: {0}")]
  UnknownBackground(String),
  #[error("视图尺寸无效: {0}x{1}")]
  InvalidViewSize(u32, u32),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut background = TRANSPARENT;
    let mut font = None;
    for (k, v) in uri.query_pairs() {
      match &*k {
        "background" => {
          background = match &*v {
            "transparent" => TRANSPARENT,
            "black" => BLACK,
            "white" => WHITE,
            other => return Err(SaveImageFileError::UnknownBackground(other.to_string())),
          }
        }
        "font" => font = Some(ImageSurface::load_font(&*v)?),
        other => warn!("忽略未知参数: {}", other),
      }
    }

    let font = match font {
      Some(font) => font,
      None => ImageSurface::default_font()?,
    };

    Ok(SaveImageFileOutput {
      path: uri.path().to_string(),
      background,
      font,
    })
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<String>) -> Result<Self, SaveImageFileError> {
    Ok(Self {
      path: path.into(),
      background: TRANSPARENT,
      font: ImageSurface::default_font()?,
    })
  }

  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = font;
    self
  }

  pub fn with_background(mut self, background: [u8; 4]) -> Self {
    self.background = background;
    self
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  /// 绘制但不保存
  pub fn render_image(&self, renderer: &OverlayRenderer) -> Result<RgbaImage, SaveImageFileError> {
    let (width, height) = renderer.view_size();
    if width == 0 || height == 0 {
      return Err(SaveImageFileError::InvalidViewSize(width, height));
    }

    let mut surface =
      ImageSurface::new(width, height, self.background).with_font(self.font.clone());
    renderer.draw(&mut surface);
    Ok(surface.into_image())
  }

  fn save_image(&self, image: RgbaImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;

    info!("保存叠加层图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<OverlayRenderer> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, renderer: &OverlayRenderer) -> Result<(), Self::Error> {
    let image = self.render_image(renderer)?;
    self.save_image(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    detection::{Category, Detection, ResultBundle},
    geometry::{DisplayMode, RectF},
  };
  use image::Rgba;
  use std::time::Duration;

  #[test]
  fn test_from_url_parses_background() {
    let url = Url::parse("image:///tmp/overlay.png?background=black").unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), "/tmp/overlay.png");
    assert_eq!(output.background, BLACK);
  }

  #[test]
  fn test_from_url_rejects_bad_input() {
    let url = Url::parse("folder:///tmp/out").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));

    let url = Url::parse("image:///tmp/out.png?background=purple").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::UnknownBackground(_))
    ));
  }

  #[test]
  fn test_render_image_draws_box() {
    let renderer = OverlayRenderer::default();
    let bundle = ResultBundle::new(
      vec![Detection::new(
        RectF::new(10.0, 10.0, 90.0, 90.0),
        vec![Category::new("ball", 0.6)],
      )],
      Duration::from_millis(3),
      100,
      100,
      0,
    );
    assert!(renderer.set_result(bundle, 200, 100, DisplayMode::Contain));

    let output = SaveImageFileOutput::new("/tmp/unused.png")
      .unwrap()
      .with_background(WHITE);
    let image = output.render_image(&renderer).unwrap();
    assert_eq!(image.dimensions(), (200, 100));
    // 缩放 1.0，水平居中偏移 50：右边框位于 x = 140
    assert_eq!(image.get_pixel(140, 50), &Rgba(BLACK));
    assert_eq!(image.get_pixel(5, 50), &Rgba(WHITE));
  }

  #[test]
  fn test_render_image_draws_label_text() {
    let renderer = OverlayRenderer::default();
    let bundle = ResultBundle::new(
      vec![Detection::new(
        RectF::new(10.0, 10.0, 90.0, 90.0),
        vec![Category::new("ball", 0.6)],
      )],
      Duration::from_millis(3),
      100,
      100,
      0,
    );
    assert!(renderer.set_result(bundle, 400, 200, DisplayMode::Contain));

    let url = Url::parse("image:///tmp/unused.png").unwrap();
    let image = SaveImageFileOutput::from_url(&url)
      .unwrap()
      .render_image(&renderer)
      .unwrap();
    // 透明背景、黑色边框与标签底色之上，只有白色文本会出现亮像素
    assert!(image.pixels().any(|p| p[0] > 200 && p[3] == 255));
  }

  #[test]
  fn test_render_image_without_view_size() {
    let renderer = OverlayRenderer::default();
    let output = SaveImageFileOutput::new("/tmp/unused.png").unwrap();
    assert!(matches!(
      output.render_image(&renderer),
      Err(SaveImageFileError::InvalidViewSize(0, 0))
    ));
  }
}
