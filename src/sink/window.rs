/// macroquad 窗口输出
/// GPU texture upload + letterboxed draw; the caller presents with `next_frame().await`.
use std::time::Instant;

use macroquad::prelude::*;
use macroquad::window::Conf;

use super::DisplaySink;
use crate::frame::Frame;

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    pub fn conf(&self) -> Conf {
        Conf {
            window_title: self.title.clone(),
            window_width: self.width as i32,
            window_height: self.height as i32,
            window_resizable: true,
            ..Default::default()
        }
    }
}

pub struct WindowSink {
    texture: Option<Texture2D>,
    render_count: u64,
    render_last: Instant,
    render_fps: f64,
    torn_down: bool,
}

impl WindowSink {
    /// Must be created inside the macroquad event loop.
    pub fn new() -> Self {
        // 关闭窗口改为由 poll_cancel 上报, 保证资源按顺序释放
        prevent_quit();
        Self {
            texture: None,
            render_count: 0,
            render_last: Instant::now(),
            render_fps: 0.0,
            torn_down: false,
        }
    }

    /// 只在分辨率变化时重建纹理, 否则更新像素数据
    fn upload(&mut self, frame: Frame) {
        let needs_rebuild = match &self.texture {
            Some(tex) => tex.width() != frame.width as f32 || tex.height() != frame.height as f32,
            None => true,
        };

        if needs_rebuild {
            log::info!("stream resolution {}x{}", frame.width, frame.height);
            let texture =
                Texture2D::from_rgba8(frame.width as u16, frame.height as u16, &frame.rgba_data);
            texture.set_filter(FilterMode::Linear);
            self.texture = Some(texture);
        } else if let Some(tex) = &self.texture {
            let img = Image {
                bytes: frame.rgba_data,
                width: frame.width as u16,
                height: frame.height as u16,
            };
            tex.update(&img);
        }
    }

    fn draw(&mut self) {
        clear_background(BLACK);

        if let Some(texture) = &self.texture {
            // 等比缩放居中
            let scale = (screen_width() / texture.width()).min(screen_height() / texture.height());
            let w = texture.width() * scale;
            let h = texture.height() * scale;
            draw_texture_ex(
                texture,
                (screen_width() - w) / 2.0,
                (screen_height() - h) / 2.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(w, h)),
                    ..Default::default()
                },
            );
        }

        // FPS统计
        self.render_count += 1;
        let elapsed = self.render_last.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            self.render_fps = self.render_count as f64 / elapsed;
            self.render_count = 0;
            self.render_last = Instant::now();
        }

        draw_text(
            &format!("{:.1} fps  [Q / Esc quit]", self.render_fps),
            10.0,
            24.0,
            22.0,
            GREEN,
        );
    }
}

impl Default for WindowSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for WindowSink {
    fn render(&mut self, frame: Frame) {
        if self.torn_down {
            return;
        }
        self.upload(frame);
        self.draw();
    }

    fn poll_cancel(&mut self) -> bool {
        is_key_pressed(KeyCode::Q) || is_key_pressed(KeyCode::Escape) || is_quit_requested()
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        // 纹理随 drop 释放 GPU 内存
        self.texture = None;
        log::debug!("window sink released");
    }
}
