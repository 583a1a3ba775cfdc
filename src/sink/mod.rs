/// 显示输出 (Display Sink)
/// - `WindowSink`: macroquad 窗口 (feature `display`)
/// - `HeadlessSink`: 不显示, 只计数
#[cfg(feature = "display")]
pub mod window;

#[cfg(feature = "display")]
pub use window::{WindowConfig, WindowSink};

use crate::frame::Frame;

/// 帧的最终去处
pub trait DisplaySink {
    /// Displays one frame. Takes ownership; the loop keeps nothing after handoff.
    fn render(&mut self, frame: Frame);

    /// 操作者是否要求退出
    fn poll_cancel(&mut self) -> bool;

    /// 释放显示资源, 可重复调用
    fn teardown(&mut self);
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn render(&mut self, frame: Frame) {
        (**self).render(frame)
    }

    fn poll_cancel(&mut self) -> bool {
        (**self).poll_cancel()
    }

    fn teardown(&mut self) {
        (**self).teardown()
    }
}

/// 无窗口输出: 丢弃帧, 可在收到 N 帧后请求退出
#[derive(Debug, Default)]
pub struct HeadlessSink {
    max_frames: Option<u64>,
    rendered: u64,
    last_size: Option<(u32, u32)>,
    torn_down: bool,
}

impl HeadlessSink {
    pub fn new(max_frames: Option<u64>) -> Self {
        Self {
            max_frames,
            ..Default::default()
        }
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }
}

impl DisplaySink for HeadlessSink {
    fn render(&mut self, frame: Frame) {
        let size = (frame.width, frame.height);
        if self.last_size != Some(size) {
            log::info!("stream resolution {}x{}", size.0, size.1);
            self.last_size = Some(size);
        }
        self.rendered += 1;
    }

    fn poll_cancel(&mut self) -> bool {
        self.max_frames.map_or(false, |max| self.rendered >= max)
    }

    fn teardown(&mut self) {
        if !self.torn_down {
            self.torn_down = true;
            log::debug!("headless sink released after {} frames", self.rendered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_cancels_after_max_frames() {
        let mut sink = HeadlessSink::new(Some(2));
        assert!(!sink.poll_cancel());
        sink.render(Frame::new(vec![0; 4], 1, 1, 0));
        assert!(!sink.poll_cancel());
        sink.render(Frame::new(vec![0; 4], 1, 1, 1));
        assert!(sink.poll_cancel());
        assert_eq!(sink.rendered(), 2);
    }

    #[test]
    fn test_headless_unbounded() {
        let mut sink = HeadlessSink::new(None);
        for seq in 0..100 {
            sink.render(Frame::new(vec![0; 4], 1, 1, seq));
        }
        assert!(!sink.poll_cancel());
        sink.teardown();
        sink.teardown();
    }
}
