/// 拉帧循环 (FrameLoop)
/// Pull → render → poll, one frame per iteration, until a terminal reason.
use std::fmt;
use std::time::{Duration, Instant};

use crate::error::PullError;
use crate::sink::DisplaySink;
use crate::source::StreamSession;

/// 循环终止原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 对端正常关闭
    EndOfStream,
    /// 流中断 / 数据损坏
    Decode(String),
    /// 操作者请求退出
    UserCancelled,
}

impl From<PullError> for StopReason {
    fn from(e: PullError) -> Self {
        match e {
            PullError::EndOfStream => StopReason::EndOfStream,
            PullError::Decode(msg) => StopReason::Decode(msg),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfStream => f.write_str("stream ended"),
            StopReason::Decode(msg) => write!(f, "stream broke: {}", msg),
            StopReason::UserCancelled => f.write_str("cancelled by user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping(StopReason),
}

/// 接收统计
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    pub delivered: u64,
    pub first_frame_at: Option<Instant>,
    pub last_frame_at: Option<Instant>,
}

impl LoopStats {
    /// 首帧到末帧的平均帧率
    pub fn mean_fps(&self) -> f64 {
        match (self.first_frame_at, self.last_frame_at) {
            (Some(first), Some(last)) if self.delivered > 1 => {
                let secs = last.duration_since(first).as_secs_f64();
                if secs > 0.0 {
                    (self.delivered - 1) as f64 / secs
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

pub struct FrameLoop<'a, S: StreamSession, D: DisplaySink> {
    session: &'a mut S,
    sink: &'a mut D,
    state: LoopState,
    stats: LoopStats,
    window_count: u64,
    window_start: Instant,
}

impl<'a, S: StreamSession, D: DisplaySink> FrameLoop<'a, S, D> {
    pub fn new(session: &'a mut S, sink: &'a mut D) -> Self {
        Self {
            session,
            sink,
            state: LoopState::Running,
            stats: LoopStats::default(),
            window_count: 0,
            window_start: Instant::now(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// One iteration. A no-op once the loop is stopping.
    ///
    /// 阻塞中的 pull 不会被打断, 取消只在 pull 返回后检查.
    pub fn step(&mut self) -> &LoopState {
        if self.state != LoopState::Running {
            return &self.state;
        }

        match self.session.pull() {
            Ok(frame) => {
                if self.stats.delivered == 0 {
                    println!("✅ 正在接收视频帧 ({}x{})", frame.width, frame.height);
                }
                self.record_delivery();
                self.sink.render(frame);
            }
            Err(e) => {
                let reason = StopReason::from(e);
                log::debug!("pull stopped the loop: {}", reason);
                self.state = LoopState::Stopping(reason);
                return &self.state;
            }
        }

        if self.sink.poll_cancel() {
            self.state = LoopState::Stopping(StopReason::UserCancelled);
        }
        &self.state
    }

    /// 阻塞运行直到终止
    pub fn run(&mut self) -> StopReason {
        loop {
            if let LoopState::Stopping(reason) = self.step() {
                return reason.clone();
            }
        }
    }

    fn record_delivery(&mut self) {
        let now = Instant::now();
        self.stats.delivered += 1;
        self.stats.first_frame_at.get_or_insert(now);
        self.stats.last_frame_at = Some(now);

        // 每秒打印一次接收统计
        self.window_count += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            log::debug!(
                "📺 接收统计: {:.1}fps | 累计{}帧",
                self.window_count as f64 / elapsed.as_secs_f64(),
                self.stats.delivered
            );
            self.window_count = 0;
            self.window_start = now;
        }
    }
}
