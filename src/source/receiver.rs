/// 帧接收端: 推模式解码线程 → 拉模式 `pull`
///
/// The decode side pushes `Packet`s into a bounded channel. This end turns
/// the channel state plus the pipeline's final result into exactly one of
/// frame / `EndOfStream` / `Decode`.
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::error::PullError;
use crate::frame::Frame;

/// 解码线程发来的一帧或一条错误
pub type Packet = Result<Frame, String>;

/// 调度器状态轮询间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 后台解码管线
pub trait Pipeline {
    fn is_ended(&self) -> bool;

    /// 管线结束后取回其结果; Ok 表示对端正常关闭
    fn finish(self) -> Result<(), String>;
}

pub struct FrameReceiver<P: Pipeline> {
    rx: Option<Receiver<Packet>>,
    pipeline: Option<P>,
    read_timeout: Option<Duration>,
    poll_interval: Duration,
}

impl<P: Pipeline> FrameReceiver<P> {
    pub fn new(rx: Receiver<Packet>, pipeline: P, read_timeout: Option<Duration>) -> Self {
        Self {
            rx: Some(rx),
            pipeline: Some(pipeline),
            read_timeout,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_open(&self) -> bool {
        self.rx.is_some() && self.pipeline.is_some()
    }

    /// Blocks for the next frame. Buffered frames are always drained before
    /// the end of the pipeline is reported.
    pub fn recv(&mut self) -> Result<Frame, PullError> {
        let started = Instant::now();
        loop {
            let rx = match &self.rx {
                Some(rx) => rx,
                None => return Err(closed()),
            };
            match rx.recv_timeout(self.poll_interval) {
                Ok(Ok(frame)) => return Ok(frame),
                Ok(Err(msg)) => return Err(PullError::Decode(msg)),
                Err(RecvTimeoutError::Disconnected) => return Err(self.finish()),
                Err(RecvTimeoutError::Timeout) => {
                    let drained = rx.is_empty();
                    let ended = self.pipeline.as_ref().map_or(true, P::is_ended);
                    if ended && drained {
                        return Err(self.finish());
                    }
                    if let Some(limit) = self.read_timeout {
                        if started.elapsed() >= limit {
                            return Err(PullError::Decode(format!(
                                "no frame received within {:.1}s",
                                limit.as_secs_f64()
                            )));
                        }
                    }
                }
            }
        }
    }

    /// Drops the receiving end and hands back the pipeline, if still held,
    /// for the caller to stop. Later calls return `None`.
    pub fn close(&mut self) -> Option<P> {
        self.rx = None;
        self.pipeline.take()
    }

    /// 正常结束为 EndOfStream, 否则为 Decode
    fn finish(&mut self) -> PullError {
        match self.pipeline.take() {
            Some(pipeline) => match pipeline.finish() {
                Ok(()) => PullError::EndOfStream,
                Err(e) => PullError::Decode(e),
            },
            None => closed(),
        }
    }
}

fn closed() -> PullError {
    PullError::Decode("session is closed".to_string())
}
