/// 视频输入系统 (Stream Source)
///
/// The transport/decoder is an opaque capability: anything that can open an
/// endpoint and hand back decoded frames one at a time.
/// - `FfmpegSource`: ez-ffmpeg 拉流解码 (feature `ffmpeg`)
/// - `FrameReceiver`: 推模式管线 → 拉模式 `pull`
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod receiver;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegOptions, FfmpegSession, FfmpegSource};
pub use receiver::{FrameReceiver, Packet, Pipeline};

use crate::endpoint::StreamEndpoint;
use crate::error::{OpenError, PullError};
use crate::frame::Frame;

/// 打开远端流的能力
pub trait StreamSource {
    type Session: StreamSession;

    /// 建立会话, 失败即 `OpenError::Unreachable`
    fn open(&mut self, endpoint: &StreamEndpoint) -> Result<Self::Session, OpenError>;
}

/// 一个已打开的连接
pub trait StreamSession {
    /// Blocks until the next frame, a clean close by the peer, or a failure.
    ///
    /// Never yields a partial frame: corruption is `PullError::Decode`.
    fn pull(&mut self) -> Result<Frame, PullError>;

    /// 释放连接句柄. Idempotent; release never fails.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}
