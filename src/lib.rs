//! Real-time stream viewer: pull decoded frames from a streaming source and
//! hand them to a display until the operator quits or the stream ends.
pub mod config; // 命令行参数
pub mod endpoint; // 流地址
pub mod error; // 错误分类
pub mod frame; // 已解码帧
pub mod frame_loop; // 拉帧循环
pub mod lifecycle; // 打开 / 运行 / 释放
pub mod sink; // 显示输出
pub mod source; // 视频输入

#[cfg(test)]
mod testing;

pub use crate::config::{Args, RtspTransport};
pub use crate::endpoint::StreamEndpoint;
pub use crate::error::{EndpointError, OpenError, PullError};
pub use crate::frame::Frame;
pub use crate::frame_loop::{FrameLoop, LoopState, LoopStats, StopReason};
pub use crate::lifecycle::{exit_code, run, run_paced, Outcome};
pub use crate::sink::{DisplaySink, HeadlessSink};
pub use crate::source::{StreamSession, StreamSource};
