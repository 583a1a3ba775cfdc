/// RTSP主动拉流解码器
/// RTSP active pulling decoder built on ez-ffmpeg
///
/// FFmpeg 的调度器是推模式: 解码线程调用 `RgbaFilter::filter_frame`.
/// 这里用一个有界通道把它变成拉模式, `pull` 只是从通道取一帧.
use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender, TrySendError};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::core::scheduler::ffmpeg_scheduler::{FfmpegScheduler, Running};
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};

use super::receiver::{FrameReceiver, Packet, Pipeline};
use super::{StreamSession, StreamSource};
use crate::config::RtspTransport;
use crate::endpoint::StreamEndpoint;
use crate::error::{OpenError, PullError};
use crate::frame::Frame;

/// 分辨率上限, 超出视为损坏帧
const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone)]
pub struct FfmpegOptions {
    pub transport: RtspTransport,
    /// Socket I/O timeout, also the longest `pull` waits for a frame.
    pub read_timeout: Option<Duration>,
    /// 解码线程 → 主循环 通道容量
    pub buffer: usize,
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self {
            transport: RtspTransport::Tcp,
            read_timeout: None,
            buffer: 4,
        }
    }
}

/// ez-ffmpeg 拉流能力
#[derive(Debug, Clone, Default)]
pub struct FfmpegSource {
    options: FfmpegOptions,
}

impl FfmpegSource {
    pub fn new(options: FfmpegOptions) -> Self {
        Self { options }
    }

    fn input_opts(&self, endpoint: &StreamEndpoint) -> HashMap<String, String> {
        let mut opts = HashMap::new();
        if endpoint.is_rtsp() {
            opts.insert(
                "rtsp_transport".to_string(),
                self.options.transport.as_opt().to_string(),
            );
            if self.options.transport == RtspTransport::Tcp {
                opts.insert("rtsp_flags".to_string(), "prefer_tcp".to_string());
            }
        }
        // 低延迟参数
        opts.insert("fflags".to_string(), "nobuffer".to_string());
        opts.insert("flags".to_string(), "low_delay".to_string());
        if let Some(timeout) = self.options.read_timeout {
            // 单位微秒. rtmp 的 `timeout` 是监听超时且会切到服务端模式, 只能用 rw_timeout
            let key = if endpoint.is_rtsp() { "timeout" } else { "rw_timeout" };
            opts.insert(key.to_string(), timeout.as_micros().to_string());
        }
        opts
    }

    /// 构建并启动管线. `build()` 已完成 avformat_open_input / find_stream_info,
    /// 连接层面的失败都在这里暴露.
    fn start(&self, input: Input, label: &str) -> Result<FfmpegSession, OpenError> {
        let unreachable = |detail: String| OpenError::Unreachable {
            endpoint: label.to_string(),
            detail,
        };

        let (tx, rx) = bounded(self.options.buffer.max(1));
        let filter = RgbaFilter::new(tx);

        let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
        let pipe = pipe.filter("rgba", Box::new(filter));
        let out = create_null_output().add_frame_pipeline(pipe);

        let ctx = FfmpegContext::builder()
            .input(input)
            .filter_desc("format=rgba")
            .output(out)
            .build()
            .map_err(|e| unreachable(format!("构建失败: {}", e)))?;

        let scheduler = ctx
            .start()
            .map_err(|e| unreachable(format!("启动失败: {}", e)))?;

        log::info!("opened {}", label);
        Ok(FfmpegSession {
            frames: FrameReceiver::new(rx, scheduler, self.options.read_timeout),
        })
    }
}

impl StreamSource for FfmpegSource {
    type Session = FfmpegSession;

    fn open(&mut self, endpoint: &StreamEndpoint) -> Result<FfmpegSession, OpenError> {
        let opts = self.input_opts(endpoint);
        log::debug!("ffmpeg input options: {:?}", opts);

        let input = Input::new(endpoint.as_str()).set_input_opts(opts);
        self.start(input, &endpoint.to_string())
    }
}

impl Pipeline for FfmpegScheduler<Running> {
    fn is_ended(&self) -> bool {
        FfmpegScheduler::is_ended(self)
    }

    fn finish(self) -> Result<(), String> {
        self.wait().map_err(|e| e.to_string())
    }
}

/// 一个运行中的 FFmpeg 调度器
pub struct FfmpegSession {
    frames: FrameReceiver<FfmpegScheduler<Running>>,
}

impl StreamSession for FfmpegSession {
    fn pull(&mut self) -> Result<Frame, PullError> {
        self.frames.recv()
    }

    /// 释放是异步的: abort 只标记调度器结束, 不等待线程.
    /// 接收端随之丢弃, 过滤器下一次发送得到 Disconnected 并退出管线.
    fn close(&mut self) {
        if let Some(scheduler) = self.frames.close() {
            scheduler.abort();
            log::debug!("ffmpeg session closed");
        }
    }

    fn is_open(&self) -> bool {
        self.frames.is_open()
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// FFmpeg解码过滤器: 流 → RGBA帧
#[derive(Clone)]
struct RgbaFilter {
    tx: Sender<Packet>,
    seq: u64,
    dropped: u64,
}

impl RgbaFilter {
    fn new(tx: Sender<Packet>) -> Self {
        Self {
            tx,
            seq: 0,
            dropped: 0,
        }
    }

    /// 把 RGBA 平面按行拷贝成紧凑缓冲
    fn to_frame(&self, frame: &ez_ffmpeg::Frame) -> Result<Frame, String> {
        unsafe {
            if frame.as_ptr().is_null() || frame.is_empty() {
                return Err("empty frame".to_string());
            }
            if frame.is_corrupt() {
                return Err(format!("corrupt frame #{}", self.seq));
            }

            let av = &*frame.as_ptr();
            if av.width <= 0 || av.height <= 0 {
                return Err(format!("invalid resolution {}x{}", av.width, av.height));
            }
            let w = av.width as u32;
            let h = av.height as u32;
            if w > MAX_DIMENSION || h > MAX_DIMENSION {
                return Err(format!("invalid resolution {}x{}", w, h));
            }
            // 缺少参考帧 / 无效比特流
            if av.decode_error_flags & 0x03 != 0 {
                return Err(format!(
                    "decode error flags 0x{:02x} on frame #{}",
                    av.decode_error_flags, self.seq
                ));
            }

            let plane = av.data[0];
            let stride = av.linesize[0];
            let row_bytes = w as usize * 4;
            if plane.is_null() || stride < row_bytes as i32 {
                return Err(format!("bad RGBA plane (stride {})", stride));
            }

            let mut rgba = Vec::with_capacity(row_bytes * h as usize);
            for y in 0..h as usize {
                let row = std::slice::from_raw_parts(plane.add(y * stride as usize), row_bytes);
                rgba.extend_from_slice(row);
            }
            Ok(Frame::new(rgba, w, h, self.seq))
        }
    }
}

impl FrameFilter for RgbaFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        log::debug!("decode filter started");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: ez_ffmpeg::Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<ez_ffmpeg::Frame>, String> {
        let decoded = match self.to_frame(&frame) {
            Ok(decoded) => decoded,
            Err(msg) => {
                // 损坏帧终止会话, 不交付半帧
                // 通道满时错误仍会经由调度器结果上报
                let _ = self.tx.try_send(Err(msg.clone()));
                return Err(msg);
            }
        };
        self.seq += 1;

        match self.tx.try_send(Ok(decoded)) {
            Ok(()) => {}
            // 显示跟不上时丢弃尚未被拉取的帧, 保持低延迟
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                if self.dropped % 100 == 1 {
                    log::warn!("display is behind, dropped {} undelivered frames", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err("session closed".to_string());
            }
        }

        Ok(Some(frame))
    }
}
