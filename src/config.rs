/// 命令行参数 (Command line configuration)
use std::time::Duration;

use clap::Parser;

use crate::endpoint::StreamEndpoint;

/// RTSP 下层传输
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RtspTransport {
    #[default]
    Tcp,
    Udp,
}

impl RtspTransport {
    pub fn as_opt(&self) -> &'static str {
        match self {
            RtspTransport::Tcp => "tcp",
            RtspTransport::Udp => "udp",
        }
    }
}

/// 实时流播放器
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "实时视频流播放器 (RTSP/RTMP/SRT...)", long_about = None)]
pub struct Args {
    /// 流地址, 例如 rtsp://localhost:8554/stream
    #[arg(value_parser = parse_endpoint)]
    pub endpoint: StreamEndpoint,

    /// RTSP 传输方式
    #[arg(long, value_enum, default_value_t = RtspTransport::Tcp)]
    pub transport: RtspTransport,

    /// 读超时(秒), 超时未收到帧视为流中断
    #[arg(long, value_parser = parse_seconds)]
    pub read_timeout: Option<Duration>,

    /// 解码缓冲帧数
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub buffer: u16,

    /// 窗口宽度
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// 窗口高度
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// 窗口标题
    #[arg(long, default_value = "Stream Viewer")]
    pub title: String,

    /// 无窗口模式, 只拉流不显示
    #[arg(long)]
    pub headless: bool,

    /// 无窗口模式下收到 N 帧后退出 (N ≥ 1)
    #[arg(long, requires = "headless", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_frames: Option<u64>,

    /// 输出调试日志
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// 默认日志级别, RUST_LOG 优先
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

fn parse_endpoint(s: &str) -> Result<StreamEndpoint, String> {
    StreamEndpoint::parse(s).map_err(|e| e.to_string())
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("timeout must be a positive number of seconds".to_string());
    }
    Ok(Duration::from_secs_f64(secs))
}
