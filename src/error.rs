/// 错误分类
/// Error taxonomy for stream acquisition
use thiserror::Error;

/// 流地址语法错误 (启动参数校验阶段)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("invalid stream URI `{uri}`: {reason}")]
    Malformed { uri: String, reason: String },
    #[error("unsupported transport scheme `{scheme}` (expected one of {supported})")]
    UnsupportedScheme { scheme: String, supported: String },
    #[error("stream URI `{0}` has no host")]
    MissingHost(String),
}

/// 打开会话失败
///
/// Timeouts, refused connections and DNS failures all collapse into
/// `Unreachable`; the caller aborts startup either way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenError {
    #[error("cannot connect to {endpoint}: {detail}")]
    Unreachable { endpoint: String, detail: String },
}

/// 拉帧失败, 两种都会终止循环
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PullError {
    /// 对端正常关闭
    #[error("end of stream")]
    EndOfStream,
    /// 网络中断 / 负载损坏 / 解码器故障
    #[error("decode failure: {0}")]
    Decode(String),
}
