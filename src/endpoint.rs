/// 流地址 (StreamEndpoint)
///
/// Only syntax is checked here; reachability is discovered by `StreamSource::open`.
use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::EndpointError;

/// 支持的传输协议
pub const SUPPORTED_SCHEMES: [&str; 9] = [
    "rtsp", "rtsps", "rtmp", "rtmps", "srt", "udp", "rtp", "http", "https",
];

/// 不可变的远端流地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    url: Url,
}

impl StreamEndpoint {
    pub fn parse(uri: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(uri.trim()).map_err(|e| EndpointError::Malformed {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(EndpointError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                supported: SUPPORTED_SCHEMES.join(", "),
            });
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(EndpointError::MissingHost(uri.to_string()));
        }

        Ok(Self { url })
    }

    /// 完整地址, 原样交给传输层
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn is_rtsp(&self) -> bool {
        matches!(self.scheme(), "rtsp" | "rtsps")
    }

    /// 隐去密码后的地址, 用于日志和控制台输出
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

impl FromStr for StreamEndpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
