//! Scripted source and sink that record every call.
use std::cell::RefCell;
use std::rc::Rc;

use crate::endpoint::StreamEndpoint;
use crate::error::{OpenError, PullError};
use crate::frame::Frame;
use crate::sink::DisplaySink;
use crate::source::{StreamSession, StreamSource};

#[derive(Debug, Default)]
pub struct CallLog {
    pub opens: usize,
    pub pulls: usize,
    pub close_calls: usize,
    /// 实际释放句柄的次数
    pub releases: usize,
    pub rendered: Vec<u64>,
    pub polls: usize,
    pub teardowns: usize,
}

pub type SharedLog = Rc<RefCell<CallLog>>;

pub fn frame(seq: u64) -> Frame {
    Frame::new(vec![seq as u8; 2 * 2 * 4], 2, 2, seq)
}

/// N 帧之后以 `end` 结束; `end == None` 表示无限帧
pub struct ScriptedSource {
    pub log: SharedLog,
    frames: u64,
    end: Option<PullError>,
    unreachable: bool,
}

impl ScriptedSource {
    pub fn new(log: SharedLog, frames: u64, end: Option<PullError>) -> Self {
        Self {
            log,
            frames,
            end,
            unreachable: false,
        }
    }

    pub fn unreachable(log: SharedLog) -> Self {
        Self {
            log,
            frames: 0,
            end: None,
            unreachable: true,
        }
    }
}

impl StreamSource for ScriptedSource {
    type Session = ScriptedSession;

    fn open(&mut self, endpoint: &StreamEndpoint) -> Result<ScriptedSession, OpenError> {
        if self.unreachable {
            return Err(OpenError::Unreachable {
                endpoint: endpoint.to_string(),
                detail: "connection refused".to_string(),
            });
        }
        self.log.borrow_mut().opens += 1;
        Ok(ScriptedSession {
            log: self.log.clone(),
            next: 0,
            frames: self.frames,
            end: self.end.clone(),
            open: true,
        })
    }
}

pub struct ScriptedSession {
    log: SharedLog,
    next: u64,
    frames: u64,
    end: Option<PullError>,
    open: bool,
}

impl StreamSession for ScriptedSession {
    fn pull(&mut self) -> Result<Frame, PullError> {
        self.log.borrow_mut().pulls += 1;
        if !self.open {
            return Err(PullError::Decode("session is closed".to_string()));
        }
        match &self.end {
            Some(end) if self.next >= self.frames => Err(end.clone()),
            _ => {
                let f = frame(self.next);
                self.next += 1;
                Ok(f)
            }
        }
    }

    fn close(&mut self) {
        let mut log = self.log.borrow_mut();
        log.close_calls += 1;
        if self.open {
            self.open = false;
            log.releases += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// 第 `cancel_on_poll` 次检查时返回 true
pub struct ScriptedSink {
    pub log: SharedLog,
    cancel_on_poll: Option<usize>,
    panic_on_render: Option<u64>,
}

impl ScriptedSink {
    pub fn new(log: SharedLog, cancel_on_poll: Option<usize>) -> Self {
        Self {
            log,
            cancel_on_poll,
            panic_on_render: None,
        }
    }

    pub fn panicking_on(log: SharedLog, seq: u64) -> Self {
        Self {
            log,
            cancel_on_poll: None,
            panic_on_render: Some(seq),
        }
    }
}

impl DisplaySink for ScriptedSink {
    fn render(&mut self, frame: Frame) {
        if self.panic_on_render == Some(frame.seq) {
            panic!("renderer fault on frame {}", frame.seq);
        }
        self.log.borrow_mut().rendered.push(frame.seq);
    }

    fn poll_cancel(&mut self) -> bool {
        let mut log = self.log.borrow_mut();
        log.polls += 1;
        self.cancel_on_poll == Some(log.polls)
    }

    fn teardown(&mut self) {
        self.log.borrow_mut().teardowns += 1;
    }
}

pub fn endpoint() -> StreamEndpoint {
    StreamEndpoint::parse("rtsp://localhost:8554/stream").unwrap()
}
