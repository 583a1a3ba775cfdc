/// 生命周期控制 (Lifecycle Controller)
///
/// Opens the session, drives the loop, and releases the session and the
/// display on every exit path, panics included.
use std::future::Future;

use crate::endpoint::StreamEndpoint;
use crate::error::OpenError;
use crate::frame_loop::{FrameLoop, LoopState, LoopStats, StopReason};
use crate::sink::DisplaySink;
use crate::source::{StreamSession, StreamSource};

/// 退出码
pub mod exit_code {
    pub const OK: u8 = 0;
    pub const INTERNAL: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const UNREACHABLE: u8 = 3;
    pub const DECODE: u8 = 4;
}

/// 一次播放的结果
#[derive(Debug, Clone)]
pub enum Outcome {
    OpenFailed(OpenError),
    Finished { reason: StopReason, stats: LoopStats },
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::OpenFailed(_) => exit_code::UNREACHABLE,
            Outcome::Finished { reason, .. } => match reason {
                StopReason::EndOfStream | StopReason::UserCancelled => exit_code::OK,
                StopReason::Decode(_) => exit_code::DECODE,
            },
        }
    }

    pub fn reason(&self) -> Option<&StopReason> {
        match self {
            Outcome::Finished { reason, .. } => Some(reason),
            Outcome::OpenFailed(_) => None,
        }
    }

    /// 控制台汇报
    pub fn report(&self) {
        match self {
            Outcome::OpenFailed(e) => eprintln!("❌ 无法连接视频流: {}", e),
            Outcome::Finished { reason, stats } => {
                let summary = format!(
                    "共{}帧, 平均{:.1}fps",
                    stats.delivered,
                    stats.mean_fps()
                );
                match reason {
                    StopReason::EndOfStream => println!("🏁 视频流已结束 ({})", summary),
                    StopReason::UserCancelled => println!("👋 用户退出 ({})", summary),
                    StopReason::Decode(msg) => {
                        eprintln!("❌ 视频流中断: {} ({})", msg, summary)
                    }
                }
            }
        }
    }
}

/// Drop 时关闭会话并释放显示资源, 各一次
struct Release<'a, S: StreamSession, D: DisplaySink> {
    session: &'a mut S,
    sink: &'a mut D,
}

impl<S: StreamSession, D: DisplaySink> Drop for Release<'_, S, D> {
    fn drop(&mut self) {
        self.session.close();
        self.sink.teardown();
        log::debug!("session and display released");
    }
}

fn open<Src: StreamSource, D: DisplaySink>(
    source: &mut Src,
    endpoint: &StreamEndpoint,
    sink: &mut D,
) -> Result<Src::Session, Outcome> {
    println!("🎬 开始连接: {}", endpoint);
    source.open(endpoint).map_err(|e| {
        log::error!("open failed: {}", e);
        sink.teardown();
        Outcome::OpenFailed(e)
    })
}

/// 阻塞运行一次完整播放
pub fn run<Src: StreamSource, D: DisplaySink>(
    source: &mut Src,
    endpoint: &StreamEndpoint,
    sink: &mut D,
) -> Outcome {
    let mut session = match open(source, endpoint, sink) {
        Ok(session) => session,
        Err(outcome) => return outcome,
    };

    let mut release = Release {
        session: &mut session,
        sink,
    };
    let mut frame_loop = FrameLoop::new(&mut *release.session, &mut *release.sink);
    let reason = frame_loop.run();
    let stats = frame_loop.stats().clone();
    drop(frame_loop);
    drop(release);

    log::info!("loop stopped: {}", reason);
    Outcome::Finished { reason, stats }
}

/// Like [`run`], but awaits `pace()` after every iteration so a GUI event
/// loop can present the frame and collect input.
pub async fn run_paced<Src, D, F, Fut>(
    source: &mut Src,
    endpoint: &StreamEndpoint,
    sink: &mut D,
    mut pace: F,
) -> Outcome
where
    Src: StreamSource,
    D: DisplaySink,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut session = match open(source, endpoint, sink) {
        Ok(session) => session,
        Err(outcome) => return outcome,
    };

    let mut release = Release {
        session: &mut session,
        sink,
    };
    let mut frame_loop = FrameLoop::new(&mut *release.session, &mut *release.sink);
    let reason = loop {
        if let LoopState::Stopping(reason) = frame_loop.step() {
            break reason.clone();
        }
        pace().await;
    };
    let stats = frame_loop.stats().clone();
    drop(frame_loop);
    drop(release);

    log::info!("loop stopped: {}", reason);
    Outcome::Finished { reason, stats }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;
    use crate::error::PullError;
    use crate::testing::*;

    #[test]
    fn test_open_then_close_releases_everything() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::new(log.clone(), 0, Some(PullError::EndOfStream));
        let mut session = source.open(&endpoint()).unwrap();
        assert!(session.is_open());
        session.close();
        assert!(!session.is_open());
        let log = log.borrow();
        assert_eq!((log.opens, log.releases), (1, 1));
    }

    #[test]
    fn test_double_close_is_noop() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::new(log.clone(), 0, None);
        let mut session = source.open(&endpoint()).unwrap();
        session.close();
        session.close();
        let log = log.borrow();
        assert_eq!(log.close_calls, 2);
        assert_eq!(log.releases, 1);
    }

    #[test]
    fn test_end_of_stream_exits_zero_and_releases() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::new(log.clone(), 5, Some(PullError::EndOfStream));
        let mut sink = ScriptedSink::new(log.clone(), None);

        let outcome = run(&mut source, &endpoint(), &mut sink);
        assert_eq!(outcome.reason(), Some(&StopReason::EndOfStream));
        assert_eq!(outcome.exit_code(), 0);

        let log = log.borrow();
        assert_eq!(log.rendered, vec![0, 1, 2, 3, 4]);
        assert_eq!((log.close_calls, log.releases, log.teardowns), (1, 1, 1));
    }

    #[test]
    fn test_decode_failure_exit_code() {
        let log = SharedLog::default();
        let mut source =
            ScriptedSource::new(log.clone(), 3, Some(PullError::Decode("corrupt".into())));
        let mut sink = ScriptedSink::new(log.clone(), None);

        let outcome = run(&mut source, &endpoint(), &mut sink);
        assert_eq!(outcome.exit_code(), exit_code::DECODE);
        assert_ne!(outcome.exit_code(), exit_code::UNREACHABLE);

        let log = log.borrow();
        assert_eq!(log.rendered, vec![0, 1, 2]);
        assert_eq!((log.releases, log.teardowns), (1, 1));
    }

    #[test]
    fn test_user_cancel_exits_zero() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::new(log.clone(), 0, None);
        let mut sink = ScriptedSink::new(log.clone(), Some(5));

        let outcome = run(&mut source, &endpoint(), &mut sink);
        assert_eq!(outcome.reason(), Some(&StopReason::UserCancelled));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(log.borrow().rendered.len(), 5);
        assert_eq!(log.borrow().releases, 1);
    }

    #[test]
    fn test_open_failure_never_enters_loop() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::unreachable(log.clone());
        let mut sink = ScriptedSink::new(log.clone(), None);

        let outcome = run(&mut source, &endpoint(), &mut sink);
        assert!(matches!(outcome, Outcome::OpenFailed(OpenError::Unreachable { .. })));
        assert_eq!(outcome.exit_code(), exit_code::UNREACHABLE);

        let log = log.borrow();
        assert!(log.rendered.is_empty());
        assert_eq!(log.polls, 0);
        assert_eq!(log.pulls, 0);
        assert_eq!(log.close_calls, 0);
    }

    #[test]
    fn test_panic_in_loop_still_releases() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::new(log.clone(), 0, None);
        let mut sink = ScriptedSink::panicking_on(log.clone(), 2);

        let result = catch_unwind(AssertUnwindSafe(|| {
            run(&mut source, &endpoint(), &mut sink)
        }));
        assert!(result.is_err());

        let log = log.borrow();
        assert_eq!(log.rendered, vec![0, 1]);
        assert_eq!((log.close_calls, log.releases, log.teardowns), (1, 1, 1));
    }

    #[test]
    fn test_paced_run_presents_each_iteration() {
        let log = SharedLog::default();
        let mut source = ScriptedSource::new(log.clone(), 4, Some(PullError::EndOfStream));
        let mut sink = ScriptedSink::new(log.clone(), None);
        let mut presents = 0;

        let outcome = futures::executor::block_on(run_paced(
            &mut source,
            &endpoint(),
            &mut sink,
            || {
                presents += 1;
                async {}
            },
        ));

        assert_eq!(outcome.reason(), Some(&StopReason::EndOfStream));
        assert_eq!(presents, 4);
        let log = log.borrow();
        assert_eq!(log.rendered, vec![0, 1, 2, 3]);
        assert_eq!((log.releases, log.teardowns), (1, 1));
    }
}
