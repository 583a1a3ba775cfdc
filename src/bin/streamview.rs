/// 实时视频流播放器
///
/// 主程序入口: cargo run --features cli --release -- rtsp://localhost:8554/stream
///
/// 单线程: 打开 → 拉帧/显示/检查按键 → 释放. 按 Q 或 Esc 退出.
use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use macroquad::window::next_frame;
use streamview::sink::{WindowConfig, WindowSink};
use streamview::source::{FfmpegOptions, FfmpegSource};
use streamview::{exit_code, lifecycle, Args, HeadlessSink};

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    match play(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(exit_code::INTERNAL)
        }
    }
}

fn play(args: Args) -> anyhow::Result<u8> {
    let options = FfmpegOptions {
        transport: args.transport,
        read_timeout: args.read_timeout,
        buffer: args.buffer as usize,
    };
    log::debug!("source options: {:?}", options);

    if args.read_timeout.is_none() {
        log::warn!("no --read-timeout set, a stalled source blocks until it recovers");
    }

    if args.headless {
        let mut source = FfmpegSource::new(options);
        let mut sink = HeadlessSink::new(args.max_frames);
        let outcome = lifecycle::run(&mut source, &args.endpoint, &mut sink);
        outcome.report();
        return Ok(outcome.exit_code());
    }

    let window = WindowConfig {
        title: args.title.clone(),
        width: args.width,
        height: args.height,
    };

    // macroquad 接管主循环, 结果经 Cell 带出
    let code = Rc::new(Cell::new(None));
    let code_out = code.clone();
    let endpoint = args.endpoint.clone();
    macroquad::Window::from_config(window.conf(), async move {
        let mut source = FfmpegSource::new(options);
        let mut sink = WindowSink::new();
        let outcome = lifecycle::run_paced(&mut source, &endpoint, &mut sink, next_frame).await;
        outcome.report();
        code_out.set(Some(outcome.exit_code()));
    });

    // 某些平台上事件循环结束后直接返回, 窗口关闭前未得到结果视为内部错误
    code.get().context("display event loop exited before playback finished")
}
