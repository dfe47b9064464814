//! 模拟命令
//!
//! 在模拟引擎上运行真实的工作线程：定位标记沿经线移动，引擎计算屏幕投影并
//! 推送回 UI 线程，BlueSphere 跟随第一个定位标记。

use crate::settings::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use mapapi_sdk::native::{MockEngine, Viewport};
use mapapi_sdk::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// 每步经度增量（度）
const LONGITUDE_STEP: f64 = 15.0;

/// 模拟参数（命令行覆盖配置文件）
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 定位标记数量
    #[arg(short, long)]
    pub positioners: Option<usize>,

    /// 模拟步数
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// 不打印每次投影变更
    #[arg(short, long)]
    pub quiet: bool,
}

impl SimulateCommand {
    pub fn execute(self, mut config: CliConfig) -> Result<()> {
        if let Some(positioners) = self.positioners {
            config.simulation.positioners = positioners;
        }
        if let Some(steps) = self.steps {
            config.simulation.steps = steps;
        }
        run_simulation(&config, self.quiet)
    }
}

fn run_simulation(config: &CliConfig, quiet: bool) -> Result<()> {
    let settings = &config.simulation;
    let viewport = Viewport {
        width: settings.viewport_width,
        height: settings.viewport_height,
        ..Default::default()
    };
    let (engine, probe) = MockEngine::with_projection(viewport);
    let runtime = MapRuntime::spawn(engine, config.bridge.clone())
        .context("Failed to start native worker")?;
    info!(
        "Simulating {} positioners for {} steps",
        settings.positioners, settings.steps
    );

    let notifications = Arc::new(AtomicU64::new(0));
    let mut positioners = Vec::with_capacity(settings.positioners);
    for i in 0..settings.positioners {
        let counter = notifications.clone();
        let latitude = -60.0 + 120.0 * (i as f64 + 0.5) / settings.positioners.max(1) as f64;
        let options = PositionerOptions::new()
            .position(LatLng::new(latitude, 0.0))
            .changed_listener(move |id: ProxyId, state: &ProjectedState| {
                counter.fetch_add(1, Ordering::Relaxed);
                if quiet {
                    return;
                }
                match state.screen_point() {
                    Some(point) if !state.is_behind_globe_horizon => {
                        println!("{} -> ({}, {})", id, point.x, point.y)
                    },
                    Some(_) => println!("{} -> behind globe horizon", id),
                    None => println!("{} -> off screen", id),
                }
            });
        positioners.push(Positioner::new(runtime.handle(), options)?);
    }

    let mut sphere = BlueSphere::new(runtime.handle())?;
    sphere.set_enabled(true)?;

    let step_interval = Duration::from_millis(settings.step_interval_ms);
    for step in 1..=settings.steps {
        let longitude = LONGITUDE_STEP * step as f64;
        for positioner in positioners.iter_mut() {
            let latitude = positioner.position().latitude;
            positioner.set_position(LatLng::new(latitude, longitude))?;
        }
        if let Some(first) = positioners.first() {
            sphere.set_position(first.position())?;
            sphere.set_direction(90.0)?;
        }
        runtime.run_ui_tasks_timeout(step_interval);
    }

    let flush_timeout = config.bridge.shutdown_timeout();
    runtime.flush(flush_timeout).context("Worker did not drain commands")?;
    runtime.run_ui_tasks_timeout(step_interval);

    for positioner in positioners.iter_mut() {
        positioner.destroy()?;
    }
    runtime.flush(flush_timeout).context("Worker did not drain commands")?;

    let metrics = runtime.metrics();
    println!();
    println!("Native calls:        {}", probe.call_count());
    println!("Listener calls:      {}", notifications.load(Ordering::Relaxed));
    println!("Commands submitted:  {}", metrics.commands_submitted);
    println!("Commands applied:    {}", metrics.commands_applied);
    println!("Commands failed:     {}", metrics.commands_failed);
    println!("Commands dropped:    {}", metrics.commands_dropped);
    println!("Engine events:       {}", metrics.events_received);
    println!("UI tasks run:        {}", metrics.ui_tasks_run);
    println!("Live positioners:    {}", probe.live_positioners().len());
    Ok(())
}
