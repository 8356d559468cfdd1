//! 媒体状态使用示例
//!
//! 演示如何注册断点状态，并在视口变化时接收回调和事件

use std::rc::Rc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use mediastate_core::api::{
    Callback, CallbackPhase, ConfigOption, StateConfig, StateEvent, StateManager,
    ValidationPhase, Viewport, ViewportEnvironment,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    // 1. 创建虚拟视口和状态管理器
    let env = Rc::new(ViewportEnvironment::new(Viewport::new(480, 800)));
    let mut manager = StateManager::new(env.clone());

    // 2. 启动事件监听器（后台任务）
    let mut event_rx = manager.subscribe();
    let listener = tokio::spawn(async move {
        println!("📡 Event listener started\n");
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                // 落后时跳过被覆盖的事件，继续接收
                Err(RecvError::Lagged(n)) => {
                    println!("⚠ Listener lagged, {n} events skipped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match event {
                StateEvent::StateAdded {
                    state_id, active, ..
                } => println!("✓ State added: {state_id} (active: {active})"),
                StateEvent::StateRejected { state_id, .. } => {
                    println!("✗ State rejected: {state_id}")
                }
                StateEvent::StateRemoved { state_id, .. } => {
                    println!("✓ State removed: {state_id}")
                }
                StateEvent::StateChanged { .. } => println!("→ Breakpoint changed"),
                StateEvent::Resized {
                    state_count, fired, ..
                } => println!("↔ Resize delivered to {fired}/{state_count} states"),
            }
        }
        println!("\n📡 Event listener stopped");
    });

    // 3. 注册校验器：enabled = false 的状态不会被创建
    manager.add_config_option(ConfigOption::new("enabled", ValidationPhase::Once, |v| {
        v.option("enabled") != Some(&serde_json::Value::Bool(false))
    }));

    // 4. 添加断点状态
    manager.add_state(
        StateConfig::new()
            .id("mobile")
            .query("(max-width: 767px)")
            .on_first_run(Callback::infallible(|| println!("  [mobile] first run")))
            .on_enter(Callback::infallible(|| println!("  [mobile] enter")))
            .on_leave(Callback::infallible(|| println!("  [mobile] leave"))),
    )?;
    manager.add_state(
        StateConfig::new()
            .id("desktop")
            .query("(min-width: 992px)")
            .on_enter(Callback::infallible(|| println!("  [desktop] enter")))
            .on_leave(Callback::infallible(|| println!("  [desktop] leave")))
            .on_resize(Callback::infallible(|| println!("  [desktop] resize"))),
    )?;
    if let Err(e) = manager.add_state(StateConfig::new().id("legacy").option("enabled", false)) {
        println!("  skipped: {e}");
    }

    // 5. 模拟视口变化
    for width in [820, 1280, 1440, 600] {
        println!("\nviewport → {width}px");
        env.resize(width, 800)?;
        manager.resize()?;
    }

    // 6. 运行时追加回调
    manager.attach_callback(
        "mobile",
        CallbackPhase::Enter,
        Callback::infallible(|| println!("  [mobile] late enter")),
        true,
    )?;

    // 7. 查看快照
    println!("\n{}", manager.snapshot().to_json()?);

    // 8. 释放管理器后监听器结束
    drop(manager);
    listener.await?;
    Ok(())
}
