// src/main.rs

//! `glws-demo`: opens a window through the EGL/Screen backend, presents a
//! few frames, resizes once and tears everything down.
//!
//! Usage: `glws-demo [config.json]`

use glws_screen::{
    Config, Context, DamageRect, Drawable, EglScreenBackend, Visual, WindowSystem, CONFIG,
};

use anyhow::Context as _;
use log::{info, warn};
use std::path::PathBuf;

fn load_config() -> anyhow::Result<Config> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::load(&path).with_context(|| format!("Failed to load {}", path.display())),
        None => {
            info!("No configuration file given; using defaults.");
            Ok(CONFIG.clone())
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting glws-demo...");
    let config = load_config()?;
    let demo = config.demo.clone();
    info!("Demo settings: {:?}", demo);

    let backend = EglScreenBackend::initialize(config);

    let Some(visual) = backend.create_visual(true, 0, demo.profile) else {
        anyhow::bail!("no visual available for {}", demo.profile);
    };
    info!("Visual ready for {}", visual.profile());

    let mut drawable = backend.create_drawable(&visual, demo.width, demo.height, None);

    let Some(context) = backend.create_context(&visual, None, demo.debug_context) else {
        anyhow::bail!("unable to create a {} context", demo.profile);
    };
    info!(
        "Context ready for {} (shared: {})",
        context.profile(),
        context.is_shared()
    );

    if !backend.make_current(Some(&drawable), None, Some(&context)) {
        anyhow::bail!("unable to make the context current");
    }
    drawable.show();

    let full = [DamageRect::new(0, 0, demo.width, demo.height)];
    for frame in 0..demo.frames {
        if !backend.process_events() {
            warn!("Event processing requested exit at frame {}", frame);
            break;
        }
        drawable.set_damage_region(&full);
        if frame % 2 == 0 {
            drawable.swap_buffers();
        } else {
            drawable.swap_buffers_with_damage(&full);
        }
    }
    info!("Presented {} frame(s) at {}x{}", demo.frames, drawable.width(), drawable.height());

    let (width, height) = (demo.width / 2, demo.height / 2);
    drawable.resize(width, height);
    drawable.swap_buffers();
    info!("Resized to {}x{}", drawable.width(), drawable.height());

    backend.make_current(None, None, None);
    drop(context);
    drop(drawable);
    drop(visual);

    backend.shutdown();
    info!("glws-demo exited successfully.");
    Ok(())
}
