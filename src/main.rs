use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, WindowBuilder},
};
use lab_scene::{RenderSettings, State};

/// Roughly one wheel notch on touchpads that report pixels.
const PIXELS_PER_LINE: f64 = 20.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresentMode {
    Fifo,
    Immediate,
    Mailbox,
}

impl From<PresentMode> for wgpu::PresentMode {
    fn from(mode: PresentMode) -> Self {
        match mode {
            PresentMode::Fifo => wgpu::PresentMode::Fifo,
            PresentMode::Immediate => wgpu::PresentMode::Immediate,
            PresentMode::Mailbox => wgpu::PresentMode::Mailbox,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding images, models and vertex data
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Draw vertex normals of the reflective model as lines
    #[arg(long)]
    show_normals: bool,

    #[arg(long, value_enum, default_value_t = PresentMode::Fifo)]
    present_mode: PresentMode,

    /// Load WGSL from this directory instead of the built-in shaders
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Start with nothing in the scene and no point or spot lights
    #[arg(long)]
    empty: bool,
}

impl Args {
    fn settings(self) -> RenderSettings {
        RenderSettings {
            width: self.width,
            height: self.height,
            assets: self.assets,
            shader_dir: self.shader_dir,
            show_normals: self.show_normals,
            present_mode: self.present_mode.into(),
            empty_scene: self.empty,
            ..Default::default()
        }
    }
}

/// Returns whether the grab took. Without it, look input falls back to
/// window cursor positions.
fn grab_cursor(state: &State) -> bool {
    let window = state.window();
    window.set_cursor_visible(false);
    match window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_e| window.set_cursor_grab(CursorGrabMode::Confined))
    {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not grab cursor: {}", e);
            false
        }
    }
}

fn run(args: Args) -> Result<()> {
    let settings = args.settings();
    let event_loop = EventLoop::new()?;

    let window = WindowBuilder::new()
        .with_title("Lab Scene")
        .with_inner_size(PhysicalSize::new(settings.width, settings.height))
        .with_visible(true)
        .build(&event_loop)?;

    let mut state = State::new(window, &settings)?;
    let mouse_captured = grab_cursor(&state);

    let start = Instant::now();
    let mut fatal = None;

    event_loop.run(|event, window_target| {
        match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => match event {
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key_code),
                            state: key_state,
                            ..
                        },
                    ..
                } => {
                    state
                        .context_mut()
                        .on_key(key_code, key_state == ElementState::Pressed);
                }
                WindowEvent::CursorMoved { position, .. } if !mouse_captured => {
                    state.context_mut().on_cursor_moved(position.x, position.y);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let dy = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                    };
                    state.context_mut().on_scroll(dy);
                }
                WindowEvent::CloseRequested => state.context_mut().request_close(),
                WindowEvent::Resized(new_size) => state.resize(new_size.width, new_size.height),
                WindowEvent::RedrawRequested => {
                    if let Err(e) = state.render(start.elapsed().as_secs_f64()) {
                        fatal = Some(e);
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } if mouse_captured => {
                state.context_mut().on_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                if state.context().close_requested() {
                    window_target.exit();
                } else {
                    state.window().request_redraw();
                }
            }
            _ => {}
        }
    })?;

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
