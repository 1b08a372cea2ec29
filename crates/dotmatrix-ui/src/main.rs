mod config;
mod font;
mod gamepad;

use clap::Parser;
use log::warn;
use pixels::{Pixels, SurfaceTexture};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use dotmatrix_core::diagnostics;
use dotmatrix_core::{cartridge::Cartridge, gameboy::GameBoy};

const GB_FPS: f64 = 59.7275;
const FRAME_TIME: Duration = Duration::from_nanos((1e9_f64 / GB_FPS) as u64);

const GAME_W: usize = 160;
const GAME_H: usize = 144;
const DEBUG_W: usize = 160;

/// RGBA colors for the four DMG shades.
const PALETTE: [[u8; 4]; 4] = [
    [255, 255, 128, 255],
    [160, 192, 64, 255],
    [64, 128, 64, 255],
    [0, 24, 0, 255],
];

const PANEL_BG: [u8; 4] = [8, 24, 32, 255];
const PANEL_TEXT: [u8; 4] = [255, 255, 255, 255];
const PANEL_ALERT: [u8; 4] = [255, 64, 64, 255];

/// Forwards core diagnostics into the `log` output.
struct CoreLogBridge;

impl diagnostics::LogSink for CoreLogBridge {
    fn log(&self, level: diagnostics::Level, target: &'static str, args: fmt::Arguments) {
        let level = match level {
            diagnostics::Level::Trace => log::Level::Trace,
            diagnostics::Level::Info => log::Level::Info,
            diagnostics::Level::Warn => log::Level::Warn,
        };
        log::log!(target: target, level, "{args}");
    }
}

#[derive(Parser)]
#[command(name = "dotmatrix", about = "DMG Game Boy emulator")]
struct Args {
    /// Path to ROM file
    rom: Option<PathBuf>,
}

fn flush_save(gb: &GameBoy) {
    if let Err(e) = gb.bus.cart.save_ram() {
        warn!("failed to write save file: {e}");
    }
}

fn update_title(window: &Window, title: &str, paused: bool) {
    let state = if paused { "(paused) " } else { "" };
    if title.is_empty() {
        window.set_title(&format!("{state}dotmatrix"));
    } else {
        window.set_title(&format!("{state}dotmatrix - {title}"));
    }
}

fn draw_frame(frame: &mut [u8], gb: &GameBoy, show_debug: bool, paused: bool, fps: f64) {
    let stride = if show_debug { GAME_W + DEBUG_W } else { GAME_W };
    let fb = gb.bus.ppu.framebuffer();
    for y in 0..GAME_H {
        for x in 0..GAME_W {
            let shade = fb[y * GAME_W + x] as usize;
            let idx = (y * stride + x) * 4;
            frame[idx..idx + 4].copy_from_slice(&PALETTE[shade & 3]);
        }
    }
    if show_debug {
        draw_debug_panel(frame, stride, gb, paused, fps);
    }
}

/// Status readout in the reserved 160 px to the right of the game area.
fn draw_debug_panel(frame: &mut [u8], stride: usize, gb: &GameBoy, paused: bool, fps: f64) {
    for y in 0..GAME_H {
        for x in GAME_W..stride {
            let idx = (y * stride + x) * 4;
            frame[idx..idx + 4].copy_from_slice(&PANEL_BG);
        }
    }

    let state = if paused { "PAUSE" } else { "     " };
    let mut lines = vec![format!("{state}   FPS:{fps:3.0}")];
    lines.extend(gb.tracer.cpu_info());
    lines.push(String::new());
    lines.push(format!("CART: {}", gb.bus.cart.cart_type_name()));
    lines.push(format!("ROM: {}", gb.bus.cart.rom_size_name()));
    lines.push(format!("RAM: {}", gb.bus.cart.ram_size_name()));

    for (i, line) in lines.iter().enumerate() {
        let color = if i == 0 { PANEL_ALERT } else { PANEL_TEXT };
        font::draw_text(frame, stride, GAME_W + 2, 2 + i * 9, line, color);
    }
}

fn main() {
    env_logger::init();
    let _ = diagnostics::try_set_log_sink(Box::new(CoreLogBridge));

    let args = Args::parse();
    let Some(rom_path) = args.rom else {
        println!("usage: dotmatrix <romfile>");
        return;
    };

    let cfg = config::load(Path::new("config.toml"));
    let scale = cfg.video.scale.min(4).max(1);
    let show_debug = cfg.video.is_show_debug;

    let cart = match Cartridge::from_file(&rom_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load ROM {}: {e}", rom_path.display());
            std::process::exit(1);
        }
    };
    let rom_title = cart.title.clone();

    let mut gb = GameBoy::new(cart);
    gb.bus.joypad.set_gamepad_enabled(cfg.gamepad.is_enabled);
    gb.bus.joypad.set_gamepad_bind(cfg.gamepad.bind);
    let mut pad = gamepad::GamepadInput::new(cfg.gamepad.is_enabled, cfg.gamepad.bind);

    let buf_w = if show_debug { GAME_W + DEBUG_W } else { GAME_W } as u32;
    let buf_h = GAME_H as u32;

    let event_loop = EventLoop::builder().build().unwrap();
    let attrs = Window::default_attributes()
        .with_title("dotmatrix")
        .with_inner_size(LogicalSize::new(
            (buf_w * scale) as f64,
            (buf_h * scale) as f64,
        ));
    #[allow(deprecated)]
    let window = Arc::new(event_loop.create_window(attrs).unwrap());
    update_title(&window, &rom_title, false);

    let size = window.inner_size();
    let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
    let mut pixels = Pixels::new(buf_w, buf_h, surface).expect("Pixels error");

    let mut keys = 0xFFu8;
    let mut paused = false;
    let mut step_once = false;
    let mut next_frame = Instant::now();
    let mut fps = 0.0f64;
    let mut fps_frames = 0u32;
    let mut fps_window = Instant::now();

    #[allow(deprecated)]
    let _ = event_loop.run(move |event, target| {
        target.set_control_flow(ControlFlow::Poll);
        match &event {
            Event::WindowEvent {
                event: win_event, ..
            } => match win_event {
                WindowEvent::CloseRequested => {
                    flush_save(&gb);
                    target.exit();
                }
                WindowEvent::Resized(size) => {
                    let _ = pixels.resize_surface(size.width, size.height);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        let pressed = event.state == ElementState::Pressed;
                        let mask = match code {
                            KeyCode::KeyZ => Some(0x01u8),     // A
                            KeyCode::KeyX => Some(0x02),       // B
                            KeyCode::ShiftLeft => Some(0x04),  // Select
                            KeyCode::Enter => Some(0x08),      // Start
                            KeyCode::ArrowRight => Some(0x10),
                            KeyCode::ArrowLeft => Some(0x20),
                            KeyCode::ArrowUp => Some(0x40),
                            KeyCode::ArrowDown => Some(0x80),
                            KeyCode::KeyP => {
                                if pressed {
                                    paused = !paused;
                                    update_title(&window, &rom_title, paused);
                                }
                                None
                            }
                            KeyCode::KeyS => {
                                if pressed {
                                    step_once = true;
                                }
                                None
                            }
                            KeyCode::Escape => {
                                // Diagnostic exit: dump the trace ring, then
                                // shut down cleanly.
                                if pressed {
                                    gb.tracer.dump();
                                    flush_save(&gb);
                                    target.exit();
                                }
                                None
                            }
                            _ => None,
                        };
                        if let Some(mask) = mask {
                            if pressed {
                                keys &= !mask;
                            } else {
                                keys |= mask;
                            }
                        }
                    }
                }
                WindowEvent::RedrawRequested => {
                    draw_frame(pixels.frame_mut(), &gb, show_debug, paused, fps);
                    if pixels.render().is_err() {
                        flush_save(&gb);
                        target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if now >= next_frame {
                    next_frame = now + FRAME_TIME;

                    gb.bus.joypad.set_pad_state(pad.poll());
                    gb.bus.joypad.set_key_state(keys);

                    if !paused || step_once {
                        step_once = false;
                        if !gb.run_frame() {
                            // CPU fault: dump the last 256 trace entries and
                            // exit non-zero.
                            gb.tracer.dump();
                            flush_save(&gb);
                            std::process::exit(1);
                        }
                        fps_frames += 1;
                    }

                    if fps_window.elapsed() >= Duration::from_secs(1) {
                        fps = fps_frames as f64 / fps_window.elapsed().as_secs_f64();
                        fps_frames = 0;
                        fps_window = Instant::now();
                    }

                    window.request_redraw();
                }
                target.set_control_flow(ControlFlow::WaitUntil(next_frame));
            }
            Event::LoopExiting => {
                flush_save(&gb);
            }
            _ => {}
        }
    });
}
