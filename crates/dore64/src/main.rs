//! Commodore 64 emulator binary.
//!
//! Runs the machine in a winit window with a pixels framebuffer, or
//! headless for scripted runs and screenshots.

use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use dore64::{capture, find_roms_dir, keyboard_map, C64, C64Config, Loader, RunError};
use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Window scale factor over the native framebuffer.
const SCALE: u32 = 2;

/// Frame period for ~50 Hz PAL.
const FRAME_DURATION: Duration = Duration::from_micros(19_950);

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    prg_path: Option<PathBuf>,
    bas_path: Option<PathBuf>,
    headless: bool,
    frames: u32,
    screenshot_path: Option<PathBuf>,
    type_text: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        prg_path: None,
        bas_path: None,
        headless: false,
        frames: 200,
        screenshot_path: None,
        type_text: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--prg" => {
                i += 1;
                cli.prg_path = args.get(i).map(PathBuf::from);
            }
            "--bas" => {
                i += 1;
                cli.bas_path = args.get(i).map(PathBuf::from);
            }
            "--headless" => {
                cli.headless = true;
            }
            "--frames" => {
                i += 1;
                if let Some(s) = args.get(i) {
                    cli.frames = s.parse().unwrap_or(200);
                }
            }
            "--screenshot" => {
                i += 1;
                cli.screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--type" => {
                i += 1;
                cli.type_text = args.get(i).cloned();
            }
            "--help" | "-h" => {
                eprintln!("Usage: dore64 [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --prg <file>         Load a PRG once BASIC is ready");
                eprintln!("  --bas <file>         Type a BASIC listing once BASIC is ready");
                eprintln!("  --headless           Run without a window");
                eprintln!("  --frames <n>         Frames to run headless [default: 200]");
                eprintln!("  --screenshot <file>  Save a PNG screenshot (headless)");
                eprintln!("  --type <text>        Type text into the machine (\\n for Return)");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Machine construction
// ---------------------------------------------------------------------------

fn make_c64(cli: &CliArgs) -> C64 {
    let config = C64Config::from_roms_dir(&find_roms_dir());
    let mut c64 = C64::new(&config);

    if let Some(ref path) = cli.prg_path {
        attach_loader(&mut c64, Loader::prg(path), path);
    } else if let Some(ref path) = cli.bas_path {
        attach_loader(&mut c64, Loader::bas(path), path);
    }

    if let Some(ref text) = cli.type_text {
        let text = text.replace("\\n", "\n");
        c64.type_text(&text);
    }

    c64
}

fn attach_loader(c64: &mut C64, loader: std::io::Result<Loader>, path: &Path) {
    match loader {
        Ok(loader) => c64.attach_loader(loader),
        Err(e) => {
            eprintln!("Cannot read program {}: {e}", path.display());
            process::exit(1);
        }
    }
}

fn report_and_exit(e: &RunError) -> ! {
    eprintln!("Emulation stopped: {e}");
    process::exit(1);
}

// ---------------------------------------------------------------------------
// Headless mode
// ---------------------------------------------------------------------------

fn run_headless(cli: &CliArgs) {
    let mut c64 = make_c64(cli);

    for _ in 0..cli.frames {
        if let Err(e) = c64.run_frame() {
            report_and_exit(&e);
        }
    }

    if let Some(ref path) = cli.screenshot_path {
        if let Err(e) = capture::save_screenshot(&c64, path) {
            eprintln!("Screenshot error: {e}");
            process::exit(1);
        }
        eprintln!("Screenshot saved to {}", path.display());
    }
}

// ---------------------------------------------------------------------------
// Windowed mode (winit + pixels)
// ---------------------------------------------------------------------------

struct App {
    c64: C64,
    window: Option<&'static Window>,
    pixels: Option<Pixels<'static>>,
    last_frame_time: Instant,
}

impl App {
    fn new(c64: C64) -> Self {
        Self {
            c64,
            window: None,
            pixels: None,
            last_frame_time: Instant::now(),
        }
    }

    fn handle_key(&mut self, keycode: KeyCode, pressed: bool) {
        if let Some(key) = keyboard_map::map_keycode(keycode) {
            if pressed {
                self.c64.press_key(key);
            } else {
                self.c64.release_key(key);
            }
        }
    }

    fn update_pixels(&mut self) {
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };

        let fb = self.c64.framebuffer();
        let frame = pixels.frame_mut();

        for (i, &argb) in fb.iter().enumerate() {
            let offset = i * 4;
            frame[offset] = ((argb >> 16) & 0xFF) as u8;
            frame[offset + 1] = ((argb >> 8) & 0xFF) as u8;
            frame[offset + 2] = (argb & 0xFF) as u8;
            frame[offset + 3] = 0xFF;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let width = self.c64.framebuffer_width();
        let height = self.c64.framebuffer_height();
        let window_size = winit::dpi::LogicalSize::new(width * SCALE, height * SCALE);
        let attrs = WindowAttributes::default()
            .with_title("dore64")
            .with_inner_size(window_size)
            .with_resizable(false);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window: &'static Window = Box::leak(Box::new(window));
                let inner = window.inner_size();
                let surface = SurfaceTexture::new(inner.width, inner.height, window);
                match Pixels::new(width, height, surface) {
                    Ok(pixels) => {
                        self.pixels = Some(pixels);
                    }
                    Err(e) => {
                        eprintln!("Failed to create pixel surface: {e}");
                        event_loop.exit();
                        return;
                    }
                }
                self.window = Some(window);
            }
            Err(e) => {
                eprintln!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    if keycode == KeyCode::Escape && event.state == ElementState::Pressed {
                        event_loop.exit();
                        return;
                    }
                    self.handle_key(keycode, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if now.duration_since(self.last_frame_time) >= FRAME_DURATION {
                    if let Err(e) = self.c64.run_frame() {
                        eprintln!("Emulation stopped: {e}");
                        event_loop.exit();
                        return;
                    }
                    self.update_pixels();
                    self.last_frame_time = now;
                }

                if let Some(pixels) = self.pixels.as_ref() {
                    if let Err(e) = pixels.render() {
                        eprintln!("Render error: {e}");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window {
            window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = parse_args();

    if cli.headless {
        run_headless(&cli);
        return;
    }

    let c64 = make_c64(&cli);
    let mut app = App::new(c64);

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            eprintln!("Failed to create event loop: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("Event loop error: {e}");
        process::exit(1);
    }
}
