use crate::announce_winner;
use anyhow::Result;
use flappy_neat::config::Config;
use flappy_neat::render::{Canvas, FrameSink};
use flappy_neat::runner::TickLimiter;
use flappy_neat::sprites::Sprites;
use flappy_neat::trainer::{Progress, Trainer};
use pixels::{Pixels, SurfaceTexture};
use std::path::PathBuf;
use std::rc::Rc;
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

/// Opens the game window and trains generation after generation at the tick
/// rate. Closing the window stops between two ticks.
pub fn run(config: Config, sprites: Sprites, save_winner: Option<PathBuf>) -> Result<()> {
    let (width, height) = (config.game.window_width, config.game.window_height);
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title("Flappy NEAT")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)?;

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(width, height, surface_texture)?
    };

    let sprites = Rc::new(sprites);
    let mut limiter = TickLimiter::new(config.game.tick_rate);
    let mut trainer = Trainer::new(config, sprites.clone());
    let mut history: Vec<f64> = Vec::new();
    let mut paused = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            if let Err(e) = pixels.render() {
                log::error!("Render error: {e}");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape) || input.close_requested() || input.destroyed() {
                log::info!("Window closed during generation {}", trainer.generation());
                *control_flow = ControlFlow::Exit;
                return;
            }

            if input.key_pressed(VirtualKeyCode::P) {
                paused = !paused;
                log::info!("{}", if paused { "Paused" } else { "Resumed" });
            }

            if paused || !limiter.ready() {
                return;
            }
            limiter.mark();

            let mut sink = FrameSink {
                canvas: Canvas::new(pixels.frame_mut(), width, height),
                sprites: sprites.as_ref(),
                history: &history,
            };
            match trainer.tick(&mut sink) {
                Ok(Progress::Running) => {}
                Ok(Progress::GenerationDone) => history = trainer.stats().best_fitness.clone(),
                Ok(Progress::Finished(winner)) => {
                    if let Err(e) = announce_winner(&winner, save_winner.as_deref()) {
                        log::error!("{e:#}");
                    }
                    *control_flow = ControlFlow::Exit;
                }
                Err(e) => {
                    log::error!("Simulation failed: {e}");
                    *control_flow = ControlFlow::Exit;
                }
            }
            window.request_redraw();
        }
    });
}
