use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::assets::{AssetEvent, AssetLoader};
use crate::config::DemoConfig;
use crate::context::{FrameClock, SceneContext};
use crate::error::{Error, Result};
use crate::gpu::GpuContext;
use crate::gui::GuiPanel;
use crate::input::Input;
use crate::renderer::Renderer;
use crate::viewport::Viewport;

/// Opens the window and runs the demo until it is closed.
///
/// # Example
/// ```no_run
/// matcap_text::run(matcap_text::DemoConfig::default())?;
/// # Ok::<(), matcap_text::Error>(())
/// ```
pub fn run(config: DemoConfig) -> Result<()> {
    let event_loop = EventLoop::<AssetEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp {
        proxy: event_loop.create_proxy(),
        state: AppState::Pending { config },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct DemoApp {
    proxy: EventLoopProxy<AssetEvent>,
    state: AppState,
    error: Option<Error>,
}

enum AppState {
    Pending { config: DemoConfig },
    Running(Box<Running>),
    Stopped,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    gui: GuiPanel,
    scene: SceneContext,
    input: Input,
    clock: FrameClock,
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: DemoConfig,
        proxy: EventLoopProxy<AssetEvent>,
    ) -> Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let viewport = Viewport::from_physical(window.inner_size(), window.scale_factor());
        let assets = config.assets.clone();
        let scene = SceneContext::new(config, viewport);

        let gpu = GpuContext::new(window.clone(), scene.viewport.drawing_buffer_size())?;
        let renderer = Renderer::new(&gpu);
        let gui = GuiPanel::new(&window, &gpu);

        let loader = AssetLoader::new(proxy);
        loader.load_texture(scene.matcap(), &assets.matcap)?;
        loader.load_font(&assets.font)?;
        log::info!(
            "loading {} and {}",
            assets.font.display(),
            assets.matcap.display()
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            gui,
            scene,
            input: Input::new(),
            clock: FrameClock::new(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let logical = size.to_logical::<f32>(scale_factor);
        if let Some((width, height)) =
            self.scene
                .resize(logical.width, logical.height, scale_factor as f32)
        {
            self.gpu.resize(width, height);
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let dt = self.clock.tick(Instant::now());
        self.scene.tick(&self.input, dt);
        self.gui.run(&self.window, &mut self.scene);

        let gui = &mut self.gui;
        self.renderer
            .render(&self.gpu, &self.scene, |gpu, encoder, view| {
                gui.paint(gpu, encoder, view)
            })?;

        self.input.begin_frame();
        self.window.request_redraw();
        Ok(())
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) -> Result<()> {
        let consumed = self.gui.on_window_event(&self.window, &event);
        // Releases always reach the controller so a drag never sticks.
        let release = matches!(
            event,
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            } | WindowEvent::CursorLeft { .. }
                | WindowEvent::Focused(false)
        );
        if !consumed || release {
            self.input.handle_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size, self.window.scale_factor()),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize(self.window.inner_size(), scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw()?,
            _ => {}
        }
        Ok(())
    }
}

impl DemoApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{err}");
        self.error = Some(err);
        self.state = AppState::Stopped;
        event_loop.exit();
    }
}

impl ApplicationHandler<AssetEvent> for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config } = &self.state else {
            return;
        };
        match Running::start(event_loop, config.clone(), self.proxy.clone()) {
            Ok(running) => {
                running.window.request_redraw();
                self.state = AppState::Running(Box::new(running));
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };
        if let Err(err) = running.window_event(event_loop, event) {
            self.fail(event_loop, err);
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AssetEvent) {
        match &mut self.state {
            AppState::Running(running) => running.scene.handle_asset(event),
            _ => log::debug!("asset arrived with no scene running"),
        }
    }
}
