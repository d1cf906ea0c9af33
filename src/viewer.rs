//! The application shell and per-frame loop.
//!
//! Startup populates the scene with its synchronous content (floor, lights)
//! and fires the asset loads as background tasks. The winit redraw cycle is
//! the render loop: every `RedrawRequested` computes a delta-time, advances
//! the animation mixer when one exists, updates the orbit damping, renders a
//! shadow pass plus a forward pass, and requests the next redraw. Loads that
//! finish mid-frame arrive as user events and are visible from the next
//! frame on; a load that fails is logged and simply never appears.

use std::{fmt::Debug, iter, sync::Arc};

use cgmath::Deg;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::scene::{Placement, Scene},
    resources::{self, animation::Mixer},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// One model to load and where to stand it.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub path: String,
    pub scale: f32,
    /// X/Z offset on the floor; Y comes from ground alignment.
    pub offset: (f32, f32),
    pub rotation_y: Deg<f32>,
}

impl ModelConfig {
    fn placement(&self) -> Placement {
        Placement::new(self.scale, self.offset, self.rotation_y)
    }
}

#[derive(Clone, Debug)]
pub struct FloorConfig {
    pub dimensions: [f32; 3],
    pub texture: String,
}

/// Everything the viewer stages at startup.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub models: Vec<ModelConfig>,
    pub floor: FloorConfig,
}

/// Completions crossing from loader tasks back to the event-loop thread.
///
/// All scene and GPU mutation happens on this thread, one event at a time,
/// so load callbacks and frames interleave without any locking.
pub enum SceneEvent {
    /// Deferred context creation (the wasm path cannot block on it).
    ContextReady(Box<Context>),
    ModelLoaded {
        index: usize,
        scene: resources::CpuScene,
    },
    FloorTextureLoaded(image::RgbaImage),
    LoadFailed {
        path: String,
        cause: anyhow::Error,
    },
}

impl Debug for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextReady(_) => f.write_str("ContextReady"),
            Self::ModelLoaded { index, .. } => {
                f.debug_struct("ModelLoaded").field("index", index).finish()
            }
            Self::FloorTextureLoaded(_) => f.write_str("FloorTextureLoaded"),
            Self::LoadFailed { path, cause } => f
                .debug_struct("LoadFailed")
                .field("path", path)
                .field("cause", cause)
                .finish(),
        }
    }
}

/// High-density displays are capped at a pixel ratio of 2 to bound the
/// fragment load.
pub fn clamped_scale_factor(scale_factor: f64) -> f64 {
    scale_factor.min(2.0)
}

/// Surface size for a physical window size, honouring the pixel-ratio clamp.
pub fn surface_size(physical: (u32, u32), scale_factor: f64) -> (u32, u32) {
    let ratio = if scale_factor > 0.0 {
        clamped_scale_factor(scale_factor) / scale_factor
    } else {
        1.0
    };
    (
        ((physical.0 as f64) * ratio).round() as u32,
        ((physical.1 as f64) * ratio).round() as u32,
    )
}

/// Monotonic frame timing: elapsed time since loop start, delta since the
/// previous frame.
#[derive(Clone, Debug)]
pub struct FrameTimer {
    start: Instant,
    previous: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            previous: Duration::ZERO,
        }
    }

    pub fn tick(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.advance(elapsed)
    }

    /// Delta between this elapsed timestamp and the previous one. A clock
    /// that stalls or runs backwards yields zero, never a negative step.
    pub fn advance(&mut self, elapsed: Duration) -> Duration {
        let dt = elapsed.saturating_sub(self.previous);
        self.previous = elapsed;
        dt
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Context plus everything staged in it.
#[derive(Debug)]
struct ViewerState {
    ctx: Context,
    scene: Scene,
    /// Extension point for animated scenes. Nothing constructs a mixer from
    /// a load result today, so the per-frame advance is a no-op.
    mixer: Option<Mixer>,
    timer: FrameTimer,
    is_surface_configured: bool,
}

impl ViewerState {
    fn new(ctx: Context, config: &SceneConfig) -> Self {
        let layout = resources::diffuse_layout(&ctx.device);
        let scene = Scene::new(&ctx.device, &ctx.queue, &layout, config.floor.dimensions);
        Self {
            ctx,
            scene,
            mixer: None,
            timer: FrameTimer::new(),
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = surface_size((width, height), self.ctx.window.scale_factor());
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = crate::data_structures::texture::Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.light.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
            self.scene
                .draw_depth(&mut shadow_pass, &self.ctx.light.shadow_bind_group);
        }
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.scene.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.ctx.pipelines.scene);
            self.scene.draw(
                &mut render_pass,
                &self.ctx.camera.bind_group,
                &self.ctx.light.bind_group,
            );
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    config: SceneConfig,
    proxy: EventLoopProxy<SceneEvent>,
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    state: Option<ViewerState>,
    // Load completions that arrive before the context does.
    pending: Vec<SceneEvent>,
}

impl App {
    fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            config,
            proxy,
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            state: None,
            pending: Vec::new(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, task: impl Future<Output = ()> + Send + 'static) {
        self.async_runtime.spawn(task);
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        wasm_bindgen_futures::spawn_local(task);
    }

    /// Fire every asset load. The loads run concurrently and complete in
    /// arbitrary order; each one reports back through the proxy.
    fn spawn_loads(&self) {
        for (index, model) in self.config.models.iter().enumerate() {
            let proxy = self.proxy.clone();
            let path = model.path.clone();
            self.spawn(async move {
                let event = match resources::load_scene_gltf(&path).await {
                    Ok(scene) => SceneEvent::ModelLoaded { index, scene },
                    Err(cause) => SceneEvent::LoadFailed { path, cause },
                };
                if proxy.send_event(event).is_err() {
                    log::warn!("event loop closed before a model load completed");
                }
            });
        }

        let proxy = self.proxy.clone();
        let path = self.config.floor.texture.clone();
        self.spawn(async move {
            let event = match resources::load_rgba(&path).await {
                Ok(rgba) => SceneEvent::FloorTextureLoaded(rgba),
                Err(cause) => SceneEvent::LoadFailed { path, cause },
            };
            if proxy.send_event(event).is_err() {
                log::warn!("event loop closed before the floor texture completed");
            }
        });
    }

    fn apply(&mut self, event: SceneEvent) {
        let Some(state) = &mut self.state else { return };
        match event {
            SceneEvent::ModelLoaded { index, scene } => {
                let Some(model_config) = self.config.models.get(index) else {
                    log::error!("load completion for unknown model index {}", index);
                    return;
                };
                let layout = resources::diffuse_layout(&state.ctx.device);
                state.scene.stage(
                    &state.ctx.device,
                    &state.ctx.queue,
                    &layout,
                    scene,
                    &model_config.placement(),
                );
                log::info!("staged {}", model_config.path);
            }
            SceneEvent::FloorTextureLoaded(rgba) => {
                let layout = resources::diffuse_layout(&state.ctx.device);
                state
                    .scene
                    .bind_floor_texture(&state.ctx.device, &state.ctx.queue, &layout, &rgba);
            }
            SceneEvent::LoadFailed { path, cause } => {
                // The scene keeps rendering without the asset.
                log::warn!("failed to load {}: {:#}", path, cause);
            }
            SceneEvent::ContextReady(_) => (),
        }
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let ctx = match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => ctx,
                Err(e) => panic!(
                    "App initialization failed. Cannot create the main context: {}",
                    e
                ),
            };
            let mut state = ViewerState::new(ctx, &self.config);
            let size = state.ctx.window.inner_size();
            state.resize(size.width, size.height);
            state.ctx.window.request_redraw();
            self.state = Some(state);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(ctx) => {
                        assert!(
                            proxy
                                .send_event(SceneEvent::ContextReady(Box::new(ctx)))
                                .is_ok()
                        );
                    }
                    Err(e) => panic!(
                        "App initialization failed. Cannot create the main context: {}",
                        e
                    ),
                }
            });
        }

        // Loads need no GPU access until their completion events land, so
        // they start right away on both targets.
        self.spawn_loads();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            SceneEvent::ContextReady(ctx) => {
                // This is the message from our wasm `spawn_local`
                let mut state = ViewerState::new(*ctx, &self.config);
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);

                let queued: Vec<SceneEvent> = self.pending.drain(..).collect();
                for event in queued {
                    self.apply(event);
                }
            }
            other => {
                if self.state.is_some() {
                    self.apply(other);
                } else {
                    self.pending.push(other);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = state.timer.tick();

                if let Some(mixer) = &mut state.mixer {
                    mixer.update(dt);
                }

                // Ease the orbit toward pending input, then refresh the
                // camera uniform.
                state
                    .ctx
                    .camera
                    .controller
                    .update(&mut state.ctx.camera.camera, dt);
                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                match state.render() {
                    Ok(()) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }

                // Ask to run again on the next display refresh. Exiting the
                // loop (close request) is what stops the cadence.
                state.ctx.window.request_redraw();
            }
            _ => {}
        }
    }
}

pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config);

    event_loop.run_app(&mut app)?;

    Ok(())
}
