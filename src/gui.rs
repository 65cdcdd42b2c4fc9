//! The on-screen control panel, drawn with egui over the scene.
//!
//! Building the UI and painting it are separate steps: [`GuiPanel::run`]
//! happens during the frame update (so color edits land before rendering),
//! [`GuiPanel::paint`] is handed to the renderer as the frame's overlay.

use egui::epaint::ClippedShape;
use egui::{Align2, ClippedPrimitive, FullOutput, TexturesDelta, ViewportId};
use winit::event::WindowEvent;
use winit::window::Window;

use crate::context::SceneContext;
use crate::gpu::GpuContext;

/// Width of the controls window in points.
const PANEL_WIDTH: f32 = 200.0;

/// State shown in the controls window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlsPanel {
    /// Label color as sRGB bytes, when the label exists.
    pub color: Option<[u8; 3]>,
    pub status: String,
}

impl ControlsPanel {
    pub fn from_context(ctx: &SceneContext) -> Self {
        Self {
            color: ctx.label_color(),
            status: ctx.font_status().to_string(),
        }
    }

    /// Lays out the window. Returns the new color if the swatch was edited.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<[u8; 3]> {
        let mut edited = None;
        egui::Window::new("Controls")
            .anchor(Align2::RIGHT_TOP, egui::vec2(-8.0, 8.0))
            .default_width(PANEL_WIDTH)
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                match self.color.as_mut() {
                    Some(color) => {
                        ui.horizontal(|ui| {
                            ui.label("color");
                            if ui.color_edit_button_srgb(color).changed() {
                                edited = Some(*color);
                            }
                        });
                    }
                    None => {
                        ui.add_enabled_ui(false, |ui| ui.label("color"));
                    }
                }
                ui.separator();
                ui.small(&self.status);
            });
        edited
    }
}

struct Prepared {
    primitives: Vec<ClippedPrimitive>,
    textures: TexturesDelta,
    pixels_per_point: f32,
}

impl Prepared {
    /// Tessellates at `pixels_per_point`, the ratio the surface is drawn at,
    /// which can be lower than the window's native scale factor.
    fn new(
        ctx: &egui::Context,
        shapes: Vec<ClippedShape>,
        textures: TexturesDelta,
        pixels_per_point: f32,
    ) -> Self {
        Self {
            primitives: ctx.tessellate(shapes, pixels_per_point),
            textures,
            pixels_per_point,
        }
    }
}

/// egui context, its winit bridge and its wgpu painter.
pub struct GuiPanel {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    prepared: Option<Prepared>,
}

impl GuiPanel {
    pub fn new(window: &Window, gpu: &GpuContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.format(),
            egui_wgpu::RendererOptions::default(),
        );
        Self {
            ctx,
            state,
            renderer,
            prepared: None,
        }
    }

    /// Feeds a window event to egui. Returns true when egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Builds this frame's UI and applies any color edit to the scene.
    pub fn run(&mut self, window: &Window, scene: &mut SceneContext) {
        let mut panel = ControlsPanel::from_context(scene);
        let raw_input = self.state.take_egui_input(window);
        let mut edited = None;
        let FullOutput {
            platform_output,
            textures_delta,
            shapes,
            ..
        } = self.ctx.run(raw_input, |ctx| {
            edited = panel.show(ctx);
        });

        if let Some(rgb) = edited {
            scene.set_label_color(rgb);
        }

        self.state.handle_platform_output(window, platform_output);
        self.prepared = Some(Prepared::new(
            &self.ctx,
            shapes,
            textures_delta,
            scene.viewport.pixel_ratio(),
        ));
    }

    /// Records the prepared UI into `view`.
    ///
    /// Returns egui's buffer-upload command buffers, which must be submitted
    /// before `encoder`.
    pub fn paint(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> Vec<wgpu::CommandBuffer> {
        let Some(prepared) = self.prepared.take() else {
            return Vec::new();
        };

        for (id, delta) in &prepared.textures.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, delta);
        }

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.width(), gpu.height()],
            pixels_per_point: prepared.pixels_per_point,
        };
        let uploads = self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            encoder,
            &prepared.primitives,
            &screen,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();
            self.renderer
                .render(&mut render_pass, &prepared.primitives, &screen);
        }

        for id in &prepared.textures.free {
            self.renderer.free_texture(id);
        }
        uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(panel: &mut ControlsPanel) -> Option<[u8; 3]> {
        let ctx = egui::Context::default();
        let mut edited = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            edited = panel.show(ctx);
        });
        edited
    }

    #[test]
    fn idle_frame_reports_no_edit() {
        let mut panel = ControlsPanel {
            color: Some([255, 0, 0]),
            status: "font: Test".to_owned(),
        };
        assert_eq!(frame(&mut panel), None);
        assert_eq!(panel.color, Some([255, 0, 0]));
    }

    #[test]
    fn panel_without_label_still_lays_out() {
        let mut panel = ControlsPanel {
            color: None,
            status: "loading font...".to_owned(),
        };
        assert_eq!(frame(&mut panel), None);
    }

    #[test]
    fn tessellates_at_surface_ratio_on_high_density_displays() {
        let ctx = egui::Context::default();
        let mut raw = egui::RawInput::default();
        raw.viewports
            .entry(ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(3.0);
        let mut panel = ControlsPanel {
            color: Some([255, 0, 0]),
            status: "font: Test".to_owned(),
        };

        // Windows are laid out invisibly on their first frame.
        let _ = ctx.run(raw.clone(), |ctx| {
            let _ = panel.show(ctx);
        });
        let output = ctx.run(raw, |ctx| {
            let _ = panel.show(ctx);
        });
        assert_eq!(output.pixels_per_point, 3.0);

        let prepared = Prepared::new(&ctx, output.shapes, output.textures_delta, 2.0);
        assert_eq!(prepared.pixels_per_point, 2.0);
        assert!(!prepared.primitives.is_empty());
    }
}
