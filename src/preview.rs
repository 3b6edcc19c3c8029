use std::sync::Arc;

use image::RgbaImage;
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::error::{DialError, DialResult};

/// Shows `image` in a window and blocks until the window is closed.
pub fn show(image: &RgbaImage, title: &str) -> DialResult<()> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DialError::InvalidSize);
    }

    let event_loop = EventLoop::new().map_err(|e| DialError::preview(e.to_string()))?;
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(LogicalSize::new(width as f64, height as f64))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|e| DialError::preview(e.to_string()))?;
    let window = Arc::new(window);
    let window_clone = window.clone();

    let size = window.inner_size();
    let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
    let mut pixels = Pixels::new(width, height, surface_texture)
        .map_err(|e| DialError::preview(e.to_string()))?;
    tracing::debug!(width, height, "preview window open");

    event_loop
        .run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::Wait);
            if let Event::WindowEvent { event, .. } = event {
                match event {
                    WindowEvent::CloseRequested => window_target.exit(),
                    WindowEvent::Resized(new_size) => {
                        if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                            tracing::warn!(%err, "preview surface resize failed");
                        }
                        window_clone.request_redraw();
                    }
                    WindowEvent::RedrawRequested => {
                        pixels.frame_mut().copy_from_slice(image.as_raw());
                        if let Err(err) = pixels.render() {
                            tracing::error!(%err, "preview render failed");
                            window_target.exit();
                        }
                    }
                    _ => {}
                }
            }
        })
        .map_err(|e| DialError::preview(e.to_string()))
}
