use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use softbuffer::{Context as SoftContext, Surface};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key as WinitKey, ModifiersState, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::catalog::Catalog;
use crate::config::Configuration;
use crate::events::{
    DecodeRequest, Frame, HitTarget, Key, LightboxInput, LoaderEvent, Variant,
};
use crate::lightbox::Status;
use crate::render::{
    LightboxView, Renderer, SceneView,
    canvas::Canvas,
    font::load_font,
    layout::{GridLayout, LightboxLayout},
    lightbox_image_rect,
    motion::{OffsetAnimator, progress},
    store::ImageStore,
};

const WHEEL_LINE_PX: f32 = 48.0;

#[derive(Debug)]
enum ViewerEvent {
    Frame(Frame),
    Loaded(LoaderEvent),
    Cancelled,
}

type FrameReceiver = mpsc::Receiver<Frame>;
type LoadedReceiver = mpsc::Receiver<LoaderEvent>;
type InputSender = mpsc::Sender<LightboxInput>;
type DecodeSender = mpsc::Sender<DecodeRequest>;
type WindowHandle = Arc<Window>;

/// Pointer that went down on the grid; becomes a thumbnail activation if
/// it is released without travelling.
#[derive(Debug, Clone, Copy)]
struct GridPress {
    x: f32,
    y: f32,
    travelled: f32,
}

struct ViewerApp {
    cfg: Configuration,
    catalog: &'static Catalog,
    inputs: InputSender,
    decode: DecodeSender,
    window: Option<WindowHandle>,
    context: Option<SoftContext<WindowHandle>>,
    surface: Option<Surface<WindowHandle, WindowHandle>>,
    canvas: Option<Canvas>,
    renderer: Renderer,
    store: ImageStore,
    empty_message: String,
    frame: Frame,
    offset: OffsetAnimator,
    closing_since: Option<Instant>,
    fades_until: Option<Instant>,
    size: PhysicalSize<u32>,
    scroll: f32,
    cursor: PhysicalPosition<f64>,
    modifiers: ModifiersState,
    /// Mouse button or touch that is currently driving the lightbox gesture.
    lightbox_pointer: Option<Pointer>,
    grid_press: Option<GridPress>,
    needs_redraw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pointer {
    Mouse,
    Touch(u64),
}

impl ViewerApp {
    fn new(
        cfg: Configuration,
        catalog: &'static Catalog,
        inputs: InputSender,
        decode: DecodeSender,
    ) -> Self {
        let font = match load_font() {
            Ok(font) => Some(font),
            Err(err) => {
                warn!(error = %err, "no font available; text will not be drawn");
                None
            }
        };
        let empty_message = format!("No images in {}", cfg.photo_library_path.display());
        if font.is_none() && catalog.is_empty() {
            warn!(
                message = %empty_message,
                "empty gallery will show a placeholder bar instead of text"
            );
        }
        let renderer = Renderer::new(font, cfg.title.clone());
        let size = PhysicalSize::new(cfg.window.width, cfg.window.height);
        Self {
            cfg,
            catalog,
            inputs,
            decode,
            window: None,
            context: None,
            surface: None,
            canvas: None,
            renderer,
            store: ImageStore::default(),
            empty_message,
            frame: Frame::closed(catalog.len()),
            offset: OffsetAnimator::new(Instant::now()),
            closing_since: None,
            fades_until: None,
            size,
            scroll: 0.0,
            cursor: PhysicalPosition::new(0.0, 0.0),
            modifiers: ModifiersState::empty(),
            lightbox_pointer: None,
            grid_press: None,
            needs_redraw: true,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        if self.window.is_some() {
            return Ok(());
        }
        let mut attrs = Window::default_attributes()
            .with_title(self.cfg.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.cfg.window.width,
                self.cfg.window.height,
            ));
        if self.cfg.window.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = WindowHandle::new(
            event_loop
                .create_window(attrs)
                .context("failed to create gallery window")?,
        );
        let context = SoftContext::new(window.clone())
            .map_err(|err| anyhow::anyhow!("failed to create softbuffer context: {err}"))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| anyhow::anyhow!("failed to create softbuffer surface: {err}"))?;
        self.context = Some(context);
        self.surface = Some(surface);
        let size = window.inner_size();
        self.window = Some(window);
        self.handle_resize(size);
        info!(width = size.width, height = size.height, "gallery window ready");
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        if let Some(surface) = self.surface.as_mut()
            && let (Some(width), Some(height)) = (
                NonZeroU32::new(self.size.width),
                NonZeroU32::new(self.size.height),
            )
            && let Err(err) = surface.resize(width, height)
        {
            warn!(error = %err, "failed to resize surface");
        }
        self.scroll = self.grid().clamp_scroll(self.scroll);
        self.send(LightboxInput::Resize {
            width: self.size.width as f32,
        });
        self.needs_redraw = true;
    }

    fn grid(&self) -> GridLayout {
        GridLayout::new(
            self.size.width as f32,
            self.size.height as f32,
            self.cfg.grid.thumbnail_size as f32,
            self.cfg.grid.gap as f32,
            self.catalog.len(),
        )
    }

    fn lightbox_layout(&self) -> LightboxLayout {
        LightboxLayout::new(self.size.width as f32, self.size.height as f32)
    }

    fn send(&self, input: LightboxInput) {
        match self.inputs.try_send(input) {
            Ok(()) => {}
            Err(TrySendError::Full(input)) => {
                warn!(?input, "lightbox input queue full; input dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("lightbox task gone; input dropped");
            }
        }
    }

    fn request(&mut self, ordinal: usize, variant: Variant) {
        if !self.store.claim(ordinal, variant) {
            return;
        }
        let Some(image) = self.catalog.get(ordinal) else {
            return;
        };
        let request = DecodeRequest {
            ordinal,
            path: image.path().to_path_buf(),
            variant,
        };
        if let Err(err) = self.decode.try_send(request) {
            // retried on the next idle pass
            self.store.unclaim(ordinal, variant);
            if matches!(err, TrySendError::Closed(_)) {
                debug!("loader gone; decode request dropped");
            }
        }
    }

    /// Full images for the active picture first, then its neighbours;
    /// thumbnails for the visible part of the grid.
    fn request_images(&mut self) {
        let full = Variant::Full(self.cfg.loader.full_image_max_dim);
        match self.frame.active_index {
            Some(index) if self.frame.is_visible() => {
                let last = self.catalog.len().saturating_sub(1);
                let keep = index.saturating_sub(1)..=(index + 1).min(last);
                self.store.retain_full(keep.clone());
                self.request(index, full);
                for ordinal in keep {
                    self.request(ordinal, full);
                }
            }
            _ => self.store.retain_full(1..=0),
        }
        let thumb = Variant::Thumbnail(self.cfg.grid.thumbnail_size);
        let grid = self.grid();
        let visible = grid.visible_range(self.scroll);
        // one row of look-ahead
        let end = (visible.end + grid.columns()).min(self.catalog.len());
        for ordinal in visible.start..end {
            self.request(ordinal, thumb);
        }
    }

    fn apply_frame(&mut self, frame: Frame) {
        let now = Instant::now();
        let previous = self.frame;
        if frame.status == Status::Closing && previous.status != Status::Closing {
            self.closing_since = Some(now);
        } else if frame.status != Status::Closing {
            self.closing_since = None;
        }
        if frame.offset_px != previous.offset_px
            || frame.motion != previous.motion
            || frame.active_index != previous.active_index
        {
            self.offset.retarget(frame.offset_px, frame.motion, now);
        }
        if frame.status == Status::Closed {
            self.lightbox_pointer = None;
        }
        self.frame = frame;
        self.needs_redraw = true;
    }

    fn apply_loaded(&mut self, event: LoaderEvent) {
        match event {
            LoaderEvent::Decoded(image) => {
                let now = Instant::now();
                if matches!(image.variant, Variant::Thumbnail(_)) {
                    self.fades_until = Some(now + self.cfg.grid.fade_in);
                }
                self.store.insert(image, now);
            }
            LoaderEvent::Failed { ordinal, variant } => {
                self.store.mark_failed(ordinal, variant);
            }
        }
        self.needs_redraw = true;
    }

    fn lightbox_view(&self, now: Instant) -> Option<LightboxView> {
        if !self.frame.is_visible() {
            return None;
        }
        let index = self.frame.active_index?;
        let opacity = match self.closing_since {
            Some(since) => 1.0 - progress(since, self.cfg.lightbox.close_duration, now),
            None => 1.0,
        };
        Some(LightboxView {
            index,
            len: self.frame.catalog_len,
            offset_px: self.offset.value(now),
            opacity,
        })
    }

    fn is_animating(&self, now: Instant) -> bool {
        self.closing_since.is_some()
            || !self.offset.is_settled(now)
            || self.fades_until.is_some_and(|until| now < until)
    }

    fn lightbox_target(&self, x: f32, y: f32) -> HitTarget {
        let layout = self.lightbox_layout();
        let now = Instant::now();
        let Some(view) = self.lightbox_view(now) else {
            return HitTarget::Backdrop;
        };
        let image =
            lightbox_image_rect(&layout, &self.store, view.index).translate_x(view.offset_px);
        layout.hit_test(x, y, Some(image), view.has_previous(), view.has_next())
    }

    fn pointer_pressed(&mut self, pointer: Pointer, x: f32, y: f32) {
        if self.frame.is_visible() {
            if self.frame.status == Status::Open && self.lightbox_pointer.is_none() {
                self.lightbox_pointer = Some(pointer);
                self.send(LightboxInput::PointerDown { x });
            }
            return;
        }
        self.grid_press = Some(GridPress {
            x,
            y,
            travelled: 0.0,
        });
    }

    fn pointer_moved(&mut self, pointer: Pointer, x: f32, y: f32) {
        if self.lightbox_pointer == Some(pointer) {
            self.send(LightboxInput::PointerMove { x });
            return;
        }
        let Some(press) = self.grid_press.as_mut() else {
            return;
        };
        let dy = y - press.y;
        press.travelled += (x - press.x).abs() + dy.abs();
        press.x = x;
        press.y = y;
        if matches!(pointer, Pointer::Touch(_)) && !self.frame.gesture_claimed {
            let grid = self.grid();
            self.scroll = grid.clamp_scroll(self.scroll - dy);
            self.needs_redraw = true;
        }
    }

    fn pointer_released(&mut self, pointer: Pointer, x: f32, y: f32) {
        if self.lightbox_pointer == Some(pointer) {
            self.lightbox_pointer = None;
            let target = self.lightbox_target(x, y);
            self.send(LightboxInput::PointerUp { target });
            return;
        }
        let Some(press) = self.grid_press.take() else {
            return;
        };
        if self.frame.is_visible() || press.travelled > self.cfg.lightbox.jitter_threshold_px {
            return;
        }
        if let Some(ordinal) = self.grid().hit_test(x, y, self.scroll) {
            debug!(ordinal, "thumbnail activated");
            self.send(LightboxInput::Open(ordinal));
        }
    }

    fn pointer_cancelled(&mut self, pointer: Pointer) {
        if self.lightbox_pointer == Some(pointer) {
            self.lightbox_pointer = None;
            self.send(LightboxInput::PointerCancel);
        }
        self.grid_press = None;
    }

    fn handle_touch(&mut self, touch: Touch) {
        let pointer = Pointer::Touch(touch.id);
        let x = touch.location.x as f32;
        let y = touch.location.y as f32;
        match touch.phase {
            TouchPhase::Started => self.pointer_pressed(pointer, x, y),
            TouchPhase::Moved => self.pointer_moved(pointer, x, y),
            TouchPhase::Ended => self.pointer_released(pointer, x, y),
            TouchPhase::Cancelled => self.pointer_cancelled(pointer),
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        let x = self.cursor.x as f32;
        let y = self.cursor.y as f32;
        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                self.pointer_pressed(Pointer::Mouse, x, y)
            }
            (MouseButton::Left, ElementState::Released) => {
                self.pointer_released(Pointer::Mouse, x, y)
            }
            (MouseButton::Back, ElementState::Pressed) => self.send(LightboxInput::Back),
            (MouseButton::Forward, ElementState::Pressed) => self.send(LightboxInput::Forward),
            _ => {}
        }
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        if self.frame.is_visible() || self.frame.gesture_claimed {
            return;
        }
        let dy = match delta {
            MouseScrollDelta::LineDelta(_x, y) => y * WHEEL_LINE_PX,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
        };
        let grid = self.grid();
        self.scroll = grid.clamp_scroll(self.scroll - dy);
        self.needs_redraw = true;
    }

    fn handle_key(&mut self, key: &WinitKey) {
        let alt = self.modifiers.alt_key();
        let input = match key {
            WinitKey::Named(NamedKey::Escape) => LightboxInput::Key(Key::Escape),
            WinitKey::Named(NamedKey::ArrowLeft) if alt => LightboxInput::Back,
            WinitKey::Named(NamedKey::ArrowRight) if alt => LightboxInput::Forward,
            WinitKey::Named(NamedKey::ArrowLeft) => LightboxInput::Key(Key::ArrowLeft),
            WinitKey::Named(NamedKey::ArrowRight) => LightboxInput::Key(Key::ArrowRight),
            WinitKey::Named(NamedKey::BrowserBack | NamedKey::Backspace) => LightboxInput::Back,
            WinitKey::Named(NamedKey::BrowserForward) => LightboxInput::Forward,
            _ => return,
        };
        self.send(input);
    }

    fn draw(&mut self) {
        let now = Instant::now();
        let width = self.size.width;
        let height = self.size.height;
        let lightbox = self.lightbox_view(now);
        let grid = self.grid();

        if self
            .canvas
            .as_ref()
            .is_none_or(|c| c.width() != width || c.height() != height)
        {
            self.canvas = Some(Canvas::new(width, height));
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let view = SceneView {
            grid,
            scroll: self.scroll,
            catalog_len: self.catalog.len(),
            empty_message: Some(&self.empty_message),
            store: &self.store,
            fade_in: self.cfg.grid.fade_in,
            now,
            lightbox,
        };
        self.renderer.draw(canvas, &view);

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match surface.buffer_mut() {
            Ok(mut buffer) => {
                if buffer.len() != canvas.pixels().len() {
                    debug!("surface size changed mid-frame; skipping present");
                    return;
                }
                buffer.copy_from_slice(canvas.pixels());
                if let Err(err) = buffer.present() {
                    warn!(error = %err, "failed to present frame");
                }
            }
            Err(err) => warn!(error = %err, "failed to acquire surface buffer"),
        }
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.ensure_window(event_loop) {
            error!(error = ?err, "gallery window unavailable");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                info!("gallery window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                self.handle_resize(size);
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    self.handle_key(&event.logical_key);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                self.pointer_moved(Pointer::Mouse, position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => self.pointer_cancelled(Pointer::Mouse),
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(state, button)
            }
            WindowEvent::MouseWheel { delta, .. } => self.handle_wheel(delta),
            WindowEvent::Touch(touch) => self.handle_touch(touch),
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Frame(frame) => self.apply_frame(frame),
            ViewerEvent::Loaded(loaded) => self.apply_loaded(loaded),
            ViewerEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.request_images();
        let animating = self.is_animating(Instant::now());
        if !animating {
            self.fades_until = None;
        }
        if (self.needs_redraw || animating)
            && let Some(window) = self.window.as_ref()
        {
            window.request_redraw();
            self.needs_redraw = false;
        }
    }
}

/// Run the gallery window on the calling thread until it is closed or
/// `cancel` fires.
#[allow(clippy::too_many_arguments)]
pub fn run_windowed(
    frames: FrameReceiver,
    loaded: LoadedReceiver,
    inputs: InputSender,
    decode: DecodeSender,
    cancel: CancellationToken,
    cfg: Configuration,
    catalog: &'static Catalog,
) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        let proxy = proxy.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };
    let frame_task = {
        let proxy = proxy.clone();
        let mut frames = frames;
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                if proxy.send_event(ViewerEvent::Frame(frame)).is_err() {
                    break;
                }
            }
        })
    };
    let loaded_task = {
        let mut loaded = loaded;
        tokio::spawn(async move {
            while let Some(event) = loaded.recv().await {
                if proxy.send_event(ViewerEvent::Loaded(event)).is_err() {
                    break;
                }
            }
        })
    };

    let mut app = ViewerApp::new(cfg, catalog, inputs, decode);
    let started = Instant::now();
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();
    frame_task.abort();
    loaded_task.abort();
    info!(
        uptime = %humantime::format_duration(round_secs(started.elapsed())),
        "gallery window closed"
    );

    run_result.context("viewer event loop failed")
}

fn round_secs(d: Duration) -> Duration {
    Duration::from_secs(d.as_secs())
}
