//! Freehand annotation over a selected image.
//!
//! Three same-sized layers back the editor: the decoded image, the user's
//! strokes, and the composite shown on screen. Strokes only ever touch the
//! annotation layer, so the composite can always be rebuilt as
//! `background` then `annotation` at the active alpha, and reset loses
//! nothing.

use si_raster::{RasterBuffer, RasterError, Resample, Rgba};

use crate::config::EditorOptions;
use crate::constants::MAX_BRUSH_RADIUS;
use crate::event_bus::EventBus;
use crate::events::DashboardEvent;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor has been destroyed")]
    Destroyed,
    #[error(transparent)]
    Raster(#[from] RasterError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// No image; drawing disabled.
    Empty,
    /// Image loaded, annotation layer blank.
    HasImage,
    /// At least one stroke since the last reset or image load.
    Annotating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Enter,
    Leave,
}

/// Pointer input in canvas-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub x: f32,
    pub y: f32,
    /// Whether the primary button is held.
    pub primary: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32, primary: bool) -> Self {
        Self {
            kind,
            x,
            y,
            primary,
        }
    }
}

/// The editor's raster surfaces, always the same size.
#[derive(Debug, Clone)]
pub struct MaskLayers {
    pub background: RasterBuffer,
    pub annotation: RasterBuffer,
    pub composite: RasterBuffer,
}

impl MaskLayers {
    fn new(width: u32, height: u32) -> Self {
        Self {
            background: RasterBuffer::new(width, height),
            annotation: RasterBuffer::new(width, height),
            composite: RasterBuffer::new(width, height),
        }
    }

    fn recomposite(&mut self, active_alpha: f32) {
        self.composite = self.background.clone();
        self.composite.composite_over(&self.annotation, active_alpha);
    }
}

/// Resize an annotation layer to the wire resolution and encode it as raw
/// base64 PNG.
pub fn encode_mask(annotation: &RasterBuffer, width: u32, height: u32) -> Result<String, RasterError> {
    annotation
        .resize(width, height, Resample::Bilinear)?
        .encode_base64()
}

pub struct CanvasMaskEditor {
    bus: EventBus,
    options: EditorOptions,
    brush_color: Rgba,
    brush_radius: u32,
    layers: Option<MaskLayers>,
    state: EditorState,
    drawing: bool,
}

impl CanvasMaskEditor {
    pub fn new(bus: EventBus, options: EditorOptions, brush_radius: u32) -> Self {
        let brush_color = options.brush_color();
        let layers = MaskLayers::new(options.width.max(1), options.height.max(1));
        Self {
            bus,
            options,
            brush_color,
            brush_radius: brush_radius.clamp(1, MAX_BRUSH_RADIUS),
            layers: Some(layers),
            state: EditorState::Empty,
            drawing: false,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.layers.is_none()
    }

    pub fn brush_radius(&self) -> u32 {
        self.brush_radius
    }

    pub fn set_brush_radius(&mut self, radius: u32) {
        self.brush_radius = radius.clamp(1, MAX_BRUSH_RADIUS);
    }

    pub fn layers(&self) -> Option<&MaskLayers> {
        self.layers.as_ref()
    }

    /// What the canvas shows.
    pub fn composite(&self) -> Option<&RasterBuffer> {
        self.layers.as_ref().map(|l| &l.composite)
    }

    /// Load a new base64 image, or clear the editor with `None`.
    ///
    /// The annotation layer is cleared either way. A payload that does not
    /// decode leaves the editor empty with drawing disabled.
    pub fn set_image(&mut self, encoded: Option<&str>) -> Result<(), EditorError> {
        let (width, height) = (self.options.width.max(1), self.options.height.max(1));
        let active_alpha = self.options.active_alpha;
        let layers = self.layers.as_mut().ok_or(EditorError::Destroyed)?;
        layers.annotation.clear();
        self.drawing = false;

        let Some(encoded) = encoded else {
            layers.background.clear();
            layers.recomposite(active_alpha);
            self.state = EditorState::Empty;
            log::debug!("editor: cleared");
            return Ok(());
        };

        match RasterBuffer::decode_base64_fitted(encoded, width, height) {
            Ok(background) => {
                layers.background = background;
                layers.recomposite(active_alpha);
                self.state = EditorState::HasImage;
                log::debug!("editor: image loaded at {}x{}", width, height);
                Ok(())
            }
            Err(e) => {
                layers.background.clear();
                layers.recomposite(active_alpha);
                self.state = EditorState::Empty;
                log::warn!("editor: could not decode image: {}", e);
                Err(e.into())
            }
        }
    }

    /// Feed one pointer event. Returns whether a stroke was stamped.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if self.state == EditorState::Empty || self.layers.is_none() {
            self.drawing = false;
            return false;
        }
        match event.kind {
            PointerKind::Down => {
                self.drawing = event.primary;
                false
            }
            PointerKind::Enter => {
                self.drawing = event.primary;
                false
            }
            PointerKind::Up | PointerKind::Leave => {
                self.drawing = false;
                false
            }
            PointerKind::Move => {
                if !(self.drawing && event.primary) {
                    return false;
                }
                self.stamp(event.x, event.y)
            }
        }
    }

    fn stamp(&mut self, x: f32, y: f32) -> bool {
        let Some(layers) = self.layers.as_mut() else {
            return false;
        };
        let radius = self.brush_radius as f32;
        layers
            .annotation
            .fill_circle(x, y, radius, self.brush_color, self.options.active_alpha);
        layers.recomposite(self.options.active_alpha);
        self.state = EditorState::Annotating;
        log::trace!("editor: stamp r={} at ({}, {})", radius, x, y);
        self.bus.trigger(&DashboardEvent::MaskChanged);
        true
    }

    /// Clear the strokes, keeping the image.
    pub fn reset(&mut self) {
        let active_alpha = self.options.active_alpha;
        let Some(layers) = self.layers.as_mut() else {
            return;
        };
        layers.annotation.clear();
        layers.recomposite(active_alpha);
        if self.state == EditorState::Annotating {
            self.state = EditorState::HasImage;
        }
        self.drawing = false;
        log::debug!("editor: reset");
        self.bus.trigger(&DashboardEvent::MaskReset);
    }

    /// Announce the current annotation for ranking. Does nothing without an
    /// image.
    pub fn submit(&self) -> bool {
        let Some(layers) = &self.layers else {
            return false;
        };
        if self.state == EditorState::Empty {
            return false;
        }
        self.bus.trigger(&DashboardEvent::MaskSubmit {
            annotation: layers.annotation.clone(),
        });
        true
    }

    /// The annotation layer resized to `width` x `height`, as raw base64 PNG.
    pub fn get_encoded_mask(&self, width: u32, height: u32) -> Result<String, EditorError> {
        let layers = self.layers.as_ref().ok_or(EditorError::Destroyed)?;
        Ok(encode_mask(&layers.annotation, width, height)?)
    }

    /// Release the layers. The editor is inert afterwards.
    pub fn destroy(&mut self) {
        self.layers = None;
        self.state = EditorState::Empty;
        self.drawing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn gray_image(size: u32) -> String {
        let mut img = RasterBuffer::new(size, size);
        for y in 0..size {
            for x in 0..size {
                img.put_pixel(x, y, Rgba::opaque(90, 90, 90));
            }
        }
        img.encode_base64().unwrap()
    }

    fn small_options() -> EditorOptions {
        EditorOptions {
            width: 32,
            height: 32,
            ..EditorOptions::default()
        }
    }

    fn editor_with_image(bus: &EventBus) -> CanvasMaskEditor {
        let mut editor = CanvasMaskEditor::new(bus.clone(), small_options(), 4);
        editor.set_image(Some(&gray_image(16))).unwrap();
        editor
    }

    fn drag(editor: &mut CanvasMaskEditor, points: &[(f32, f32)]) {
        editor.handle_pointer(PointerEvent::new(PointerKind::Down, 0.0, 0.0, true));
        for &(x, y) in points {
            editor.handle_pointer(PointerEvent::new(PointerKind::Move, x, y, true));
        }
        editor.handle_pointer(PointerEvent::new(PointerKind::Up, 0.0, 0.0, false));
    }

    #[test]
    fn test_state_machine() {
        let bus = EventBus::new();
        let mut editor = CanvasMaskEditor::new(bus.clone(), small_options(), 4);
        assert_eq!(editor.state(), EditorState::Empty);

        editor.set_image(Some(&gray_image(8))).unwrap();
        assert_eq!(editor.state(), EditorState::HasImage);

        drag(&mut editor, &[(10.0, 10.0)]);
        assert_eq!(editor.state(), EditorState::Annotating);

        editor.reset();
        assert_eq!(editor.state(), EditorState::HasImage);

        editor.set_image(None).unwrap();
        assert_eq!(editor.state(), EditorState::Empty);
        drag(&mut editor, &[(10.0, 10.0)]);
        assert_eq!(editor.state(), EditorState::Empty);
    }

    #[test]
    fn test_image_is_fitted_to_canvas() {
        let editor = editor_with_image(&EventBus::new());
        let layers = editor.layers().unwrap();
        assert_eq!(layers.background.dimensions(), (32, 32));
        assert_eq!(layers.annotation.dimensions(), (32, 32));
        assert_eq!(layers.composite.dimensions(), (32, 32));
    }

    #[test]
    fn test_corrupt_image_leaves_editor_empty() {
        let mut editor = editor_with_image(&EventBus::new());
        assert!(editor.set_image(Some("not base64!")).is_err());
        assert_eq!(editor.state(), EditorState::Empty);
        assert!(!editor.handle_pointer(PointerEvent::new(PointerKind::Down, 1.0, 1.0, true)));
        assert!(!editor.handle_pointer(PointerEvent::new(PointerKind::Move, 1.0, 1.0, true)));
    }

    #[test]
    fn test_moves_without_button_do_not_draw() {
        let mut editor = editor_with_image(&EventBus::new());
        assert!(!editor.handle_pointer(PointerEvent::new(PointerKind::Move, 5.0, 5.0, false)));
        assert!(!editor.handle_pointer(PointerEvent::new(PointerKind::Move, 5.0, 5.0, true)));
        assert!(editor.layers().unwrap().annotation.is_blank());

        // entering with the button held re-arms the stroke
        editor.handle_pointer(PointerEvent::new(PointerKind::Enter, 5.0, 5.0, true));
        assert!(editor.handle_pointer(PointerEvent::new(PointerKind::Move, 5.0, 5.0, true)));

        editor.handle_pointer(PointerEvent::new(PointerKind::Leave, 5.0, 5.0, true));
        assert!(!editor.handle_pointer(PointerEvent::new(PointerKind::Move, 9.0, 9.0, true)));
    }

    #[test]
    fn test_stroke_never_touches_background() {
        let mut editor = editor_with_image(&EventBus::new());
        let before = editor.layers().unwrap().background.clone();
        drag(&mut editor, &[(8.0, 8.0), (12.0, 12.0)]);
        let layers = editor.layers().unwrap();
        assert_eq!(layers.background, before);
        assert!(!layers.annotation.is_blank());
        assert_ne!(layers.composite, before);

        editor.reset();
        assert_eq!(editor.composite().unwrap(), &before);
    }

    #[test]
    fn test_reset_then_encode_is_blank() {
        let mut editor = editor_with_image(&EventBus::new());
        drag(&mut editor, &[(8.0, 8.0), (20.0, 20.0)]);
        editor.reset();

        let encoded = editor.get_encoded_mask(224, 224).unwrap();
        assert!(!encoded.starts_with("data:"));
        let decoded = RasterBuffer::decode_base64(&encoded).unwrap();
        assert_eq!(decoded.dimensions(), (224, 224));
        assert!(decoded.is_blank());

        let fresh = CanvasMaskEditor::new(EventBus::new(), small_options(), 4);
        let fresh_mask = RasterBuffer::decode_base64(&fresh.get_encoded_mask(224, 224).unwrap())
            .unwrap();
        assert_eq!(decoded, fresh_mask);
    }

    #[test]
    fn test_encoded_mask_keeps_strokes() {
        let mut editor = editor_with_image(&EventBus::new());
        drag(&mut editor, &[(16.0, 16.0)]);
        let decoded =
            RasterBuffer::decode_base64(&editor.get_encoded_mask(64, 64).unwrap()).unwrap();
        assert!(decoded.coverage() > 0);
        assert!(decoded.pixel(32, 32).unwrap().a > 0);
        assert_eq!(decoded.pixel(0, 0).unwrap().a, 0);
    }

    #[test]
    fn test_events() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for kind in [EventKind::MaskChanged, EventKind::MaskReset, EventKind::MaskSubmit] {
            let log = Rc::clone(&log);
            subs.push(bus.bind(kind, move |e| {
                let covered = match e {
                    DashboardEvent::MaskSubmit { annotation } => annotation.coverage(),
                    _ => 0,
                };
                log.borrow_mut().push((e.kind(), covered));
            }));
        }

        let mut editor = editor_with_image(&bus);
        drag(&mut editor, &[(16.0, 16.0)]);
        assert!(editor.submit());
        editor.reset();

        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].0, EventKind::MaskChanged);
        assert_eq!(log[1].0, EventKind::MaskSubmit);
        assert!(log[1].1 > 0);
        assert_eq!(log[2].0, EventKind::MaskReset);
    }

    #[test]
    fn test_submit_requires_image() {
        let editor = CanvasMaskEditor::new(EventBus::new(), small_options(), 4);
        assert!(!editor.submit());
    }

    #[test]
    fn test_destroy_releases_layers() {
        let mut editor = editor_with_image(&EventBus::new());
        editor.destroy();
        assert!(editor.is_destroyed());
        assert!(editor.layers().is_none());
        assert!(matches!(
            editor.get_encoded_mask(10, 10),
            Err(EditorError::Destroyed)
        ));
        assert!(matches!(
            editor.set_image(Some(&gray_image(4))),
            Err(EditorError::Destroyed)
        ));
        assert!(!editor.handle_pointer(PointerEvent::new(PointerKind::Move, 1.0, 1.0, true)));
    }

    #[test]
    fn test_brush_radius_clamped() {
        let mut editor = CanvasMaskEditor::new(EventBus::new(), small_options(), 0);
        assert_eq!(editor.brush_radius(), 1);
        editor.set_brush_radius(1000);
        assert_eq!(editor.brush_radius(), MAX_BRUSH_RADIUS);
    }
}
