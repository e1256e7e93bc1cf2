//! Canvas document and state management.

use crate::camera::Camera;
use crate::shapes::{SerializableColor, Shape, ShapeId, ShapeStyle};
use crate::tools::ToolKind;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Document errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    #[error("Shape {0} already exists in the document")]
    DuplicateShape(ShapeId),
}

/// Result type for document operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// A document: shapes keyed by id plus their paint order.
///
/// Every id in `z_order` has exactly one entry in `shapes` and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// All shapes in the document, keyed by ID.
    pub shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    pub z_order: Vec<ShapeId>,
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a shape on top of the paint order.
    pub fn add_shape(&mut self, shape: Shape) -> CanvasResult<ShapeId> {
        let id = shape.id();
        if self.shapes.contains_key(&id) {
            return Err(CanvasError::DuplicateShape(id));
        }
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        Ok(id)
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let removed = self.shapes.remove(&id)?;
        self.z_order.retain(|&shape_id| shape_id != id);
        Some(removed)
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Shapes back to front.
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Style defaults applied to newly created shapes, plus view options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    pub stroke: SerializableColor,
    pub fill: Option<SerializableColor>,
    pub stroke_width: f64,
    pub font_size: f64,
    pub background: SerializableColor,
    pub show_grid: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            stroke: SerializableColor::rgb(0x11, 0x18, 0x27),
            fill: Some(SerializableColor::rgb(0x3b, 0x82, 0xf6)),
            stroke_width: 2.0,
            font_size: 24.0,
            background: SerializableColor::white(),
            show_grid: true,
        }
    }
}

impl UiSettings {
    /// Style for a new shape, with or without the fill setting.
    pub fn shape_style(&self, filled: bool) -> ShapeStyle {
        ShapeStyle::new(
            self.stroke,
            self.stroke_width,
            if filled { self.fill } else { None },
        )
    }

    pub fn apply(&mut self, patch: UiSettingsPatch) {
        if let Some(stroke) = patch.stroke {
            self.stroke = stroke;
        }
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(background) = patch.background {
            self.background = background;
        }
        if let Some(show_grid) = patch.show_grid {
            self.show_grid = show_grid;
        }
    }
}

/// Partial update for [`UiSettings`]. `fill: Some(None)` clears the fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettingsPatch {
    pub stroke: Option<SerializableColor>,
    #[serde(deserialize_with = "present_or_null")]
    pub fill: Option<Option<SerializableColor>>,
    pub stroke_width: Option<f64>,
    pub font_size: Option<f64>,
    pub background: Option<SerializableColor>,
    pub show_grid: Option<bool>,
}

/// Distinguishes an explicit `null` from a missing key.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Selection, active tool and settings.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub tool: ToolKind,
    /// Only ever holds ids present in the working document.
    pub selection: HashSet<ShapeId>,
    pub settings: UiSettings,
}

/// A named document snapshot with its own camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    pub document: CanvasDocument,
    pub camera: Camera,
}

impl Page {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            document: CanvasDocument::new(),
            camera: Camera::default(),
        }
    }
}

/// Runtime canvas state.
///
/// `document` and `camera` are the working copy of the active page; the
/// page list only sees them when a snapshot is saved.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The document being edited.
    pub document: CanvasDocument,
    /// Camera for view transform.
    pub camera: Camera,
    pub ui: UiState,
    pages: Vec<Page>,
    active_page: String,
    /// Viewport size in CSS pixels.
    pub viewport_size: Size,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a canvas holding a single empty page.
    pub fn new() -> Self {
        let first = Page::new("page-1", "Page 1");
        Self {
            document: CanvasDocument::new(),
            camera: Camera::new(),
            ui: UiState::default(),
            active_page: first.id.clone(),
            pages: vec![first],
            viewport_size: Size::new(800.0, 600.0),
        }
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    pub fn viewport_center(&self) -> Point {
        Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0)
    }

    pub fn add_shape(&mut self, shape: Shape) -> CanvasResult<ShapeId> {
        self.document.add_shape(shape)
    }

    /// Remove a shape and drop it from the selection. No-op if absent.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.ui.selection.remove(&id);
        self.document.remove_shape(id)
    }

    /// Replace the selection with `id`, or empty it.
    pub fn select_only(&mut self, id: Option<ShapeId>) {
        self.ui.selection.clear();
        if let Some(id) = id {
            self.ui.selection.insert(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.ui.selection.clear();
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.ui.selection.contains(&id)
    }

    pub fn delete_selected(&mut self) {
        let ids: Vec<ShapeId> = self.ui.selection.drain().collect();
        for id in ids {
            self.document.remove_shape(id);
        }
    }

    /// Switch tools. Anything other than select drops the selection.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.ui.tool = tool;
        if tool != ToolKind::Select {
            self.clear_selection();
        }
    }

    pub fn set_ui_settings(&mut self, patch: UiSettingsPatch) {
        self.ui.settings.apply(patch);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.camera.pan(Vec2::new(dx, dy));
    }

    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        self.camera.zoom_at(screen, factor);
    }

    /// Reshape a rectangle or ellipse to the box spanned by `a` and `b`.
    pub fn update_rect(&mut self, id: ShapeId, a: Point, b: Point) {
        match self.document.get_shape_mut(id) {
            Some(Shape::Rectangle(rect)) => rect.set_corners(a, b),
            Some(Shape::Ellipse(ellipse)) => ellipse.set_corners(a, b),
            _ => {}
        }
    }

    /// Move both endpoints of a line or arrow.
    pub fn update_line_like(&mut self, id: ShapeId, a: Point, b: Point) {
        match self.document.get_shape_mut(id) {
            Some(Shape::Line(line)) => {
                line.start = a;
                line.end = b;
            }
            Some(Shape::Arrow(arrow)) => {
                arrow.start = a;
                arrow.end = b;
            }
            _ => {}
        }
    }

    /// Append a sample to a pencil stroke.
    pub fn append_point(&mut self, id: ShapeId, p: Point) {
        if let Some(Shape::Pencil(pencil)) = self.document.get_shape_mut(id) {
            pencil.add_point(p);
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn active_page_id(&self) -> &str {
        &self.active_page
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == self.active_page)
    }

    pub fn active_title(&self) -> &str {
        match self.active_page() {
            Some(page) if !page.name.trim().is_empty() => &page.name,
            _ => "Untitled",
        }
    }

    /// Copy the working document and camera into the active page slot.
    pub fn save_active_page_snapshot(&mut self) {
        let active = self.active_page.clone();
        if let Some(page) = self.pages.iter_mut().find(|p| p.id == active) {
            page.document = self.document.clone();
            page.camera = self.camera;
        }
    }

    /// Make `id` the active page. Returns whether the page changed.
    ///
    /// The outgoing page is always saved first, even when `id` is unknown.
    pub fn switch_to_page(&mut self, id: &str) -> bool {
        if id == self.active_page {
            return false;
        }
        self.save_active_page_snapshot();
        let Some(page) = self.pages.iter().find(|p| p.id == id) else {
            return false;
        };
        self.document = page.document.clone();
        self.camera = page.camera;
        self.active_page = page.id.clone();
        self.clear_selection();
        log::debug!("Switched to page {}", self.active_page);
        true
    }

    /// Append an empty page, make it active and return its id.
    pub fn add_page(&mut self) -> String {
        let uuid = Uuid::new_v4().simple().to_string();
        let id = format!("page-{}-{}", self.pages.len() + 1, &uuid[..6]);
        self.add_page_with_id(id.clone());
        id
    }

    pub fn add_page_with_id(&mut self, id: String) {
        self.save_active_page_snapshot();
        let page = Page::new(id, format!("Page {}", self.pages.len() + 1));
        self.document = page.document.clone();
        self.camera = page.camera;
        self.active_page = page.id.clone();
        self.pages.push(page);
        self.clear_selection();
    }

    pub fn rename_active_page(&mut self, title: &str) {
        let active = self.active_page.clone();
        if let Some(page) = self.pages.iter_mut().find(|p| p.id == active) {
            page.name = title.to_string();
        }
    }
}
