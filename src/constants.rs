//! Global constants for the Shared Interest dashboard

/// Case study loaded when the URL does not name one
pub const DEFAULT_CASE_STUDY: &str = "data_dogs_10";

/// Image selected for annotation when the URL does not name one
pub const DEFAULT_SELECTED_IMAGE: &str = "n02085620_3360";

/// Default paint brush radius in canvas pixels
pub const DEFAULT_BRUSH_RADIUS: u32 = 10;

/// Largest brush radius accepted from the URL or the UI
pub const MAX_BRUSH_RADIUS: u32 = 100;

/// Side length of the mask sent to the ranking endpoint
pub const MASK_WIRE_SIZE: u32 = 224;

/// Number of ranked predictions requested per submit
pub const DEFAULT_TOP_K: u32 = 5;

/// Extra pixels around the viewport that already count as visible
pub const DEFAULT_ROOT_MARGIN: f64 = 200.0;

/// Brush color of the annotation layer
pub const DRAW_COLOR: &str = "#f2d602";

/// Opacity of brush stamps and of the annotation layer in the preview
pub const ACTIVE_ALPHA: f32 = 0.65;

/// Opacity of pixels outside a ranked prediction's mask
pub const DIM_ALPHA: f32 = 0.25;

/// API root used by native builds when nothing overrides it
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable overriding the API root on native builds
pub const API_URL_ENV: &str = "SHARED_INTEREST_API_URL";
