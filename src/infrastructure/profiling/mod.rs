// ============================================================
// PROFILING INFRASTRUCTURE LAYER
// ============================================================
// Exploratory profile of a DataTable and its HTML rendering

mod html_renderer;
mod profiler;
mod stats;

pub use html_renderer::HtmlRenderer;
pub use profiler::{ProfileSettings, Profiler};
