//! Inkpad gesture replay
//!
//! Drives a notebook from a JSON script of pointer events and frame ticks and
//! prints the resulting pages and pipeline events as JSON.
//!
//! ```json
//! {
//!   "pages": [{ "id": "p1", "width": 800, "height": 1100 }],
//!   "steps": [
//!     { "step": "select_tool", "tool": "pen" },
//!     { "step": "pointer", "page": "p1", "event": { "type": "down", "position": { "x": 10, "y": 10 }, "time_ms": 0 } },
//!     { "step": "frame", "time_ms": 16 }
//!   ]
//! }
//! ```
//!
//! Usage: `inkpad-replay <script.json> [tool-settings.json]`

use inkpad_core::{
    ConfigError, DrawableObject, EraserMode, ErasedEntry, Notebook, PageId, PipelineEvent, PointerEvent, ToolKind,
    ToolSettings,
};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
enum ReplayError {
    #[error("usage: inkpad-replay <script.json> [tool-settings.json]")]
    Usage,
    #[error("tool settings: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("script error: {0}")]
    Script(#[from] serde_json::Error),
    #[error("unknown page {0}")]
    UnknownPage(PageId),
}

#[derive(Debug, Deserialize)]
struct PageSpec {
    id: PageId,
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    SelectTool { tool: ToolKind },
    SetColor { color: String },
    EraserMode { mode: EraserMode },
    Pointer { page: PageId, event: PointerEvent },
    Frame { time_ms: u64 },
    EditText { page: PageId, time_ms: u64, text: String },
    SubmitEditor { page: PageId },
    CopySelection { page: PageId },
    CutSelection { page: PageId },
    DeleteSelection { page: PageId },
    RestoreLastErased { page: PageId },
}

#[derive(Debug, Deserialize)]
struct Script {
    pages: Vec<PageSpec>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
struct PageReport {
    id: PageId,
    objects: Vec<DrawableObject>,
    redo: Vec<ErasedEntry>,
    events: Vec<PipelineEvent>,
}

#[derive(Debug, Serialize)]
struct Report {
    pages: Vec<PageReport>,
}

fn replay(script: Script, settings: ToolSettings) -> Result<Report, ReplayError> {
    let mut notebook = Notebook::new(Arc::new(settings));
    for page in &script.pages {
        notebook.insert_page(page.id.clone(), Rect::new(0.0, 0.0, page.width, page.height));
    }

    // Events are drained after every step so none are lost to later resets
    let mut events: Vec<(PageId, PipelineEvent)> = Vec::new();

    for step in script.steps {
        log::trace!("step {step:?}");
        match step {
            Step::SelectTool { tool } => notebook.tools.set_tool(tool),
            Step::SetColor { color } => notebook.tools.set_color(color),
            Step::EraserMode { mode } => notebook.tools.eraser_mode = mode,
            Step::Pointer { page, event } => {
                if !notebook.handle_pointer(&page, event) {
                    return Err(ReplayError::UnknownPage(page));
                }
            }
            Step::Frame { time_ms } => notebook.on_frame(time_ms),
            Step::EditText { page, time_ms, text } => {
                if !page_mut(&mut notebook, &page)?.edit_text(time_ms, |draft| draft.text = text) {
                    log::warn!("edit_text on {page}: no editor open");
                }
            }
            Step::SubmitEditor { page } => {
                page_mut(&mut notebook, &page)?.submit_editor();
            }
            Step::CopySelection { page } => {
                page_mut(&mut notebook, &page)?.copy_selection();
            }
            Step::CutSelection { page } => {
                page_mut(&mut notebook, &page)?.cut_selection();
            }
            Step::DeleteSelection { page } => {
                page_mut(&mut notebook, &page)?.delete_selection();
            }
            Step::RestoreLastErased { page } => {
                page_mut(&mut notebook, &page)?.document.restore_last_erased();
            }
        }

        for page in script.pages.iter() {
            if let Some(p) = notebook.page_mut(&page.id) {
                events.extend(p.drain_events().into_iter().map(|e| (page.id.clone(), e)));
            }
        }
    }

    let pages = notebook
        .pages()
        .iter()
        .map(|page| PageReport {
            id: page.id().clone(),
            objects: page.document.objects().to_vec(),
            redo: page.document.redo.entries().to_vec(),
            events: events
                .iter()
                .filter(|(id, _)| id == page.id())
                .map(|(_, e)| e.clone())
                .collect(),
        })
        .collect();
    Ok(Report { pages })
}

fn page_mut<'a>(notebook: &'a mut Notebook, id: &PageId) -> Result<&'a mut inkpad_core::Page, ReplayError> {
    notebook.page_mut(id).ok_or_else(|| ReplayError::UnknownPage(id.clone()))
}

fn load_script(path: &Path) -> Result<Script, ReplayError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn run(args: &[String]) -> Result<String, ReplayError> {
    let (script_path, settings_path) = match args {
        [script] => (PathBuf::from(script), None),
        [script, settings] => (PathBuf::from(script), Some(PathBuf::from(settings))),
        _ => return Err(ReplayError::Usage),
    };

    let settings = match settings_path {
        Some(path) => ToolSettings::load(path)?,
        None => ToolSettings::default(),
    };
    let script = load_script(&script_path)?;
    log::info!("replaying {} step(s) on {} page(s)", script.steps.len(), script.pages.len());

    let report = replay(script, settings)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
