use std::backtrace::Backtrace;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use once_cell::sync::Lazy;
use regex::Regex;

/// Path segments identifying third-party code: node_modules for traces
/// arriving in JS payloads, .cargo for registry checkouts.
const DEPENDENCY_DIRS: [&str; 2] = ["node_modules", ".cargo"];

const FRAME_PREFIX: &str = "\n    at ";

static EXEC_PATH: Lazy<PathBuf> =
    Lazy::new(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

// `<invocation> (<filepath>)` - the invocation group is greedy so the split
// lands on the last ` (`.
static FRAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*) \((.+)\)$").expect("valid regex"));

/// The working-directory root used when sanitizing stacks at construction.
pub fn exec_path() -> &'static Path {
    &EXEC_PATH
}

/// Removes dependency and runtime-internal frames from a stack trace, and
/// shortens paths under `root` to root-relative form. The header line
/// passes through unchanged and surviving frames keep their order. Empty
/// input yields an empty string.
pub fn sanitize(stack: &str, root: &Path) -> String {
    if stack.is_empty() {
        return String::new();
    }

    let mut header: Vec<&str> = Vec::new();
    let mut frames: Vec<&str> = Vec::new();
    for line in stack.lines() {
        if let Some(body) = line.trim_start().strip_prefix("at ") {
            frames.push(body);
        } else if frames.is_empty() {
            header.push(line);
        }
        // Non-frame lines after the first frame are renderer noise.
    }

    let mut out = header.join("\n");
    for frame in frames {
        if let Some(rewritten) = sanitize_frame(frame, root) {
            out.push_str(FRAME_PREFIX);
            out.push_str(&rewritten);
        }
    }

    out
}

fn sanitize_frame(frame: &str, root: &Path) -> Option<String> {
    if let Some(captures) = FRAME_RE.captures(frame) {
        let invocation = &captures[1];
        let filepath = &captures[2];
        let rewritten = sanitize_path(filepath, root)?;
        return Some(format!("{invocation} ({rewritten})"));
    }

    // Anonymous frame: the body is the path itself.
    sanitize_path(frame, root)
}

/// Path-membership rules. Only frames that are rewritten-as-relative or
/// otherwise project-owned survive.
fn sanitize_path(filepath: &str, root: &Path) -> Option<String> {
    if is_dependency_path(filepath) {
        return None;
    }

    let root = root.to_string_lossy();
    if let Some(suffix) = filepath.strip_prefix(root.as_ref()) {
        if suffix.starts_with(MAIN_SEPARATOR) {
            return Some(format!(".{suffix}"));
        }
    }

    if Path::new(filepath).is_absolute() || has_scheme_prefix(filepath) {
        // The runtime's own internals: not the working tree, not a
        // dependency checkout.
        return None;
    }

    Some(filepath.to_string())
}

fn is_dependency_path(filepath: &str) -> bool {
    DEPENDENCY_DIRS.iter().any(|dir| {
        let marker = format!("{MAIN_SEPARATOR}{dir}{MAIN_SEPARATOR}");
        filepath.contains(&marker)
    })
}

// Frames like `node:internal/process/task_queues:96:5` name a runtime
// module, not a file in the working tree.
fn has_scheme_prefix(filepath: &str) -> bool {
    match (filepath.find(':'), filepath.find(MAIN_SEPARATOR)) {
        (Some(colon), Some(separator)) => colon < separator,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Renders the trace the runtime captured at this call site into the
/// canonical `Error` header plus `at` frame-line shape. Frames without a
/// source location are omitted; there is no path to apply membership rules
/// to.
pub(crate) fn capture(message: &str) -> String {
    render(message, &Backtrace::force_capture().to_string())
}

fn render(message: &str, backtrace: &str) -> String {
    let mut out = if message.is_empty() {
        "Error".to_string()
    } else {
        format!("Error: {message}")
    };

    let mut symbol: Option<&str> = None;
    for line in backtrace.lines() {
        let trimmed = line.trim_start();
        if let Some(location) = trimmed.strip_prefix("at ") {
            out.push_str(FRAME_PREFIX);
            match symbol.take() {
                Some(symbol) => {
                    out.push_str(symbol);
                    out.push_str(" (");
                    out.push_str(location);
                    out.push(')');
                }
                None => out.push_str(location),
            }
        } else if let Some((index, rest)) = trimmed.split_once(':') {
            if index.parse::<usize>().is_ok() {
                symbol = Some(rest.trim_start());
            }
        }
    }

    out
}
