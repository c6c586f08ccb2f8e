//! One-time engine session initialization.
//!
//! The engine carries two pieces of process-wide state: the rayon thread
//! pool used for row evaluation and the set of preloaded auxiliary modules.
//! Both are set exactly once, before any region is processed, through
//! [`init`]; the pipeline never mutates them afterwards. Calling [`init`]
//! again returns the existing session unchanged.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Result, TableError};

static SESSION: OnceLock<Session> = OnceLock::new();

/// The process-wide engine session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Thread-count hint the pool was built with, if any.
    pub threads: Option<usize>,
    /// Preloaded module paths, in configuration order.
    pub libraries: Vec<PathBuf>,
}

/// Initialize the engine session.
///
/// `threads` is an opaque concurrency hint: when present and non-zero the
/// global rayon pool is built with that many threads (best-effort; a pool
/// built earlier in the process is kept). Each library path is preloaded:
/// verified to exist and recorded on the session. A missing library is a
/// [`TableError::Session`] error.
pub fn init(threads: Option<usize>, libraries: &[PathBuf]) -> Result<&'static Session> {
    if let Some(existing) = SESSION.get() {
        return Ok(existing);
    }

    for lib in libraries {
        if !lib.exists() {
            return Err(TableError::Session(format!(
                "library not found: {}",
                lib.display()
            )));
        }
    }

    if let Some(n) = threads {
        if n > 0 {
            // Best-effort; if a global pool already exists, keep going.
            let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
        }
    }

    let session = Session { threads, libraries: libraries.to_vec() };
    Ok(SESSION.get_or_init(|| session))
}

/// The current session, if [`init`] has run.
pub fn current() -> Option<&'static Session> {
    SESSION.get()
}

impl Session {
    /// Whether the given module path was preloaded.
    pub fn has_library(&self, path: &Path) -> bool {
        self.libraries.iter().any(|l| l == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SESSION is process-global, so everything lives in one test.
    #[test]
    fn init_is_one_time() {
        let missing = PathBuf::from("/nonexistent/libFoo.so");
        let err = init(None, std::slice::from_ref(&missing)).unwrap_err();
        assert!(err.to_string().contains("libFoo"), "{err}");
        assert!(current().is_none());

        let dir = std::env::temp_dir();
        let s = init(Some(2), std::slice::from_ref(&dir)).unwrap();
        assert_eq!(s.threads, Some(2));
        assert!(s.has_library(&dir));

        // A second init is a no-op returning the same session.
        let again = init(Some(8), &[]).unwrap();
        assert_eq!(again.threads, Some(2));
        assert!(again.has_library(&dir));
    }
}
