//! Autocomplete coordinator
//!
//! Bridges the editor and a [`CompletionProvider`]. Tab queries run inline;
//! proactive queries after each INSERT keystroke go to a worker thread with a
//! one-slot queue. Each query carries a generation number and a result is
//! applied only if it answers the latest query for the word still under the
//! cursor.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use super::document::is_word_char;

/// Source of completion candidates
pub trait CompletionProvider: Send + Sync {
    /// Candidates for the position (1-based line, 0-based column) in `text`
    fn complete(&self, text: &str, line: usize, column: usize) -> Vec<String>;
}

/// Provider that never suggests anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCompletion;

impl CompletionProvider for NoCompletion {
    fn complete(&self, _text: &str, _line: usize, _column: usize) -> Vec<String> {
        Vec::new()
    }
}

/// Completes from identifiers already in the document
#[derive(Debug, Default, Clone, Copy)]
pub struct BufferWords;

impl CompletionProvider for BufferWords {
    fn complete(&self, text: &str, line: usize, column: usize) -> Vec<String> {
        let Some(current) = line.checked_sub(1).and_then(|i| text.split('\n').nth(i)) else {
            return Vec::new();
        };

        let prefix: String = {
            let before: Vec<char> = current.chars().take(column).collect();
            let start = before
                .iter()
                .rposition(|c| !is_word_char(*c))
                .map(|i| i + 1)
                .unwrap_or(0);
            before[start..].iter().collect()
        };
        if prefix.is_empty() {
            return Vec::new();
        }

        let mut seen = std::collections::HashSet::new();
        text.split(|c: char| !is_word_char(c))
            .filter(|word| word.len() > prefix.len() && word.starts_with(prefix.as_str()))
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect()
    }
}

/// Call a provider, turning a panic into "no suggestions"
pub fn safe_complete(
    provider: &dyn CompletionProvider,
    text: &str,
    line: usize,
    column: usize,
) -> Vec<String> {
    match catch_unwind(AssertUnwindSafe(|| provider.complete(text, line, column))) {
        Ok(items) => items,
        Err(_) => {
            tracing::warn!("Completion provider panicked at {}:{}", line, column);
            Vec::new()
        }
    }
}

/// A query for the worker
#[derive(Debug, Clone)]
struct Request {
    generation: u64,
    text: String,
    line: usize,
    column: usize,
    word: String,
}

/// A worker answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub generation: u64,
    pub word: String,
    pub items: Vec<String>,
}

/// Pending request shared with the worker
struct Slot {
    request: Mutex<Option<Request>>,
    ready: Condvar,
    shutdown: AtomicBool,
}

/// Background completion thread
struct Worker {
    slot: Arc<Slot>,
    results: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(provider: Arc<dyn CompletionProvider>) -> std::io::Result<Self> {
        let slot = Arc::new(Slot {
            request: Mutex::new(None),
            ready: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let (tx, results) = mpsc::channel();

        let worker_slot = slot.clone();
        let handle = thread::Builder::new()
            .name("rix-complete".to_string())
            .spawn(move || run_worker(&worker_slot, provider.as_ref(), &tx))?;

        Ok(Self {
            slot,
            results,
            handle: Some(handle),
        })
    }

    /// Replace any request still waiting
    fn submit(&self, request: Request) {
        let mut pending = self
            .slot
            .request
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *pending = Some(request);
        self.slot.ready.notify_one();
    }
}

fn run_worker(slot: &Slot, provider: &dyn CompletionProvider, tx: &Sender<Completion>) {
    loop {
        let request = {
            let mut pending = slot.request.lock().unwrap_or_else(PoisonError::into_inner);
            loop {
                if slot.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                if let Some(request) = pending.take() {
                    break request;
                }
                pending = slot
                    .ready
                    .wait(pending)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        let items = safe_complete(provider, &request.text, request.line, request.column);
        let result = Completion {
            generation: request.generation,
            word: request.word,
            items,
        };
        if tx.send(result).is_err() {
            return;
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.slot.shutdown.store(true, Ordering::SeqCst);
        {
            let _guard = self
                .slot
                .request
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.slot.ready.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Suggestion list and selection
pub struct Autocomplete {
    provider: Arc<dyn CompletionProvider>,
    worker: Option<Worker>,
    enabled: bool,
    suggestions: Vec<String>,
    selected: usize,
    /// Latest query issued; older answers are dropped
    generation: u64,
}

impl Autocomplete {
    /// Inline queries only
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            worker: None,
            enabled: true,
            suggestions: Vec::new(),
            selected: 0,
            generation: 0,
        }
    }

    /// Proactive queries on a worker thread
    pub fn with_worker(provider: Arc<dyn CompletionProvider>) -> Self {
        let mut coordinator = Self::new(provider.clone());
        match Worker::spawn(provider) {
            Ok(worker) => coordinator.worker = Some(worker),
            Err(e) => tracing::warn!("Completion worker unavailable, querying inline: {}", e),
        }
        coordinator
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_suggestion(&self) -> Option<&str> {
        self.suggestions.get(self.selected).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.suggestions.first().map(String::as_str)
    }

    pub fn select_next(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + 1) % self.suggestions.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.suggestions.is_empty() {
            let len = self.suggestions.len();
            self.selected = (self.selected + len - 1) % len;
        }
    }

    /// Drop suggestions and invalidate every query in flight
    pub fn clear(&mut self) {
        self.suggestions.clear();
        self.selected = 0;
        self.generation += 1;
    }

    /// Query inline, replacing the current suggestions
    pub fn query_now(&mut self, text: &str, line: usize, column: usize) -> &[String] {
        self.generation += 1;
        self.suggestions = if self.enabled {
            safe_complete(self.provider.as_ref(), text, line, column)
        } else {
            Vec::new()
        };
        self.selected = 0;
        &self.suggestions
    }

    /// Query after an INSERT keystroke. Words of one character or less
    /// clear the list instead.
    pub fn refresh(&mut self, text: &str, line: usize, column: usize, word: &str) {
        if !self.enabled || word.chars().count() <= 1 {
            self.clear();
            return;
        }

        match &self.worker {
            Some(worker) => {
                self.generation += 1;
                worker.submit(Request {
                    generation: self.generation,
                    text: text.to_string(),
                    line,
                    column,
                    word: word.to_string(),
                });
            }
            None => {
                self.query_now(text, line, column);
            }
        }
    }

    /// Apply finished worker results. Returns true if the list changed.
    pub fn poll(&mut self, current_word: &str) -> bool {
        let mut results = Vec::new();
        if let Some(worker) = &self.worker {
            while let Ok(result) = worker.results.try_recv() {
                results.push(result);
            }
        }

        let mut changed = false;
        for result in results {
            changed |= self.apply(result, current_word);
        }
        changed
    }

    /// Accept a result only for the latest query and an unchanged word
    pub fn apply(&mut self, result: Completion, current_word: &str) -> bool {
        if result.generation != self.generation || result.word != current_word {
            return false;
        }
        self.suggestions = result.items;
        self.selected = 0;
        true
    }

    /// Generation of the latest query
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Fixed(Vec<&'static str>);

    impl CompletionProvider for Fixed {
        fn complete(&self, _text: &str, _line: usize, _column: usize) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    struct Panicking;

    impl CompletionProvider for Panicking {
        fn complete(&self, _text: &str, _line: usize, _column: usize) -> Vec<String> {
            panic!("provider failure")
        }
    }

    #[test]
    fn test_buffer_words_prefix_match() {
        let text = "print(x)\nprinter = 1\npr";
        let items = BufferWords.complete(text, 3, 2);
        assert_eq!(items, vec!["print".to_string(), "printer".to_string()]);
    }

    #[test]
    fn test_buffer_words_dedup_and_strict() {
        let text = "foo foobar foo foobar fo";
        let items = BufferWords.complete(text, 1, 24);
        assert_eq!(items, vec!["foo".to_string(), "foobar".to_string()]);
    }

    #[test]
    fn test_buffer_words_empty_word() {
        assert!(BufferWords.complete("alpha beta ", 1, 11).is_empty());
        assert!(BufferWords.complete("alpha", 5, 0).is_empty());
    }

    #[test]
    fn test_panicking_provider_yields_nothing() {
        assert!(safe_complete(&Panicking, "x", 1, 0).is_empty());
    }

    #[test]
    fn test_selection_cycles() {
        let mut ac = Autocomplete::new(Arc::new(Fixed(vec!["a", "b", "c"])));
        ac.query_now("", 1, 0);
        ac.select_prev();
        assert_eq!(ac.selected_suggestion(), Some("c"));
        ac.select_next();
        ac.select_next();
        assert_eq!(ac.selected_suggestion(), Some("b"));
    }

    #[test]
    fn test_refresh_short_word_clears() {
        let mut ac = Autocomplete::new(Arc::new(Fixed(vec!["print"])));
        ac.refresh("pr", 1, 2, "pr");
        assert!(ac.has_suggestions());
        ac.refresh("p", 1, 1, "p");
        assert!(!ac.has_suggestions());
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut ac = Autocomplete::new(Arc::new(NoCompletion));
        ac.refresh("pr", 1, 2, "pr");
        let stale = ac.generation();
        ac.refresh("pri", 1, 3, "pri");

        let old = Completion {
            generation: stale,
            word: "pr".to_string(),
            items: vec!["old".to_string()],
        };
        assert!(!ac.apply(old, "pri"));

        let current = Completion {
            generation: ac.generation(),
            word: "pri".to_string(),
            items: vec!["print".to_string()],
        };
        assert!(ac.apply(current.clone(), "pri"));
        assert_eq!(ac.suggestions(), &["print".to_string()]);

        // Word moved on since the query was issued
        ac.clear();
        let moved = Completion {
            generation: ac.generation(),
            ..current
        };
        assert!(!ac.apply(moved, "prin"));
    }

    #[test]
    fn test_clear_invalidates_in_flight() {
        let mut ac = Autocomplete::new(Arc::new(NoCompletion));
        ac.refresh("ab", 1, 2, "ab");
        let issued = ac.generation();
        ac.clear();
        let late = Completion {
            generation: issued,
            word: "ab".to_string(),
            items: vec!["abc".to_string()],
        };
        assert!(!ac.apply(late, "ab"));
        assert!(!ac.has_suggestions());
    }

    #[test]
    fn test_worker_delivers_latest() {
        let mut ac = Autocomplete::with_worker(Arc::new(BufferWords));
        let text = "printer print pri";
        ac.refresh(text, 1, 17, "pri");

        let deadline = Instant::now() + Duration::from_secs(5);
        while !ac.poll("pri") && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(ac.suggestions(), &["printer".to_string(), "print".to_string()]);
    }
}
